mod test_connect_to_answers_advertiser;
mod test_failure_is_isolated;
