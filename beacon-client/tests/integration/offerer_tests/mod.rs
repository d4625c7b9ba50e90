mod test_answer_reaches_offerer;
