mod test_two_clients_handshake;
