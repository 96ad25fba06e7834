mod test_presence_reconnect;
