mod test_frame_feed;
