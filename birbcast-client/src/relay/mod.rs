mod frame_feed;

pub use frame_feed::*;
