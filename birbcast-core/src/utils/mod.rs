mod calendar;
mod candidate;
mod sanitize;

pub use calendar::DayClock;
pub use candidate::{admits_candidate, filter_sdp_candidates, is_udp_relay_candidate};
pub use sanitize::sanitize_html;

/// Public STUN servers used when no ICE servers are configured.
pub const DEFAULT_STUN_URLS: [&str; 10] = [
    "stun:stun.l.google.com:19302",
    "stun:stun.l.google.com:5349",
    "stun:stun1.l.google.com:3478",
    "stun:stun1.l.google.com:5349",
    "stun:stun2.l.google.com:19302",
    "stun:stun2.l.google.com:5349",
    "stun:stun3.l.google.com:3478",
    "stun:stun3.l.google.com:5349",
    "stun:stun4.l.google.com:19302",
    "stun:stun4.l.google.com:5349",
];
