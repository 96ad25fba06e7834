//! Shared models and pure helpers for the birbcast viewer client.

mod error;
pub mod model;
pub mod utils;

pub use error::{PayloadError, UnknownTransportPolicy};
pub use model::*;
