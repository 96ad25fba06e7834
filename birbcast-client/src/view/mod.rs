mod projection;
mod render_model;

pub use projection::*;
pub use render_model::*;
