mod presence_counter;

pub use presence_counter::*;
