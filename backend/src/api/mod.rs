mod channels;
mod jobs;
pub mod views;

pub use channels::*;
pub use jobs::*;
