mod lease;
mod state;

pub use lease::*;
