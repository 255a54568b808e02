mod composite;
mod counter;
mod interface;
mod segment;
mod status;

pub use composite::*;
pub use counter::*;
pub use interface::*;
pub use segment::*;
pub use status::*;
