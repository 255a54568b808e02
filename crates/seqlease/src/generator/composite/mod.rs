mod allocator;
mod atomic;
#[cfg(test)]
mod tests;

pub use allocator::*;
pub use atomic::*;
