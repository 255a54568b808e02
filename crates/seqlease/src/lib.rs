#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod config;
mod error;
mod generator;
mod id;
mod mutex;
mod registry;
mod store;
mod time;

pub use crate::config::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::registry::*;
pub use crate::store::*;
pub use crate::time::*;
