//! Pack and build configuration types

mod pack;

pub use pack::*;
