// Shared by several test crates; not every crate uses every helper
#![allow(dead_code)]

pub mod mocks;

pub use mocks::*;
