#![doc = include_str!("../README.md")]

mod config;
mod constants;
mod descriptor;
mod error;
mod outcome;
mod stats;
mod verdict;

pub use config::*;
pub use constants::*;
pub use descriptor::*;
pub use error::*;
pub use outcome::*;
pub use stats::*;
pub use verdict::*;
