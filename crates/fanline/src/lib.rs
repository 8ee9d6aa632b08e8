#![doc = include_str!("../README.md")]

mod error;
mod pipeline;
pub mod primes;
mod scope;
mod signal;
pub mod stage;
mod stats;
mod stream;
pub mod telemetry;

pub use crate::error::*;
pub use crate::pipeline::*;
pub use crate::scope::*;
pub use crate::signal::*;
pub use crate::stats::*;
pub use crate::stream::*;
