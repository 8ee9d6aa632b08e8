//! Pipeline stages.
//!
//! Each stage spawns one background task per source through a [`Scope`] and
//! returns the [`Outlet`] of its output stream right away. Every blocking
//! point inside a stage task is a `tokio::select!` biased toward the scope's
//! cancellation, so a fired signal always wins a tie and no stage can stay
//! parked on a send or receive after cancellation.
//!
//! ## Structure
//!
//! - [`generate`] / [`try_generate`] - unbounded producer stream.
//! - [`filter`] / [`try_filter`] - predicate worker; many may share one input.
//! - [`merge`] - fan-in of any number of streams.
//! - [`take`] - bounded prefix of a stream.
//!
//! [`Scope`]: crate::Scope
//! [`Outlet`]: crate::Outlet

mod filter;
mod generate;
mod merge;
mod take;

pub use filter::*;
pub use generate::*;
pub use merge::*;
pub use take::*;
