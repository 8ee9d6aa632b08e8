use core::convert::Infallible;

/// A result type whose error defaults to the crate [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors a pipeline can surface to its caller.
///
/// The generic parameter `E` is the error type of a fallible producer or
/// predicate (see [`crate::Pipeline::try_run`]). Pipelines built from
/// infallible functions use the default `Infallible`, which makes
/// [`Error::Stage`] unconstructible.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error<E = Infallible> {
    /// The pipeline configuration was rejected before any task was spawned.
    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    /// A producer or predicate failed. The first reported failure wins;
    /// the pipeline was cancelled and fully unwound before this was returned.
    #[error("Stage failed: {0}")]
    Stage(E),

    /// The runtime backing [`crate::Pipeline::run_blocking`] could not be
    /// built.
    #[error("Runtime error: {0}")]
    Runtime(#[source] std::io::Error),
}
