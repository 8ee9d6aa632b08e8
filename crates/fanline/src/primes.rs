//! Prime-filter instantiation of the pipeline.
//!
//! [`random_candidates`] is the producer and [`is_prime`] the predicate:
//!
//! ```
//! use fanline::{Pipeline, PipelineConfig, primes};
//!
//! # #[tokio::main(flavor = "multi_thread")]
//! # async fn main() -> fanline::Result<()> {
//! let pipeline = Pipeline::new(PipelineConfig::new(3))?;
//! let found = pipeline
//!     .run(primes::random_candidates(1_000), |n| primes::is_prime(*n))
//!     .await;
//! assert!(found.iter().all(|n| *n < 1_000 && primes::is_prime(*n)));
//! # Ok(())
//! # }
//! ```

use rand::Rng;

/// Exclusive upper bound of the candidates drawn by default.
pub const DEFAULT_UPPER_BOUND: u64 = 500_000_000;

/// Returns `true` if `n` is prime.
///
/// Plain trial division by odd numbers up to `sqrt(n)`. Deterministic and
/// deliberately CPU bound, which is what makes fanning it out worthwhile.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }

    let mut divisor = 3;
    while divisor <= n / divisor {
        if n % divisor == 0 {
            return false;
        }
        divisor += 2;
    }
    true
}

/// Returns a producer of uniformly random candidates in `0..upper`.
///
/// # Panics
///
/// Panics if `upper` is zero.
pub fn random_candidates(upper: u64) -> impl FnMut() -> u64 + Send + 'static {
    assert!(upper > 0, "candidate range must not be empty");
    // The thread-local generator is looked up on every call, so the producer
    // stays `Send` and can run on any runtime thread.
    move || rand::rng().random_range(0..upper)
}
