use crate::{Error, Result};

/// Number of results taken when no limit is configured.
pub const DEFAULT_TAKE: usize = 10;

/// Upper bound on the worker pool size.
///
/// Every worker is a long-lived task with its own fan-in forwarder; this
/// keeps a misconfigured pool from spawning an unbounded number of them.
pub const MAX_PARALLELISM: usize = 4096;

/// Runtime configuration of a [`crate::Pipeline`].
///
/// The defaults size the worker pool to the number of logical CPUs and take
/// [`DEFAULT_TAKE`] results.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct PipelineConfig {
    /// Number of filter workers reading the generator stream concurrently.
    ///
    /// Must be in `1..=MAX_PARALLELISM`.
    pub parallelism: usize,

    /// Maximum number of results returned by a run.
    ///
    /// Zero is valid and yields an empty result.
    pub take: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            parallelism: num_cpus::get(),
            take: DEFAULT_TAKE,
        }
    }
}

impl PipelineConfig {
    /// Default configuration taking `take` results.
    pub fn new(take: usize) -> Self {
        Self {
            take,
            ..Self::default()
        }
    }

    /// Overrides the worker pool size.
    #[must_use]
    pub const fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Overrides the number of results to take.
    #[must_use]
    pub const fn with_take(mut self, take: usize) -> Self {
        self.take = take;
        self
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `parallelism` is zero or exceeds
    /// [`MAX_PARALLELISM`].
    pub fn validate(&self) -> Result<()> {
        if self.parallelism == 0 {
            return Err(Error::InvalidConfig {
                reason: "parallelism must be greater than 0".to_string(),
            });
        }

        if self.parallelism > MAX_PARALLELISM {
            return Err(Error::InvalidConfig {
                reason: format!(
                    "parallelism ({}) exceeds the maximum ({MAX_PARALLELISM})",
                    self.parallelism
                ),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sizes_pool_to_cpus() {
        let config = PipelineConfig::default();
        assert_eq!(config.parallelism, num_cpus::get());
        assert_eq!(config.take, DEFAULT_TAKE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builders_override_fields() {
        let config = PipelineConfig::new(3).with_parallelism(2);
        assert_eq!(config, PipelineConfig { parallelism: 2, take: 3 });
        assert_eq!(config.with_take(0).take, 0);
    }

    #[test]
    fn rejects_empty_pool() {
        let err = PipelineConfig::new(1).with_parallelism(0).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
        assert_eq!(err.to_string(), "Invalid config: parallelism must be greater than 0");
    }

    #[test]
    fn rejects_oversized_pool() {
        let config = PipelineConfig::new(1).with_parallelism(MAX_PARALLELISM + 1);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig { .. })));
        assert!(config.with_parallelism(MAX_PARALLELISM).validate().is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserializes_partial_config() {
        let config: PipelineConfig = serde_json::from_str(r#"{ "take": 7 }"#).unwrap();
        assert_eq!(config.take, 7);
        assert_eq!(config.parallelism, num_cpus::get());

        let json = serde_json::to_string(&PipelineConfig { parallelism: 3, take: 1 }).unwrap();
        assert_eq!(json, r#"{"parallelism":3,"take":1}"#);

        assert!(serde_json::from_str::<PipelineConfig>(r#"{ "workers": 2 }"#).is_err());
    }
}
