//! Coordinator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ReplicatorError, ReplicatorResult};

/// Tunables for the replication coordinator and facade.
///
/// The distilled coordinator only needs `req_timeout`; `default_w` is
/// convenience sugar for callers that would rather ask for a named
/// consistency level than hand-compute a quorum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicatorConfig {
    /// Total per-request deadline, measured from the moment the facade
    /// starts waiting on the coordinator's reply channel.
    pub req_timeout: Duration,

    /// Optional fallback write quorum for convenience constructors. Callers
    /// may always pass an explicit `w` to [`crate::facade::replicate`]
    /// instead.
    pub default_w: Option<u32>,
}

impl Default for ReplicatorConfig {
    fn default() -> Self {
        Self {
            req_timeout: Duration::from_secs(5),
            default_w: None,
        }
    }
}

impl ReplicatorConfig {
    /// Creates a builder seeded with the default configuration.
    #[must_use]
    pub fn builder() -> ReplicatorConfigBuilder {
        ReplicatorConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ReplicatorError::Config`] if `req_timeout` is zero.
    pub fn validate(&self) -> ReplicatorResult<()> {
        if self.req_timeout.is_zero() {
            return Err(ReplicatorError::Config(
                "req_timeout must be greater than zero".into(),
            ));
        }

        Ok(())
    }

    /// Returns the quorum needed for a simple majority of `n` replicas.
    ///
    /// Additive sugar over the coordinator's quorum semantics, analogous to
    /// a named `Quorum` consistency level: it does not change how the
    /// coordinator evaluates `W` once chosen.
    #[must_use]
    pub const fn majority_of(n: u32) -> u32 {
        n / 2 + 1
    }
}

/// Builder for [`ReplicatorConfig`].
#[derive(Debug, Default)]
pub struct ReplicatorConfigBuilder {
    config: ReplicatorConfig,
}

impl ReplicatorConfigBuilder {
    /// Sets the per-request deadline.
    #[must_use]
    pub fn req_timeout(mut self, timeout: Duration) -> Self {
        self.config.req_timeout = timeout;
        self
    }

    /// Sets the default write quorum used by convenience constructors.
    #[must_use]
    pub fn default_w(mut self, w: u32) -> Self {
        self.config.default_w = Some(w);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> ReplicatorResult<ReplicatorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ReplicatorConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let result = ReplicatorConfig::builder()
            .req_timeout(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_round_trip() {
        let config = ReplicatorConfig::builder()
            .req_timeout(Duration::from_secs(2))
            .default_w(2)
            .build()
            .expect("valid config");

        assert_eq!(config.req_timeout, Duration::from_secs(2));
        assert_eq!(config.default_w, Some(2));
    }

    #[test]
    fn majority_of_is_plurality_plus_one() {
        assert_eq!(ReplicatorConfig::majority_of(3), 2);
        assert_eq!(ReplicatorConfig::majority_of(5), 3);
        assert_eq!(ReplicatorConfig::majority_of(1), 1);
    }
}
