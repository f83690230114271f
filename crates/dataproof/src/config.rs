//! Cryptosuite configuration.

use std::time::Duration;

use dataproof_rdf::{CanonicalizationOptions, ContextOptions, DEFAULT_MAX_REMOTE_CONTEXTS};

/// Configuration for a cryptosuite instance.
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    /// Per-fetch timeout for remote contexts. `None` waits indefinitely.
    pub loader_timeout: Option<Duration>,
    /// Maximum number of distinct remote contexts one call may load.
    pub max_remote_contexts: usize,
    /// Blank node labeling algorithm, its hash and work limit.
    pub canonicalization: CanonicalizationOptions,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            loader_timeout: Some(Duration::from_secs(10)),
            max_remote_contexts: DEFAULT_MAX_REMOTE_CONTEXTS,
            canonicalization: CanonicalizationOptions::default(),
        }
    }
}

impl SuiteConfig {
    pub fn loader_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.loader_timeout = timeout;
        self
    }

    pub fn max_remote_contexts(mut self, max: usize) -> Self {
        self.max_remote_contexts = max;
        self
    }

    pub fn canonicalization(mut self, options: CanonicalizationOptions) -> Self {
        self.canonicalization = options;
        self
    }

    pub(crate) fn context_options(&self) -> ContextOptions {
        ContextOptions {
            loader_timeout: self.loader_timeout,
            max_remote_contexts: self.max_remote_contexts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataproof_rdf::CanonicalizationAlgorithm;

    #[test]
    fn test_defaults() {
        let config = SuiteConfig::default();
        assert_eq!(config.loader_timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.max_remote_contexts, DEFAULT_MAX_REMOTE_CONTEXTS);
        assert_eq!(config.canonicalization.algorithm, CanonicalizationAlgorithm::Rdfc10);
        assert_eq!(config.canonicalization.max_work_factor, 2);
    }

    #[test]
    fn test_context_options_follow_config() {
        let config = SuiteConfig::default()
            .loader_timeout(None)
            .max_remote_contexts(3);
        let options = config.context_options();
        assert_eq!(options.loader_timeout, None);
        assert_eq!(options.max_remote_contexts, 3);
    }
}
