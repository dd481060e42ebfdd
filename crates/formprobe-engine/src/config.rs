//! Engine configuration
//!
//! Every field has a default, so a TOML file only needs the keys it changes.

use crate::error::EngineError;
use formprobe_policy::{CanonicalSuffix, DEFAULT_DATE_FORMAT, DEFAULT_SUFFIX};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Budget for each individual surface call
    pub interaction_timeout_ms: u64,
    /// Pause before retrying a blocked control
    pub settle_delay_ms: u64,
    /// Wait for the unsaved-changes prompt to close after dismissal
    pub interstitial_wait_ms: u64,
    /// Maximum filter keystrokes probed on an empty choice panel
    pub max_filter_attempts: usize,
    /// Letters probed first, in shuffled order
    pub preferred_letters: String,
    /// Consecutive infrastructure failures that abort the run
    pub max_consecutive_infra_failures: u32,
    /// Marker appended to mutated text
    pub suffix: String,
    /// `chrono` format for generated dates
    pub date_format: String,
    /// Seed for option choice and letter shuffling
    pub rng_seed: Option<u64>,
    /// Restrict report rows to these qids
    pub allow_list: Option<Vec<String>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interaction_timeout_ms: 2_000,
            settle_delay_ms: 300,
            interstitial_wait_ms: 500,
            max_filter_attempts: 8,
            preferred_letters: "aeirst".to_string(),
            max_consecutive_infra_failures: 3,
            suffix: DEFAULT_SUFFIX.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            rng_seed: None,
            allow_list: None,
        }
    }
}

impl EngineConfig {
    /// Create default config
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML
    ///
    /// # Errors
    /// Returns [`EngineError::Config`] on malformed TOML or unknown value types
    pub fn from_toml_str(content: &str) -> Result<Self, EngineError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns [`EngineError::Io`] if the file cannot be read, or
    /// [`EngineError::Config`] if it does not parse
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| EngineError::io_error(path, e))?;
        Self::from_toml_str(&content)
    }

    /// With interaction timeout
    #[inline]
    #[must_use]
    pub fn with_interaction_timeout(mut self, timeout: Duration) -> Self {
        self.interaction_timeout_ms = duration_ms(timeout);
        self
    }

    /// With settle delay
    #[inline]
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay_ms = duration_ms(delay);
        self
    }

    /// With maximum filter attempts
    #[inline]
    #[must_use]
    pub fn with_max_filter_attempts(mut self, attempts: usize) -> Self {
        self.max_filter_attempts = attempts;
        self
    }

    /// With preferred filter letters
    #[inline]
    #[must_use]
    pub fn with_preferred_letters(mut self, letters: impl Into<String>) -> Self {
        self.preferred_letters = letters.into();
        self
    }

    /// With infrastructure failure budget
    #[inline]
    #[must_use]
    pub fn with_max_consecutive_infra_failures(mut self, max: u32) -> Self {
        self.max_consecutive_infra_failures = max;
        self
    }

    /// With suffix marker
    #[inline]
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// With date format
    #[inline]
    #[must_use]
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// With RNG seed
    #[inline]
    #[must_use]
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// With report allow-list
    #[must_use]
    pub fn with_allow_list<I, S>(mut self, qids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_list = Some(qids.into_iter().map(Into::into).collect());
        self
    }

    /// Interaction timeout as a duration
    #[inline]
    #[must_use]
    pub fn interaction_timeout(&self) -> Duration {
        Duration::from_millis(self.interaction_timeout_ms)
    }

    /// Settle delay as a duration
    #[inline]
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Interstitial wait as a duration
    #[inline]
    #[must_use]
    pub fn interstitial_wait(&self) -> Duration {
        Duration::from_millis(self.interstitial_wait_ms)
    }

    /// Suffix marker
    #[must_use]
    pub fn canonical_suffix(&self) -> CanonicalSuffix {
        CanonicalSuffix::new(self.suffix.clone())
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
