use crate::error::{CounterError, CounterResult};
use crate::types::{Config, CounterConfig};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml_str(&contents)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        // serde_yaml reads an empty document as unit, not as an empty map
        let config: Config = if contents.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(contents)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.counter.validate()?;
        if self.joints.proximal.is_empty()
            || self.joints.joint.is_empty()
            || self.joints.distal.is_empty()
        {
            anyhow::bail!("joint names must not be empty");
        }
        Ok(())
    }
}

impl CounterConfig {
    /// Checks the rules a [`crate::exercise::RepCounter`] is built under.
    pub fn validate(&self) -> CounterResult<()> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(CounterError::InvalidSmoothingFactor(self.alpha));
        }
        let in_range = |v: f64| (0.0..=180.0).contains(&v);
        if !(in_range(self.th_down) && in_range(self.th_up) && self.th_down < self.th_up) {
            return Err(CounterError::InvalidThresholds {
                down: self.th_down,
                up: self.th_up,
            });
        }
        if !(0.0..=1.0).contains(&self.min_conf) {
            return Err(CounterError::InvalidConfidence(self.min_conf));
        }
        Ok(())
    }
}
