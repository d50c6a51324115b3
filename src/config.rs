use std::path::Path;

use serde::{Deserialize, Serialize};


/// Evaluation limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Maximum call depth. The base frame counts as one level and every
    /// active call, lambda or not, as one more
    pub max_call_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { max_call_depth: 128 }
    }
}

impl Config {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let source = std::fs::read(path)?;
        Ok(serde_json::from_slice(&source)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() -> anyhow::Result<()> {
        let config: Config = serde_json::from_str("{}")?;
        assert_eq!(config, Config::default());

        let config: Config = serde_json::from_str(r#"{"max_call_depth": 8}"#)?;
        assert_eq!(config.max_call_depth, 8);
        Ok(())
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<Config>(r#"{"max_depth": 8}"#).is_err());
    }
}
