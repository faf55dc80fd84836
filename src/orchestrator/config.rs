//! Orchestrator configuration
//!
//! Execution limits shared by every job.

use crate::config::ExecutionConfig;
use crate::error::AppError;
use serde::Serialize;
use std::time::Duration;

/// Orchestrator configuration
#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorConfig {
    /// Upper bound for one job's provider work, credential fetch included
    pub provider_timeout_secs: u64,
    /// Maximum prompt length in characters (prompt plus context)
    pub max_prompt_length: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            provider_timeout_secs: 120,
            max_prompt_length: 10000, // 10KB
        }
    }
}

impl From<&ExecutionConfig> for OrchestratorConfig {
    fn from(execution: &ExecutionConfig) -> Self {
        Self {
            provider_timeout_secs: execution.provider_timeout_secs,
            max_prompt_length: execution.max_prompt_length,
        }
    }
}

impl OrchestratorConfig {
    /// Provider timeout as a `Duration`
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Reject limits that would make every job fail
    pub fn validate(&self) -> Result<(), AppError> {
        if self.provider_timeout_secs == 0 {
            return Err(AppError::Internal(anyhow::anyhow!(
                "provider_timeout_secs must be > 0"
            )));
        }
        if self.max_prompt_length == 0 {
            return Err(AppError::Internal(anyhow::anyhow!(
                "max_prompt_length must be > 0"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = OrchestratorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.provider_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_zero_limits_rejected() {
        let config = OrchestratorConfig {
            provider_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = OrchestratorConfig {
            max_prompt_length: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_execution_config() {
        let execution = ExecutionConfig {
            provider_timeout_secs: 30,
            max_prompt_length: 500,
        };
        let config = OrchestratorConfig::from(&execution);
        assert_eq!(config.provider_timeout_secs, 30);
        assert_eq!(config.max_prompt_length, 500);
    }
}
