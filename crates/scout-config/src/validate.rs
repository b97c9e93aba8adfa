use scout_core::AppError;

use crate::ScoutConfig;

/// Reject configurations the cycle cannot run with.
pub fn validate_config(config: &ScoutConfig) -> Result<(), AppError> {
    validate_cycle(config)?;
    validate_oracle(config)?;
    validate_trends(config);
    Ok(())
}

fn validate_cycle(config: &ScoutConfig) -> Result<(), AppError> {
    if config.cycle.max_candidates == 0 {
        return Err(AppError::InvalidConfig(
            "cycle.max_candidates must be at least 1".to_string(),
        ));
    }
    let gate = config.cycle.creation_gate;
    if !gate.is_finite() || !(0.0..=1.0).contains(&gate) {
        return Err(AppError::InvalidConfig(format!(
            "cycle.creation_gate must be within [0, 1] (got {gate})"
        )));
    }
    Ok(())
}

fn validate_oracle(config: &ScoutConfig) -> Result<(), AppError> {
    if config.oracle.model_list().is_empty() {
        return Err(AppError::InvalidConfig(
            "oracle.models must name at least one model".to_string(),
        ));
    }
    if config.oracle.api_key_env.trim().is_empty() {
        return Err(AppError::InvalidConfig(
            "oracle.api_key_env cannot be empty".to_string(),
        ));
    }
    if config.oracle.timeout_secs == 0 {
        return Err(AppError::InvalidConfig(
            "oracle.timeout_secs must be > 0 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_trends(config: &ScoutConfig) {
    let blank = config
        .trends
        .candidates
        .iter()
        .filter(|candidate| candidate.keyword.trim().is_empty())
        .count();
    if blank > 0 {
        tracing::warn!(blank, "trends.candidates contains entries without a keyword");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ScoutConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_fan_out_rejected() {
        let mut config = ScoutConfig::default();
        config.cycle.max_candidates = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("max_candidates"));
    }

    #[test]
    fn test_gate_out_of_range_rejected() {
        let mut config = ScoutConfig::default();
        config.cycle.creation_gate = 1.5;
        assert!(validate_config(&config).is_err());

        config.cycle.creation_gate = f64::NAN;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_gate_bounds_accepted() {
        let mut config = ScoutConfig::default();
        config.cycle.creation_gate = 0.0;
        assert!(validate_config(&config).is_ok());
        config.cycle.creation_gate = 1.0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_models_rejected() {
        let mut config = ScoutConfig::default();
        config.oracle.models = " , ".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("oracle.models"));
    }

    #[test]
    fn test_blank_key_env_rejected() {
        let mut config = ScoutConfig::default();
        config.oracle.api_key_env = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = ScoutConfig::default();
        config.oracle.timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }
}
