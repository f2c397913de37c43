use crate::config::Config;
use crate::error::ConfigError;

/// Validate a [`Config`], returning all detected violations.
pub fn validate(config: &Config) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.debugger.path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            field: "debugger.path".to_string(),
            message: "must not be empty".to_string(),
        });
    }

    // An empty sentinel would frame every byte as its own unit.
    if config.debugger.prompt.is_empty() {
        errors.push(ConfigError::Validation {
            field: "debugger.prompt".to_string(),
            message: "must not be empty".to_string(),
        });
    }

    if config.session.verbosity > 2 {
        errors.push(ConfigError::Validation {
            field: "session.verbosity".to_string(),
            message: format!("must be 0, 1 or 2, got {}", config.session.verbosity),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_default_config_passes() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn empty_debugger_path_rejected() {
        let mut cfg = Config::default();
        cfg.debugger.path = "  ".into();
        let errs = validate(&cfg).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert!(format!("{}", errs[0]).contains("debugger.path"));
    }

    #[test]
    fn empty_prompt_rejected() {
        let mut cfg = Config::default();
        cfg.debugger.prompt = String::new();
        let errs = validate(&cfg).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert!(format!("{}", errs[0]).contains("debugger.prompt"));
    }

    #[test]
    fn verbosity_three_rejected() {
        let mut cfg = Config::default();
        cfg.session.verbosity = 3;
        let errs = validate(&cfg).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert!(format!("{}", errs[0]).contains("got 3"));
    }

    #[test]
    fn verbosity_two_allowed() {
        let mut cfg = Config::default();
        cfg.session.verbosity = 2;
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn multiple_errors_returned() {
        let mut cfg = Config::default();
        cfg.debugger.path = String::new();
        cfg.debugger.prompt = String::new();
        cfg.session.verbosity = 9;
        assert_eq!(validate(&cfg).unwrap_err().len(), 3);
    }
}
