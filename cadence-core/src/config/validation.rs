use crate::config::schema::Config;
use crate::error::{Error, Result};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

pub fn validate_config(config: &Config) -> Result<()> {
    if config.workflows.path.trim().is_empty() {
        return Err(Error::Config(
            "workflows.path must not be empty".to_owned(),
        ));
    }

    // Plain levels only; richer filters belong in RUST_LOG.
    let level = config.logging.level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(Error::Config(format!(
            "logging.level '{}' is not one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        )));
    }

    if config.actions.timeout_seconds == 0 {
        return Err(Error::Config(
            "actions.timeout_seconds must be greater than zero".to_owned(),
        ));
    }

    for (index, dir) in config.actions.safe_directories.iter().enumerate() {
        if dir.trim().is_empty() {
            return Err(Error::Config(format!(
                "actions.safe_directories[{index}] must not be empty"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate_config;
    use crate::config::schema::Config;

    #[test]
    fn accepts_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = Config::default();
        config.logging.level = "chatty".to_owned();

        let error = validate_config(&config).expect_err("validation should fail");
        assert!(error.to_string().contains("logging.level 'chatty'"));
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut config = Config::default();
        config.actions.timeout_seconds = 0;

        let error = validate_config(&config).expect_err("validation should fail");
        assert!(error.to_string().contains("timeout_seconds"));
    }

    #[test]
    fn rejects_blank_safe_directory() {
        let mut config = Config::default();
        config.actions.safe_directories.push("  ".to_owned());

        let error = validate_config(&config).expect_err("validation should fail");
        assert!(error.to_string().contains("safe_directories[3]"));
    }
}
