use crate::model::backup_configuration::DEFAULT_STORAGE;
use crate::model::config::{Config, ConfigTable};
use crate::model::error::Error;
use crate::model::error::system::SystemError;
use crate::platform::constants::CONFIG_PATH;
use std::fs;
use std::ops::Deref;
use std::path::Path;

const MAX_COMMAND_TIMEOUT: u64 = 86_400;

pub struct AppConfig {
    config: Config,
}

impl AppConfig {
    pub fn new() -> Result<Self, Error> {
        Self::load(CONFIG_PATH)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let toml_string = fs::read_to_string(path).map_err(SystemError::config_not_found)?;
        Self::parse(&toml_string)
    }

    pub fn parse(toml_string: &str) -> Result<Self, Error> {
        let config = toml::from_str::<ConfigTable>(toml_string)
            .map_err(SystemError::invalid_config)?
            .config;
        Self::validate(&config)?;
        Ok(Self { config })
    }

    fn validate(config: &Config) -> Result<(), Error> {
        let mut problems = Vec::new();
        if !(1..=MAX_COMMAND_TIMEOUT).contains(&config.command_timeout) {
            problems.push(format!(
                "command_timeout must be between 1 and {MAX_COMMAND_TIMEOUT} seconds"
            ));
        }
        if config.event_timeout == 0 {
            problems.push("event_timeout must be positive".to_string());
        }
        if config.default_wakeup_time <= 0 {
            problems.push("default_wakeup_time must be positive".to_string());
        }
        if !(1..=9).contains(&config.compression.gzip_level) {
            problems.push("gzip_level must be between 1 and 9".to_string());
        }
        if config.compression.zip_level > 9 {
            problems.push("zip_level must be between 0 and 9".to_string());
        }
        let storage_known = config.default_storage == DEFAULT_STORAGE
            || config
                .storages
                .iter()
                .any(|storage| storage.name() == config.default_storage);
        if !storage_known {
            problems.push(format!(
                "default_storage {} is not a configured storage",
                config.default_storage
            ));
        }
        if !problems.is_empty() {
            Err(SystemError::invalid_config(problems.join("; ")))?
        }
        Ok(())
    }
}

impl Deref for AppConfig {
    type Target = Config;

    fn deref(&self) -> &Self::Target {
        &self.config
    }
}
