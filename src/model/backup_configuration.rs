use crate::model::error::Error;
use crate::model::error::adapter::AdapterError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

pub const DEFAULT_STORAGE: &str = "local";

/// Open, adapter specific settings.
pub type Options = serde_json::Map<String, Value>;

/// Input of a single backup operation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BackupConfiguration {
    /// Generic (`database`, `filesystem`) or concrete engine token.
    #[serde(rename = "type")]
    pub backup_type: String,
    /// Label used to derive artifact names. Empty means auto generated.
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_storage")]
    pub storage: String,
    #[serde(default)]
    pub compression: Option<String>,
    /// Table globs for databases, path globs for filesystem backups.
    #[serde(default)]
    pub exclusions: Vec<String>,
    /// Directory receiving the raw artifact before upload.
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    #[serde(default)]
    pub options: Options,
}

fn default_storage() -> String {
    DEFAULT_STORAGE.to_string()
}

impl Default for BackupConfiguration {
    fn default() -> Self {
        Self {
            backup_type: String::new(),
            name: String::new(),
            storage: default_storage(),
            compression: None,
            exclusions: Vec::new(),
            output_path: None,
            options: Options::new(),
        }
    }
}

impl BackupConfiguration {
    pub fn new(backup_type: impl Into<String>) -> Self {
        Self {
            backup_type: backup_type.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_storage(mut self, storage: impl Into<String>) -> Self {
        self.storage = storage.into();
        self
    }

    pub fn with_compression(mut self, compression: impl Into<String>) -> Self {
        self.compression = Some(compression.into());
        self
    }

    pub fn with_exclusions<I, S>(mut self, exclusions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusions = exclusions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_output_path(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(output_path.into());
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn option_str(&self, key: &str) -> Option<&str> {
        option_str(&self.options, key)
    }

    /// Deserializes the whole option map into an adapter's typed view.
    pub fn options_as<T: DeserializeOwned>(&self) -> Result<T, Error> {
        options_as(&self.options)
    }
}

pub fn option_str<'a>(options: &'a Options, key: &str) -> Option<&'a str> {
    options
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

pub fn option_bool(options: &Options, key: &str) -> Option<bool> {
    options.get(key).and_then(Value::as_bool)
}

pub fn options_as<T: DeserializeOwned>(options: &Options) -> Result<T, Error> {
    let value = Value::Object(options.clone());
    Ok(serde_json::from_value(value).map_err(AdapterError::invalid_options)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_defaults() {
        let configuration: BackupConfiguration =
            serde_json::from_str(r#"{ "type": "filesystem", "name": "nightly" }"#).unwrap();

        assert_eq!(configuration.backup_type, "filesystem");
        assert_eq!(configuration.storage, DEFAULT_STORAGE);
        assert!(configuration.compression.is_none());
        assert!(configuration.exclusions.is_empty());
    }

    #[test]
    fn empty_string_options_read_as_absent() {
        let configuration = BackupConfiguration::new("mysql")
            .with_option("format", "")
            .with_option("single_transaction", true);

        assert_eq!(configuration.option_str("format"), None);
        assert_eq!(option_bool(&configuration.options, "single_transaction"), Some(true));
    }
}
