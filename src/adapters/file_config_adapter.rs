//! INI file configuration adapter.

use crate::domain::error::QuantsimError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;
use tracing::debug;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, QuantsimError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading config");
        let mut config = Ini::new();
        config.load(path).map_err(|reason| QuantsimError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, QuantsimError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| QuantsimError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    /// A config with no sections; every lookup falls back to its default.
    pub fn empty() -> Self {
        Self { config: Ini::new() }
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[session]
initial_capital = 100000.0
store = json
state_path = /tmp/quantsim.json

[data]
dir = ./prices
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("session", "state_path"),
            Some("/tmp/quantsim.json".to_string())
        );
        assert_eq!(adapter.get_string("data", "dir"), Some("./prices".to_string()));
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[session]\nstore = json\n").unwrap();
        assert_eq!(adapter.get_string("session", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_value() {
        let adapter = FileConfigAdapter::from_string("[indicators]\nrsi_period = 7\n").unwrap();
        assert_eq!(adapter.get_int("indicators", "rsi_period", 14), 7);
    }

    #[test]
    fn get_int_returns_default_for_missing_or_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[data]\nseed = abc\n").unwrap();
        assert_eq!(adapter.get_int("data", "seed", 42), 42);
        assert_eq!(adapter.get_int("data", "missing", 7), 7);
    }

    #[test]
    fn get_double_returns_value() {
        let adapter =
            FileConfigAdapter::from_string("[session]\ninitial_capital = 100000.5\n").unwrap();
        assert_eq!(adapter.get_double("session", "initial_capital", 0.0), 100000.5);
    }

    #[test]
    fn get_double_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[indicators]\nbollinger_mult = wide\n").unwrap();
        assert_eq!(adapter.get_double("indicators", "bollinger_mult", 2.0), 2.0);
    }

    #[test]
    fn get_bool_values() {
        let adapter =
            FileConfigAdapter::from_string("[data]\na = true\nb = yes\nc = 0\nd = maybe\n")
                .unwrap();
        assert!(adapter.get_bool("data", "a", false));
        assert!(adapter.get_bool("data", "b", false));
        assert!(!adapter.get_bool("data", "c", true));
        assert!(adapter.get_bool("data", "d", true));
        assert!(!adapter.get_bool("data", "missing", false));
    }

    #[test]
    fn empty_adapter_returns_defaults() {
        let adapter = FileConfigAdapter::empty();
        assert_eq!(adapter.get_string("session", "store"), None);
        assert_eq!(adapter.get_int("indicators", "sma_period", 20), 20);
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[data]\nsynthetic = true\nseed = 9\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert!(adapter.get_bool("data", "synthetic", false));
        assert_eq!(adapter.get_int("data", "seed", 0), 9);
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(QuantsimError::ConfigParse { .. })));
    }
}
