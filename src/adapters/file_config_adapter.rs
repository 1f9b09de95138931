//! INI file configuration adapter.

use crate::domain::error::AllocError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AllocError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| AllocError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, AllocError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| AllocError::ConfigParse {
                file: "<string>".into(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[portfolio]
start_date = 2011-01-01
end_date = 2011-12-31
symbols = AAPL, GLD, GOOG, XOM
granularity_steps = 10
session_time = 16:00

[optimizer]
threads = 4
timeout_secs = 0

[data]
source = csv
path = ./data

[calendar]
holidays =
"#;

    #[test]
    fn reads_portfolio_section() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_string("portfolio", "start_date"),
            Some("2011-01-01".to_string())
        );
        assert_eq!(adapter.get_int("portfolio", "granularity_steps", 0), 10);
        assert_eq!(adapter.get_int("optimizer", "threads", 0), 4);
    }

    #[test]
    fn get_list_splits_and_trims() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_list("portfolio", "symbols"),
            vec!["AAPL", "GLD", "GOOG", "XOM"]
        );
        assert!(adapter.get_list("calendar", "holidays").is_empty());
        assert!(adapter.get_list("calendar", "missing").is_empty());
    }

    #[test]
    fn blank_value_reads_as_missing() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("calendar", "holidays"), None);
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[data]\nsource = csv\n").unwrap();
        assert_eq!(adapter.get_string("data", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_default_for_missing_or_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[optimizer]\nthreads = many\n").unwrap();
        assert_eq!(adapter.get_int("optimizer", "threads", 2), 2);
        assert_eq!(adapter.get_int("optimizer", "missing", 7), 7);
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[data]\npath = /srv/prices\n").unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("data", "path"),
            Some("/srv/prices".to_string())
        );
    }

    #[test]
    fn from_file_missing_is_config_parse_error() {
        let err = FileConfigAdapter::from_file("/nonexistent/path/config.ini").unwrap_err();
        assert!(
            matches!(err, AllocError::ConfigParse { file, .. } if file == "/nonexistent/path/config.ini")
        );
    }
}
