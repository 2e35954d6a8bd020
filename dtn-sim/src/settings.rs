use crate::error::ConfigError;
use std::collections::BTreeMap;
use std::path::Path;

/// Scenario settings: one `name = value` per line, `#` starts a comment.
///
/// Later assignments win, so a driver can layer command-line overrides on top
/// of the values read from the scenario file.
#[derive(Clone, Debug, Default)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&contents))
    }

    pub fn parse(contents: &str) -> Self {
        let mut values = BTreeMap::new();
        for line in contents.lines() {
            let line = match line.find('#') {
                Some(idx) => &line[..idx],
                None => line,
            };
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            values.insert(key.trim().to_string(), value.trim().to_string());
        }
        Self { values }
    }

    /// Sets or overrides a single value.
    pub fn set(&mut self, key: &str, value: impl ToString) {
        self.values.insert(key.to_string(), value.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }

    pub fn require_u32(&self, key: &str) -> Result<u32, ConfigError> {
        parse(key, self.require(key)?, "an unsigned integer")
    }

    pub fn require_u64(&self, key: &str) -> Result<u64, ConfigError> {
        parse(key, self.require(key)?, "an unsigned integer")
    }

    pub fn require_f64(&self, key: &str) -> Result<f64, ConfigError> {
        parse(key, self.require(key)?, "a number")
    }

    pub fn opt_u32(&self, key: &str) -> Result<Option<u32>, ConfigError> {
        self.get(key)
            .map(|v| parse(key, v, "an unsigned integer"))
            .transpose()
    }

    pub fn opt_u64(&self, key: &str) -> Result<Option<u64>, ConfigError> {
        self.get(key)
            .map(|v| parse(key, v, "an unsigned integer"))
            .transpose()
    }

    pub fn opt_f64(&self, key: &str) -> Result<Option<f64>, ConfigError> {
        self.get(key).map(|v| parse(key, v, "a number")).transpose()
    }

    pub fn opt_bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        self.get(key)
            .map(|v| parse(key, v, "true or false"))
            .transpose()
    }

    /// Parses a half-open address range written as `a,b`.
    pub fn require_range(&self, key: &str) -> Result<(u32, u32), ConfigError> {
        let raw = self.require(key)?;
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
            expected: "a half-open range `a,b`",
        };
        let (start, end) = raw.split_once(',').ok_or_else(invalid)?;
        let start = start.trim().parse().map_err(|_| invalid())?;
        let end = end.trim().parse().map_err(|_| invalid())?;
        Ok((start, end))
    }
}

fn parse<T: std::str::FromStr>(
    key: &str,
    value: &str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    })
}
