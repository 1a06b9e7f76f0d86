use crate::utils::error::{FfiError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// How blocking native calls are moved off the async runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum CallStrategy {
    /// One long-lived worker thread; calls are serialized.
    #[default]
    Deferred,
    /// One blocking thread per call.
    Detached,
}

impl CallStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStrategy::Deferred => "deferred",
            CallStrategy::Detached => "detached",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub demo: DemoSection,
    pub library: LibrarySection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSection {
    pub sheep: u32,
    pub tick_ms: u64,
    pub sleep_ms: u64,
}

impl Default for DemoSection {
    fn default() -> Self {
        Self {
            sheep: 5,
            tick_ms: 1000,
            sleep_ms: 5500,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrarySection {
    /// Shared library to load. `None` uses the exports linked into this binary.
    pub path: Option<String>,
    pub strategy: CallStrategy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub verbose: bool,
    pub json: bool,
}

impl DemoConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(FfiError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${FFI_LIB_DIR})，未定義的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| FfiError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.demo.tick_ms)
    }

    /// Native sleep as the `c_int` the exported function takes.
    pub fn sleep_delay_ms(&self) -> Result<i32> {
        validation::validate_c_delay("demo.sleep_ms", self.demo.sleep_ms)
    }
}

impl Validate for DemoConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_positive_number("demo.sheep", self.demo.sheep.into(), 1)?;
        validation::validate_positive_number("demo.tick_ms", self.demo.tick_ms, 1)?;
        self.sleep_delay_ms()?;

        if let Some(path) = &self.library.path {
            validation::validate_path("library.path", path)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = DemoConfig::from_toml_str("").unwrap();

        assert_eq!(config.demo.sheep, 5);
        assert_eq!(config.tick(), Duration::from_secs(1));
        assert_eq!(config.sleep_delay_ms().unwrap(), 5500);
        assert!(config.library.path.is_none());
        assert_eq!(config.library.strategy, CallStrategy::Deferred);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[demo]
sheep = 3
tick_ms = 250
sleep_ms = 800

[library]
path = "./target/release/libasync_python_ffi.so"
strategy = "detached"

[logging]
verbose = true
json = true
"#;

        let config = DemoConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.demo.sheep, 3);
        assert_eq!(config.demo.tick_ms, 250);
        assert_eq!(config.sleep_delay_ms().unwrap(), 800);
        assert_eq!(
            config.library.path.as_deref(),
            Some("./target/release/libasync_python_ffi.so")
        );
        assert_eq!(config.library.strategy, CallStrategy::Detached);
        assert!(config.logging.verbose);
        assert!(config.logging.json);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("ASYNC_FFI_TEST_LIB_DIR", "/opt/ffi");

        let toml_content = r#"
[library]
path = "${ASYNC_FFI_TEST_LIB_DIR}/libasync_python_ffi.so"
"#;

        let config = DemoConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.library.path.as_deref(),
            Some("/opt/ffi/libasync_python_ffi.so")
        );

        std::env::remove_var("ASYNC_FFI_TEST_LIB_DIR");
    }

    #[test]
    fn test_unknown_env_var_is_left_verbatim() {
        let toml_content = r#"
[library]
path = "${ASYNC_FFI_SURELY_UNSET_VAR}/lib.so"
"#;

        let config = DemoConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.library.path.as_deref(),
            Some("${ASYNC_FFI_SURELY_UNSET_VAR}/lib.so")
        );
    }

    #[test]
    fn test_config_validation() {
        let mut config = DemoConfig::default();
        config.demo.sheep = 0;
        assert!(config.validate().is_err());

        let mut config = DemoConfig::default();
        config.demo.tick_ms = 0;
        assert!(config.validate().is_err());

        let mut config = DemoConfig::default();
        config.demo.sleep_ms = u64::from(u32::MAX);
        assert!(config.validate().is_err());

        let mut config = DemoConfig::default();
        config.library.path = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_strategy_is_a_config_error() {
        let err = DemoConfig::from_toml_str("[library]\nstrategy = \"forked\"\n").unwrap_err();
        assert!(matches!(err, FfiError::ConfigError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[demo]\nsheep = 2\n").unwrap();

        let config = DemoConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.demo.sheep, 2);
        assert_eq!(config.demo.tick_ms, 1000);
    }
}
