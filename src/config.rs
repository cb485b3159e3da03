use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Configured bookings: `"dd/mm/yyyy" -> "hh:mm" -> [class names]`.
pub type DaysConfig = BTreeMap<String, BTreeMap<String, Vec<String>>>;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub credentials: Credentials,
    pub site: SiteConfig,
    pub webdriver: WebDriverConfig,
    pub network: NetworkConfig,
    pub timing: TimingConfig,
    #[serde(default)]
    pub days: DaysConfig,
}

#[derive(Deserialize, Clone)]
pub struct Credentials {
    /// Usually the e-mail address of the account.
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    pub login_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            login_url: "https://www.crossfitcostablanca.es/login.php".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebDriverConfig {
    /// Address of a running chromedriver/geckodriver.
    pub url: String,
    pub browser: String,
    pub headless: bool,
    pub maximize: bool,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9515".to_string(),
            browser: "chrome".to_string(),
            headless: true,
            maximize: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NetworkConfig {
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// Fixed pauses that give the site time to render.
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    pub page_load_wait_secs: u64,
    pub login_wait_secs: u64,
    pub close_wait_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            page_load_wait_secs: 2,
            login_wait_secs: 5,
            close_wait_secs: 1,
        }
    }
}

impl TimingConfig {
    /// No waiting at all, for tests against mock servers.
    pub fn immediate() -> Self {
        Self {
            page_load_wait_secs: 0,
            login_wait_secs: 0,
            close_wait_secs: 0,
        }
    }
}

impl AppConfig {
    /// Load from the default locations only.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, optionally adding an explicit file that must exist.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        // Credentials may live in a .env file as CCB__CREDENTIALS__*
        let _ = dotenvy::dotenv();

        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ccb-booker");

        let mut builder = Self::defaults()?
            // 2. Load from local config file (optional, lowest priority)
            .add_source(File::with_name("config").required(false))
            // 3. Load from user config directory (optional, overrides local)
            .add_source(File::from(config_dir.join("config")).required(false));

        // 4. Explicit file from the command line
        if let Some(path) = path {
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }

        Self::finish(builder)
    }

    /// Load defaults, then `files` in order, then `CCB__` environment
    /// variables. `.env`, `./config.*` and the user config directory are not
    /// consulted. Every file must exist.
    pub fn load_from_sources(files: &[&Path]) -> Result<Self> {
        let mut builder = Self::defaults()?;
        for path in files {
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }
        Self::finish(builder)
    }

    // 1. Default values
    fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        Ok(Config::builder()
            // Site
            .set_default("site.login_url", "https://www.crossfitcostablanca.es/login.php")?
            // WebDriver
            .set_default("webdriver.url", "http://localhost:9515")?
            .set_default("webdriver.browser", "chrome")?
            .set_default("webdriver.headless", true)?
            .set_default("webdriver.maximize", true)?
            // Network
            .set_default("network.request_timeout_secs", 30)?
            .set_default("network.connect_timeout_secs", 10)?
            // Timing
            .set_default("timing.page_load_wait_secs", 2)?
            .set_default("timing.login_wait_secs", 5)?
            .set_default("timing.close_wait_secs", 1)?)
    }

    // 5. Environment variables (CCB__CREDENTIALS__PASSWORD=...), highest priority
    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let s = builder
            .add_source(Environment::with_prefix("CCB").separator("__"))
            .build()?;
        Ok(s.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    // ==================== Default Value Tests ====================

    #[test]
    fn test_network_config_defaults() {
        let config = NetworkConfig::default();
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.connect_timeout_secs, 10);
    }

    #[test]
    fn test_webdriver_config_defaults() {
        let config = WebDriverConfig::default();
        assert_eq!(config.url, "http://localhost:9515");
        assert_eq!(config.browser, "chrome");
        assert!(config.headless);
        assert!(config.maximize);
    }

    #[test]
    fn test_timing_config_defaults() {
        let config = TimingConfig::default();
        assert_eq!(config.page_load_wait_secs, 2);
        assert_eq!(config.login_wait_secs, 5);
        assert_eq!(config.close_wait_secs, 1);
    }

    #[test]
    fn test_site_config_default_login_url() {
        let config = SiteConfig::default();
        assert!(config.login_url.ends_with("/login.php"));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let credentials = Credentials {
            username: "me@example.com".to_string(),
            password: "hunter2".to_string(),
        };
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("me@example.com"));
        assert!(!debug.contains("hunter2"));
    }

    // ==================== File Loading Tests ====================

    fn write_config(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("temp file");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn test_load_toml_file() {
        let file = write_config(
            ".toml",
            r#"
            [credentials]
            username = "athlete@example.com"
            password = "secret"

            [timing]
            login_wait_secs = 8

            [days."22/11/2020"]
            "11:00" = ["Open Box", "Crossfit"]
            "#,
        );

        let config = AppConfig::load_from_sources(&[file.path()]).expect("Config should load");

        assert_eq!(config.credentials.username, "athlete@example.com");
        assert_eq!(config.timing.login_wait_secs, 8);
        assert_eq!(config.timing.page_load_wait_secs, 2);
        assert_eq!(config.webdriver.browser, "chrome");
        assert_eq!(
            config.days["22/11/2020"]["11:00"],
            vec!["Open Box".to_string(), "Crossfit".to_string()]
        );
    }

    #[test]
    fn test_load_json_file() {
        let file = write_config(
            ".json",
            r#"{
                "credentials": {"username": "athlete@example.com", "password": "secret"},
                "days": {
                    "22/11/2020": {"15:00": ["Crossfit"]},
                    "23/11/2020": {"09:30": ["Halterofília"]}
                }
            }"#,
        );

        let config = AppConfig::load_from_sources(&[file.path()]).expect("Config should load");

        assert_eq!(config.days.len(), 2);
        assert_eq!(config.days["23/11/2020"]["09:30"], vec!["Halterofília".to_string()]);
    }

    #[test]
    fn test_load_without_days_yields_empty_map() {
        let file = write_config(
            ".toml",
            r#"
            [credentials]
            username = "athlete@example.com"
            password = "secret"
            "#,
        );

        let config = AppConfig::load_from_sources(&[file.path()]).expect("Config should load");
        assert!(config.days.is_empty());
    }

    #[test]
    fn test_later_file_overrides_earlier_file() {
        let base = write_config(
            ".toml",
            r#"
            [credentials]
            username = "athlete@example.com"
            password = "secret"

            [timing]
            login_wait_secs = 8
            page_load_wait_secs = 4
            "#,
        );
        let local = write_config(
            ".toml",
            r#"
            [timing]
            login_wait_secs = 1
            "#,
        );

        let config = AppConfig::load_from_sources(&[base.path(), local.path()])
            .expect("Config should load");

        assert_eq!(config.timing.login_wait_secs, 1);
        assert_eq!(config.timing.page_load_wait_secs, 4);
        assert_eq!(config.credentials.username, "athlete@example.com");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = AppConfig::load_from_sources(&[Path::new("/nonexistent/ccb-booker.toml")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_credentials_is_an_error() {
        let file = write_config(
            ".toml",
            r#"
            [days."22/11/2020"]
            "11:00" = ["Crossfit"]
            "#,
        );

        let result = AppConfig::load_from_sources(&[file.path()]);
        assert!(result.is_err(), "Credentials have no defaults");
    }

    // ==================== Environment Override Tests ====================

    /// Helper to set and remove an environment variable around a closure.
    fn with_env_var<F, R>(key: &str, value: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        // SAFETY: Test environment; no other test reads this key
        unsafe {
            std::env::set_var(key, value);
        }
        let result = f();
        unsafe {
            std::env::remove_var(key);
        }
        result
    }

    #[test]
    fn test_env_var_overrides_file_value() {
        let file = write_config(
            ".toml",
            r#"
            [credentials]
            username = "athlete@example.com"
            password = "secret"

            [timing]
            close_wait_secs = 3
            "#,
        );

        let config = with_env_var("CCB__TIMING__CLOSE_WAIT_SECS", "7", || {
            AppConfig::load_from_sources(&[file.path()]).expect("Config should load")
        });

        assert_eq!(
            config.timing.close_wait_secs, 7,
            "Environment variable should override timing.close_wait_secs"
        );
    }
}
