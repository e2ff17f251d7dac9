use std::path::PathBuf;
use std::time::Duration;

use app::{AppDirs, Application};
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment, File, FileFormat};
use form_engine::EngineSettings;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::Cmd;

lazy_static! {
    pub static ref PROJECT_NAME: String = env!("CARGO_CRATE_NAME").to_uppercase().to_string();
}

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

/// Application identity used for directories and environment variables.
pub struct Scribe;

impl Application for Scribe {
    const APP_ID: &'static str = "scribe";

    fn env_prefix() -> String {
        PROJECT_NAME.clone()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

impl ServiceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Effective configuration.
///
/// Layers, lowest first: built-in defaults, `config.json5` / `config.toml`
/// in the config directory, `SCRIBE_*` environment variables (nested keys
/// separated by `__`, e.g. `SCRIBE_ENGINE__AUTOSAVE_DEBOUNCE_MS=500`),
/// then command line flags via [`Config::apply_overrides`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineSettings,
    pub service: ServiceConfig,
    pub tick_rate: f64,
    pub frame_rate: f64,
    pub log_filter: Option<String>,
    pub data_dir: PathBuf,
    pub config_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineSettings::default(),
            service: ServiceConfig::default(),
            tick_rate: 4.0,
            frame_rate: 30.0,
            log_filter: None,
            data_dir: PathBuf::new(),
            config_dir: PathBuf::new(),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(&AppDirs::resolve::<Scribe>())
    }

    pub fn load(dirs: &AppDirs) -> Result<Self, ConfigError> {
        let env = Environment::with_prefix(&PROJECT_NAME)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true);
        Self::layered(dirs)?.add_source(env).build()?.try_deserialize()
    }

    fn layered(dirs: &AppDirs) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("data_dir", dirs.data_dir().to_string_lossy().into_owned())?
            .set_default("config_dir", dirs.config_dir().to_string_lossy().into_owned())?;

        let config_files = [
            ("config.json5", FileFormat::Json5),
            ("config.toml", FileFormat::Toml),
        ];
        let mut found_config = false;
        for (file, format) in &config_files {
            let path = dirs.config_dir().join(file);
            found_config |= path.exists();
            builder = builder.add_source(File::from(path).format(*format).required(false));
        }
        if !found_config {
            debug!(dir = ?dirs.config_dir(), "no configuration file found, using defaults");
        }
        Ok(builder)
    }

    /// Apply command line flags on top of the loaded layers.
    pub fn apply_overrides(&mut self, cmd: &Cmd) {
        if let Cmd::Run {
            base_url,
            debounce_ms,
            no_autosave,
            ..
        } = cmd
        {
            if let Some(url) = base_url {
                self.service.base_url = url.clone();
            }
            if let Some(ms) = debounce_ms {
                self.engine.autosave_debounce_ms = *ms;
            }
            if *no_autosave {
                self.engine.autosave_enabled = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scratch_dirs(name: &str) -> AppDirs {
        let root =
            std::env::temp_dir().join(format!("scribe-config-{name}-{}", std::process::id()));
        let dirs = AppDirs::from_parts(Some(root.join("config")), Some(root.join("data")), None);
        dirs.ensure().unwrap();
        dirs
    }

    fn load_files_only(dirs: &AppDirs) -> Config {
        Config::layered(dirs)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn defaults_without_files() {
        let dirs = scratch_dirs("defaults");
        let cfg = load_files_only(&dirs);
        assert_eq!(cfg.engine, EngineSettings::default());
        assert_eq!(cfg.service.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.config_dir, dirs.config_dir());
        assert_eq!(cfg.data_dir, dirs.data_dir());
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dirs = scratch_dirs("toml");
        std::fs::write(
            dirs.config_dir().join("config.toml"),
            concat!(
                "log_filter = \"form_engine=debug\"\n\n",
                "[engine]\nautosave_debounce_ms = 750\n\n",
                "[service]\nbase_url = \"http://localhost:8080\"\n",
            ),
        )
        .unwrap();

        let cfg = load_files_only(&dirs);
        assert_eq!(cfg.engine.autosave_debounce_ms, 750);
        assert!(cfg.engine.autosave_enabled);
        assert_eq!(cfg.service.base_url, "http://localhost:8080");
        assert_eq!(cfg.service.request_timeout_ms, 10_000);
        assert_eq!(cfg.log_filter.as_deref(), Some("form_engine=debug"));
    }

    #[test]
    fn command_line_flags_win() {
        let mut cfg = Config::default();
        cfg.apply_overrides(&Cmd::Run {
            offline: false,
            base_url: Some("http://127.0.0.1:9000".into()),
            debounce_ms: Some(100),
            no_autosave: true,
        });
        assert_eq!(cfg.service.base_url, "http://127.0.0.1:9000");
        assert_eq!(cfg.engine.autosave_debounce_ms, 100);
        assert!(!cfg.engine.autosave_enabled);
    }

    #[test]
    fn other_commands_leave_config_untouched() {
        let mut cfg = Config::default();
        cfg.apply_overrides(&Cmd::Config);
        assert_eq!(cfg, Config::default());
    }
}
