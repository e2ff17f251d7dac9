use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod dirs;

pub use dirs::AppDirs;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("failed to prepare application directories: {0}")]
    Io(#[from] std::io::Error),

    #[error("log file path {0:?} has no parent directory or file name")]
    LogPath(PathBuf),

    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("a global tracing subscriber is already installed: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Application metadata trait.
///
/// Define your application's identity by implementing this trait.
pub trait Application: Sized + 'static {
    const APP_ID: &'static str;
    const QUALIFIER: &'static str = "com";
    const ORGANIZATION: &'static str = "chicken105";

    /// Prefix of the environment variables read for this application
    /// (`SCRIBE` for `scribe`).
    fn env_prefix() -> String {
        Self::APP_ID.to_uppercase()
    }
}

/// Application infrastructure context.
///
/// The log guard must be kept alive for the duration of the application
/// so buffered log lines are flushed.
pub struct AppContext {
    dirs: AppDirs,
    version: &'static str,
    log_file: PathBuf,
    _log_guard: tracing_appender::non_blocking::WorkerGuard,
}

impl AppContext {
    pub fn dirs(&self) -> &AppDirs {
        &self.dirs
    }

    pub fn version(&self) -> &'static str {
        self.version
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }
}

/// Builder performing the common initialization:
/// - resolves (or takes) the application directories and creates them
/// - installs the global tracing subscriber: non-blocking file layer,
///   optional stderr layer, `EnvFilter`, and the `tracing-error` layer
pub struct AppBuilder<A: Application> {
    version: &'static str,
    console: bool,
    filter: Option<String>,
    dirs: Option<AppDirs>,
    _marker: PhantomData<A>,
}

impl<A: Application> AppBuilder<A> {
    pub fn new(version: &'static str) -> Self {
        Self {
            version,
            console: true,
            filter: None,
            dirs: None,
            _marker: PhantomData,
        }
    }

    /// Also log to stderr. Turn this off for full-screen terminal UIs.
    pub fn console_logging(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    /// Filter directive (`RUST_LOG` syntax). Without one, `RUST_LOG` is
    /// consulted before falling back to the build's default level.
    pub fn log_filter(mut self, directive: Option<String>) -> Self {
        self.filter = directive;
        self
    }

    pub fn dirs(mut self, dirs: AppDirs) -> Self {
        self.dirs = Some(dirs);
        self
    }

    pub fn build(self) -> Result<AppContext, AppError> {
        let dirs = self.dirs.unwrap_or_else(AppDirs::resolve::<A>);
        dirs.ensure()?;

        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
        let log_file = dirs.log_file(A::APP_ID, &timestamp);
        let (log_dir, log_name) = match (log_file.parent(), log_file.file_name()) {
            (Some(dir), Some(name)) => (dir.to_path_buf(), name.to_os_string()),
            _ => return Err(AppError::LogPath(log_file.clone())),
        };

        let file_appender = tracing_appender::rolling::never(log_dir, log_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .with_writer(non_blocking);

        let console_layer = self
            .console
            .then(|| fmt::layer().with_target(false).with_writer(std::io::stderr));

        tracing_subscriber::registry()
            .with(build_filter(self.filter.as_deref())?)
            .with(file_layer)
            .with(console_layer)
            .with(ErrorLayer::default())
            .try_init()?;

        tracing::info!(
            app = A::APP_ID,
            version = self.version,
            log = ?log_file,
            "logging initialized"
        );

        Ok(AppContext {
            dirs,
            version: self.version,
            log_file,
            _log_guard: guard,
        })
    }
}

/// Level used when neither a directive nor `RUST_LOG` is given.
pub fn default_filter_directive() -> &'static str {
    if cfg!(debug_assertions) { "info" } else { "warn" }
}

/// Filter from an explicit directive, else `RUST_LOG`, else the default.
pub fn build_filter(directive: Option<&str>) -> Result<EnvFilter, AppError> {
    match directive {
        Some(directive) => Ok(EnvFilter::try_new(directive)?),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter_directive()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Demo;

    impl Application for Demo {
        const APP_ID: &'static str = "scribe";
    }

    #[test]
    fn env_prefix_is_upper_case_app_id() {
        assert_eq!(Demo::env_prefix(), "SCRIBE");
    }

    #[test]
    fn explicit_filter_is_parsed() {
        assert!(build_filter(Some("form_engine=debug,info")).is_ok());
        assert!(matches!(
            build_filter(Some("form_engine=loud")),
            Err(AppError::Filter(_))
        ));
    }
}
