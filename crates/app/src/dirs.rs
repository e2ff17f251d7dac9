use std::env;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::Application;

/// Config and data directories of one application.
///
/// Resolution order per directory: `<PREFIX>_CONFIG` / `<PREFIX>_DATA`
/// environment override, then the platform directory from
/// [`ProjectDirs`], then `./.config` / `./.data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl AppDirs {
    pub fn resolve<A: Application>() -> Self {
        let prefix = A::env_prefix();
        let config = env::var_os(format!("{prefix}_CONFIG")).map(PathBuf::from);
        let data = env::var_os(format!("{prefix}_DATA")).map(PathBuf::from);
        let project = ProjectDirs::from(A::QUALIFIER, A::ORGANIZATION, A::APP_ID);
        Self::from_parts(config, data, project.as_ref())
    }

    pub fn from_parts(
        config_override: Option<PathBuf>,
        data_override: Option<PathBuf>,
        project: Option<&ProjectDirs>,
    ) -> Self {
        let config_dir = config_override
            .or_else(|| project.map(|p| p.config_local_dir().to_path_buf()))
            .unwrap_or_else(|| PathBuf::from(".").join(".config"));
        let data_dir = data_override
            .or_else(|| project.map(|p| p.data_local_dir().to_path_buf()))
            .unwrap_or_else(|| PathBuf::from(".").join(".data"));
        Self {
            config_dir,
            data_dir,
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    /// `<data>/logs/<app_id>.<timestamp>.log`
    pub fn log_file(&self, app_id: &str, timestamp: &str) -> PathBuf {
        self.logs_dir().join(format!("{app_id}.{timestamp}.log"))
    }

    pub fn ensure(&self) -> std::io::Result<()> {
        for dir in [self.config_dir.clone(), self.data_dir.clone(), self.logs_dir()] {
            if !dir.exists() {
                std::fs::create_dir_all(&dir)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn overrides_win() {
        let dirs = AppDirs::from_parts(Some("/tmp/cfg".into()), Some("/tmp/data".into()), None);
        assert_eq!(dirs.config_dir(), Path::new("/tmp/cfg"));
        assert_eq!(dirs.data_dir(), Path::new("/tmp/data"));
        assert_eq!(dirs.logs_dir(), PathBuf::from("/tmp/data/logs"));
    }

    #[test]
    fn falls_back_to_local_dot_dirs() {
        let dirs = AppDirs::from_parts(None, None, None);
        assert_eq!(dirs.config_dir(), Path::new("./.config"));
        assert_eq!(dirs.data_dir(), Path::new("./.data"));
    }

    #[test]
    fn log_file_carries_app_and_timestamp() {
        let dirs = AppDirs::from_parts(None, Some("/var/lib/scribe".into()), None);
        assert_eq!(
            dirs.log_file("scribe", "20261015-120000"),
            PathBuf::from("/var/lib/scribe/logs/scribe.20261015-120000.log")
        );
    }
}
