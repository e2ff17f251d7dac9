use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use app::{AppDirs, Application};
use color_eyre::{Result, config::PanicHook};
use tracing::error;

use crate::config::Scribe;

static INIT: OnceLock<()> = OnceLock::new();

/// Install the color-eyre report hook and a panic hook. On panic the hook
/// restores the terminal and writes the plain-text report to a crash file
/// in the logs directory of `dirs`, then exits. Idempotent.
pub fn init(dirs: &AppDirs) -> Result<()> {
    if INIT.get().is_some() {
        return Ok(());
    }

    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
    let crash_file = crash_report_path(dirs, &timestamp);

    // try_into_hooks fails instead of panicking when a theme is already set
    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default()
        .panic_section(panic_section(&crash_file))
        .capture_span_trace_by_default(false)
        .display_location_section(false)
        .display_env_section(false)
        .try_into_hooks()?;
    eyre_hook.install()?;
    install_panic_hook(panic_hook, crash_file);

    let _ = INIT.set(());
    Ok(())
}

/// `<data>/logs/scribe.crash-<timestamp>.log`, next to the session log.
fn crash_report_path(dirs: &AppDirs, timestamp: &str) -> PathBuf {
    dirs.log_file(Scribe::APP_ID, &format!("crash-{timestamp}"))
}

fn panic_section(crash_file: &Path) -> String {
    format!(
        "This is a bug. The crash report is saved to {}",
        crash_file.display()
    )
}

fn write_report(path: &Path, report: &str) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, report)
}

fn install_panic_hook(panic_hook: PanicHook, crash_file: PathBuf) {
    std::panic::set_hook(Box::new(move |panic_info| {
        if let Err(err) = crate::tui::restore() {
            error!("Unable to restore terminal: {err:?}");
        }

        let report = panic_hook.panic_report(panic_info).to_string();
        let plain = strip_ansi_escapes::strip_str(&report);
        error!("Error: {plain}");
        let saved = match write_report(&crash_file, &plain) {
            Ok(()) => Some(crash_file.as_path()),
            Err(err) => {
                error!(path = %crash_file.display(), "Unable to write crash report: {err}");
                None
            }
        };

        #[cfg(not(debug_assertions))]
        {
            let metadata = human_panic::metadata!();
            if human_panic::print_msg(saved, &metadata).is_err() {
                eprintln!("human-panic: printing error message to console failed");
            }
            eprintln!("{report}");
        }

        #[cfg(debug_assertions)]
        {
            let _ = saved;
            better_panic::Settings::auto()
                .most_recent_first(false)
                .lineno_suffix(true)
                .verbosity(better_panic::Verbosity::Full)
                .create_panic_handler()(panic_info);
        }

        std::process::exit(libc::EXIT_FAILURE);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn crash_report_lives_next_to_the_session_log() {
        let dirs = AppDirs::from_parts(None, Some("/var/lib/scribe".into()), None);
        assert_eq!(
            crash_report_path(&dirs, "20261016-093000"),
            PathBuf::from("/var/lib/scribe/logs/scribe.crash-20261016-093000.log")
        );
    }

    #[test]
    fn panic_section_names_the_crash_file() {
        let section = panic_section(Path::new("/tmp/scribe.crash-1.log"));
        assert!(section.contains("/tmp/scribe.crash-1.log"));
    }

    #[test]
    fn report_is_written_into_a_missing_logs_dir() {
        let root = std::env::temp_dir().join(format!("scribe-crash-{}", std::process::id()));
        let dirs = AppDirs::from_parts(None, Some(root.clone()), None);
        let path = crash_report_path(&dirs, "test");

        write_report(&path, "The application panicked").unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "The application panicked"
        );
        std::fs::remove_dir_all(root).unwrap();
    }
}
