//! Console and file logging for the hostbind tools
//!
//! Library crates report diagnostics through `tracing`; this crate is the
//! user-facing layer used by the command line: colored console messages gated
//! by a verbosity level, a per-run log file, and a spinner for long operations.

use colored::Colorize;
use indicatif::ProgressBar;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

static LOG_FILE: Mutex<Option<PathBuf>> = Mutex::new(None);
static VERBOSITY: Mutex<u8> = Mutex::new(0);
static NO_STDOUT: Mutex<bool> = Mutex::new(false);
static CURRENT_SCOPE: Mutex<Option<String>> = Mutex::new(None);
static SPINNER: Mutex<Option<ProgressBar>> = Mutex::new(None);

const LOG_FILE_NAME: &str = "hostbind.log";

/// Get the current verbosity level
/// 0 = warn only, 1 = debug (-v), 2 = trace (-vv)
pub fn get_verbosity() -> u8 {
    VERBOSITY.lock().ok().map(|v| *v).unwrap_or(0)
}

/// Get whether console output is suppressed
pub fn get_no_stdout() -> bool {
    NO_STDOUT.lock().ok().map(|v| *v).unwrap_or(false)
}

fn set_no_stdout(disabled: bool) {
    if let Ok(mut v) = NO_STDOUT.lock() {
        *v = disabled;
    }
}

fn current_scope() -> Option<String> {
    CURRENT_SCOPE.lock().ok().and_then(|guard| guard.clone())
}

/// Set the scope tag (e.g. the host version being rebuilt)
pub fn set_current_scope(scope: Option<String>) {
    if let Ok(mut v) = CURRENT_SCOPE.lock() {
        *v = scope;
    }
}

/// Map the verbosity level to a `tracing` filter directive
pub fn verbosity_to_filter() -> String {
    match get_verbosity() {
        0 => "hostbind=warn".to_string(),
        1 => "hostbind=debug".to_string(),
        _ => "hostbind=trace".to_string(),
    }
}

/// Initialize the logger with a verbosity level, logging to the default config directory
pub fn init_with_verbosity(verbosity: u8, no_stdout: bool) -> Result<(), String> {
    let config_dir = get_config_dir()?;
    init_in_dir(&config_dir, verbosity, no_stdout)
}

/// Initialize the logger, writing the log file into `dir`
pub fn init_in_dir(dir: &Path, verbosity: u8, no_stdout: bool) -> Result<(), String> {
    if let Ok(mut v) = VERBOSITY.lock() {
        *v = verbosity;
    }
    set_no_stdout(no_stdout);

    fs::create_dir_all(dir).map_err(|e| format!("Failed to create log directory: {}", e))?;
    let log_file = dir.join(LOG_FILE_NAME);

    // Truncate log file on each run
    if log_file.exists() {
        let _ = fs::remove_file(&log_file);
    }

    let mut log_file_guard = LOG_FILE
        .lock()
        .map_err(|_| "Log file lock poisoned".to_string())?;
    *log_file_guard = Some(log_file);

    Ok(())
}

fn get_config_dir() -> Result<PathBuf, String> {
    #[cfg(not(target_os = "windows"))]
    let config_dir = dirs::home_dir()
        .ok_or("Could not determine home directory")?
        .join(".config")
        .join("hostbind");

    #[cfg(target_os = "windows")]
    let config_dir = dirs::config_dir()
        .ok_or("Could not determine config directory")?
        .join("hostbind");

    Ok(config_dir)
}

fn write_to_log(message: &str) {
    let Ok(log_file_guard) = LOG_FILE.lock() else {
        return;
    };
    let Some(ref log_path) = *log_file_guard else {
        return;
    };
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(log_path) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        match current_scope() {
            Some(scope) => {
                let _ = writeln!(file, "[{}] [{}] {}", timestamp, scope, message);
            }
            None => {
                let _ = writeln!(file, "[{}] {}", timestamp, message);
            }
        }
    }
}

fn console(line: &str) {
    if !get_no_stdout() {
        eprintln!("{}", line);
    }
}

/// Log a debug message (to console if verbose >= 1, always to file)
pub fn debug(message: &str) {
    write_to_log(&format!("DEBUG {}", message));
    if get_verbosity() >= 1 {
        console(&format!("{} {}", "DEBUG:".blue().bold(), message));
    }
}

/// Log an error message (to file, and to the console even when quiet)
pub fn error(message: &str) {
    write_to_log(&format!("ERROR {}", message));
    eprintln!("{} {}", "Error:".red().bold(), message);
}

/// Log a success message
pub fn success(message: &str) {
    write_to_log(&format!("SUCCESS {}", message));
    let check = "\u{2714}".green().bold();
    console(&format!("{} {}", check, message));
}

/// Get the log file path for display
pub fn get_log_path() -> Option<PathBuf> {
    LOG_FILE.lock().ok().and_then(|guard| guard.clone())
}

/// Print the log file path to the user
pub fn show_log_path() {
    if let Some(path) = get_log_path() {
        eprintln!("Log file: {}", path.display());
    } else if let Ok(config_dir) = get_config_dir() {
        eprintln!("Log file: {}", config_dir.join(LOG_FILE_NAME).display());
    } else {
        eprintln!("Log file location not available");
    }
}

/// Start a spinner with the given message (only if not verbose)
pub fn spinner_start(message: &str) {
    if get_verbosity() > 0 || get_no_stdout() {
        return;
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = indicatif::ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner:.cyan} {msg}")
    {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner.set_message(message.to_string());

    if let Ok(mut spinner_guard) = SPINNER.lock() {
        *spinner_guard = Some(spinner);
    }
}

fn spinner_clear() {
    if let Ok(mut spinner_guard) = SPINNER.lock() {
        if let Some(spinner) = spinner_guard.take() {
            spinner.finish_and_clear();
        }
    }
}

/// Stop the spinner without any message
pub fn spinner_stop() {
    spinner_clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_logging_with_scope() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        assert!(init_in_dir(dir.path(), 0, true).is_ok());

        assert!(get_no_stdout());

        set_current_scope(Some("2026".to_string()));
        success("cache rebuilt");
        set_current_scope(None);
        debug("unscoped");

        let contents = get_log_path()
            .and_then(|path| fs::read_to_string(path).ok())
            .unwrap_or_default();
        assert!(contents.contains("[2026] SUCCESS cache rebuilt"));
        assert!(contents.contains("] DEBUG unscoped"));
    }

    #[test]
    fn test_verbosity_filter() {
        if let Ok(mut v) = VERBOSITY.lock() {
            *v = 2;
        }
        assert_eq!(verbosity_to_filter(), "hostbind=trace");
        if let Ok(mut v) = VERBOSITY.lock() {
            *v = 0;
        }
        assert_eq!(verbosity_to_filter(), "hostbind=warn");
    }
}
