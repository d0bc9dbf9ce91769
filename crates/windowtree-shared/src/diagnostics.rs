use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const DIAG_ENV: &str = "WINDOW_TREE_DIAG";

/// Read once from `WINDOW_TREE_DIAG` on first use.
fn diagnostics_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| {
        std::env::var(DIAG_ENV)
            .map(|v| is_truthy(&v))
            .unwrap_or(false)
    })
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Root directory for everything windowtree writes outside the session store.
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".windowtree"))
}

pub fn log_dir() -> Option<PathBuf> {
    static DIR: OnceLock<Option<PathBuf>> = OnceLock::new();
    DIR.get_or_init(|| data_dir().map(|dir| dir.join("logs")))
        .clone()
}

fn diagnostics_path() -> Option<PathBuf> {
    log_dir().map(|dir| dir.join("diagnostics.log"))
}

fn format_line(timestamp: OffsetDateTime, message: &str) -> String {
    let stamp = timestamp
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown-time".to_string());
    format!("[{}] {}\n", stamp, message)
}

/// Appends a timestamped line to the diagnostics log and mirrors it to
/// stderr. No-op unless diagnostics are enabled.
pub fn log(message: impl AsRef<str>) {
    if !diagnostics_enabled() {
        return;
    }

    let line = format_line(OffsetDateTime::now_utc(), message.as_ref());

    if let Some(path) = diagnostics_path() {
        if let Some(parent) = path.parent() {
            let _ = create_dir_all(parent);
        }
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&path) {
            let _ = file.write_all(line.as_bytes());
        }
    }

    eprintln!("[diag] {}", message.as_ref());
}
