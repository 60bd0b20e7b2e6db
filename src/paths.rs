use std::path::PathBuf;
use std::sync::OnceLock;

/// Directory layout for voicewatch.
///
/// On Linux this follows the XDG Base Directory Specification:
///   Config:  $XDG_CONFIG_HOME/voicewatch  (~/.config/voicewatch)
///   Data:    $XDG_DATA_HOME/voicewatch    (~/.local/share/voicewatch)
///
/// Patient history lives in memory only; the data directory just holds
/// rendered trend charts. The `dirs` crate handles platform detection and
/// the resolved base paths are cached in OnceLock cells.

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();
static CONFIG_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Root data directory: $XDG_DATA_HOME/voicewatch
pub fn data_dir() -> &'static PathBuf {
    DATA_DIR.get_or_init(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("voicewatch")
    })
}

/// Root config directory: $XDG_CONFIG_HOME/voicewatch
pub fn config_dir() -> &'static PathBuf {
    CONFIG_DIR.get_or_init(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("voicewatch")
    })
}

/// Config file path: <config_dir>/config.toml
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Reports directory: <data_dir>/reports
pub fn reports_dir() -> PathBuf {
    data_dir().join("reports")
}

/// Default trend chart location for a patient:
/// <data_dir>/reports/<patient>_trend.png
pub fn trend_chart_path(patient_id: &str) -> PathBuf {
    let safe: String = patient_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    reports_dir().join(format!("{safe}_trend.png"))
}
