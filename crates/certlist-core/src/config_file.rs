use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub parsing: Option<ParsingSection>,
    pub store: Option<StoreSection>,
    pub display: Option<DisplaySection>,
}

/// Pattern and default overrides fed to the parsing config builder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsingSection {
    /// Two-letter state code attached to every record.
    pub state: Option<String>,
    pub county_pattern: Option<String>,
    pub party_pattern: Option<String>,
    pub header_pattern: Option<String>,
    pub footer_pattern: Option<String>,
    pub vacancy_pattern: Option<String>,
    /// Replaces the built-in committee office patterns.
    pub office_patterns: Option<Vec<String>>,
    /// Appended to the office patterns (built-in or replaced).
    pub extra_office_patterns: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSection {
    pub db_path: Option<String>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplaySection {
    pub color: Option<bool>,
    /// Default export format: "text", "json" or "csv".
    pub format: Option<String>,
}

/// Platform config directory path: `<config_dir>/certlist/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("certlist").join("config.toml"))
}

/// Platform data directory path for the default SQLite store.
pub fn default_db_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("certlist").join("certlist.db"))
}

/// Load config by cascading CWD `.certlist.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".certlist.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

fn pick<S, T: Clone>(
    overlay: Option<&S>,
    base: Option<&S>,
    field: impl Fn(&S) -> Option<T>,
) -> Option<T> {
    overlay.and_then(&field).or_else(|| base.and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (bp, op) = (base.parsing.as_ref(), overlay.parsing.as_ref());
    let (bs, os) = (base.store.as_ref(), overlay.store.as_ref());
    let (bd, od) = (base.display.as_ref(), overlay.display.as_ref());

    ConfigFile {
        parsing: Some(ParsingSection {
            state: pick(op, bp, |p| p.state.clone()),
            county_pattern: pick(op, bp, |p| p.county_pattern.clone()),
            party_pattern: pick(op, bp, |p| p.party_pattern.clone()),
            header_pattern: pick(op, bp, |p| p.header_pattern.clone()),
            footer_pattern: pick(op, bp, |p| p.footer_pattern.clone()),
            vacancy_pattern: pick(op, bp, |p| p.vacancy_pattern.clone()),
            office_patterns: pick(op, bp, |p| p.office_patterns.clone()),
            extra_office_patterns: pick(op, bp, |p| p.extra_office_patterns.clone()),
        }),
        store: Some(StoreSection {
            db_path: pick(os, bs, |s| s.db_path.clone()),
            page_size: pick(os, bs, |s| s.page_size),
        }),
        display: Some(DisplaySection {
            color: pick(od, bd, |d| d.color),
            format: pick(od, bd, |d| d.format.clone()),
        }),
    }
}

/// Save the current config to the platform config directory.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf, String> {
    let path = config_path().ok_or_else(|| "Could not determine config directory".to_string())?;
    save_config_to(config, &path)?;
    Ok(path)
}

/// Save a config to an explicit path, creating parent directories.
pub fn save_config_to(config: &ConfigFile, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let content =
        toml::to_string_pretty(config).map_err(|e| format!("Failed to serialize config: {}", e))?;
    std::fs::write(path, content).map_err(|e| format!("Failed to write config: {}", e))
}
