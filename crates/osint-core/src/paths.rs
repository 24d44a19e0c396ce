use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const OSINT_DIR: &str = ".osint";
pub const CONFIG_FILE: &str = ".osint/config.yaml";
pub const AUDIT_DB: &str = ".osint/audit.redb";
pub const EXPORTS_DIR: &str = ".osint/exports";
pub const INVESTIGATIONS_DIR: &str = ".osint/investigations";

pub const WORKFLOWS_EXPORT: &str = "workflows.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Resolve a configured path: absolute paths are kept, relative ones are
/// taken from the project root.
pub fn resolve(root: &Path, configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        root.join(configured)
    }
}

pub fn investigation_file(dir: &Path, investigation_id: &str) -> PathBuf {
    dir.join(format!("{investigation_id}.json"))
}

pub fn workflows_export(export_dir: &Path) -> PathBuf {
    export_dir.join(WORKFLOWS_EXPORT)
}

pub fn campaign_file(export_dir: &Path, name: &str) -> PathBuf {
    export_dir.join(format!("campaign_{}.json", file_stem(name)))
}

/// Lowercase, filesystem-safe rendering of a free-form name.
pub fn file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "unnamed".to_string()
    } else {
        stem
    }
}
