use std::path::PathBuf;

/// Outcome of the initial system backup run during preload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupResult {
    /// Whether every backup step completed.
    pub success: bool,
    /// Directory the backup was written to, if any.
    pub backup_path: Option<PathBuf>,
    /// Names of the files captured by the backup.
    pub backed_up: Vec<String>,
    /// Failure description when `success` is false.
    pub error_message: Option<String>,
}

/// Outcome of the one-time migration of legacy script locations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationResult {
    /// Whether any legacy location still had content to move.
    pub needed: bool,
    /// Whether the migration finished without errors.
    pub success: bool,
    /// File names moved into the current scripts directory.
    pub migrated: Vec<String>,
    /// Failure description when `success` is false.
    pub error_message: Option<String>,
}

/// Latest release information as reported by the version service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    /// Whether `version` is newer than the running build.
    pub update_available: bool,
    /// Latest published version.
    pub version: String,
    /// Location of the installer for `version`, if one was published.
    pub download_url: Option<String>,
}
