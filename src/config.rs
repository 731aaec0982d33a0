use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Carelog";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The implicit single user. No authentication or profile switching
/// exists; every record row belongs to this id.
pub const DEFAULT_USER_ID: &str = "default_user";
pub const DEFAULT_USER_NAME: &str = "Primary User";

/// Get the application data directory
/// ~/Carelog/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Carelog")
}

/// Path of the relational record store database
pub fn database_path() -> PathBuf {
    app_data_dir().join("medical_history.db")
}

/// Path of the legacy key-value store file
pub fn legacy_store_path() -> PathBuf {
    app_data_dir().join("legacy_profile.json")
}

/// Default tracing filter when RUST_LOG is not set
pub fn default_log_filter() -> &'static str {
    "carelog=info"
}
