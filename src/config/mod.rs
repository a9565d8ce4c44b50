// Core configuration types
mod core;
mod loader;

pub use self::core::{
    DocumentsConfig, LayoutmapConfig, MigrationConfig, PlanningConfig, ScanConfig, VerifyConfig,
    DEFAULT_QUICK_WIN_HOURS, MAX_SCAN_DEPTH,
};
pub use loader::{
    directory_ancestors, load_config, load_config_from, parse_and_validate_config,
    CONFIG_FILE_NAME,
};
