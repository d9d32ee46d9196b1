//! Default locations and names
//!
//! Every value here can be overridden from the command line or the matching
//! `DIACHECK_*` environment variable.

/// CSV dataset read by `diacheck load`
pub const DEFAULT_CSV_PATH: &str = "./data/raw/diabetes_dataset.csv";

/// SQLite database written by `diacheck load`
pub const DEFAULT_DB_PATH: &str = "./database/health_indicators.db";

/// Destination table, replaced on every load
pub const DEFAULT_TABLE: &str = "diabetes_health_indicators";

/// XGBoost JSON model artifact
pub const DEFAULT_MODEL_PATH: &str = "model/models/xgboost_model_v01.json";

/// Rows read back after a load
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Port for `diacheck serve`
pub const DEFAULT_PORT: u16 = 8501;

/// Log filter used when `RUST_LOG` is unset
pub fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "diacheck=debug"
    } else {
        "diacheck=info"
    }
}
