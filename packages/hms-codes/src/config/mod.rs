mod allocator;
mod app;
mod database;
mod log;

pub use allocator::{AllocationMode, AllocatorConfig};
pub use app::{AppConfig, DevelopmentConfig, PrometheusConfig};
pub use database::DatabaseConfig;
pub use log::{LogConfig, LogFormat, LogLevel, LogOutput};

pub const HMS_PREFIX: &str = "HMS";
pub const DEFAULT_CONFIG_FILE_PATH: &str = "hms-codes.toml";

pub const DEFAULT_CODE_PREFIX: &str = "ER-";
pub const DEFAULT_CODE_WIDTH: usize = 2;
pub const DEFAULT_RETRY_BUDGET: u32 = 3;
pub const DEFAULT_PROMETHEUS_PORT: u16 = 9930;
