pub mod allocator;
pub mod beds;
pub mod cli;
pub mod code;
pub mod config;
pub mod connect;
pub mod error;
pub mod log;
pub mod prometheus;
pub mod response;
pub mod store;
pub mod tls;

pub use crate::allocator::Allocator;
pub use crate::beds::{BedStatus, EmergencyBed, EmergencyBeds, NewEmergencyBed};
pub use crate::cli::Args;
pub use crate::code::CodeFormat;
pub use crate::config::{AllocationMode, AllocatorConfig, AppConfig, DatabaseConfig};
pub use crate::log::init;

#[cfg(test)]
pub mod test_helpers;
