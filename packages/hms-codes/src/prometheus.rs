use crate::config::PrometheusConfig;
use crate::error::{ConfigError, Error};
use crate::log::DEVELOPMENT;
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{debug, info};

// See https://prometheus.io/docs/practices/naming/
pub const CODES_ALLOCATED_TOTAL: &str = "hms_codes_allocated_total";
pub const CODE_COLLISIONS_TOTAL: &str = "hms_code_collisions_total";
pub const ALLOCATION_FAILURES_TOTAL: &str = "hms_code_allocation_failures_total";
pub const DUPLICATE_CODES_TOTAL: &str = "hms_duplicate_codes_total";
pub const BEDS_CREATED_TOTAL: &str = "hms_emergency_beds_created_total";

pub fn start(config: &PrometheusConfig) -> Result<(), Error> {
    let address = format!("{}:{}", config.host, config.port);
    let socket_address: SocketAddr = address.parse().map_err(|_| ConfigError::InvalidParameter {
        name: "prometheus.host".to_string(),
        value: address.to_owned(),
    })?;

    debug!(target: DEVELOPMENT, msg = "Starting Prometheus exporter", port = config.port);

    PrometheusBuilder::new()
        .with_http_listener(socket_address)
        .install()?;

    describe_counter!(CODES_ALLOCATED_TOTAL, "Number of codes handed out");
    describe_counter!(
        CODE_COLLISIONS_TOTAL,
        "Number of candidate codes that already existed at re-check"
    );
    describe_counter!(
        ALLOCATION_FAILURES_TOTAL,
        "Number of allocations that exhausted the retry budget"
    );
    describe_counter!(
        DUPLICATE_CODES_TOTAL,
        "Number of inserts rejected by the unique constraint"
    );
    describe_counter!(BEDS_CREATED_TOTAL, "Number of emergency beds created");

    // Prometheus endpoint is empty on startup and looks like an error
    // Explicitly set counts to zero
    counter!(CODES_ALLOCATED_TOTAL).absolute(0);
    counter!(CODE_COLLISIONS_TOTAL).absolute(0);
    counter!(ALLOCATION_FAILURES_TOTAL).absolute(0);
    counter!(DUPLICATE_CODES_TOTAL).absolute(0);
    counter!(BEDS_CREATED_TOTAL).absolute(0);

    info!(msg = "Prometheus exporter started", address);
    Ok(())
}
