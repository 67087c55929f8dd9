use clap::Parser;
use hms_codes::config::AppConfig;
use hms_codes::error::Error;
use hms_codes::response::Envelope;
use hms_codes::store::PgStore;
use hms_codes::{cli, connect, log, prometheus, Args, EmergencyBeds};
use serde::Serialize;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match AppConfig::load(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration Error: {}", err);
            std::process::exit(exitcode::CONFIG);
        }
    };

    if let Err(err) = config.validate() {
        eprintln!("Configuration Error: {}", err);
        std::process::exit(exitcode::CONFIG);
    }

    log::init(config.log.clone());

    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        warn!(msg = "Default crypto provider already installed");
    }

    if config.prometheus_enabled() {
        if let Err(err) = prometheus::start(&config.prometheus) {
            error!(msg = "Could not start Prometheus exporter", error = err.to_string());
            std::process::exit(exitcode::CONFIG);
        }
    }

    let client = match connect::database_with_retry(&config).await {
        Ok(client) => client,
        Err(err) => {
            print(&Envelope::error(&err));
            std::process::exit(exitcode::UNAVAILABLE);
        }
    };

    info!(
        msg = "Database connected",
        database = config.database.name,
        host = config.database.host,
        port = config.database.port,
    );

    let beds = EmergencyBeds::new(PgStore::new(client), config.allocator.clone());

    match cli::run(args.command, &beds).await {
        Ok(data) => print(&Envelope::ok(data)),
        Err(err) => {
            exit_with(err);
        }
    }
}

fn exit_with(err: Error) -> ! {
    if err.is_client_error() {
        warn!(msg = "Request rejected", error = err.to_string());
        print(&Envelope::error(&err));
        std::process::exit(exitcode::DATAERR);
    }

    error!(msg = "Request failed", error = err.to_string());
    print(&Envelope::error(&err));
    std::process::exit(exitcode::SOFTWARE);
}

fn print<T: Serialize>(envelope: &Envelope<T>) {
    match envelope.to_json() {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("Could not render response: {err}"),
    }
}
