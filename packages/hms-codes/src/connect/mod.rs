use crate::config::AppConfig;
use crate::error::Error;
use crate::log::DEVELOPMENT;
use crate::tls;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time;
use tokio_postgres::tls::TlsStream;
use tokio_postgres::{Client, Connection, NoTls, Socket};
use tracing::{debug, error, warn};

const MAX_RETRY_DELAY: Duration = Duration::from_secs(2);
const MAX_RETRY_COUNT: u32 = 3;

///
/// Connect to the database, bounded by the configured connection timeout
///
pub async fn database(config: &AppConfig) -> Result<Client, Error> {
    let database = &config.database;

    connect(config).await.inspect_err(|err| {
        error!(
            msg = "Could not connect to database",
            database = database.name,
            host = database.host,
            port = database.port,
            username = database.username,
            error = err.to_string(),
        );
        error!(msg = "Confirm that the database configuration is correct");
    })
}

async fn connect(config: &AppConfig) -> Result<Client, Error> {
    let database = &config.database;
    let pg_config = database.to_pg_config();
    let timeout = database.connection_timeout();

    if config.database_tls_disabled() {
        warn!(msg = "Database connection is not using Transport Layer Security (TLS)");

        let (client, connection) =
            time::timeout(timeout, pg_config.connect(NoTls)).await??;
        spawn_connection(connection);
        return Ok(client);
    }

    if !database.with_tls_verification {
        warn!(msg = "Bypassing Transport Layer Security (TLS) verification for database connections");
    }

    let tls_config = tls::configure_client(database);
    let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);

    let (client, connection) =
        time::timeout(timeout, pg_config.connect(tls)).await??;
    spawn_connection(connection);
    Ok(client)
}

///
/// Connect with capped exponential backoff
///
pub async fn database_with_retry(config: &AppConfig) -> Result<Client, Error> {
    let mut retry_count = 0;

    loop {
        debug!(target: DEVELOPMENT, msg = "Connecting to database", attempt = retry_count + 1);

        match database(config).await {
            Ok(client) => return Ok(client),
            Err(err) => {
                if retry_count >= MAX_RETRY_COUNT {
                    error!(msg = "Could not connect to database", retries = retry_count, error = err.to_string());
                    return Err(Error::DatabaseConnection {
                        retries: retry_count,
                    });
                }
            }
        }

        time::sleep(retry_delay(retry_count)).await;

        retry_count += 1;
    }
}

fn retry_delay(retry_count: u32) -> Duration {
    let delay_ms = (100 * 2_u64.pow(retry_count)).min(MAX_RETRY_DELAY.as_millis() as _);
    Duration::from_millis(delay_ms)
}

///
/// Drive the connection on its own task
///
fn spawn_connection<T>(connection: Connection<Socket, T>)
where
    T: AsyncRead + AsyncWrite + TlsStream + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(msg = "Connection error", error = err.to_string());
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_delay_is_capped() {
        assert_eq!(retry_delay(0), Duration::from_millis(100));
        assert_eq!(retry_delay(1), Duration::from_millis(200));
        assert_eq!(retry_delay(3), Duration::from_millis(800));
        assert_eq!(retry_delay(10), MAX_RETRY_DELAY);
    }
}
