use super::{BedStore, CodeStore};
use crate::beds::{EmergencyBed, NewEmergencyBed};
use crate::code::CodeFormat;
use crate::error::Error;
use crate::log::STORE;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, Row};
use tracing::{debug, info, warn};

/// Idempotent DDL for the bed table and its unique constraint
const CREATE_EMERGENCY_BEDS: &str = include_str!("./sql/create_emergency_beds.sql");

/// Highest numeric suffix. Non-numeric suffixes are filtered before the cast.
const SELECT_MAX_SUFFIX: &str = include_str!("./sql/select_max_suffix.sql");

const SELECT_CODE_EXISTS: &str = include_str!("./sql/select_code_exists.sql");
const INSERT_EMERGENCY_BED: &str = include_str!("./sql/insert_emergency_bed.sql");
const SELECT_EMERGENCY_BED: &str = include_str!("./sql/select_emergency_bed.sql");
const SELECT_EMERGENCY_BEDS: &str = include_str!("./sql/select_emergency_beds.sql");
const RETIRE_EMERGENCY_BED: &str = include_str!("./sql/retire_emergency_bed.sql");

/// Transaction-scoped advisory lock keyed on the code prefix
const LOCK_PREFIX: &str = include_str!("./sql/lock_prefix.sql");

///
/// PostgreSQL backed store for emergency beds.
///
/// The client is behind a mutex because a transaction needs exclusive access to it.
///
pub struct PgStore {
    client: Mutex<Client>,
}

impl PgStore {
    pub fn new(client: Client) -> Self {
        Self {
            client: Mutex::new(client),
        }
    }
}

#[async_trait]
impl CodeStore for PgStore {
    async fn max_suffix(&self, format: &CodeFormat) -> Result<Option<u64>, Error> {
        let client = self.client.lock().await;
        let row = client
            .query_one(SELECT_MAX_SUFFIX, &[&format.prefix(), &prefix_len(format)])
            .await?;

        max_suffix_from_row(&row)
    }

    async fn code_exists(&self, code: &str) -> Result<bool, Error> {
        let client = self.client.lock().await;
        let row = client.query_one(SELECT_CODE_EXISTS, &[&code]).await?;
        Ok(row.try_get("code_exists")?)
    }
}

#[async_trait]
impl BedStore for PgStore {
    async fn ensure_schema(&self) -> Result<(), Error> {
        let client = self.client.lock().await;
        client.batch_execute(CREATE_EMERGENCY_BEDS).await?;
        info!(target: STORE, msg = "Schema ready", table = "emergency_beds");
        Ok(())
    }

    async fn insert_bed(
        &self,
        bed_no: &str,
        bed: &NewEmergencyBed,
    ) -> Result<EmergencyBed, Error> {
        let client = self.client.lock().await;
        let row = client
            .query_one(
                INSERT_EMERGENCY_BED,
                &[&bed_no, &bed.ward, &bed.status.as_str(), &bed.notes],
            )
            .await
            .map_err(|err| insert_error(err, bed_no))?;

        bed_from_row(&row)
    }

    async fn insert_bed_serialized(
        &self,
        format: &CodeFormat,
        bed: &NewEmergencyBed,
    ) -> Result<EmergencyBed, Error> {
        let mut client = self.client.lock().await;
        let transaction = client.transaction().await?;

        transaction.execute(LOCK_PREFIX, &[&format.prefix()]).await?;
        debug!(target: STORE, msg = "Acquired prefix lock", prefix = format.prefix());

        let row = transaction
            .query_one(SELECT_MAX_SUFFIX, &[&format.prefix(), &prefix_len(format)])
            .await?;
        let bed_no = format.next_code(max_suffix_from_row(&row)?)?;

        let row = transaction
            .query_one(
                INSERT_EMERGENCY_BED,
                &[&bed_no, &bed.ward, &bed.status.as_str(), &bed.notes],
            )
            .await
            .map_err(|err| insert_error(err, &bed_no))?;
        let inserted = bed_from_row(&row)?;

        transaction.commit().await?;

        Ok(inserted)
    }

    async fn find_bed(&self, bed_no: &str) -> Result<Option<EmergencyBed>, Error> {
        let client = self.client.lock().await;
        let row = client.query_opt(SELECT_EMERGENCY_BED, &[&bed_no]).await?;
        row.as_ref().map(bed_from_row).transpose()
    }

    async fn list_beds(&self) -> Result<Vec<EmergencyBed>, Error> {
        let client = self.client.lock().await;
        let rows = client.query(SELECT_EMERGENCY_BEDS, &[]).await?;
        rows.iter().map(bed_from_row).collect()
    }

    async fn retire_bed(&self, id: i64) -> Result<Option<EmergencyBed>, Error> {
        let client = self.client.lock().await;
        let row = client.query_opt(RETIRE_EMERGENCY_BED, &[&id]).await?;
        row.as_ref().map(bed_from_row).transpose()
    }
}

/// Prefix length in characters, as the SQL string functions count it
fn prefix_len(format: &CodeFormat) -> i32 {
    format.prefix_len() as i32
}

fn max_suffix_from_row(row: &Row) -> Result<Option<u64>, Error> {
    let max: Option<i64> = row.try_get("max_suffix")?;
    Ok(max.and_then(|max| u64::try_from(max).ok()))
}

fn bed_from_row(row: &Row) -> Result<EmergencyBed, Error> {
    let status: String = row.try_get("status")?;

    Ok(EmergencyBed {
        id: row.try_get("id")?,
        bed_no: row.try_get("bed_no")?,
        ward: row.try_get("ward")?,
        status: status.parse()?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
    })
}

///
/// The unique constraint on `bed_no` is reported as `DuplicateCode`, everything else
/// stays a database error
///
fn insert_error(err: tokio_postgres::Error, bed_no: &str) -> Error {
    if err.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        warn!(target: STORE, msg = "Unique constraint rejected code", code = bed_no);
        Error::DuplicateCode {
            code: bed_no.to_owned(),
        }
    } else {
        err.into()
    }
}
