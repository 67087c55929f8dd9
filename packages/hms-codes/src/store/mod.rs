mod memory;
mod postgres;

use crate::beds::{EmergencyBed, NewEmergencyBed};
use crate::code::CodeFormat;
use crate::error::Error;
use async_trait::async_trait;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Highest numeric suffix among existing codes with the format's prefix.
    /// Codes whose suffix is not purely numeric are ignored.
    async fn max_suffix(&self, format: &CodeFormat) -> Result<Option<u64>, Error>;

    async fn code_exists(&self, code: &str) -> Result<bool, Error>;
}

///
/// Storage for bed records.
///
/// Implementations enforce uniqueness of codes themselves. An insert with a code that
/// already exists fails with `Error::DuplicateCode`. That check is the authoritative
/// guarantee, the allocator's pre-check only makes collisions rare.
///
#[async_trait]
pub trait BedStore: CodeStore {
    /// Create the bed table and its unique constraint on `bed_no` if missing
    async fn ensure_schema(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Insert a bed with a code chosen by the caller
    async fn insert_bed(&self, bed_no: &str, bed: &NewEmergencyBed)
        -> Result<EmergencyBed, Error>;

    /// Compute the next code and insert the bed as one atomic step, serialised per prefix
    async fn insert_bed_serialized(
        &self,
        format: &CodeFormat,
        bed: &NewEmergencyBed,
    ) -> Result<EmergencyBed, Error>;

    async fn find_bed(&self, bed_no: &str) -> Result<Option<EmergencyBed>, Error>;

    async fn list_beds(&self) -> Result<Vec<EmergencyBed>, Error>;

    /// Mark a bed as retired. Returns `None` if no bed has this id.
    async fn retire_bed(&self, id: i64) -> Result<Option<EmergencyBed>, Error>;
}
