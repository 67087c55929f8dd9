mod model;

pub use model::{BedStatus, EmergencyBed, NewEmergencyBed};

use crate::allocator::Allocator;
use crate::config::{AllocationMode, AllocatorConfig};
use crate::error::Error;
use crate::log::BEDS;
use crate::prometheus::{ALLOCATION_FAILURES_TOTAL, BEDS_CREATED_TOTAL, DUPLICATE_CODES_TOTAL};
use crate::store::BedStore;
use metrics::counter;
use tracing::{debug, info, warn};

///
/// Creates and manages emergency beds, assigning each new bed the next `bed_no`.
///
pub struct EmergencyBeds<S: BedStore> {
    store: S,
    config: AllocatorConfig,
}

impl<S: BedStore> EmergencyBeds<S> {
    pub fn new(store: S, config: AllocatorConfig) -> Self {
        Self { store, config }
    }

    ///
    /// Ensure the bed table and its unique constraint exist
    ///
    pub async fn setup(&self) -> Result<(), Error> {
        self.store.ensure_schema().await
    }

    pub fn allocator(&self) -> Allocator<'_, S> {
        Allocator::new(&self.store, &self.config)
    }

    ///
    /// Bed number the next created bed would get, if nothing else is inserted first
    ///
    pub async fn next_bed_no(&self) -> Result<String, Error> {
        self.allocator().next_candidate().await
    }

    pub async fn create(&self, bed: NewEmergencyBed) -> Result<EmergencyBed, Error> {
        let created = match self.config.mode {
            AllocationMode::PreCheck => self.create_prechecked(&bed).await,
            AllocationMode::Serialized => self.create_serialized(&bed).await,
        }?;

        counter!(BEDS_CREATED_TOTAL).increment(1);
        info!(target: BEDS, msg = "Created emergency bed", id = created.id, bed_no = created.bed_no, mode = %self.config.mode);

        Ok(created)
    }

    ///
    /// Allocate with the re-check loop, then insert.
    ///
    /// A writer that inserts the same code between the re-check and the insert makes the
    /// unique constraint fire, which is reported as `DuplicateCode`.
    ///
    async fn create_prechecked(&self, bed: &NewEmergencyBed) -> Result<EmergencyBed, Error> {
        let bed_no = self.allocator().allocate().await?;

        self.store
            .insert_bed(&bed_no, bed)
            .await
            .inspect_err(|err| {
                if let Error::DuplicateCode { code } = err {
                    counter!(DUPLICATE_CODES_TOTAL).increment(1);
                    warn!(target: BEDS, msg = "Bed number taken between check and insert", code);
                }
            })
    }

    ///
    /// Allocate and insert in one step under the store's prefix lock.
    ///
    /// Writers that bypass the lock can still collide. Those collisions are retried
    /// within the retry budget.
    ///
    async fn create_serialized(&self, bed: &NewEmergencyBed) -> Result<EmergencyBed, Error> {
        let format = self.config.format();

        for attempt in 1..=self.config.retry_budget {
            match self.store.insert_bed_serialized(&format, bed).await {
                Ok(created) => return Ok(created),
                Err(Error::DuplicateCode { code }) => {
                    counter!(DUPLICATE_CODES_TOTAL).increment(1);
                    warn!(target: BEDS, msg = "Serialized insert collided", code, attempt);
                }
                Err(err) => return Err(err),
            }
        }

        counter!(ALLOCATION_FAILURES_TOTAL).increment(1);

        Err(Error::CouldNotAllocate {
            prefix: format.prefix().to_owned(),
            attempts: self.config.retry_budget,
        })
    }

    pub async fn get(&self, bed_no: &str) -> Result<EmergencyBed, Error> {
        self.store
            .find_bed(bed_no)
            .await?
            .ok_or_else(|| Error::NotFound {
                key: bed_no.to_owned(),
            })
    }

    pub async fn list(&self) -> Result<Vec<EmergencyBed>, Error> {
        self.store.list_beds().await
    }

    ///
    /// Retire a bed. The row is kept so its bed number is never handed out again.
    ///
    pub async fn delete(&self, id: i64) -> Result<EmergencyBed, Error> {
        let retired = self
            .store
            .retire_bed(id)
            .await?
            .ok_or_else(|| Error::NotFound { key: id.to_string() })?;

        debug!(target: BEDS, msg = "Retired emergency bed", id, bed_no = retired.bed_no);

        Ok(retired)
    }
}
