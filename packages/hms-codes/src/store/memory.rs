use super::{BedStore, CodeStore};
use crate::beds::{BedStatus, EmergencyBed, NewEmergencyBed};
use crate::code::CodeFormat;
use crate::error::Error;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

///
/// In-process bed store with the same uniqueness rules as the PostgreSQL table.
///
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    beds: Vec<EmergencyBed>,
    last_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    ///
    /// Store pre-populated with beds carrying the given codes, in order.
    /// Codes do not have to match any format.
    ///
    pub fn with_codes<'a, I>(codes: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut state = State::default();
        for code in codes {
            state.push(code, &NewEmergencyBed::default());
        }

        Self {
            state: Mutex::new(state),
        }
    }
}

impl State {
    fn push(&mut self, bed_no: &str, bed: &NewEmergencyBed) -> EmergencyBed {
        self.last_id += 1;

        let inserted = EmergencyBed {
            id: self.last_id,
            bed_no: bed_no.to_owned(),
            ward: bed.ward.clone(),
            status: bed.status,
            notes: bed.notes.clone(),
            created_at: Utc::now(),
        };

        self.beds.push(inserted.clone());
        inserted
    }

    fn insert(&mut self, bed_no: &str, bed: &NewEmergencyBed) -> Result<EmergencyBed, Error> {
        if self.contains(bed_no) {
            return Err(Error::DuplicateCode {
                code: bed_no.to_owned(),
            });
        }

        Ok(self.push(bed_no, bed))
    }

    fn contains(&self, bed_no: &str) -> bool {
        self.beds.iter().any(|b| b.bed_no == bed_no)
    }

    fn max_suffix(&self, format: &CodeFormat) -> Option<u64> {
        format.max_suffix(self.beds.iter().map(|b| b.bed_no.as_str()))
    }
}

#[async_trait]
impl CodeStore for MemoryStore {
    async fn max_suffix(&self, format: &CodeFormat) -> Result<Option<u64>, Error> {
        Ok(self.state.lock().await.max_suffix(format))
    }

    async fn code_exists(&self, code: &str) -> Result<bool, Error> {
        Ok(self.state.lock().await.contains(code))
    }
}

#[async_trait]
impl BedStore for MemoryStore {
    async fn insert_bed(
        &self,
        bed_no: &str,
        bed: &NewEmergencyBed,
    ) -> Result<EmergencyBed, Error> {
        self.state.lock().await.insert(bed_no, bed)
    }

    async fn insert_bed_serialized(
        &self,
        format: &CodeFormat,
        bed: &NewEmergencyBed,
    ) -> Result<EmergencyBed, Error> {
        let mut state = self.state.lock().await;
        let bed_no = format.next_code(state.max_suffix(format))?;
        state.insert(&bed_no, bed)
    }

    async fn find_bed(&self, bed_no: &str) -> Result<Option<EmergencyBed>, Error> {
        let state = self.state.lock().await;
        Ok(state.beds.iter().find(|b| b.bed_no == bed_no).cloned())
    }

    async fn list_beds(&self) -> Result<Vec<EmergencyBed>, Error> {
        Ok(self.state.lock().await.beds.clone())
    }

    async fn retire_bed(&self, id: i64) -> Result<Option<EmergencyBed>, Error> {
        let mut state = self.state.lock().await;

        Ok(state.beds.iter_mut().find(|b| b.id == id).map(|bed| {
            bed.status = BedStatus::Retired;
            bed.clone()
        }))
    }
}
