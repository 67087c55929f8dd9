use crate::code::CodeFormat;
use crate::config::AllocatorConfig;
use crate::error::Error;
use crate::log::ALLOCATE;
use crate::prometheus::{ALLOCATION_FAILURES_TOTAL, CODES_ALLOCATED_TOTAL, CODE_COLLISIONS_TOTAL};
use crate::store::CodeStore;
use metrics::counter;
use tracing::{debug, warn};

///
/// Sequential code allocation with collision retry.
///
/// Reads the highest existing suffix, proposes the next code and re-checks that nobody
/// has taken it in the meantime. The re-check narrows the race with concurrent writers
/// but does not close it. The store's unique constraint finally rejects a duplicate.
///
pub struct Allocator<'s, S: CodeStore + ?Sized> {
    store: &'s S,
    format: CodeFormat,
    retry_budget: u32,
}

impl<'s, S: CodeStore + ?Sized> Allocator<'s, S> {
    pub fn new(store: &'s S, config: &AllocatorConfig) -> Self {
        Self {
            store,
            format: config.format(),
            retry_budget: config.retry_budget,
        }
    }

    ///
    /// Next code after the highest existing suffix.
    ///
    /// Nothing is reserved: calling this twice without persisting the first result
    /// returns the same code twice.
    ///
    pub async fn next_candidate(&self) -> Result<String, Error> {
        let max = self.store.max_suffix(&self.format).await?;
        let code = self.format.next_code(max)?;

        debug!(target: ALLOCATE, msg = "Candidate", code, max_suffix = ?max);

        Ok(code)
    }

    ///
    /// Candidate code that did not exist when it was re-checked.
    ///
    /// Regenerates on collision up to the retry budget, then fails with `CouldNotAllocate`.
    ///
    pub async fn allocate(&self) -> Result<String, Error> {
        for attempt in 1..=self.retry_budget {
            let code = self.next_candidate().await?;

            if !self.store.code_exists(&code).await? {
                debug!(target: ALLOCATE, msg = "Allocated code", code, attempt);
                counter!(CODES_ALLOCATED_TOTAL).increment(1);
                return Ok(code);
            }

            warn!(target: ALLOCATE, msg = "Code collision", code, attempt, retry_budget = self.retry_budget);
            counter!(CODE_COLLISIONS_TOTAL).increment(1);
        }

        counter!(ALLOCATION_FAILURES_TOTAL).increment(1);

        Err(Error::CouldNotAllocate {
            prefix: self.format.prefix().to_owned(),
            attempts: self.retry_budget,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn config() -> AllocatorConfig {
        AllocatorConfig::default()
    }

    ///
    /// Store whose max query lags behind: it reports a stale maximum while the
    /// candidate it leads to is already taken
    ///
    struct StaleStore {
        stale_max: Option<u64>,
        max_calls: AtomicU32,
        exists_calls: AtomicU32,
    }

    impl StaleStore {
        fn new(stale_max: Option<u64>) -> Self {
            Self {
                stale_max,
                max_calls: AtomicU32::new(0),
                exists_calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl CodeStore for StaleStore {
        async fn max_suffix(&self, _format: &CodeFormat) -> Result<Option<u64>, Error> {
            self.max_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.stale_max)
        }

        async fn code_exists(&self, _code: &str) -> Result<bool, Error> {
            self.exists_calls.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
    }

    ///
    /// Store that reports a collision for the first `collisions` re-checks, as if a
    /// concurrent writer kept winning the race
    ///
    struct RacingStore {
        inner: MemoryStore,
        collisions: AtomicU32,
    }

    #[async_trait]
    impl CodeStore for RacingStore {
        async fn max_suffix(&self, format: &CodeFormat) -> Result<Option<u64>, Error> {
            self.inner.max_suffix(format).await
        }

        async fn code_exists(&self, code: &str) -> Result<bool, Error> {
            let remaining = self.collisions.load(Ordering::SeqCst);
            if remaining > 0 {
                self.collisions.store(remaining - 1, Ordering::SeqCst);
                return Ok(true);
            }
            self.inner.code_exists(code).await
        }
    }

    #[tokio::test]
    async fn first_code_when_empty() {
        let store = MemoryStore::new();
        let allocator = Allocator::new(&store, &config());

        assert_eq!(allocator.allocate().await.unwrap(), "ER-01");
    }

    #[tokio::test]
    async fn next_after_highest_suffix() {
        let store = MemoryStore::with_codes(["ER-03", "ER-01", "ER-07"]);
        let allocator = Allocator::new(&store, &config());

        assert_eq!(allocator.allocate().await.unwrap(), "ER-08");
    }

    #[tokio::test]
    async fn gaps_are_not_reused() {
        let store = MemoryStore::with_codes(["ER-01", "ER-05"]);
        let allocator = Allocator::new(&store, &config());

        assert_eq!(allocator.allocate().await.unwrap(), "ER-06");
    }

    #[tokio::test]
    async fn ten_after_one_to_nine() {
        let codes = (1..=9).map(|n| format!("ER-{n:02}")).collect::<Vec<_>>();
        let store = MemoryStore::with_codes(codes.iter().map(String::as_str));
        let allocator = Allocator::new(&store, &config());

        assert_eq!(allocator.allocate().await.unwrap(), "ER-10");
    }

    #[tokio::test]
    async fn width_grows_past_ninety_nine() {
        let store = MemoryStore::with_codes(["ER-98", "ER-99"]);
        let allocator = Allocator::new(&store, &config());

        assert_eq!(allocator.allocate().await.unwrap(), "ER-100");
    }

    #[tokio::test]
    async fn malformed_codes_do_not_abort_allocation() {
        let store = MemoryStore::with_codes(["ER-02", "ER-9z", "ER-", "ER--50", "ICU-77", "TEMP"]);
        let allocator = Allocator::new(&store, &config());

        assert_eq!(allocator.allocate().await.unwrap(), "ER-03");
    }

    #[tokio::test]
    async fn only_malformed_codes_starts_at_one() {
        let store = MemoryStore::with_codes(["ER-A", "ER-B"]);
        let allocator = Allocator::new(&store, &config());

        assert_eq!(allocator.allocate().await.unwrap(), "ER-01");
    }

    #[tokio::test]
    async fn candidate_is_not_reserved_without_persisting() {
        let store = MemoryStore::with_codes(["ER-04"]);
        let allocator = Allocator::new(&store, &config());

        let first = allocator.next_candidate().await.unwrap();
        let second = allocator.next_candidate().await.unwrap();

        assert_eq!(first, "ER-05");
        assert_eq!(first, second);

        let first = allocator.allocate().await.unwrap();
        let second = allocator.allocate().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn exhausting_the_budget_is_reported() {
        let store = StaleStore::new(Some(4));
        let allocator = Allocator::new(&store, &config());

        let err = allocator.allocate().await.unwrap_err();

        assert!(matches!(
            err,
            Error::CouldNotAllocate { ref prefix, attempts: 3 } if prefix == "ER-"
        ));
        assert_eq!(store.max_calls.load(Ordering::SeqCst), 3);
        assert_eq!(store.exists_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_budget_is_configurable() {
        let store = StaleStore::new(None);
        let config = AllocatorConfig {
            retry_budget: 5,
            ..config()
        };
        let allocator = Allocator::new(&store, &config);

        let err = allocator.allocate().await.unwrap_err();

        assert!(matches!(err, Error::CouldNotAllocate { attempts: 5, .. }));
        assert_eq!(store.exists_calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn recovers_when_collision_clears_within_budget() {
        let store = RacingStore {
            inner: MemoryStore::with_codes(["ER-01"]),
            collisions: AtomicU32::new(2),
        };
        let allocator = Allocator::new(&store, &config());

        assert_eq!(allocator.allocate().await.unwrap(), "ER-02");
    }

    #[tokio::test]
    async fn custom_prefix_and_width() {
        let store = MemoryStore::with_codes(["ER-40", "OT-001", "OT-009"]);
        let config = AllocatorConfig {
            prefix: "OT-".to_string(),
            width: 3,
            ..config()
        };
        let allocator = Allocator::new(&store, &config);

        assert_eq!(allocator.allocate().await.unwrap(), "OT-010");
    }
}
