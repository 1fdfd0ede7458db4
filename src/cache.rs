//! Process-wide data cache.
//!
//! The source data is static for the life of the process, so the first
//! successful load is kept forever and shared read-only. Concurrent first
//! callers block on the same initialisation; only one of them runs the loader.

use crate::config::DashboardConfig;
use crate::error::Result;
use crate::loader::{self, LoadedData};
use once_cell::sync::OnceCell;

static DATA: OnceCell<LoadedData> = OnceCell::new();

/// Load the dashboard data once and hand out the cached copy afterwards.
///
/// A failed load is not cached; the next call tries again.
pub fn get_or_load(config: &DashboardConfig) -> Result<&'static LoadedData> {
    get_or_init_with(&DATA, || loader::load(config))
}

/// Cached data if a load has already succeeded.
pub fn cached() -> Option<&'static LoadedData> {
    DATA.get()
}

fn get_or_init_with<'a, F>(cell: &'a OnceCell<LoadedData>, load: F) -> Result<&'a LoadedData>
where
    F: FnOnce() -> Result<LoadedData>,
{
    if let Some(data) = cell.get() {
        log::debug!("Serving dashboard data from cache");
        return Ok(data);
    }
    cell.get_or_try_init(load)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const STD_CSV: &str = "FIPS,Geography,Year,Indicator,Cases,Rate per 100000\n6,California,2015,Gonorrhea,10,1.0\n";
    const SDH_CSV: &str = "FIPS,Geography,Year,Indicator,Numerator,Percent\n6,California,2015,Uninsured,5,2.0\n";

    #[test]
    fn loads_once_across_threads() {
        let cell: Arc<OnceCell<LoadedData>> = Arc::new(OnceCell::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cell = Arc::clone(&cell);
                let calls = Arc::clone(&calls);
                std::thread::spawn(move || {
                    let data = get_or_init_with(&cell, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        loader::load_from_readers(STD_CSV.as_bytes(), SDH_CSV.as_bytes())
                    })
                    .unwrap();
                    data.joined.len()
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_load_is_retried() {
        let cell = OnceCell::new();
        let err = get_or_init_with(&cell, || Err(DashboardError::config("boom")));
        assert!(err.is_err());
        assert!(cell.get().is_none());
        let ok = get_or_init_with(&cell, || {
            loader::load_from_readers(STD_CSV.as_bytes(), SDH_CSV.as_bytes())
        });
        assert!(ok.is_ok());
    }
}
