//! Application sync service: drives one run of page → map → upsert for a
//! single domain and reports a [`pds_core::SyncRunResult`].

pub mod service;

pub use service::{SyncService, MAX_PAGES};
