//! Self-healing block ingestion.
//!
//! Four independently scheduled components share one block directory and a
//! Redis store:
//! - `poller`: stores every new tip and appends its height to the log
//! - `detector`: publishes the heights missing from the log
//! - `healer`: backfills the published heights
//! - `scan`: finds and backfills gaps straight from the directory listing
pub mod config;
pub mod coord;
pub mod detector;
pub mod error;
pub mod healer;
pub mod net;
pub mod poller;
pub mod scan;
pub mod store;
pub mod window;
