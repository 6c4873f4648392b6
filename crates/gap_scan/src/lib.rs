//! Gap detection over sequences of block heights.
//!
//! This crate exposes:
//! - Gap computation: `detect`, `missing_heights`, `sorted_distinct`
//! - Gap and report types: `Gap`, `GapReport`
//! - Missing Set documents: `missing_set::{encode, decode}`
//!
//! Inputs may arrive in any order and may repeat; every computation starts
//! by sorting and deduplicating.
pub mod gap;
pub mod missing_set;

pub use gap::{Gap, GapError, GapReport, detect, missing_heights, sorted_distinct};
pub use missing_set::MissingSetError;

/// Monotonic identifier of one block in the remote source's sequence.
pub type Height = u64;
