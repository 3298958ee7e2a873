//! Chemref Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling, logging and byte-level utilities for the chemref
//! workspace.
//!
//! - **Error Handling**: [`ChemrefError`] and the [`Result`] alias
//! - **Logging**: `tracing` subscriber setup driven by [`logging::LogConfig`]
//! - **Checksums**: integrity digests for cached dataset blobs
//! - **Decompression**: gzip detection and inflation for fetched payloads
//!
//! # Example
//!
//! ```no_run
//! use chemref_common::checksum::{sha256_hex, verify_sha256};
//!
//! fn check(blob: &[u8], expected: &str) -> chemref_common::Result<()> {
//!     verify_sha256(blob, expected)?;
//!     tracing::info!(digest = %sha256_hex(blob), "blob verified");
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod decompression;
pub mod error;
pub mod logging;

pub use error::{ChemrefError, Result};
