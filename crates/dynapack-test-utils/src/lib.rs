//! Shared test utilities for the dynapack workspace.
//!
//! This crate provides test doubles for the loader's seams. It is a
//! dev-dependency only and never published.
//!
//! # Modules
//!
//! - [`transport`]: in-memory [`MockTransport`] with a fetch log and delays
//! - [`packages`]: [`TestPackages`] builder for on-disk package trees
//! - [`extension`]: extensions that record their initialization

pub mod extension;
pub mod packages;
pub mod transport;

pub use extension::{InitLog, RecordingExtension};
pub use packages::TestPackages;
pub use transport::MockTransport;
