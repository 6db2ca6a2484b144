//! Metadata and configuration for Dynapack.
//!
//! This crate holds the I/O-free data model shared by the loader and its
//! front ends: the package [`Descriptor`] and the [`LoaderConfig`] surface.

pub mod config;
pub mod descriptor;
pub mod error;

/// Placeholder substituted with the package id in a package-root template.
pub const ID_PLACEHOLDER: &str = "{0}";

pub use config::LoaderConfig;
pub use descriptor::Descriptor;
pub use error::{Error, Result};
