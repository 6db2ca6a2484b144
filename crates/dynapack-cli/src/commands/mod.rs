//! Command implementations for dynapack-cli

pub mod inspect;
pub mod load;
pub mod urls;

pub use inspect::run_inspect;
pub use load::run_load;
pub use urls::run_urls;
