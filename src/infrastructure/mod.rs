//! Infrastructure layer: adapters for config, logging, storage, and the
//! goal runner.

pub mod config;
pub mod logging;
pub mod runners;
pub mod stores;
