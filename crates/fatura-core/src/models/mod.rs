//! Data models: invoice records and customer configuration.

pub mod config;
pub mod invoice;
