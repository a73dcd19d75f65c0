//! Core data model types: normalized addresses and message records.

pub mod address;
pub mod record;
