//! Command implementations for the GeoGrid CLI

pub mod config;
pub mod draw;
