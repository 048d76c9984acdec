//! Shared contracts for pulsebar: the configuration schema consumed by the
//! indicator modules and the port traits a host shell can implement to supply
//! its own backends.

pub mod config;
pub mod ports;
