//! Port definitions for pulsebar backends.
//!
//! These contracts let the core sample counters without linking a concrete
//! statistics implementation; hosts may plug in their own.

pub mod traffic;
