//! Test module for schema-bridge
//!
//! Unit tests for each pipeline stage plus property-based tests using
//! proptest for the conversion invariants.

#[cfg(test)]
pub mod fixtures;


#[cfg(test)]
pub mod enum_tests;

#[cfg(test)]
pub mod conversion_tests;

#[cfg(test)]
pub mod default_tests;

#[cfg(test)]
pub mod override_tests;
