#![cfg(test)]

pub mod discovery_tests;
pub mod lifecycle_tests;
pub mod resolution_tests;
