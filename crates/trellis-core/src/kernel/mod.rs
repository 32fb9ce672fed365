//! # Trellis Core Kernel
//!
//! Shared building blocks for the rest of `trellis-core`: the crate-wide
//! [`Error`](error::Error) type with its `Result` alias, and the constants
//! (runtime version, manifest name, entry symbol) the component system and
//! the command-line host agree on.
pub mod constants;
pub mod error;

pub use error::{Error, Result};
