//! Common utilities module
//!
//! This module contains shared utilities used across the spectro pipeline.

pub mod error;
pub mod stats;

pub use error::{SpectroError, Result};
