//! Raw frame model
//!
//! This module describes camera frames, how their pixels are laid out, and
//! which part of them is read for spectral extraction.

pub mod types;
mod layout;
mod roi;

pub use types::{Frame, FrameBuffer};
pub use layout::{FrameLayout, PixelEncoding};
pub use roi::{Roi, normalize_roi};
