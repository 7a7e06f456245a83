//! Liquid heights from experiment video.
//!
//! Every tank of a frame is segmented by colour, split into vertical slices and
//! measured. Rows of heights go to one raw table per marked video section, which
//! can then be smoothed into filtered tables.

pub mod batch;
pub mod config;
pub mod error;
pub mod filter;
pub mod height;
pub mod markers;
pub mod mask;
pub mod region;
pub mod row;
pub mod slice;
pub mod table;
pub mod tank;
pub mod video;
#[cfg(test)]
mod tests;

pub use error::{Error, Result};
