//! Headless testing helpers.
//!
//! Use the [`Pilot`] to drive a [`View`](crate::template::View) by selector:
//! mount instances, fire events on matching nodes and read back markup.

pub mod pilot;

pub use pilot::Pilot;
