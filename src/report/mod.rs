//! Reporting
//!
//! Factors settings shared by every host into a common layer and renders
//! tuning runs as text, JSON or Hiera data files.

mod common;
mod output;

pub use common::*;
pub use output::*;
