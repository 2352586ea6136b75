//! Core types, config, errors, and wire shapes for Sketchsolve.

pub mod config;
pub mod error;
pub mod protocol;

pub use error::{Result, SketchsolveError};
