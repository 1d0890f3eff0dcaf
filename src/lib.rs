//! nutripick - context-aware dish recommendations.
//!
//! Ranks a catalog of dishes against live health context, a learned
//! per-tag preference model and optional network collaborators, then
//! explains the picks in layers.

pub mod app;
pub mod cache;
pub mod catalog;
pub mod cli;
pub mod collaborators;
pub mod config;
pub mod context;
pub mod error;
pub mod explain;
pub mod learning;
pub mod ranking;
pub mod scoring;
pub mod storage;
pub mod test_utils;

pub use error::{NpError, Result};
