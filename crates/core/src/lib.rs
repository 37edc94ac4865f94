//! Domain logic shared across the storyreel workspace.
//!
//! This crate has no internal dependencies so that every other crate
//! (db, providers, pipeline, client, api) can use it freely.

pub mod error;
pub mod generation;
pub mod signing;
pub mod target;
pub mod types;
