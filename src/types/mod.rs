//! Shared type definitions
//!
//! This module contains the data types passed between the pipeline stages.

pub mod config;
pub mod research;
