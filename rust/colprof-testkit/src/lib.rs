//! Test utilities for the colprof crates.
//!
//! This crate provides:
//! - Synthetic column value files with controllable value overlap
//! - Small helpers for writing and reading line-oriented fixtures

pub mod data_gen;
pub mod files;
