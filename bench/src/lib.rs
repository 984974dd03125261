//! Benchmark utilities for the meme engine.
//!
//! - **flat_set**: linear vs. binary lookup in flat containers across
//!   search thresholds
//! - **storage**: keyed storage load/get/emplace and ECS refresh/iteration
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench -p meme_bench
//!
//! # Only the lookup group
//! cargo bench -p meme_bench -- lookup
//! ```
//!
//! Results are written to `target/criterion/` with HTML reports.

pub mod components;
pub mod data;
