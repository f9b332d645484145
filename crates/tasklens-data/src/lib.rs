//! Data ingestion and analysis layer for tasklens.
//!
//! Responsible for normalizing heterogeneous uploaded time-tracking sources
//! into the canonical record shape, filtering the resulting dataset, and
//! computing aggregations, outlier bounds, idle gaps, efficiency scores and
//! pivot heatmaps for the presentation layer.

pub mod aggregator;
pub mod analysis;
pub mod efficiency;
pub mod export;
pub mod filter;
pub mod gaps;
pub mod heatmap;
pub mod ingest;
pub mod stats;

pub use tasklens_core as core;
