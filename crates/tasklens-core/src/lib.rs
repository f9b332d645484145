//! Core data model for the tasklens analysis engine.
//!
//! Defines the canonical record shape produced by schema normalization, the
//! filter criteria applied to it, the column-mapping configuration, the
//! temporal feature derivations, and the shared error taxonomy.

pub mod error;
pub mod mapping;
pub mod models;
pub mod temporal;
