//! # Repository Module
//!
//! Database repository implementations for VentaPro.
//!
//! ## Available Repositories
//!
//! - [`MigrationRecordRepository`](migration::MigrationRecordRepository) - Schema migration history

pub mod migration;
