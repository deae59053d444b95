//! sb-db: database access and persistence layer.
//!
//! This crate provides SQLite-backed storage with connection pooling,
//! embedded migrations, the image record model, its queries, and the
//! [`repository::ImageRepository`] seam the HTTP layer is built against.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
pub mod repository;
