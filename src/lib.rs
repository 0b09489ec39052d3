//! Collects NBA highlight videos from the YouTube search API, keeps one row per video in
//! SurrealDB, and serves the stored rows to the dashboard.

pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod ingest;
pub mod keywords;
pub mod logger;
pub mod model;
pub mod statistics;
pub mod time;
pub mod youtube;
