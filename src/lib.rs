//! Client Profile Migrator Library
//!
//! This library migrates client (company) profiles from a legacy user export into
//! the hosted backend's `client_profiles` table. Each legacy record carries three
//! JSON documents (public, private and protected data) that are merged into a
//! single profile, attached to the matching account by email, and inserted once.
//!
//! # Modules
//!
//! - `config`: Configuration management and backend selection.
//! - `db_storage`: Profile storage over a direct Postgres connection, including pool setup.
//! - `errors`: Error handling types.
//! - `extraction`: Profile extraction from the legacy JSON documents.
//! - `migrator`: CSV-driven migration run and statistics.
//! - `models`: Legacy rows, profiles and run statistics.
//! - `rest_client`: Profile storage over the hosted REST API.
//! - `sink`: The storage abstraction shared by both backends.
//! - `transform`: Mapping of extracted profiles onto table rows.

pub mod config;
pub mod db_storage;
pub mod errors;
pub mod extraction;
pub mod migrator;
pub mod models;
pub mod rest_client;
pub mod sink;
pub mod transform;
