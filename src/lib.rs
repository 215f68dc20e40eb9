//! Ledger Service Library
//!
//! This library acts as the core of the Ledger Service, exporting the necessary modules
//! for the application binary and integration tests.
//!
//! # Modules
//!
//! * `api` - Contains the HTTP boundary (routes, envelopes, idempotency, middleware).
//! * `config` - Contains the environment configuration.
//! * `domain` - Contains the domain entities, error taxonomy and repository ports.
//! * `infrastructure` - Contains the concrete PostgreSQL repositories.
//! * `jobs` - Contains the background maintenance jobs.
//! * `use_cases` - Contains the application business logic and workflows.

pub mod api;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod jobs;
pub mod use_cases;
