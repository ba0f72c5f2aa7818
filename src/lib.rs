/// Basic application code
pub mod app;
/// REST clients for outside services
pub mod client;
/// Controllers for REST endpoints
pub mod controller;
/// Cryptography-related objects
pub mod crypto;
/// Domain objects
pub mod domain;
/// REST error mapping
pub mod error;
/// Scheduled background jobs
pub mod job;
/// Models
pub mod model;
/// Repositories
pub mod repo;
/// Application services
pub mod service;
/// Application settings
pub mod settings;
/// Application telemetry for tracing and logging
pub mod telemetry;
