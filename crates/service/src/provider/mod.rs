//! Providers and their lifecycle. A provider is plainly visible to
//! everyone; authorization only controls the projection (admin set,
//! draft offers) and the write paths.

pub mod repo;
pub mod repository;
pub mod service;

pub use service::ProviderService;
