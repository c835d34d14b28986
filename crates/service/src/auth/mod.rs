//! Account module: three-layer architecture (domain, repository, service).
//!
//! Registration, login with lockout, email verification and account
//! maintenance all live here, independent of the web framework.

pub mod domain;
pub mod errors;
pub mod repo;
pub mod repository;
pub mod service;

pub use service::AuthService;
