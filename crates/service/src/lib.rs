//! Business layer for the marketplace: Services (a permission-inheriting
//! forest), Providers, Offers and account workflows on top of `models`.
//! - Repository traits with in-memory mocks keep the core testable.
//! - Authorization and publication predicates are pure functions over
//!   already-resolved data; resolution is the only async phase.
//! - Provides clear error types and documented interfaces.

pub mod errors;
pub mod mail;
pub mod patch;
pub mod view;
pub mod viewer;

pub mod auth;
pub mod catalog;
pub mod offer;
pub mod provider;
