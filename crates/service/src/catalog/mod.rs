//! Service catalog: the hierarchy resolver and CRUD over the service
//! forest (domain, repository, service layering).
//!
//! Services form a forest. `show` output is always of the form:
//!
//! ```text
//! {
//!   // attributes
//!   parent: {}   // full chain, all the way up to the root
//!   children: [] // direct descendants only
//! }
//! ```
//!
//! The exception is `index`, which returns a flat array with `parentId`
//! references instead of nesting.

pub mod hierarchy;
pub mod repo;
pub mod repository;
pub mod service;

pub use service::CatalogService;
