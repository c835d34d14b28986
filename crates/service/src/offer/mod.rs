//! Offers and their lifecycle. An offer hangs between one leaf service
//! and one provider; administering either side is enough to manage it.

pub mod repo;
pub mod repository;
pub mod service;

pub use service::OfferService;
