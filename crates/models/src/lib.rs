pub mod db;
pub mod errors;
pub mod slug;

pub mod offer;
pub mod provider;
pub mod service;
pub mod user;
pub mod user_credentials;
