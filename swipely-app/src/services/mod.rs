pub mod auth_service;
pub mod deck;
pub mod feed_service;
pub mod match_service;
pub mod media;
pub mod profile_service;
pub mod session;
pub mod storage;
