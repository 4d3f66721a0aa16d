//! InMemory Repository 実装

pub mod hub;

pub use hub::InMemoryHubRepository;
