//! Infrastructure layer
//!
//! Concrete implementations of the domain's ports plus wire DTOs.

pub mod code_generator;
pub mod dto;
pub mod message_pusher;
pub mod repository;
