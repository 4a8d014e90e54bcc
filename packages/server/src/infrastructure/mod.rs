//! Infrastructure layer: the broker actor behind [`crate::domain::MessageBroker`]
//! and the DTOs the HTTP API serializes.

pub mod dto;
pub mod hub;
