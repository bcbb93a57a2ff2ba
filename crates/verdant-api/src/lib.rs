//! # Verdant API - Wire Boundary
//!
//! Uniform entity services over the resource layer. Every entity type gets
//! the same surface: get/create/update/delete handlers that translate the
//! canonical outcome back to its wire representation.

pub mod service;

pub use service::{status_for_outcome, EntityService, GetReply, Services, WriteReply};
