//! # Verdant Server Library
//!
//! Shared pieces of the server binary, split out so initialization logic
//! stays testable.

pub mod initialization;
