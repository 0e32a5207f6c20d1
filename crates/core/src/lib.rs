//! `epicrm-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the records
//! manager (no storage, no transport, no crypto).

pub mod error;
pub mod id;
pub mod owned;

pub use error::{DomainError, DomainResult};
pub use id::UserId;
pub use owned::Owned;
