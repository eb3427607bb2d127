//! Pure domain logic for the event-grants platform.
//!
//! This crate has zero internal dependencies so it can be used by the
//! lookup services, the repository layer, and the API crate alike.
//! Anything that talks to the network or a cache lives elsewhere.

pub mod entity;
pub mod grant;
pub mod hashing;
pub mod pagination;
pub mod types;
