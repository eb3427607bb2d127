//! Client for the Fluxx grants-management API.
//!
//! [`client::FluxxClient`] owns OAuth2 token acquisition and
//! authenticated JSON POSTs; [`lookup::GrantIdLookup`] validates grant
//! IDs and retrieves agreement timestamps with per-ID caching.

pub mod client;
pub mod error;
pub mod lookup;

pub use client::{FluxxClient, FluxxConfig};
pub use error::{FluxxError, GrantLookupError};
pub use lookup::GrantIdLookup;
