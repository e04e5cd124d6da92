//! Core traits for the nic.ru DNS client
//!
//! - [`Transport`]: perform HTTP exchanges with the API
//!
//! The token persistence callback lives next to the token type in
//! [`crate::token::TokenUpdater`].

pub mod transport;

pub use transport::{ApiRequest, ApiResponse, Method, RequestBody, Transport};
