//! Core domain types and utilities for the Anaya Candles storefront.
//!
//! This crate provides the identifier types and the error-handling
//! foundation shared by the access layer and the web server.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, UserId};
