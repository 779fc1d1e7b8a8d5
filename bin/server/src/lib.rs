//! Anaya Candles storefront server.
//!
//! This crate wires the request gate from `anaya-candles-access` into an
//! Axum application along with password and federated login.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod pages;
