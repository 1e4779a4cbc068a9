//! modqueue - moderation queue client
//!
//! This library provides the client core of a listing moderation queue:
//! filters encoded in the location, cached list and detail reads with
//! background refresh, selection and bulk decisions against the moderation
//! REST API.

pub mod api;
pub mod cache;
pub mod config;
pub mod filters;
pub mod models;
pub mod services;

#[cfg(test)]
mod testing;
