//! Ofertas VIN Core - Domain library for the VIN offer lookup tool.
//!
//! This crate provides everything about offers that does not touch the network:
//! - validating VINs
//! - normalizing offer names into lookup keys
//! - the static offer knowledge base (descriptions and images)
//! - turning raw offer names into display-ready text
//! - reshaping a warehouse row into an [`OfferRecord`]
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no warehouse access. The `server` crate owns all of that.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for VINs, emails, identities and offer records
//! - [`text`] - Text normalization and HTML escaping
//! - [`catalog`] - Offer knowledge base with ordered substring fallback
//! - [`resolver`] - Display formatting for offers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod resolver;
pub mod text;
pub mod types;

pub use types::*;
