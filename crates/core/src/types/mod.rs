//! Core types for the offer lookup tool.
//!
//! This module provides type-safe wrappers for the domain concepts that flow
//! between the gate, the warehouse and the presentation layer.

pub mod email;
pub mod identity;
pub mod offer;
pub mod vin;

pub use email::{Email, EmailError};
pub use identity::Identity;
pub use offer::{OfferRecord, parse_offer_list, without_primary};
pub use vin::{Vin, VinError};
