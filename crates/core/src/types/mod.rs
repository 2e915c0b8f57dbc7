//! Core types for Parcelflow.
//!
//! This module provides the domain entities consumed by the client and
//! dashboard crates.

pub mod envelope;
pub mod parcel;
pub mod user;

pub use envelope::ApiEnvelope;
pub use parcel::{
    Address, Dimensions, Parcel, ParcelDetails, ParcelStatus, PaymentStatus, Recipient, SenderRef,
    Shipping, ShippingService, StatusEvent,
};
pub use user::{Role, User};
