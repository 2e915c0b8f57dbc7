//! Parcelflow API client.
//!
//! # Architecture
//!
//! - Typed endpoint descriptors (queries = read, mutations = write), each
//!   tagged with the cache categories it provides or invalidates
//! - Process-wide [`cache::CacheStore`] with request coalescing, issue-order
//!   response application, and tag-based invalidation
//! - [`session::SessionStore`] holding the authenticated identity and tokens,
//!   persisted across restarts and consulted for every bearer header
//! - Pluggable [`transport::Transport`] so tests run against a scripted fake
//!   instead of the network
//!
//! # Example
//!
//! ```rust,ignore
//! use parcelflow_client::{ApiClient, ClientConfig};
//! use parcelflow_client::api::parcels::ParcelListFilter;
//!
//! let client = ApiClient::from_config(&ClientConfig::from_env()?);
//! client.login("jane@example.com", "hunter22!").await?;
//!
//! let filter = ParcelListFilter { page: 1, limit: 10, ..Default::default() };
//! let parcels = client.list_parcels(&filter).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod query;
pub mod session;
pub mod transport;

pub use client::{ApiClient, QueryData, QueryHandle};
pub use config::{ClientConfig, ConfigError};
pub use endpoint::{MutationEndpoint, QueryEndpoint, Tag, Verb};
pub use error::{AuthError, ClientError, Result};
pub use query::QueryDescriptor;
pub use session::{Session, SessionState, SessionStore};
