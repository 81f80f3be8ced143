//! Client for the Pirsch web-analytics REST API.
//!
//! [`filters`] turns a loosely-typed filter object into query parameters,
//! [`client::PirschClient`] handles authentication and retries.

pub mod client;
pub mod filters;
pub mod token;

pub use client::{AnalyticsApi, DomainQuery, PirschClient};
pub use filters::{encode, EncodeDefaults, Filter, QueryParams};
pub use token::TokenState;
