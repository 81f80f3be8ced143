//! Pirsch analytics tools.
//!
//! [`request`] turns a tool name and JSON arguments into a typed request,
//! [`schema`] lists what is on offer, and [`Dispatcher`] runs requests
//! against an [`pirsch_client::AnalyticsApi`].

pub mod dispatcher;
pub mod request;
pub mod schema;

pub use dispatcher::Dispatcher;
pub use request::{ToolRequest, UtmDimension};
