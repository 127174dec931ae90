//! Client for the REST API of a hosted full-text search service.
//!
//! Every operation on [`SearchClient`] maps onto a single HTTPS exchange built by the request
//! executor: the path and query string come from a [`RequestPath`], the `api-version` parameter
//! is always appended, and the response status is classified before the body is decoded.
//!
//! ```no_run
//! # async fn run() -> Result<(), search_client::Error> {
//! use search_client::{
//!     Query,
//!     SearchClient,
//!     ServiceConfig,
//! };
//!
//! let config = ServiceConfig::new("https://example.search.windows.net", "<admin key>")?;
//! let client = SearchClient::new(config);
//!
//! let hits = client
//!     .search("hotels", &Query::new().param("search", "budget").param("$top", 10))
//!     .await?;
//! println!("{} hits", hits.len());
//! # Ok(())
//! # }
//! ```

mod client;
pub mod config;
pub mod consts;
mod error;
mod executor;
mod path;
mod request;
mod reqwest_client;

pub use client::SearchClient;
pub use config::ServiceConfig;
pub use error::{
    ConfigError,
    Error,
    StatusKind,
};
pub use executor::ResponseBody;
pub use path::{
    Query,
    RequestPath,
};
pub use request::RequestSpec;
pub use reqwest;
pub use reqwest::Method;
pub use reqwest_client::{
    reqwest_client,
    user_agent,
};
