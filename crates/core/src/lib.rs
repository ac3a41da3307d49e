//! Rust client for the [Radiant MLHub](https://mlhub.earth) API.
//!
//! MLHub serves training data for geospatial machine learning as
//! [STAC](https://stacspec.org) collections and items. This crate **is**:
//!
//! - A blocking client that authenticates with a bearer token
//! - Lazy pagination over linked item listings
//! - Thin wrappers around [stac] collections and items
//!
//! This crate **is not**:
//!
//! - An implementation of the STAC data model, see [stac]
//! - An async client
//!
//! # Authentication
//!
//! Every request is authenticated with an API token. The token comes from,
//! in order:
//!
//! 1. an explicit token passed to a request or set with [Client::with_api_token]
//! 2. the `MLHUB_API_TOKEN` environment variable
//! 3. the `auth.api_token` field of a `.ml-hub` TOML file in the current
//!    working directory or the home directory
//!
//! ```toml
//! [auth]
//! api_token = "your-token"
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use mlhub::Client;
//!
//! let client = Client::new();
//! for collection in client.collections().unwrap() {
//!     println!("{}", collection.id());
//! }
//! let collection = client.collection("ref_african_crops_uganda_01").unwrap();
//! let item = collection.items(&client, Some(1)).unwrap().next().unwrap().unwrap();
//! println!("{:?}", item.property("label:description"));
//! ```

#![warn(missing_docs, unused_qualifications)]

mod client;
mod collection;
mod credentials;
mod error;
mod paginate;
mod session;

pub use {
    client::{Client, DEFAULT_ITEMS_FIELD, MLHUB_URL, RequestOptions},
    collection::{Collection, Item, Items},
    credentials::{CredentialResolver, MLHUB_CONFIG_FILE, MLHUB_ENV_VARIABLE},
    error::Error,
    paginate::Paginate,
    session::{Session, SessionCache},
};

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns a string suitable for use as a HTTP user agent.
pub fn user_agent() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"))
}
