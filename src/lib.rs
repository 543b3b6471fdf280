#![allow(async_fn_in_trait)]
pub mod auth;
pub mod client;
pub mod config;
pub mod download;
mod error;
pub mod feed;
pub mod hub;
pub mod metadata;
pub mod query;
pub mod roi;
pub mod search;
pub mod store;
pub mod workdir;

pub use error::SdmError;

pub type Result<T> = std::result::Result<T, SdmError>;
