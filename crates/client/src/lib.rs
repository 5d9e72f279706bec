//! HTTP/JSON client for the image generation service.
//!
//! [`api::ImageApi`] is the boundary the studio controllers depend on;
//! [`http::HttpImageApi`] implements it over [`reqwest`]. Tests substitute
//! their own implementation.

pub mod api;
pub mod config;
pub mod http;
pub mod models;

pub use api::{ApiError, ImageApi};
pub use config::ClientConfig;
pub use http::HttpImageApi;
