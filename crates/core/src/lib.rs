//! Domain types and pure logic for the image studio client.
//!
//! Nothing in this crate performs I/O. The HTTP boundary lives in
//! `dreamcanvas-client` and the stateful controllers in
//! `dreamcanvas-studio`.

pub mod error;
pub mod image;
pub mod pagination;
pub mod prompt;
pub mod seed;
pub mod training;
pub mod types;
