//! Domain models for the request pipeline

pub mod request;
pub mod tenant;

pub use request::*;
pub use tenant::*;
