//! # Scribe Shared
//!
//! Context and response types shared between the server and any rendering
//! surface. The presentation layer consumes these as-is; the server only
//! fills them in.

pub mod dto;
pub mod response;

pub use response::{ErrorResponse, FieldError};
