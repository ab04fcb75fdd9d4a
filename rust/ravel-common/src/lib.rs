//! Core definitions (error taxonomy and result alias), relied upon by all ravel-* crates.

pub mod error;
pub mod result;

pub use result::Result;
