//! Media type parsing.

pub mod media_type;

pub use media_type::{MediaType, Parameters};
