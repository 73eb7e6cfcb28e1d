//! Common types shared by the OAuth 2.0 client workspace

mod secret;
mod error;

pub use secret::Secret;
pub use error::{Error, Result};
