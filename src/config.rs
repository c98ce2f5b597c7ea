//! Layered settings: struct defaults, then `config.toml`, then `CADENZA__*`
//! environment variables.

mod load;
mod schema;

pub use schema::*;
