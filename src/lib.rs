pub mod config;
pub mod error;
pub mod export;
pub mod ingest;
pub mod load;
pub mod table;
pub mod transform;
pub mod upload;

pub use error::{Error, Result};
