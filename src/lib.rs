pub mod error;
pub mod kmeans;
pub mod preprocessing;
pub mod features;
pub mod models;
pub mod assign;
pub mod scan;
pub mod pipeline;
pub mod staging;
pub mod interface;
pub mod manifest;

pub use error::{Error, Result};
