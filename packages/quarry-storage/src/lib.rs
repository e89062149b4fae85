pub mod models;
pub mod records;
pub mod tags;
pub mod vector;

mod error;

pub use error::{Error, Result};
