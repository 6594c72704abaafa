pub mod chain;
pub mod config;
pub mod decode;
pub mod digest;
pub mod encode;
pub mod error;
pub mod report;
pub mod store;

pub use error::{ChainError, Result};
