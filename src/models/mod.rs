//! Data models

pub mod analysis;
pub mod upload;

pub use analysis::*;
pub use upload::*;
