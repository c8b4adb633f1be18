//! Shared data model, template catalog, and pure policies for the grading
//! pipeline.

pub mod backoff;
pub mod catalog;
pub mod check;
pub mod error;
pub mod model;
pub mod taskgen;
pub mod template;
pub mod time;

pub use backoff::*;
pub use catalog::*;
pub use check::*;
pub use error::*;
pub use model::*;
pub use taskgen::*;
pub use template::*;
pub use time::*;
