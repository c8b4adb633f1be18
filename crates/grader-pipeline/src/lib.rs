pub mod builder;
pub mod dispatch;
pub mod ingest;
pub mod notify;
pub mod roster;
pub mod round1;
pub mod round2;

pub use builder::*;
pub use dispatch::*;
pub use ingest::*;
pub use notify::*;
pub use roster::*;
pub use round1::*;
pub use round2::*;
