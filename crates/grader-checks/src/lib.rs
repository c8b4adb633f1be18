pub mod artifact;
pub mod backend;
pub mod engine;
pub mod interactive;
pub mod static_dom;

pub use artifact::*;
pub use backend::*;
pub use engine::*;
pub use interactive::*;
pub use static_dom::*;
