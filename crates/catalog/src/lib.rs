pub mod document;
pub mod extent;
pub mod import;
pub mod services;
pub mod tree;

pub use extent::layer_extent;
pub use import::{ImportError, ImportPayload};
pub use services::ServiceRegistry;
pub use tree::*;
