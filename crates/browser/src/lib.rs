pub mod drag;
pub mod ports;
pub mod view_model;

pub use drag::*;
pub use ports::*;
pub use view_model::*;
