pub mod layer;
pub mod list;
pub mod now_viewing;

pub use layer::*;
pub use list::*;
pub use now_viewing::*;
