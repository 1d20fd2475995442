pub mod editor;
pub mod right;
pub mod role;

pub use editor::*;
pub use right::*;
pub use role::*;
