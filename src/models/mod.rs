pub mod descriptor;
pub mod event;

pub use descriptor::*;
pub use event::*;
