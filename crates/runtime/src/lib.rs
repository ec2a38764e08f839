pub mod frame;
pub mod frame_loop;

pub use frame::*;
pub use frame_loop::*;
