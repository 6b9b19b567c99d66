pub mod display;
pub mod parsers;
pub mod send_utils;

pub use display::*;
pub use parsers::*;
pub use send_utils::*;
