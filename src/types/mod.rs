//! Value types shared by every layer.

mod axis;
mod range;
mod selection;
mod value;

pub use axis::*;
pub use range::*;
pub use selection::*;
pub use value::*;
