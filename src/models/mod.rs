mod amount;
mod order;

pub use amount::*;
pub use order::*;
