mod zpay;

pub use zpay::*;
