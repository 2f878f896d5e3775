mod normal;

pub use normal::*;
