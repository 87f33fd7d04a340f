mod health;
pub mod sse;
mod workflows;

pub use health::*;
pub use workflows::*;
