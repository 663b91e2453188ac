pub mod error;
pub mod graph;
pub mod traits;
pub mod types;

pub use error::{EngineError, Result};
pub use graph::*;
pub use types::*;
