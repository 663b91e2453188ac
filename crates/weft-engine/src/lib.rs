pub mod deps;
pub mod dispatch;
pub mod engine;
pub mod prompt;
pub mod quota;
pub mod sources;
pub mod store;
pub mod stream;
pub mod trace;

pub use engine::Engine;
pub use stream::{ExecutionStream, StreamItem};
