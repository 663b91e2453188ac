pub mod backend;
pub mod dev;
pub mod registry;
pub mod schema;

pub use backend::{GenerationBackend, GenerationChunk, GenerationRequest, GenerationStream, PartialObject};
pub use dev::DevBackend;
pub use registry::{ModelSelector, ProviderId, ProviderRegistry};
pub use schema::artifact_schema;
