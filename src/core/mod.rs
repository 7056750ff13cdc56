mod orchestrator;

pub use orchestrator::{ChatOrchestrator, OrchestrationError};
