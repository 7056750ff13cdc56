pub mod calculator;
pub mod error;
pub mod execution_result;
pub mod registry;
pub mod system;
pub mod text;
pub mod traits;

pub use calculator::calculate;
pub use error::ToolError;
pub use execution_result::{ToolOutcome, ToolResult};
pub use registry::ToolRegistry;
pub use traits::Tool;
