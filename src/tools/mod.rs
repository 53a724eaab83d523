//! Tool registry and invocation protocol.

pub mod arguments;
pub mod input;
pub mod registry;
pub mod tool;
pub mod types;
pub mod validation;

pub use arguments::ToolArguments;
pub use input::{ToolInput, ToolValue};
pub use registry::{decode_input, describe, invoke, ToolRegistry};
pub use tool::{FnTool, Tool, ToolContext};
pub use types::{AgentToolParameters, InputShape, ParameterBuilder, ToolSignature, TEXT_INPUT_FIELD};
pub use validation::validate_arguments;
