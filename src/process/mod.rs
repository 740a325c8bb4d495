// External tool execution: spawning, output relay, exit status mapping.

pub mod run;
pub mod types;

pub use run::run;
pub use types::{ToolCommand, ToolError};
