pub mod checks;
pub mod config;
pub mod console;
pub mod logging;
pub mod pipeline;
pub mod process;

pub use checks::default_stages;
pub use console::Console;
pub use pipeline::{RunOutcome, Stage, run_pipeline};
