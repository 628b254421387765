mod mock_script_writer;
mod openrouter_writer;

pub use mock_script_writer::MockScriptWriter;
pub use openrouter_writer::OpenRouterScriptWriter;
