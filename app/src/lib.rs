pub mod render;
pub mod repl;

pub use render::{render_message, render_table};
pub use repl::{parse_command, ChatRepl, ReplCommand, ReplOutcome};
