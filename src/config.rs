// ABOUTME: Constants for the CLI shim and the REPL

pub const VERSION: &str = "0.1.0";
pub const WELCOME_MESSAGE: &str = "Rill v0.1";
pub const WELCOME_SUBTITLE: &str = "A small scripting language with closures and modules";
pub const WELCOME_FOOTER: &str = "Press Ctrl-D to exit";

pub const PROMPT: &str = "> ";
pub const HISTORY_FILE: &str = ".rill_history";
