//! Interactive REPL (Read-Eval-Print Loop).

use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};

/// REPL meta-commands (prefixed with `.`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Show help
    Help,
    /// List tables
    Tables,
    /// Show symbol index information
    Index,
    /// Exit the REPL
    Quit,
    /// Execute SQL query
    Sql(String),
    /// Unknown command
    Unknown(String),
    /// Empty input
    Empty,
}

impl ReplCommand {
    /// Parse a line of input into a command.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return ReplCommand::Empty;
        }

        if trimmed.starts_with('.') {
            match trimmed.to_lowercase().as_str() {
                ".help" | ".h" | ".?" => ReplCommand::Help,
                ".tables" | ".t" => ReplCommand::Tables,
                ".index" | ".i" => ReplCommand::Index,
                ".quit" | ".exit" | ".q" => ReplCommand::Quit,
                _ => ReplCommand::Unknown(trimmed.to_string()),
            }
        } else if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
            ReplCommand::Quit
        } else {
            ReplCommand::Sql(trimmed.to_string())
        }
    }

    /// Check if this is a quit command.
    pub fn is_quit(&self) -> bool {
        matches!(self, ReplCommand::Quit)
    }
}

/// Input from the REPL - either a command or a request to quit.
#[derive(Debug)]
pub enum ReplInput {
    /// User provided input
    Command(ReplCommand),
    /// User pressed Ctrl-D or Ctrl-C
    Exit,
}

/// Interactive SQL REPL using rustyline for line editing and history.
pub struct Repl {
    editor: DefaultEditor,
    history_file: Option<String>,
}

impl Repl {
    /// Create a new REPL instance.
    pub fn new() -> RlResult<Self> {
        let editor = DefaultEditor::new()?;
        Ok(Self {
            editor,
            history_file: None,
        })
    }

    /// Set the history file path.
    pub fn with_history(mut self, path: &str) -> Self {
        self.history_file = Some(path.to_string());
        if let Err(e) = self.editor.load_history(path) {
            tracing::debug!("Could not load history: {}", e);
        }
        self
    }

    /// Read a complete input from the user (handles multi-line SQL).
    pub fn read_input(&mut self) -> RlResult<ReplInput> {
        let mut buffer = String::new();
        let mut first_line = true;

        loop {
            let prompt = if first_line { "symsql> " } else { "   ...> " };

            match self.editor.readline(prompt) {
                Ok(line) => {
                    let trimmed = line.trim();

                    if !trimmed.is_empty() {
                        let _ = self.editor.add_history_entry(&line);
                    }

                    // Dot commands and quit words are single-line
                    if first_line {
                        let command = ReplCommand::parse(trimmed);
                        if !matches!(command, ReplCommand::Sql(_)) {
                            return Ok(ReplInput::Command(command));
                        }
                    }

                    buffer.push_str(&line);
                    buffer.push('\n');

                    if trimmed.ends_with(';') {
                        return Ok(ReplInput::Command(ReplCommand::Sql(buffer)));
                    }

                    first_line = false;
                }
                Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                    return Ok(ReplInput::Exit);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Save history to file.
    pub fn save_history(&mut self) {
        if let Some(ref path) = self.history_file {
            if let Err(e) = self.editor.save_history(path) {
                tracing::debug!("Could not save history: {}", e);
            }
        }
    }
}

impl Drop for Repl {
    fn drop(&mut self) {
        self.save_history();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(ReplCommand::parse(".help"), ReplCommand::Help);
        assert_eq!(ReplCommand::parse(".H"), ReplCommand::Help);
        assert_eq!(ReplCommand::parse(".tables"), ReplCommand::Tables);
        assert_eq!(ReplCommand::parse(".quit"), ReplCommand::Quit);
        assert_eq!(ReplCommand::parse("exit"), ReplCommand::Quit);
        assert_eq!(ReplCommand::parse(""), ReplCommand::Empty);
        assert_eq!(ReplCommand::parse("   "), ReplCommand::Empty);
        assert!(matches!(
            ReplCommand::parse("SELECT symbolize_address(pc) FROM samples"),
            ReplCommand::Sql(_)
        ));
        assert!(matches!(
            ReplCommand::parse(".unknown"),
            ReplCommand::Unknown(_)
        ));
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(ReplCommand::parse(".index"), ReplCommand::Index);
        assert_eq!(ReplCommand::parse(".INDEX"), ReplCommand::Index);
        assert_eq!(ReplCommand::parse(".i"), ReplCommand::Index);
    }

    #[test]
    fn test_is_quit() {
        assert!(ReplCommand::parse(".q").is_quit());
        assert!(ReplCommand::parse("QUIT").is_quit());
        assert!(!ReplCommand::parse(".tables").is_quit());
    }
}
