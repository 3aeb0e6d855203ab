//! Slash commands for interactive mode

/// A parsed line of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send the text as a chat message
    Send(String),
    /// Stop the reply in flight
    Stop,
    /// Re-send the last user message
    Retry,
    /// Discard the conversation
    Reset,
    /// Dismiss the error banner
    Dismiss,
    /// Print the conversation
    History,
    /// Show a message to the user
    Help,
    /// Exit the application
    Quit,
    /// Unknown command
    Unknown(String),
}

/// Parse a line of input. Blank lines yield `None`.
pub fn parse(input: &str) -> Option<Command> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let Some(rest) = input.strip_prefix('/') else {
        return Some(Command::Send(input.to_string()));
    };

    let command = rest.split_whitespace().next().unwrap_or("").to_lowercase();
    Some(match command.as_str() {
        "help" | "h" | "?" => Command::Help,
        "stop" | "s" => Command::Stop,
        "retry" | "r" => Command::Retry,
        "reset" | "clear" | "c" => Command::Reset,
        "dismiss" | "d" => Command::Dismiss,
        "history" | "l" => Command::History,
        "quit" | "exit" | "q" => Command::Quit,
        _ => Command::Unknown(command),
    })
}

pub fn help_message() -> &'static str {
    r#"Available commands:
  /help, /h, /?          Show this help message
  /stop, /s              Stop the reply in flight
  /retry, /r             Re-send your last message
  /reset, /clear, /c     Start a fresh conversation
  /dismiss, /d           Dismiss the current error
  /history, /l           Print the conversation
  /quit, /exit, /q       Exit ocean

Anything else is sent as a message."#
}
