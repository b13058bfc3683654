// Line-oriented control of a running assistant

use std::fmt;
use std::str::FromStr;
use wayfinder_eye::VisualAssistant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Start,
    Stop,
    Toggle,
    Status,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommand(pub String);

impl fmt::Display for UnknownCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown command '{}' (try: start, stop, toggle, status, quit)", self.0)
    }
}

impl FromStr for ConsoleCommand {
    type Err = UnknownCommand;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        match line.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(ConsoleCommand::Start),
            "stop" => Ok(ConsoleCommand::Stop),
            "toggle" | "t" => Ok(ConsoleCommand::Toggle),
            "status" => Ok(ConsoleCommand::Status),
            "quit" | "exit" | "q" => Ok(ConsoleCommand::Quit),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}

impl ConsoleCommand {
    /// Apply to `assistant` and describe the result for the user
    pub fn apply(self, assistant: &VisualAssistant) -> String {
        match self {
            ConsoleCommand::Start => {
                if assistant.start() {
                    "capture started".to_string()
                } else {
                    "capture already running".to_string()
                }
            }
            ConsoleCommand::Stop => {
                if assistant.stop() {
                    "capture stopped".to_string()
                } else {
                    "capture not running".to_string()
                }
            }
            ConsoleCommand::Toggle => {
                if assistant.toggle() {
                    "capture started".to_string()
                } else {
                    "capture stopped".to_string()
                }
            }
            ConsoleCommand::Status => format!(
                "capture {}, playback {}",
                if assistant.is_running() { "running" } else { "stopped" },
                assistant.playback().state()
            ),
            ConsoleCommand::Quit => "shutting down".to_string(),
        }
    }
}
