//! Slash commands for interactive chat

use agentdesk_api::Agent;

/// Result of executing a slash command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Start a fresh conversation
    NewChat,
    /// Address subsequent messages to this agent
    SelectAgent(Agent),
    /// Go back to the default router
    ClearAgent,
    /// Print the execution trace of the conversation
    ShowTrace,
    /// Show a message to the user (not sent to the backend)
    Message(String),
    /// Exit the session
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse and execute a slash command. Returns `None` for ordinary input.
pub fn execute_command(input: &str, agents: &[Agent]) -> Option<CommandResult> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next().unwrap_or("").to_lowercase();
    let args = parts.next().map(str::trim).unwrap_or("");

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),
        "new" | "n" => CommandResult::NewChat,
        "trace" | "t" => CommandResult::ShowTrace,
        "quit" | "exit" | "q" => CommandResult::Exit,
        "agent" | "a" => agent_command(args, agents),
        _ => CommandResult::Unknown(command),
    })
}

fn agent_command(args: &str, agents: &[Agent]) -> CommandResult {
    if args.is_empty() {
        let names: Vec<&str> = agents.iter().map(|a| a.name.as_str()).collect();
        return CommandResult::Message(format!("Agents: {}", names.join(", ")));
    }
    if args.eq_ignore_ascii_case("none") || args.eq_ignore_ascii_case("auto") {
        return CommandResult::ClearAgent;
    }
    match agents.iter().find(|a| a.name.eq_ignore_ascii_case(args)) {
        Some(agent) => CommandResult::SelectAgent(agent.clone()),
        None => CommandResult::Message(format!("Unknown agent: {}", args)),
    }
}

fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?        Show this help message
  /new, /n             Start a new conversation
  /agent, /a [name]    List agents or address one (/agent none to reset)
  /trace, /t           Show tool calls made in this conversation
  /quit, /q            Exit"#
        .to_string()
}
