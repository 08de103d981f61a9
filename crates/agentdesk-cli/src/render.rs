//! Plain-text rendering of store snapshots

use std::fmt::Write;

use agentdesk_api::{Agent, ConversationGroup, ExecutionStep, Message, MessageStatus};
use agentdesk_sync::{Participant, SurfacedError};

/// Truncate a string to `max` characters, appending "..." if truncated.
pub fn truncate_chars(s: &str, max: usize) -> String {
    let mut chars = s.chars();
    let truncated: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", truncated)
    } else {
        truncated
    }
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Conversation list under date headers
pub fn format_groups(groups: &[ConversationGroup]) -> String {
    let mut out = String::new();
    for group in groups {
        let _ = writeln!(out, "{}", group.group);
        for conversation in &group.conversations {
            let id = conversation
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".into());
            let _ = writeln!(out, "  {:>6}  {}", id, conversation.display_title());
        }
    }
    out
}

pub fn format_message(message: &Message) -> String {
    let author = if message.is_user() {
        "you"
    } else {
        message.agent_name.as_deref().unwrap_or("assistant")
    };
    let status = match message.status {
        MessageStatus::Pending => " [sending]",
        MessageStatus::Failed => " [failed]",
        MessageStatus::Sent => "",
    };
    format!(
        "{} {}{}:\n{}\n",
        message.timestamp.format("%H:%M"),
        author,
        status,
        indent(&message.text, "  ")
    )
}

/// Tool calls behind an assistant message, inputs pretty-printed
pub fn format_steps(steps: &[ExecutionStep]) -> String {
    let mut out = String::new();
    for (i, step) in steps.iter().enumerate() {
        let _ = writeln!(out, "  [{}] {}", i + 1, step.tool_name);
        let _ = writeln!(out, "{}", indent(&step.pretty_input(), "      "));
        if !step.observation.is_empty() {
            let _ = writeln!(out, "      -> {}", truncate_chars(&step.observation, 200));
        }
    }
    out
}

pub fn format_history(messages: &[Message]) -> String {
    let mut out = String::new();
    for message in messages {
        out.push_str(&format_message(message));
        if !message.execution_details.is_empty() {
            out.push_str(&format_steps(&message.execution_details));
        }
    }
    out
}

pub fn format_participants(participants: &[Participant]) -> String {
    participants
        .iter()
        .map(|p| format!("{} ({})", p.name, p.kind.label()))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn format_agents(agents: &[Agent], selected: Option<&Agent>) -> String {
    let mut out = String::new();
    for agent in agents {
        let marker = if selected.is_some_and(|s| s.id == agent.id) {
            "*"
        } else {
            " "
        };
        let _ = write!(out, "{} {:<24} {:<24}", marker, agent.name, agent.kind().label());
        if let Some(description) = &agent.description {
            let _ = write!(out, " {}", truncate_chars(description, 60));
        }
        if !agent.is_active {
            out.push_str(" (inactive)");
        }
        out.push('\n');
    }
    out
}

pub fn format_error(error: &SurfacedError) -> String {
    format!("Error ({:?}): {}", error.operation, error.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentdesk_api::{AgentId, Conversation, ConversationId, DateGroup};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello world", 5), "hello...");
    }

    #[test]
    fn test_format_groups() {
        let ts = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        let groups = vec![ConversationGroup {
            group: DateGroup::Today,
            conversations: vec![
                Conversation::new(ConversationId(42), Some("Q3 Revenue".into()), ts),
                Conversation::new(ConversationId(7), None, ts),
            ],
        }];
        let out = format_groups(&groups);
        assert!(out.starts_with("Today\n"));
        assert!(out.contains("42  Q3 Revenue"));
        assert!(out.contains("7  New conversation"));
    }

    #[test]
    fn test_format_failed_message() {
        let mut message = Message::user("hello?");
        message.status = MessageStatus::Failed;
        let out = format_message(&message);
        assert!(out.contains("you [failed]:"));
        assert!(out.contains("  hello?"));
    }

    #[test]
    fn test_format_steps_pretty_prints_json() {
        let steps = vec![ExecutionStep::new("lookup", r#"{"id":1}"#, "found")];
        let out = format_steps(&steps);
        assert!(out.contains("[1] lookup"));
        assert!(out.contains("\"id\": 1"));
        assert!(out.contains("-> found"));
    }

    #[test]
    fn test_format_agents_marks_selection() {
        let agent = Agent {
            id: AgentId(1),
            name: "Finance_Agent".into(),
            description: None,
            department: "Finance".into(),
            created_by: None,
            tools: vec![],
            is_active: true,
            is_main_router: false,
        };
        let out = format_agents(std::slice::from_ref(&agent), Some(&agent));
        assert!(out.starts_with("* Finance_Agent"));
    }
}
