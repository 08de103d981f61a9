//! agentdesk - command-line client for the agentdesk chat backend

mod commands;
mod config;
mod render;

use std::sync::Arc;

use agentdesk_api::{Client, Conversation, ConversationId};
use agentdesk_sync::{
    ConversationStore, ErrorKind, HttpGateway, LoadMoreOutcome, SendOutcome, StoreEvent,
};
use anyhow::Context;
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// agentdesk - chat with your organization's agents
#[derive(Parser, Debug)]
#[command(name = "agentdesk")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Backend base URL (overrides AGENTDESK_BASE_URL and the config file)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a message, or start an interactive session when no text is given
    Chat {
        /// Agent to address (defaults to `default_agent` from the config)
        #[arg(short, long)]
        agent: Option<String>,

        /// Continue an existing conversation
        #[arg(short, long)]
        conversation: Option<i64>,

        text: Vec<String>,
    },

    /// List conversations grouped by date
    Conversations {
        /// Only conversations matching this text
        #[arg(short, long)]
        search: Option<String>,

        /// Number of pages to fetch
        #[arg(short, long, default_value_t = 1)]
        pages: usize,
    },

    /// Print the messages of a conversation
    History { id: i64 },

    /// Delete a conversation
    Delete { id: i64 },

    /// List available agents
    Agents,

    /// Initialize config file
    InitConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    let filter = if args.verbose {
        EnvFilter::new("agentdesk=debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Command::InitConfig = args.command {
        let path = config::Config::init().context("creating config file")?;
        println!("Config file at: {}", path.display());
        println!("\nExample config:\n{}", config::example_config());
        return Ok(());
    }

    let cfg = config::Config::load();
    let base_url = cfg.resolve_base_url(args.base_url.clone());
    let client = Client::with_timeout(base_url, cfg.request_timeout())?;
    let store = ConversationStore::new(cfg.store_config(), Arc::new(HttpGateway::new(client)));

    match args.command {
        Command::Chat {
            agent,
            conversation,
            text,
        } => {
            let agent = agent.or(cfg.default_agent.clone());
            run_chat(&store, agent, conversation, text.join(" ")).await
        }
        Command::Conversations { search, pages } => {
            list_conversations(&store, search.as_deref(), pages).await
        }
        Command::History { id } => show_history(&store, ConversationId(id)).await,
        Command::Delete { id } => delete_conversation(&store, ConversationId(id)).await,
        Command::Agents => {
            store.load_agents().await?;
            print!("{}", render::format_agents(&store.agents(), None));
            Ok(())
        }
        Command::InitConfig => Ok(()),
    }
}

/// Placeholder row for a conversation known only by id
fn by_id(id: ConversationId) -> Conversation {
    Conversation::new(id, None, Utc::now())
}

async fn list_conversations(
    store: &ConversationStore,
    search: Option<&str>,
    pages: usize,
) -> anyhow::Result<()> {
    match search {
        Some(query) => store.search_conversations(query).await?,
        None => store.reload_conversations().await?,
    };
    for _ in 1..pages {
        if !matches!(store.load_more().await?, LoadMoreOutcome::Appended { .. }) {
            break;
        }
    }

    let groups = store.grouped_conversations(&Local::now());
    if groups.is_empty() {
        println!("No conversations.");
    }
    print!("{}", render::format_groups(&groups));
    if store.has_more() {
        println!("(more available, use --pages)");
    }
    Ok(())
}

async fn show_history(store: &ConversationStore, id: ConversationId) -> anyhow::Result<()> {
    let conversation = by_id(id);
    let (agents, history) = tokio::join!(store.load_agents(), store.select_conversation(&conversation));
    if let Err(e) = agents {
        tracing::debug!("Agent list unavailable: {}", e);
    }
    history?;

    print!("{}", render::format_history(&store.messages()));
    let participants = store.participants();
    if !participants.is_empty() {
        println!("\nParticipants: {}", render::format_participants(&participants));
    }
    Ok(())
}

async fn delete_conversation(store: &ConversationStore, id: ConversationId) -> anyhow::Result<()> {
    store.reload_conversations().await?;
    while !store.conversations().iter().any(|c| c.id == Some(id)) {
        if !matches!(store.load_more().await?, LoadMoreOutcome::Appended { .. }) {
            anyhow::bail!("conversation {} not found", id);
        }
    }
    store.delete_conversation(id).await?;
    println!("Deleted conversation {}.", id);
    Ok(())
}

async fn run_chat(
    store: &ConversationStore,
    agent: Option<String>,
    conversation: Option<i64>,
    text: String,
) -> anyhow::Result<()> {
    store.load_agents().await?;
    if let Some(name) = agent {
        let found = store
            .agents()
            .into_iter()
            .find(|a| a.name.eq_ignore_ascii_case(&name))
            .with_context(|| format!("unknown agent: {}", name))?;
        store.select_agent(Some(found));
    }
    if let Some(id) = conversation {
        store.select_conversation(&by_id(ConversationId(id))).await?;
    }

    if !text.trim().is_empty() {
        return match store.send_message(&text).await? {
            SendOutcome::Delivered { .. } => {
                print_reply(store);
                Ok(())
            }
            SendOutcome::Stale => Ok(()),
        };
    }

    run_interactive(store, conversation.is_some()).await
}

fn print_reply(store: &ConversationStore) {
    if let Some(reply) = store.messages().last() {
        print!("{}", render::format_message(reply));
    }
}

async fn run_interactive(store: &ConversationStore, resumed: bool) -> anyhow::Result<()> {
    use std::io::{self, Write};

    // Spawn event handler
    let mut receiver = store.subscribe();
    let events = store.clone();
    let handle = tokio::spawn(async move {
        while let Ok(event) = receiver.recv().await {
            match event {
                StoreEvent::ConversationPromoted { conversation_id } => {
                    if let Some(conv) = events.active_conversation() {
                        if conv.id == Some(conversation_id) {
                            eprintln!("[conversation {}: {}]", conversation_id, conv.display_title());
                        }
                    }
                }
                StoreEvent::Error { error } => eprintln!("{}", render::format_error(&error)),
                _ => {}
            }
        }
    });

    if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        match store.selected_agent() {
            Some(agent) => eprintln!("agentdesk ({})", agent.name),
            None => eprintln!("agentdesk"),
        }
        eprintln!("Type /help for commands.");
        eprintln!();
    }
    if resumed {
        print!("{}", render::format_history(&store.messages()));
    }

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // EOF
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(result) = commands::execute_command(input, &store.agents()) {
            match result {
                commands::CommandResult::NewChat => {
                    store.start_new_chat();
                    println!("Started a new conversation.");
                }
                commands::CommandResult::SelectAgent(agent) => {
                    println!("Talking to {} ({}).", agent.name, agent.kind());
                    store.select_agent(Some(agent));
                }
                commands::CommandResult::ClearAgent => {
                    store.select_agent(None);
                    println!("Messages go to the default router.");
                }
                commands::CommandResult::ShowTrace => {
                    let trace = store.execution_trace();
                    if trace.is_empty() {
                        println!("No tool calls in this conversation.");
                    }
                    for entry in trace {
                        println!("{}:", entry.agent_name.as_deref().unwrap_or("assistant"));
                        print!("{}", render::format_steps(std::slice::from_ref(&entry.step)));
                    }
                }
                commands::CommandResult::Message(msg) => println!("{}", msg),
                commands::CommandResult::Exit => break,
                commands::CommandResult::Unknown(cmd) => {
                    println!("Unknown command: /{}", cmd);
                    println!("Type /help for available commands.");
                }
            }
            continue;
        }

        match store.send_message(input).await {
            Ok(SendOutcome::Delivered { .. }) => print_reply(store),
            Ok(SendOutcome::Stale) => {}
            // network and server failures arrive through the event handler
            Err(e) if e.kind() == ErrorKind::ValidationFailure => println!("{}", e),
            Err(_) => {}
        }
    }

    handle.abort();
    Ok(())
}
