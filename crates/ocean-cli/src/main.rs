//! ocean - terminal chat client

mod commands;
mod config;

use std::io;
use std::path::PathBuf;

use clap::Parser;
use commands::Command;
use ocean_session::{
    Message, Role, SessionConfig, SessionController, SessionEvent, Status, TurnOutcome,
    open_default_store,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

/// ocean - a minimal chat client
#[derive(Parser, Debug)]
#[command(name = "ocean")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the chat backend (replies come from POST <base>/chat)
    #[arg(long)]
    api_base: Option<String>,

    /// Use simulated replies even if a backend is configured
    #[arg(long)]
    mock: bool,

    /// Directory the conversation is persisted in
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// Send a single message, print the reply and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    if args.verbose || std::env::var_os("RUST_LOG").is_some() {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new("ocean=debug,ocean_reply=debug,ocean_session=debug")
        });
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }

    if args.init_config {
        let path = config::Config::init()?;
        println!("Config file at: {}", path.display());
        println!("\nExample config:\n{}", config::example_config());
        return Ok(());
    }

    let cfg = config::Config::load();
    let overrides = config::Overrides {
        api_base: args.api_base.clone(),
        mock: args.mock,
        storage_dir: args.storage_dir.clone(),
    };
    let settings = config::resolve(&cfg, &overrides, |key| std::env::var(key).ok());
    tracing::debug!("Resolved settings: {:?}", settings);

    let provider = ocean_reply::provider_for(&settings.mode)?;
    let store = open_default_store(settings.storage_dir.clone());
    let controller = SessionController::new(
        provider,
        store,
        SessionConfig {
            storage_key: settings.storage_key.clone(),
            ..SessionConfig::for_mode(&settings.mode)
        },
    );

    if let Some(command) = args.command {
        return run_command(&controller, &command).await;
    }

    run_interactive(controller).await
}

async fn run_command(controller: &SessionController, command: &str) -> anyhow::Result<()> {
    match controller.send(command).await {
        TurnOutcome::Ignored => anyhow::bail!("Nothing to send"),
        TurnOutcome::Done | TurnOutcome::Canceled => {
            if let Some(reply) = controller.messages().last() {
                println!("{}", reply.content);
            }
            Ok(())
        }
        TurnOutcome::Failed(description) => anyhow::bail!(description),
    }
}

async fn run_interactive(controller: SessionController) -> anyhow::Result<()> {
    if io::IsTerminal::is_terminal(&io::stderr()) {
        eprintln!("ocean - type /help for commands");
        eprintln!();
    }
    print_history(&controller.messages());

    let printer = spawn_event_printer(&controller);
    let mut pending: Option<JoinHandle<TurnOutcome>> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let Some(command) = commands::parse(&line) else {
            continue;
        };

        match command {
            Command::Send(text) => {
                let c = controller.clone();
                pending = Some(tokio::spawn(async move { c.send(&text).await }));
            }
            Command::Stop => controller.stop(),
            Command::Retry => {
                if controller.can_retry() {
                    let c = controller.clone();
                    pending = Some(tokio::spawn(async move { c.retry().await }));
                } else {
                    println!("Nothing to retry.");
                }
            }
            Command::Reset => controller.reset_conversation(),
            Command::Dismiss => controller.clear_error(),
            Command::History => print_history(&controller.messages()),
            Command::Help => println!("{}", commands::help_message()),
            Command::Quit => {
                controller.stop();
                break;
            }
            Command::Unknown(cmd) => {
                println!("Unknown command: /{}", cmd);
                println!("Type /help for available commands.");
            }
        }
    }

    // Let a reply that is still in flight land before exiting.
    if let Some(task) = pending.take() {
        let _ = task.await;
    }
    tokio::task::yield_now().await;
    printer.abort();

    Ok(())
}

fn spawn_event_printer(controller: &SessionController) -> JoinHandle<()> {
    let mut receiver = controller.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = receiver.recv().await {
            match event {
                SessionEvent::MessageUpdated { message } if message.status.is_terminal() => {
                    println!("{}", format_message(&message));
                    println!();
                }
                SessionEvent::TypingChanged { is_typing: true } => {
                    println!("assistant is typing...");
                }
                SessionEvent::ErrorChanged { error: Some(error) } => {
                    eprintln!("Error: {} (type /retry to try again)", error);
                }
                SessionEvent::ConversationCleared => {
                    println!("Cleared conversation.");
                }
                _ => {}
            }
        }
    })
}

fn print_history(messages: &[Message]) {
    for message in messages {
        println!("{}", format_message(message));
    }
    if !messages.is_empty() {
        println!();
    }
}

fn format_message(message: &Message) -> String {
    let who = match message.role {
        Role::User => "you",
        Role::Assistant => "assistant",
        Role::System => "system",
    };
    match message.status {
        Status::Canceled | Status::Error => format!("{}: [{}]", who, message.content),
        Status::Streaming => format!("{}: ...", who),
        _ => format!("{}: {}", who, message.content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_message() {
        let mut msg = Message::placeholder();
        assert_eq!(format_message(&msg), "assistant: ...");

        msg.content = "Stopped.".into();
        msg.status = Status::Canceled;
        assert_eq!(format_message(&msg), "assistant: [Stopped.]");

        assert_eq!(format_message(&Message::user("hi")), "you: hi");
        assert_eq!(format_message(&Message::system("note")), "system: note");
    }
}
