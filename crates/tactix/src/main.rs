//! Command-line client for a Tactix analysis server.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use log::{debug, info};
use std::path::PathBuf;
use tactix::{ChatError, ChatSession, DEFAULT_ENDPOINT, RemoteAnalyzer};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Command-line options for the client.
#[derive(Parser)]
#[command(name = "tactix", version)]
struct Cli {
    /// Analysis endpoint URL
    #[arg(long, global = true, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send one message and/or image and print the analysis
    Ask {
        /// Message text
        #[arg(long)]
        message: Option<String>,
        /// Path to a JPEG, PNG or WebP image
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Start an interactive conversation
    Chat,
}

/// Supported slash commands in the chat prompt.
#[derive(Debug, PartialEq, Eq)]
enum SlashCommand {
    Image(PathBuf),
    Clear,
    Quit,
    Help,
}

const HELP: &str = "commands: /image <path>, /clear, /quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tactix::init_logging();

    let cli = Cli::parse();
    info!("starting client (endpoint={})", cli.endpoint);
    let session = ChatSession::new(RemoteAnalyzer::new(cli.endpoint.clone()));
    match cli.command {
        Command::Ask { message, image } => ask(session, message, image).await,
        Command::Chat => chat(session).await,
    }
}

async fn ask(
    mut session: ChatSession<RemoteAnalyzer>,
    message: Option<String>,
    image: Option<PathBuf>,
) -> anyhow::Result<()> {
    if message.is_none() && image.is_none() {
        bail!("pass --message, --image, or both");
    }
    if let Some(path) = image.as_ref() {
        session
            .attach_image_path(path)
            .with_context(|| format!("failed to attach {}", path.display()))?;
    }
    let reply = session
        .send(message.as_deref().unwrap_or_default())
        .await
        .context("analysis failed")?;
    println!("{}", reply.content);
    Ok(())
}

async fn chat(mut session: ChatSession<RemoteAnalyzer>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    println!("{HELP}");
    loop {
        let marker = if session.pending_image().is_some() {
            "[image] > "
        } else {
            "> "
        };
        stdout.write_all(marker.as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("failed to read input")? else {
            break;
        };
        match parse_slash_command(&line) {
            Ok(Some(SlashCommand::Quit)) => break,
            Ok(Some(SlashCommand::Help)) => println!("{HELP}"),
            Ok(Some(SlashCommand::Clear)) => {
                session.clear();
                println!("conversation cleared");
            }
            Ok(Some(SlashCommand::Image(path))) => match session.attach_image_path(&path) {
                Ok(_) => println!("attached {}", path.display()),
                Err(err) => eprintln!("error: {err}"),
            },
            Ok(None) => match session.send(&line).await {
                Ok(reply) => println!("\n{}\n", reply.content),
                Err(ChatError::EmptyInput) => {}
                Err(err) => eprintln!("error: {err}"),
            },
            Err(message) => eprintln!("{message}"),
        }
    }
    debug!("chat ended (turns={})", session.turns().len());
    Ok(())
}

fn parse_slash_command(input: &str) -> Result<Option<SlashCommand>, String> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return Ok(None);
    }
    let rest = trimmed.trim_start_matches('/');
    let (command, argument) = match rest.split_once(char::is_whitespace) {
        Some((command, argument)) => (command, argument.trim()),
        None => (rest, ""),
    };
    match command.to_lowercase().as_str() {
        "image" => {
            if argument.is_empty() {
                return Err("usage: /image <path>".to_string());
            }
            Ok(Some(SlashCommand::Image(PathBuf::from(argument))))
        }
        "clear" => Ok(Some(SlashCommand::Clear)),
        "quit" | "exit" => Ok(Some(SlashCommand::Quit)),
        "help" => Ok(Some(SlashCommand::Help)),
        other => Err(format!("unknown command /{other}; {HELP}")),
    }
}

#[cfg(test)]
mod tests {
    use super::{SlashCommand, parse_slash_command};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn plain_text_is_a_message() {
        assert_eq!(parse_slash_command("4-4-2の弱点は？"), Ok(None));
    }

    #[test]
    fn image_keeps_paths_with_spaces() {
        assert_eq!(
            parse_slash_command("/image  shots/corner kick.png "),
            Ok(Some(SlashCommand::Image(PathBuf::from("shots/corner kick.png"))))
        );
        assert!(parse_slash_command("/image").is_err());
    }

    #[test]
    fn control_commands_parse() {
        assert_eq!(parse_slash_command("/clear"), Ok(Some(SlashCommand::Clear)));
        assert_eq!(parse_slash_command("/QUIT"), Ok(Some(SlashCommand::Quit)));
        assert!(parse_slash_command("/bogus").is_err());
    }
}
