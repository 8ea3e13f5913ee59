use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use tutor_protocol::assembler::{self, ErrorClass};
use tutor_protocol::config::Config;
use tutor_protocol::error::{ProviderError, TutorError};
use tutor_protocol::parsing::render;
use tutor_protocol::session_io::{JsonDirSessionStore, SessionStore};
use tutor_protocol::types::session::UserLevel;

#[derive(Parser, Debug)]
#[command(name = "tutor", version, about = "Parse and inspect bilingual tutor replies")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a raw completion into a chat message
    Parse {
        file: PathBuf,
        /// Treat the file as a relay response body instead of raw completion text
        #[arg(long)]
        json: bool,
        /// HTTP status the relay answered with (only with --json)
        #[arg(long, default_value_t = 200)]
        status: u16,
        /// Print the rendered English body instead of the message JSON
        #[arg(long)]
        html: bool,
        /// Append the parsed message to this stored session
        #[arg(long)]
        session: Option<String>,
    },
    /// Render a markdown file to HTML
    Render { file: PathBuf },
    /// Show the canned reply for a provider failure
    Error {
        #[arg(long)]
        status: u16,
        #[arg(long, default_value = "")]
        kind: String,
    },
    #[command(subcommand)]
    Session(SessionCommand),
}

#[derive(Subcommand, Debug)]
enum SessionCommand {
    /// Start a new session
    New {
        #[arg(long, default_value_t = 1)]
        speaking: u8,
        #[arg(long, default_value_t = 1)]
        writing: u8,
        #[arg(long, default_value_t = 1)]
        grammar: u8,
        #[arg(long, default_value_t = 1)]
        vocabulary: u8,
    },
    /// List archived sessions, newest first
    List,
    Show { id: String },
    Archive { id: String },
    Delete { id: String },
}

fn read_input(path: &Path) -> Result<String, TutorError> {
    fs::read_to_string(path).map_err(|e| TutorError::io(path, e))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), TutorError> {
    let json = serde_json::to_string_pretty(value).map_err(TutorError::json)?;
    println!("{json}");
    Ok(())
}

fn run(cli: Cli) -> Result<(), TutorError> {
    let config = Config::load_or_default(&cli.config)?;

    match cli.command {
        Command::Parse {
            file,
            json,
            status,
            html,
            session,
        } => {
            let input = read_input(&file)?;
            let message = if json {
                let response = assembler::decode_relay_reply(status, &input);
                assembler::assemble_response(response, &config.heuristics)
            } else {
                assembler::assemble_with(Ok::<_, tutor_protocol::TurnError>(input), &config.heuristics)
            };

            if let Some(id) = session {
                let store = JsonDirSessionStore::open(&config.sessions_dir)?;
                let mut stored = store.fetch(&id)?;
                stored.push_message(message.clone());
                store.update(&mut stored)?;
            }

            if html {
                println!("{}", render(message.english.as_str()));
            } else {
                print_json(&message)?;
            }
        }
        Command::Render { file } => {
            let input = read_input(&file)?;
            println!("{}", render(input.as_str()));
        }
        Command::Error { status, kind } => {
            let err = ProviderError::new(status, kind, "");
            let class = ErrorClass::from_provider(&err);
            print_json(&serde_json::json!({
                "class": class,
                "retryable": class.is_retryable(),
                "message": class.canned_message(),
            }))?;
        }
        Command::Session(command) => {
            let store = JsonDirSessionStore::open(&config.sessions_dir)?;
            match command {
                SessionCommand::New {
                    speaking,
                    writing,
                    grammar,
                    vocabulary,
                } => {
                    let session = store.create(UserLevel {
                        speaking,
                        writing,
                        grammar,
                        vocabulary,
                    })?;
                    println!("{}", session.id);
                }
                SessionCommand::List => print_json(&store.list_history()?)?,
                SessionCommand::Show { id } => print_json(&store.fetch(&id)?)?,
                SessionCommand::Archive { id } => store.archive(&id)?,
                SessionCommand::Delete { id } => store.delete(&id)?,
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
