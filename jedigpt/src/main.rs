use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, WrapErr};
use shared::chat::{Conversation, Status};
use shared::transport::DEFAULT_TIMEOUT_SECS;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use jedigpt::{ask_jedi, ask_with_timeout, Config, ProxyClient};

#[derive(Parser, Debug)]
#[command(author, version, about = "Ask a Jedi Master", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask the completion API directly, using the AOAI_* env vars
    Ask { prompt: String },
    /// Chat through a running proxy
    Chat {
        #[arg(long, default_value = "http://localhost:3000")]
        api_url: String,
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Ask { prompt } => {
            let config = Config::from_env().wrap_err("Could not load AOAI configuration")?;
            let client = config.client()?;

            let reply = ask_jedi(&client, &prompt).await?;
            println!("{reply}");
        }
        Command::Chat {
            api_url,
            timeout_secs,
        } => chat(&api_url, timeout_secs).await?,
    }

    Ok(())
}

async fn chat(api_url: &str, timeout_secs: u64) -> Result<()> {
    let client = ProxyClient::new(api_url)?;
    let mut conversation = Conversation::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Ask the Jedi Master. Commands: /retry, /clear, /quit");

    while let Some(line) = lines.next_line().await.into_diagnostic()? {
        let prompt = match line.trim() {
            "/quit" => break,
            "/clear" => {
                if conversation.clear() {
                    println!("Conversation cleared.");
                }
                continue;
            }
            "/retry" => match conversation.retry() {
                Some(prompt) => {
                    println!("> {prompt}");
                    prompt
                }
                None => {
                    println!("Nothing to retry.");
                    continue;
                }
            },
            _ => match conversation.submit(&line) {
                Ok(prompt) => prompt,
                Err(_) => continue,
            },
        };

        let outcome = ask_with_timeout(&client, &prompt, timeout_secs).await;
        conversation.resolve(outcome);

        match conversation.status() {
            Status::Error(record) => {
                eprintln!("{}", record.message);
                if let Some(details) = &record.details {
                    eprintln!("  {details}");
                }
                eprintln!("Type /retry to ask again.");
            }
            _ => {
                if let Some(message) = conversation.messages().last() {
                    println!("{}\n", message.text);
                }
            }
        }
    }

    Ok(())
}
