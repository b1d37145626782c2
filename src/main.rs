use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;

use agentic_chat::config::Config;
use agentic_chat::llm::Message;
use agentic_chat::search::{Focus, SearchOptions, SearchProvider};
use agentic_chat::stream::{ChatRequest, ChatTurn, StreamChunk};
use agentic_chat::{build_state, routes};

#[derive(Parser)]
#[command(
    name = "agentic-chat",
    about = "Chat backend with planned web search over Claude and Perplexity"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging for this crate
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to bind, overrides BIND_ADDR
        #[arg(long)]
        bind: Option<String>,
    },
    /// Answer a single message and print the streamed chunks
    Ask {
        /// The message to answer
        question: String,
        /// System instruction for the direct-search answer
        #[arg(long)]
        system: Option<String>,
    },
    /// Run a web search and print the results as JSON
    Search {
        /// The search query
        query: String,
        /// technical, general, news or writing
        #[arg(long)]
        focus: Option<Focus>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "agentic_chat=debug,info"
    } else {
        "info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = Config::from_env()?;
    let state = build_state(&config)?;

    match cli.command {
        Commands::Serve { bind } => {
            let addr = bind.unwrap_or_else(|| config.bind_addr.clone());
            let app = routes::create_router(state);

            let listener = TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            info!(%addr, "server listening");
            axum::serve(listener, app).await.context("Server error")?;
        }
        Commands::Ask { question, system } => {
            let turn = ChatTurn::from_request(ChatRequest {
                messages: vec![Message::user(question)],
                system,
            })?;

            let mut stream = state.streamer.stream_response(turn);
            while let Some(chunk) = stream.next_chunk().await {
                match chunk {
                    StreamChunk::Status(text) => eprintln!("[{}]", text),
                    StreamChunk::Content(text) => println!("{}", text),
                    StreamChunk::Error(text) => eprintln!("{}", text),
                }
            }

            if let Some(metadata) = stream.metadata() {
                eprintln!("\n[search] {} ({} results)", metadata.query, metadata.results.len());
                for result in &metadata.results {
                    eprintln!(
                        "  - {} {}",
                        result.title.as_deref().unwrap_or("(без названия)"),
                        result.url.as_deref().unwrap_or("")
                    );
                }
            }
        }
        Commands::Search { query, focus } => {
            let options = SearchOptions {
                focus,
                ..SearchOptions::default()
            };
            let results = state.search.search(&query, &options).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}
