use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chat_relay::cache::ResponseCache;
use chat_relay::config::RelayFileConfig;
use chat_relay::knowledge::KnowledgeBase;
use chat_relay::llm::{Message, OllamaClient};
use chat_relay::{ReplySource, ResolutionPipeline};

#[derive(Parser)]
#[command(name = "chat-relay")]
#[command(about = "Chat relay backend: knowledge base, response cache, and LLM fallback")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: search for .relay.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model backend URL
    #[arg(long, global = true, env = "RELAY_LLM_URL")]
    llm_url: Option<String>,

    /// Model to use
    #[arg(long, global = true, env = "RELAY_MODEL")]
    model: Option<String>,

    /// Knowledge base JSON file
    #[arg(long, global = true, env = "RELAY_KNOWLEDGE_PATH")]
    knowledge: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(long, short, env = "RELAY_PORT")]
        port: Option<u16>,
    },
    /// Resolve a single question and print the reply
    Ask {
        /// Question to ask
        message: String,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Load the config file and apply command-line overrides
fn load_config(cli: &Cli) -> Result<RelayFileConfig> {
    let mut config = match &cli.config {
        Some(path) => RelayFileConfig::load_from_path(path)?,
        None => RelayFileConfig::load()?,
    };

    if let Some(url) = &cli.llm_url {
        config.llm.url = url.clone();
    }
    if let Some(model) = &cli.model {
        config.llm.model = model.clone();
    }
    if let Some(path) = &cli.knowledge {
        config.knowledge.path = path.clone();
    }

    Ok(config)
}

fn build_pipeline(config: &RelayFileConfig) -> Result<ResolutionPipeline> {
    let kb_path = config.knowledge.resolved_path()?;
    let knowledge = KnowledgeBase::load(&kb_path)
        .with_context(|| format!("Failed to load knowledge base from {}", kb_path.display()))?;

    let cache = ResponseCache::new(config.cache.capacity);
    let client = OllamaClient::new(&config.llm.url, &config.llm.model, config.llm.timeout())?;
    tracing::info!(
        "Model backend {} (model {}, timeout {}s)",
        client.endpoint(),
        config.llm.model,
        config.llm.timeout_secs
    );

    Ok(
        ResolutionPipeline::new(Arc::new(client), config.llm.completion_options())
            .with_knowledge(Arc::new(knowledge))
            .with_cache(Arc::new(cache))
            .with_system_prompt(config.system_prompt()),
    )
}

#[cfg(feature = "web")]
async fn run_server(host: String, port: u16, pipeline: ResolutionPipeline) -> Result<()> {
    use chat_relay::web::{self, AppState, WebConfig};

    web::serve(WebConfig { host, port }, AppState::new(pipeline)).await
}

#[cfg(not(feature = "web"))]
async fn run_server(_host: String, _port: u16, _pipeline: ResolutionPipeline) -> Result<()> {
    anyhow::bail!("chat-relay was built without the `web` feature")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = load_config(&cli)?;
    let pipeline = build_pipeline(&config)?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);
            run_server(host, port, pipeline).await?;
        }
        Commands::Ask { message } => {
            let reply = pipeline.resolve(&[Message::user(message)]).await?;
            println!("{}", reply.content);
            if reply.source == ReplySource::Model {
                if let Some(secs) = reply.processing_time {
                    eprintln!("[{:.2}s from {}]", secs, pipeline.model());
                }
            } else {
                eprintln!("[{}]", reply.source.as_str());
            }
        }
    }

    Ok(())
}
