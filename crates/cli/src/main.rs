use std::sync::Arc;

use {
    clap::{Parser, Subcommand},
    secrecy::Secret,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    bina_config::{DiscoveredBot, discover_from_env},
    bina_gateway::AppState,
    bina_reasoning::AnthropicClient,
    bina_routing::{BotIdentity, BotRegistry},
    bina_slack::{SelfIdCache, SlackClient},
    bina_workflow::{BotServices, factory_for},
};

#[derive(Parser)]
#[command(name = "bina", about = "bina — multi-personality Slack study bot")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Address to bind to.
    #[arg(long, global = true, env = "BINA_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// Port to listen on.
    #[arg(long, global = true, env = "BINA_PORT", default_value_t = 3000)]
    port: u16,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook gateway (default when no subcommand is given).
    Serve,
    /// List the bot identities discovered from the environment.
    Bots,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli);

    match cli.command.as_ref().unwrap_or(&Commands::Serve) {
        Commands::Serve => serve(&cli).await,
        Commands::Bots => {
            list_bots();
            Ok(())
        },
    }
}

fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

async fn serve(cli: &Cli) -> anyhow::Result<()> {
    let bots = discover_from_env();
    let registry = build_registry(bots)?;
    info!(bots = ?registry.list(), "registered bot identities");

    let listener = tokio::net::TcpListener::bind((cli.bind.as_str(), cli.port)).await?;
    bina_gateway::server::serve(listener, AppState::new(registry)).await?;
    Ok(())
}

/// Wire one platform client per bot credential, a shared reasoning client,
/// and a shared self-id cache into the registry.
fn build_registry(bots: Vec<DiscoveredBot>) -> anyhow::Result<Arc<BotRegistry>> {
    let api_key = std::env::var("ANTHROPIC_API_KEY").unwrap_or_default();
    let reasoning = Arc::new(AnthropicClient::new(Secret::new(api_key))?);
    let self_ids = Arc::new(SelfIdCache::new());

    let registry = Arc::new(BotRegistry::new());
    for bot in bots {
        let chat = Arc::new(SlackClient::new(bot.token.clone())?);
        let services = Arc::new(BotServices {
            bot_name: bot.name.clone(),
            chat,
            reasoning: reasoning.clone(),
            rewriter: reasoning.clone(),
            self_ids: Arc::clone(&self_ids),
        });
        let factory = factory_for(&bot.name);
        registry.register(BotIdentity::new(
            bot.name.clone(),
            bot.token,
            bot.signing_secret,
            None,
            services,
            factory,
        ));
    }
    Ok(registry)
}

fn list_bots() {
    let bots = discover_from_env();
    for bot in &bots {
        let factory = factory_for(&bot.name);
        let mode = if bot.is_placeholder() {
            " (placeholder credentials)"
        } else {
            ""
        };
        println!("{}  variant={}{}", bot.name, factory.variant(), mode);
    }
    println!("{} bot(s) configured", bots.len());
}
