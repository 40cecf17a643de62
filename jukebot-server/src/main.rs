use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use twilight_model::id::Id;

use jukebot_core::eventbus::NodeEventBus;
use jukebot_core::platforms::catalog::{CatalogResolver, SpotifyApi, TidalApi};
use jukebot_core::platforms::discord::runtime::{build_cache, build_http_client};
use jukebot_core::platforms::discord::{DiscordNotifier, DiscordRuntime, DiscordVoice, VoiceForwarder};
use jukebot_core::platforms::lavalink::{LavalinkListener, LavalinkNode, NodeRegistry};
use jukebot_core::platforms::{CatalogApi, NotificationSink, VoiceGateway};
use jukebot_core::services::discord::DiscordEventService;
use jukebot_core::services::{CommandService, ResolutionPipeline, SessionManager};
use jukebot_core::tasks::credential_refresh::spawn_credential_refresh_task;
use jukebot_core::tasks::node_events::spawn_node_event_dispatch;
use jukebot_core::{BotConfig, DefaultHttpClient, HttpClient};

#[derive(Parser, Debug, Clone)]
#[command(name = "jukebot")]
#[command(author, version, about = "Jukebot - Discord music bot on a Lavalink node")]
struct Args {
    /// Read environment variables from this file instead of `./.env`.
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Overrides LAVALINK_URI.
    #[arg(long)]
    lavalink_uri: Option<String>,

    /// Re-register the global slash commands on startup.
    #[arg(long, default_value = "false")]
    regen_commands: bool,
}

fn init_tracing() -> anyhow::Result<()> {
    tracing_log::LogTracer::init().context("Failed to bridge log records")?;
    let filter = EnvFilter::from_default_env()
        .add_directive("jukebot=info".parse()?)
        .add_directive("jukebot_core=info".parse()?);
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub).context("Failed to set global subscriber")?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let args = Args::parse();
    info!("Jukebot starting. regen_commands={}", args.regen_commands);

    if let Err(e) = run(args).await {
        error!("Jukebot error: {:?}", e);
        return Err(e);
    }
    info!("Main finished. Goodbye!");
    Ok(())
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = BotConfig::from_env(args.env_file.as_deref())?;
    if let Some(uri) = args.lavalink_uri {
        config.lavalink_uri = uri;
    }
    config.regen_commands |= args.regen_commands;
    let bot_user_id = config.bot_user_id()?;

    let cancel = CancellationToken::new();
    let http: Arc<dyn HttpClient> = Arc::new(DefaultHttpClient::new(config.request_timeout)?);

    // 1) Audio node
    let node = Arc::new(LavalinkNode::new(
        http.clone(),
        &config.lavalink_uri,
        config.lavalink_password.clone(),
    ));
    let nodes = Arc::new(NodeRegistry::new(node.clone()));
    let bus = Arc::new(NodeEventBus::new());
    let listener = Arc::new(LavalinkListener::new(node.clone(), bus.clone(), bot_user_id));
    let listener_task = {
        let listener = listener.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { listener.run(cancel).await })
    };

    // 2) Catalog providers, each with its own refresh loop
    let mut apis: Vec<Arc<dyn CatalogApi>> = Vec::new();
    match &config.spotify {
        Some(creds) => apis.push(Arc::new(SpotifyApi::new(http.clone(), creds.clone()))),
        None => warn!("Spotify credentials missing; Spotify links will not resolve"),
    }
    match &config.tidal {
        Some(creds) => apis.push(Arc::new(TidalApi::new(
            http.clone(),
            creds.clone(),
            config.tidal_country_code.clone(),
        ))),
        None => warn!("Tidal credentials missing; Tidal links will not resolve"),
    }
    let mut refresh_tasks = Vec::new();
    let mut catalogs = Vec::new();
    for api in apis {
        let resolver = Arc::new(CatalogResolver::new(api));
        refresh_tasks.push(spawn_credential_refresh_task(resolver.clone(), cancel.clone()));
        catalogs.push(resolver);
    }

    // 3) Playback services
    let discord_http = build_http_client(&config.bot_token);
    let notifier: Arc<dyn NotificationSink> = Arc::new(DiscordNotifier::new(discord_http.clone()));
    let pipeline = Arc::new(ResolutionPipeline::new(catalogs, nodes.clone()));
    let sessions = Arc::new(SessionManager::new(pipeline, nodes.clone(), notifier.clone()));

    let voice = Arc::new(DiscordVoice::new());
    let voice_gateway: Arc<dyn VoiceGateway> = voice.clone();
    let commands = Arc::new(CommandService::new(sessions.clone(), voice_gateway.clone()));
    let dispatch_task = spawn_node_event_dispatch(bus.clone(), sessions.clone()).await;

    // 4) Discord gateway
    let bot_user = Id::new_checked(bot_user_id).context("bot user id is zero")?;
    let service = Arc::new(DiscordEventService::new(
        discord_http.clone(),
        build_cache(),
        commands,
        notifier,
        Arc::new(VoiceForwarder::new(nodes)),
        voice_gateway,
        bot_user,
        config.regen_commands,
    ));
    let mut runtime = DiscordRuntime::new(
        config.bot_token.clone(),
        config.bot_status_message.clone(),
        discord_http,
        voice,
    );
    runtime.connect(service).await?;
    info!("Jukebot is up. Press Ctrl-C to stop.");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Ctrl-C detected; shutting down.");

    for session in sessions.active_sessions() {
        sessions.remove(session).await;
    }
    runtime.disconnect().await;
    cancel.cancel();
    bus.shutdown();

    let _ = listener_task.await;
    let _ = dispatch_task.await;
    for task in refresh_tasks {
        let _ = task.await;
    }
    info!("Shutdown complete.");
    Ok(())
}
