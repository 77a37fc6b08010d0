use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use embedfix::application::{
    DomainPolicy, HandleMessageUseCase, LinkRewriter, RedditVideoResolver,
};
use embedfix::domain::entities::InboundMessage;
use embedfix::infrastructure::{
    AppConfig, CliArgs, ConfigLoader, DiscordRestClient, DispatchEvent, GatewayClient,
    GatewayClientConfig, GatewayEventKind, LruResultCache, RedditHttpClient,
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

fn init_logging(config: &AppConfig) -> Result<()> {
    let level = config.effective_log_level();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    if let Some(log_path) = &config.log_path {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .init();
    }

    Ok(())
}

fn load_config() -> Result<AppConfig> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let args = CliArgs::parse();
    let loader = ConfigLoader::new()?;
    let config = loader
        .load_with_args(args)
        .wrap_err("failed to load configuration")?;

    Ok(config)
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

async fn handle_message(
    handler: Arc<HandleMessageUseCase>,
    message: InboundMessage,
    cancel: CancellationToken,
) {
    match handler.execute(&message, &cancel).await {
        Ok(outcome) => debug!(message_id = %message.id, outcome = ?outcome, "Message handled"),
        Err(e) => error!(
            message_id = %message.id,
            channel_id = %message.channel_id,
            error = %e,
            "Failed to handle message"
        ),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let config = load_config()?;
    init_logging(&config)?;

    let token = config.bot_token()?;

    info!(
        version = embedfix::VERSION,
        environment = ?config.environment,
        suppress_embeds = config.suppress_embeds,
        "Starting embedfix"
    );

    let cache = Arc::new(LruResultCache::new(config.cache.max_cost));
    let upstream = RedditHttpClient::new(&config.upstream_config(), config.reddit_credentials())
        .wrap_err("failed to build Reddit client")?;
    if !upstream.is_authenticated() {
        info!("Reddit credentials incomplete, using anonymous requests");
    }

    let resolver =
        RedditVideoResolver::new(Arc::new(upstream), cache.clone(), config.resolver_settings());
    let rewriter = LinkRewriter::new(Arc::new(DomainPolicy::builtin()), resolver);
    let messaging = Arc::new(DiscordRestClient::new(&token)?);
    let handler = Arc::new(HandleMessageUseCase::new(
        rewriter,
        messaging,
        config.bot_settings(),
    ));

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("Shutdown signal received");
        shutdown.cancel();
    });

    let mut gateway = GatewayClient::new(GatewayClientConfig::default());
    let mut events = gateway.connect(token, cancel.clone())?;
    let mut tasks = JoinSet::new();
    let mut fatal = None;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(GatewayEventKind::Dispatch(DispatchEvent::MessageCreate { message })) => {
                    tasks.spawn(handle_message(handler.clone(), message, cancel.clone()));
                }
                Some(GatewayEventKind::Dispatch(DispatchEvent::Ready { username, user_id, .. })) => {
                    info!(username = %username, user_id = %user_id, "Bot is now running");
                }
                Some(GatewayEventKind::Error { message, recoverable: false }) => {
                    error!(error = %message, "Gateway stopped");
                    fatal = Some(message);
                }
                // Recoverable errors are logged by the gateway loop.
                Some(
                    GatewayEventKind::Error { .. }
                    | GatewayEventKind::Dispatch(DispatchEvent::Unknown { .. }),
                ) => {}
                None => break,
            },

            Some(result) = tasks.join_next() => {
                if let Err(e) = result {
                    error!(error = %e, "Message task failed");
                }
            }
        }
    }

    gateway.disconnect();

    if !tasks.is_empty() {
        info!(pending = tasks.len(), "Waiting for in-flight messages");
        let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!("In-flight messages did not finish, aborting");
            tasks.abort_all();
        }
    }

    info!(stats = %cache.stats(), "Shutting down");

    match fatal {
        Some(message) => Err(eyre!("gateway stopped: {message}")),
        None => Ok(()),
    }
}
