use anyhow::{Context, Result};
use birbcast_client::chat::validate_username;
use birbcast_client::view::{ConnectionIndicator, MessageClass, RenderModel, VideoSource};
use birbcast_client::{Adapters, ClientConfig, Coordinator, CoordinatorOptions, VideoMode};
use birbcast_core::TransportPolicy;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Input;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Chat rows kept on screen.
const VISIBLE_MESSAGES: usize = 12;

#[derive(Parser)]
#[command(name = "birbcast")]
#[command(bin_name = "birbcast")]
#[command(about = "Terminal viewer for a birbcast live stream")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the stream and follow video state, viewers and chat.
    Watch {
        /// `host[:port]` of the stream server. Overrides BIRBCAST_API_URL.
        #[arg(long)]
        api_url: Option<String>,

        /// Force all media through TURN relays.
        #[arg(long)]
        relay_only: bool,

        #[arg(short, long)]
        username: Option<String>,

        #[arg(long)]
        no_chat: bool,

        /// Use the jpeg frame relay instead of a webrtc session.
        #[arg(long)]
        frames: bool,

        /// Start with the chat pane open.
        #[arg(long)]
        show_chat: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = ClientConfig::from_env().context("Failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Watch {
            api_url,
            relay_only,
            username,
            no_chat,
            frames,
            show_chat,
        } => {
            if let Some(api_url) = api_url {
                config.api_url = api_url;
            }
            if relay_only {
                config.transport_policy = TransportPolicy::RelayOnly;
            }

            let options = CoordinatorOptions {
                video_mode: if frames { VideoMode::Frames } else { VideoMode::Media },
                chat_enabled: !no_chat,
                chat_visible: show_chat,
                ..CoordinatorOptions::from_config(&config)
            };
            let username = match (options.chat_enabled, username) {
                (false, _) => None,
                (true, Some(name)) => Some(name),
                (true, None) => Some(prompt_username().await?),
            };

            watch(config, options, username).await?;
        }
    }

    Ok(())
}

async fn prompt_username() -> Result<String> {
    tokio::task::spawn_blocking(|| {
        Input::<String>::new()
            .with_prompt("Username")
            .validate_with(|name: &String| -> Result<(), String> {
                validate_username(name).map(|_| ()).map_err(|e| e.to_string())
            })
            .interact_text()
            .context("Failed to read username")
    })
    .await
    .context("Username prompt panicked")?
}

async fn watch(config: ClientConfig, options: CoordinatorOptions, username: Option<String>) -> Result<()> {
    let session = Arc::new(config.session_config().context("Invalid stream configuration")?);
    let adapters = Adapters::network(&session, config.signaling_timeout)
        .context("Failed to build network adapters")?;

    println!(
        "{} {}",
        "📡 Connecting to".green().bold(),
        session.signaling_endpoint()
    );
    let mut coordinator = Coordinator::start(session, adapters, options).await;

    if let Some(name) = username {
        if let Err(e) = coordinator.join_chat(&name).await {
            println!("{} {}", "⚠️  Could not join chat:".yellow(), e);
        }
    }
    println!(
        "{}",
        "Type to chat. Commands: /show /hide /restart /rejoin /quit".dimmed()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last: Option<RenderModel> = None;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }

            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                if !handle_input(&coordinator, line.trim()).await {
                    break;
                }
            }

            _ = coordinator.changed() => {}
        }

        let model = coordinator.render_model();
        if last.as_ref() != Some(&model) {
            render(&model);
            last = Some(model);
        }
    }

    println!("{}", "👋 Shutting down...".cyan());
    coordinator.shutdown().await;
    Ok(())
}

/// Returns false when the viewer should exit.
async fn handle_input(coordinator: &Coordinator, line: &str) -> bool {
    match line {
        "" => {}
        "/quit" => return false,
        "/show" => coordinator.set_chat_visible(true),
        "/hide" => coordinator.set_chat_visible(false),
        "/restart" => coordinator.restart_media().await,
        "/rejoin" => {
            if let Err(e) = coordinator.rejoin_chat().await {
                println!("{} {}", "⚠️ ".yellow(), e);
            }
        }
        text => {
            if let Err(e) = coordinator.send_chat(text).await {
                println!("{} {}", "⚠️  Message not sent:".yellow(), e);
            }
        }
    }
    true
}

fn render(model: &RenderModel) {
    let indicator = match model.indicator {
        ConnectionIndicator::Connected => model.indicator.to_string().green(),
        ConnectionIndicator::Disconnected => model.indicator.to_string().red(),
    };
    println!("\n{}  👀 {} watching", indicator.bold(), model.viewers);

    match &model.video {
        VideoSource::Track(track) => println!("   📺 live track {}", track.track_id),
        VideoSource::Frame { fps, .. } => match fps {
            Some(fps) => println!("   🖼  frame relay @ {fps} fps"),
            None => println!("   🖼  frame relay"),
        },
        VideoSource::Error(text) => println!("   {}", text.red()),
        VideoSource::Nothing => println!("   {}", "Waiting for video...".dimmed()),
    }

    if let Some(error) = &model.chat_error {
        println!("   {}", error.yellow());
    }

    if !model.chat_visible {
        if model.unseen_badge {
            println!("   {}", "💬 New messages (/show)".cyan().bold());
        }
        return;
    }

    let skip = model.messages.len().saturating_sub(VISIBLE_MESSAGES);
    for message in &model.messages[skip..] {
        let time = message.time_label.as_deref().unwrap_or("     ");
        match (message.class, &message.username) {
            (MessageClass::System, _) | (_, None) => {
                println!("   {} {}", time.dimmed(), message.text.italic().dimmed())
            }
            (MessageClass::Me, Some(name)) => {
                println!("   {} {}: {}", time.dimmed(), name.blue().bold(), message.text)
            }
            (MessageClass::User, Some(name)) => {
                println!("   {} {}: {}", time.dimmed(), name.bold(), message.text)
            }
        }
    }
}
