use lume_swipe::config::Settings;
use lume_swipe::core::{ChannelStatus, MatchSlotState, Session, SwipeNotification};
use lume_swipe::models::{MatchEvent, SwipeDirection};
use lume_swipe::services::{ApiClient, SocketTransport};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(settings: Option<&Settings>) {
    let level = std::env::var("LOG_LEVEL")
        .ok()
        .or_else(|| settings.map(|s| s.logging.level.clone()))
        .unwrap_or_else(|| "info".to_string());
    let format = std::env::var("LOG_FORMAT")
        .ok()
        .or_else(|| settings.map(|s| s.logging.format.clone()))
        .unwrap_or_else(|| "pretty".to_string());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

fn render_front(session: &Session) {
    match session.swipes.queue().peek_front() {
        Some(profile) => println!(
            "[{} left] {} - {}\n    {}",
            session.swipes.queue().len(),
            profile.name,
            profile.avatar,
            profile.bio
        ),
        None => println!("No more candidates."),
    }
}

fn render_match(event: &MatchEvent) {
    println!(
        "*** It's a match! {} ({})\n    {}\n    type `dismiss` to close",
        event.profile.name, event.profile.avatar, event.profile.bio
    );
}

fn render_notification(notification: &SwipeNotification) {
    if let Err(e) = &notification.outcome {
        println!(
            "(could not save your {} on {}: {})",
            notification.request.direction, notification.request.target_id, e
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let loaded = match std::env::var("LUME_CONFIG") {
        Ok(path) => Settings::load_from(path),
        Err(_) => Settings::load(),
    };
    let settings = match loaded {
        Ok(settings) => settings,
        Err(e) => {
            init_logging(None);
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    init_logging(Some(&settings));

    let identity = std::env::args()
        .nth(1)
        .or_else(|| settings.session.user_id.clone())
        .ok_or("no user id given: pass it as the first argument or set LUME__SESSION__USER_ID")?;

    info!("Starting swipe session for {}", identity);

    let api = Arc::new(ApiClient::with_timeout(
        settings.api.base_url.clone(),
        settings.api_timeout(),
    ));
    let transport = Arc::new(
        SocketTransport::new(settings.socket.url.clone())
            .with_connect_timeout(settings.socket_connect_timeout()),
    );

    let (mut session, mut notifications) = Session::start(
        &identity,
        api.clone(),
        api,
        transport,
        settings.channel_settings(),
    )
    .await?;

    println!("Signed in as {}", session.user.name);

    // The stream copy is not needed here; the slot watch drives rendering.
    match session.open_channel().await {
        Ok(_stream) => {}
        Err(e) => warn!("Matches unavailable for now ({}); type `reopen` to retry", e),
    }

    let mut active = session.matches.watch_active();
    let mut status = session.matches.status();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    render_front(&session);
    println!("commands: like | dislike | dismiss | reopen | status | quit");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let command = line.trim();
                match command {
                    "" => continue,
                    "quit" | "exit" => break,
                    "dismiss" => {
                        session.matches.dismiss();
                    }
                    "reopen" => match session.open_channel().await {
                        Ok(_stream) => println!("Match channel reopened."),
                        Err(e) => println!("Still unavailable: {}", e),
                    },
                    "status" => println!(
                        "channel: {:?}, swiped: {}, left: {}",
                        session.matches.current_status(),
                        session.swipes.queue().swiped(),
                        session.swipes.queue().len()
                    ),
                    other => match other.parse::<SwipeDirection>() {
                        Ok(direction) => match session.swipes.swipe(direction) {
                            Ok(_) => render_front(&session),
                            Err(e) => println!("{}", e),
                        },
                        Err(e) => println!("{}", e),
                    },
                }
            }

            Some(notification) = notifications.recv() => {
                render_notification(&notification);
            }

            Ok(()) = active.changed() => {
                let state: MatchSlotState = active.borrow_and_update().clone();
                if let Some(event) = &state.active {
                    render_match(event);
                }
            }

            Ok(()) = status.changed() => {
                let current = *status.borrow_and_update();
                if let ChannelStatus::Abandoned { attempts } = current {
                    println!("Lost the match channel after {} attempts; type `reopen` to retry.", attempts);
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, ending session");
                break;
            }
        }
    }

    session.end().await;

    // Give in-flight decisions a moment to land before exiting.
    let drain = async {
        while let Some(notification) = notifications.recv().await {
            render_notification(&notification);
        }
    };
    let _ = tokio::time::timeout(std::time::Duration::from_secs(2), drain).await;

    Ok(())
}
