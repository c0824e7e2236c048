//! WebSocket transport task.
//!
//! Owns the socket and nothing else. Frames are decoded here and handed
//! to the UI task over a channel in arrival order; commands flow the
//! other way. Reconnects with a capped linear backoff until the user
//! disconnects or the app shuts down.

use eq_core::{decode_inbound, Inbound};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{info, warn};
use url::Url;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(15);

#[derive(Debug)]
pub enum TransportCommand {
    Connect,
    Disconnect,
    Send(String),
}

#[derive(Debug)]
pub enum TransportEvent {
    Connected,
    Disconnected { reason: Option<String> },
    Frame(Inbound),
}

fn next_backoff(current: Duration) -> Duration {
    (current + Duration::from_secs(2)).min(MAX_BACKOFF)
}

/// Runs until the command channel closes. Idle until a `Connect`
/// arrives, then holds a session open, reconnecting on socket loss.
pub async fn transport_loop(
    url: Url,
    mut commands: mpsc::Receiver<TransportCommand>,
    events: mpsc::Sender<TransportEvent>,
) {
    'idle: loop {
        match commands.recv().await {
            Some(TransportCommand::Connect) => {}
            Some(_) => continue 'idle,
            None => return,
        }

        let mut backoff = INITIAL_BACKOFF;
        'session: loop {
            let (mut ws, _) = match connect_async(url.clone()).await {
                Ok(value) => value,
                Err(err) => {
                    warn!("connect_error: {err}");
                    let _ = events
                        .send(TransportEvent::Disconnected { reason: Some(err.to_string()) })
                        .await;
                    tokio::select! {
                        _ = tokio::time::sleep(backoff) => {
                            backoff = next_backoff(backoff);
                            continue 'session;
                        }
                        cmd = commands.recv() => match cmd {
                            Some(TransportCommand::Disconnect) => continue 'idle,
                            Some(_) => continue 'session,
                            None => return,
                        }
                    }
                }
            };
            backoff = INITIAL_BACKOFF;
            info!("connected: {url}");
            if events.send(TransportEvent::Connected).await.is_err() {
                return;
            }

            loop {
                tokio::select! {
                    msg = ws.next() => match msg {
                        Some(Ok(WsMessage::Text(text))) => match decode_inbound(&text) {
                            Ok(inbound) => {
                                if events.send(TransportEvent::Frame(inbound)).await.is_err() {
                                    return;
                                }
                            }
                            Err(err) => warn!("undecodable frame dropped: {err}"),
                        },
                        Some(Ok(WsMessage::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            warn!("socket_error: {err}");
                            break;
                        }
                    },
                    cmd = commands.recv() => match cmd {
                        Some(TransportCommand::Send(payload)) => {
                            if ws.send(WsMessage::Text(payload)).await.is_err() {
                                break;
                            }
                        }
                        Some(TransportCommand::Disconnect) => {
                            let _ = ws.close(None).await;
                            let _ = events
                                .send(TransportEvent::Disconnected { reason: None })
                                .await;
                            continue 'idle;
                        }
                        Some(TransportCommand::Connect) => {}
                        None => {
                            let _ = ws.close(None).await;
                            return;
                        }
                    }
                }
            }

            let _ = events
                .send(TransportEvent::Disconnected { reason: Some("connection lost".into()) })
                .await;
        }
    }
}
