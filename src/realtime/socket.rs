//! Persistent push-channel transport.
//!
//! One client per claim subscription. The connect loop re-authenticates
//! with the latest credential on every attempt, refuses to dial with an
//! expired one, sends a keep-alive probe while connected, and reconnects
//! with exponential backoff (1s doubling to a 30s cap) on any drop that
//! was not an intentional shutdown.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::watch;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::api::RemoteStore;
use crate::auth::TokenProvider;
use crate::config::Config;
use crate::mutation::Executor;

use super::events::{CorrelationOutcome, EventCorrelator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Idle,
    Connecting,
    Connected,
    /// Credential expired or unavailable; no dial was attempted.
    AuthRefused,
    /// Waiting out the backoff before the next attempt.
    Reconnecting,
    Closed,
}

pub struct RealtimeClient {
    status_rx: watch::Receiver<ConnectionStatus>,
    shutdown_tx: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl RealtimeClient {
    /// Spawn the connection loop for one claim subscription.
    pub fn spawn<R: RemoteStore + 'static>(
        config: Config,
        claim_id: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
        correlator: EventCorrelator,
        executor: Executor<R>,
        remote: Arc<R>,
    ) -> Self {
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Idle);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let claim_id = claim_id.into();
        let task = tokio::spawn(run_loop(
            config,
            claim_id,
            tokens,
            correlator,
            executor,
            remote,
            status_tx,
            shutdown_rx,
        ));
        Self {
            status_rx,
            shutdown_tx,
            task,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status_rx.borrow()
    }

    pub fn status_watch(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    /// Intentional teardown; the loop will not reconnect.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.task.await;
    }
}

/// Doubling backoff capped at the configured maximum.
fn next_backoff(current: Duration, cap: Duration) -> Duration {
    (current * 2).min(cap)
}

#[allow(clippy::too_many_arguments)]
async fn run_loop<R: RemoteStore + 'static>(
    config: Config,
    claim_id: String,
    tokens: Arc<dyn TokenProvider>,
    correlator: EventCorrelator,
    executor: Executor<R>,
    remote: Arc<R>,
    status_tx: watch::Sender<ConnectionStatus>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut backoff = config.reconnect_backoff_initial;

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let token = match tokens.access_token().await {
            Ok(token) if !token.is_expired() => token,
            Ok(_) => {
                tracing::warn!("refusing realtime connect with expired credential");
                let _ = status_tx.send(ConnectionStatus::AuthRefused);
                if wait_or_shutdown(&mut shutdown_rx, backoff).await {
                    break;
                }
                backoff = next_backoff(backoff, config.reconnect_backoff_cap);
                continue;
            }
            Err(err) => {
                tracing::warn!("credential source failed: {}", err);
                let _ = status_tx.send(ConnectionStatus::AuthRefused);
                if wait_or_shutdown(&mut shutdown_rx, backoff).await {
                    break;
                }
                backoff = next_backoff(backoff, config.reconnect_backoff_cap);
                continue;
            }
        };

        let _ = status_tx.send(ConnectionStatus::Connecting);
        let url = format!(
            "{}?token={}",
            config.realtime_url,
            urlencoding::encode(&token.token)
        );

        let (ws, _response) = match connect_async(&url).await {
            Ok(pair) => pair,
            Err(err) => {
                tracing::warn!("realtime connect failed: {}", err);
                let _ = status_tx.send(ConnectionStatus::Reconnecting);
                if wait_or_shutdown(&mut shutdown_rx, backoff).await {
                    break;
                }
                backoff = next_backoff(backoff, config.reconnect_backoff_cap);
                continue;
            }
        };

        tracing::info!("realtime connected: claim={}", claim_id);
        let _ = status_tx.send(ConnectionStatus::Connected);
        backoff = config.reconnect_backoff_initial;

        let (mut sink, mut stream) = ws.split();
        let subscribe = serde_json::json!({ "action": "subscribe", "claimId": claim_id });
        if let Err(err) = sink.send(Message::Text(subscribe.to_string())).await {
            tracing::warn!("subscribe send failed: {}", err);
            continue;
        }

        let mut keepalive = tokio::time::interval(config.keepalive_interval);
        keepalive.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        keepalive.tick().await; // first tick is immediate

        let mut intentional = false;
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        let _ = sink.send(Message::Close(None)).await;
                        intentional = true;
                        break;
                    }
                }
                _ = keepalive.tick() => {
                    let ping = serde_json::json!({ "action": "ping" });
                    if let Err(err) = sink.send(Message::Text(ping.to_string())).await {
                        tracing::warn!("keep-alive send failed: {}", err);
                        break;
                    }
                }
                inbound = stream.next() => {
                    match inbound {
                        Some(Ok(Message::Text(text))) => {
                            if let CorrelationOutcome::Applied { refresh } =
                                correlator.handle_raw(&text)
                            {
                                if !refresh.is_empty() {
                                    refresh_file_records(&executor, &remote, &refresh).await;
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            tracing::info!("realtime connection closed by peer");
                            break;
                        }
                        Some(Ok(_)) => {} // binary/ping/pong frames carry nothing for us
                        Some(Err(err)) => {
                            tracing::warn!("realtime read failed: {}", err);
                            break;
                        }
                    }
                }
            }
        }

        if intentional {
            break;
        }
        let _ = status_tx.send(ConnectionStatus::Reconnecting);
        if wait_or_shutdown(&mut shutdown_rx, backoff).await {
            break;
        }
        backoff = next_backoff(backoff, config.reconnect_backoff_cap);
    }

    let _ = status_tx.send(ConnectionStatus::Closed);
}

/// Sleep the backoff, returning true if shutdown arrived first.
async fn wait_or_shutdown(shutdown_rx: &mut watch::Receiver<bool>, wait: Duration) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(wait) => false,
        _ = shutdown_rx.changed() => *shutdown_rx.borrow(),
    }
}

/// Pull refreshed file records (labels, URLs) after processing events.
async fn refresh_file_records<R: RemoteStore>(
    executor: &Executor<R>,
    remote: &Arc<R>,
    ids: &[String],
) {
    match remote.fetch_files(&ids.to_vec()).await {
        Ok(records) => executor.apply_file_records(&records),
        Err(err) => tracing::warn!("file record refresh failed: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_to_cap() {
        let cap = Duration::from_secs(30);
        let mut backoff = Duration::from_secs(1);
        let mut seen = Vec::new();
        for _ in 0..7 {
            seen.push(backoff.as_secs());
            backoff = next_backoff(backoff, cap);
        }
        assert_eq!(seen, vec![1, 2, 4, 8, 16, 30, 30]);
    }
}
