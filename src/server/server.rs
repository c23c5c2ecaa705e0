//! WebSocket server implementation.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::{StatusCode, header};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::protocol::{ClientMessage, ServerMessage};

use super::coordinator::{Coordinator, Event};
use super::registry::ConnectionId;
use super::timer::{IntervalScheduler, TickScheduler};

/// Run the quiz server until Ctrl-C.
pub async fn run(config: Config) -> Result<()> {
    let listener = TcpListener::bind(config.bind_address()).await?;
    serve(listener, config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

/// Accept connections on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, config: Config, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let coordinator = Coordinator::new(IntervalScheduler::new(events_tx.clone()));
    let event_loop = tokio::spawn(run_event_loop(coordinator, events_rx));

    let addr = listener.local_addr()?;
    info!(%addr, allowed_origin = ?config.client_url, "Server listening");

    let config = Arc::new(config);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tokio::spawn(handle_connection(
                        stream,
                        peer,
                        events_tx.clone(),
                        Arc::clone(&config),
                    ));
                }
                Err(e) => {
                    warn!(error = %e, "Failed to accept connection");
                }
            },
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
        }
    }

    event_loop.abort();
    Ok(())
}

/// Process events one at a time until every sender is gone.
pub async fn run_event_loop<S: TickScheduler>(
    mut coordinator: Coordinator<S>,
    mut events: mpsc::UnboundedReceiver<Event>,
) {
    while let Some(event) = events.recv().await {
        if let Err(rejection) = coordinator.handle(event) {
            debug!(%rejection, "Ignored event");
        }
    }
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    events: mpsc::UnboundedSender<Event>,
    config: Arc<Config>,
) {
    let check_origin = |req: &Request, resp: Response| -> std::result::Result<Response, ErrorResponse> {
        let origin = req
            .headers()
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok());
        if config.origin_allowed(origin) {
            Ok(resp)
        } else {
            warn!(%peer, ?origin, "Rejected connection from disallowed origin");
            let mut rejection = ErrorResponse::new(Some("Origin not allowed".to_string()));
            *rejection.status_mut() = StatusCode::FORBIDDEN;
            Err(rejection)
        }
    };

    let ws_stream = match tokio_tungstenite::accept_hdr_async(stream, check_origin).await {
        Ok(ws) => ws,
        Err(e) => {
            debug!(%peer, error = %e, "WebSocket handshake failed");
            return;
        }
    };

    let id = ConnectionId::new();
    let (ws_sender, ws_receiver) = ws_stream.split();
    let (tx, rx) = mpsc::unbounded_channel::<ServerMessage>();

    if events.send(Event::Connected { id, sender: tx }).is_err() {
        return;
    }

    let send_task = tokio::spawn(forward_outbound(id, ws_sender, rx));
    read_inbound(id, ws_receiver, &events).await;

    let _ = events.send(Event::Disconnected { id });
    send_task.abort();
}

/// Write queued server messages to the socket.
async fn forward_outbound(
    id: ConnectionId,
    mut ws_sender: SplitSink<WebSocketStream<TcpStream>, Message>,
    mut rx: mpsc::UnboundedReceiver<ServerMessage>,
) {
    while let Some(msg) = rx.recv().await {
        let json = match encode(&msg) {
            Ok(json) => json,
            Err(e) => {
                error!(connection = %id, error = %e, "Failed to serialize message");
                continue;
            }
        };
        if ws_sender.send(Message::Text(json.into())).await.is_err() {
            break;
        }
    }
}

fn encode(msg: &ServerMessage) -> Result<String> {
    Ok(serde_json::to_string(msg)?)
}

/// Parse client frames and hand them to the event loop.
async fn read_inbound(
    id: ConnectionId,
    mut ws_receiver: SplitStream<WebSocketStream<TcpStream>>,
    events: &mpsc::UnboundedSender<Event>,
) {
    while let Some(msg) = ws_receiver.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Err(e) => {
                debug!(connection = %id, error = %e, "WebSocket error");
                break;
            }
            _ => continue,
        };

        let client_msg: ClientMessage = match serde_json::from_str(text.as_str()) {
            Ok(m) => m,
            Err(e) => {
                warn!(connection = %id, error = %e, raw_message = %text.as_str(), "Failed to parse client message");
                continue;
            }
        };

        if events.send(Event::Message { id, msg: client_msg }).is_err() {
            break;
        }
    }
}
