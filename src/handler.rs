//! WebSocket connection handler
//!
//! Handles individual client connections: WebSocket handshake,
//! frame decoding, and bidirectional communication with the ChatServer.

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, DecodeError};
use crate::message::{decode, encode, ClientMessage, ServerMessage};
use crate::server::ServerCommand;
use crate::types::ConnectionId;

/// Accept connections forever, spawning a handler task for each
///
/// `outbound_buffer` bounds each connection's queue of frames waiting to be written.
pub async fn serve(
    listener: TcpListener,
    cmd_tx: mpsc::Sender<ServerCommand>,
    outbound_buffer: usize,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let cmd_tx = cmd_tx.clone();

                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, cmd_tx, outbound_buffer).await {
                        error!("Connection handler error: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

/// Handle a new TCP connection
///
/// Performs WebSocket handshake, sets up bidirectional communication,
/// and manages the connection lifecycle.
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<ServerCommand>,
    outbound_buffer: usize,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    debug!("New TCP connection from {}", peer_addr);

    // WebSocket handshake
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let connection_id = ConnectionId::new();
    info!("Connection {} established from {}", connection_id, peer_addr);

    // Channel for server -> client frames; a reader that falls this far behind loses frames
    let (frame_tx, mut frame_rx) = mpsc::channel::<String>(outbound_buffer.max(1));
    let (replay_tx, replay_rx) = oneshot::channel();

    // Register with ChatServer; it answers with the users and history to replay
    if cmd_tx
        .send(ServerCommand::Connect {
            connection_id,
            sender: frame_tx.clone(),
            replay: replay_tx,
        })
        .await
        .is_err()
    {
        error!("Failed to register connection {} - server closed", connection_id);
        return Err(AppError::ChannelSend);
    }
    let Ok(replay) = replay_rx.await else {
        error!("No replay for connection {} - server closed", connection_id);
        return Err(AppError::ChannelSend);
    };

    let cmd_tx_read = cmd_tx.clone();

    // Spawn read task (WebSocket -> ServerCommand)
    let read_task = tokio::spawn(async move {
        while let Some(msg_result) = ws_receiver.next().await {
            match msg_result {
                Ok(Message::Text(text)) => {
                    let cmd = match decode(&text) {
                        Ok(ClientMessage::NewUser { data }) => ServerCommand::NewUser {
                            connection_id,
                            candidate: data,
                        },
                        Ok(ClientMessage::Message { data, user_id }) => ServerCommand::Message {
                            connection_id,
                            body: data,
                            user_id,
                        },
                        Ok(ClientMessage::Unknown) => {
                            debug!("Ignoring unknown frame from {}", connection_id);
                            continue;
                        }
                        Err(e) => {
                            warn!("Invalid JSON from {}: {}", connection_id, e);
                            if let Err(e) = queue_decode_error(&frame_tx, e) {
                                warn!("Error reply to {} failed: {}", connection_id, e);
                            }
                            continue;
                        }
                    };
                    if cmd_tx_read.send(cmd).await.is_err() {
                        debug!("Server closed, ending read task for {}", connection_id);
                        break;
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("Connection {} sent close frame", connection_id);
                    break;
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // Pong replies are handled automatically by tungstenite
                }
                Ok(_) => {
                    // Binary or raw frames - ignore
                }
                Err(e) => {
                    error!("WebSocket error for {}: {}", connection_id, e);
                    break;
                }
            }
        }
        debug!("Read task ended for {}", connection_id);
    });

    // Spawn write task (replay, then queued frames -> WebSocket)
    let write_task = tokio::spawn(async move {
        for frame in replay {
            if ws_sender.send(Message::Text(frame.into())).await.is_err() {
                debug!("WebSocket send failed during replay, ending write task");
                return;
            }
        }
        while let Some(frame) = frame_rx.recv().await {
            if ws_sender.send(Message::Text(frame.into())).await.is_err() {
                debug!("WebSocket send failed, ending write task");
                break;
            }
        }
        debug!("Write task ended for connection");

        let _ = ws_sender.close().await;
    });

    // Wait for either task to complete
    let read_abort = read_task.abort_handle();
    let write_abort = write_task.abort_handle();
    tokio::select! {
        _ = read_task => {
            debug!("Read task completed for {}", connection_id);
            write_abort.abort();
        }
        _ = write_task => {
            debug!("Write task completed for {}", connection_id);
            read_abort.abort();
        }
    }

    let _ = cmd_tx
        .send(ServerCommand::Disconnect { connection_id })
        .await;

    info!("Connection {} closed", connection_id);

    Ok(())
}

/// Queue the `error` answer to a malformed frame on the connection's own queue
fn queue_decode_error(frame_tx: &mpsc::Sender<String>, err: DecodeError) -> Result<(), AppError> {
    let frame = encode(&ServerMessage::from(err))?;
    frame_tx.try_send(frame).map_err(|_| AppError::ChannelSend)
}
