use super::state::AppState;
use crate::streaming::{ClientMessage, StreamingController};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// GET /ws/asr
/// Upgrade to a streaming recognition connection
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (sender, receiver) = socket.split();
    run_connection(sender, receiver, state).await;
}

/// Run one connection until the client goes away
///
/// Frames are read here and handed to a processor task that owns the
/// controller, so frames of one connection are handled strictly in order.
/// When the client disconnects the processor is aborted, even mid-inference;
/// dropping the controller releases its session.
pub async fn run_connection<S, R>(mut sender: S, mut receiver: R, state: AppState)
where
    S: Sink<Message> + Unpin + Send + 'static,
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let (frame_tx, mut frame_rx) = mpsc::channel::<ClientMessage>(64);

    let mut controller = StreamingController::connect(
        state.registry.clone(),
        state.engine.clone(),
        state.settings.clone(),
    );
    let connection = controller.session_id();
    info!("Client connected (session {:?})", connection);

    let processor = tokio::spawn(async move {
        while let Some(frame) = frame_rx.recv().await {
            for event in controller.handle(frame).await {
                let payload = match serde_json::to_string(&event) {
                    Ok(payload) => payload,
                    Err(e) => {
                        error!("Failed to serialize websocket event: {}", e);
                        continue;
                    }
                };
                if sender.send(Message::Text(payload)).await.is_err() {
                    debug!("Client stopped receiving, ending processor");
                    return;
                }
            }
        }
        controller.close();
    });

    while let Some(message) = receiver.next().await {
        let frame = match message {
            Ok(Message::Text(text)) => ClientMessage::Control(text),
            Ok(Message::Binary(data)) => ClientMessage::Audio(data),
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            Err(e) => {
                warn!("Websocket receive error: {}", e);
                break;
            }
        };

        if frame_tx.send(frame).await.is_err() {
            break;
        }
    }

    drop(frame_tx);
    processor.abort();
    if let Err(e) = processor.await {
        if e.is_panic() {
            error!("Connection processor panicked: {}", e);
        }
    }

    info!(
        "Client disconnected, {} sessions active",
        state.registry.stats().active_sessions
    );
}
