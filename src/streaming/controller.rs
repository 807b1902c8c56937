use super::messages::{ClientMessage, ControlAction, ControlMessage, ServerEvent};
use crate::audio::decode_f32le;
use crate::engine::{generate_with_timeout, ChunkParams, InferenceEngine};
use crate::error::{AsrError, Result};
use crate::session::SessionRegistry;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

/// Settings shared by every streaming connection
#[derive(Debug, Clone)]
pub struct StreamingSettings {
    /// Model window configuration
    pub params: ChunkParams,

    /// Audio frames shorter than this are dropped
    pub min_samples: usize,

    /// Per-call inference limit (none = wait indefinitely)
    pub inference_timeout: Option<Duration>,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        Self {
            params: ChunkParams::default(),
            min_samples: 100,
            inference_timeout: None,
        }
    }
}

/// Drives one connection: buffering → inference → transcript → events
///
/// The controller always holds a session while the connection is usable. A
/// session is created on connect, replaced on `start`, and replaced again
/// right after `stop` finalizes it. Only an inference failure leaves the
/// controller without one until the next `start` or `stop`.
///
/// Dropping the controller removes its session from the registry, which also
/// covers a connection task that is aborted mid-inference.
pub struct StreamingController {
    registry: SessionRegistry,
    engine: Arc<dyn InferenceEngine>,
    settings: StreamingSettings,
    session: Option<Uuid>,
}

impl StreamingController {
    /// Create the controller for a new connection, registering its first session
    pub fn connect(
        registry: SessionRegistry,
        engine: Arc<dyn InferenceEngine>,
        settings: StreamingSettings,
    ) -> Self {
        let session = registry.create();
        info!("Connection session created: {}", session);

        Self {
            registry,
            engine,
            settings,
            session: Some(session),
        }
    }

    /// Current session id, if the connection has one
    pub fn session_id(&self) -> Option<Uuid> {
        self.session
    }

    /// Process one client frame and return the events to send back, in order
    pub async fn handle(&mut self, message: ClientMessage) -> Vec<ServerEvent> {
        match message {
            ClientMessage::Control(text) => match parse_control(&text) {
                Ok(Some(ControlAction::Start)) => vec![self.start()],
                Ok(Some(ControlAction::Stop)) => vec![self.stop().await],
                Ok(None) => {
                    debug!("Ignoring control message without a known action: {}", text);
                    Vec::new()
                }
                Err(e) => {
                    warn!("{}", e);
                    Vec::new()
                }
            },
            ClientMessage::Audio(bytes) => match decode_f32le(&bytes) {
                Ok(samples) => self.push_audio(&samples).await,
                Err(e) => {
                    warn!("Dropping audio frame: {}", e);
                    Vec::new()
                }
            },
        }
    }

    /// Discard the current session (if any) and start a fresh one
    pub fn start(&mut self) -> ServerEvent {
        if let Some(previous) = self.session.take() {
            self.registry.cleanup(&previous);
        }

        let session = self.registry.create();
        self.session = Some(session);
        info!("Session started: {}", session);

        ServerEvent::ready(session)
    }

    /// Feed samples to the current session, emitting a partial per recognized window
    ///
    /// An inference failure abandons the session and appends an error event
    /// after any partials produced by earlier windows of the same push.
    pub async fn push_audio(&mut self, samples: &[f32]) -> Vec<ServerEvent> {
        if samples.len() < self.settings.min_samples {
            trace!("Discarding short audio frame ({} samples)", samples.len());
            return Vec::new();
        }

        let mut events = Vec::new();

        if let Err(e) = self.dispatch(samples, &mut events).await {
            if let AsrError::InferenceFailure(_) = e {
                error!("Recognition failed, abandoning session: {}", e);
                self.abandon();
            } else {
                warn!("Audio rejected: {}", e);
            }
            events.push(ServerEvent::error(e.to_string()));
        }

        events
    }

    async fn dispatch(&self, samples: &[f32], events: &mut Vec<ServerEvent>) -> Result<()> {
        let id = self.session.ok_or(AsrError::NoActiveSession)?;
        let session = self.registry.get(&id)?;
        let mut session = session.lock().await;

        let windows = session.audio.push(samples);
        for window in windows {
            let cache = std::mem::take(&mut session.cache);
            let generation = generate_with_timeout(
                self.engine.as_ref(),
                &window,
                cache,
                false,
                &self.settings.params,
                self.settings.inference_timeout,
            )
            .await?;

            session.cache = generation.cache;

            let Some(fragment) = generation.text else {
                continue;
            };
            if let Some(update) = session.transcript.append(&fragment) {
                debug!(
                    "Session {} chunk {}: {}",
                    id, update.chunk_count, update.chunk
                );
                events.push(ServerEvent::partial(update.text, update.chunk));
            }
        }

        Ok(())
    }

    /// Finalize the current session and replace it with a fresh one
    ///
    /// The returned event carries the full transcript, which is empty when
    /// the connection had no live session.
    pub async fn stop(&mut self) -> ServerEvent {
        let text = match self.session {
            Some(id) => {
                let text = self.finalize(&id).await;
                self.registry.cleanup(&id);
                info!("Session stopped: {}", id);
                text
            }
            None => String::new(),
        };

        let next = self.registry.create();
        self.session = Some(next);

        ServerEvent::final_result(text)
    }

    async fn finalize(&self, id: &Uuid) -> String {
        let session = match self.registry.get(id) {
            Ok(session) => session,
            Err(e) => {
                debug!("Nothing to finalize: {}", e);
                return String::new();
            }
        };
        let mut session = session.lock().await;

        let remainder = session.audio.take_remainder();
        if !remainder.is_empty() {
            let cache = std::mem::take(&mut session.cache);
            match generate_with_timeout(
                self.engine.as_ref(),
                &remainder,
                cache,
                true,
                &self.settings.params,
                self.settings.inference_timeout,
            )
            .await
            {
                Ok(generation) => {
                    session.cache = generation.cache;
                    if let Some(fragment) = generation.text {
                        session.transcript.append(&fragment);
                    }
                }
                Err(e) => warn!("Final flush failed for session {}: {}", id, e),
            }
        }

        self.registry.record_request();

        let text = session.transcript.text().to_string();
        info!(
            "Session finalized: {} ({} chunks): {}",
            id,
            session.chunk_count(),
            preview(&text)
        );

        text
    }

    fn abandon(&mut self) {
        if let Some(id) = self.session.take() {
            self.registry.cleanup(&id);
        }
    }

    /// Tear down on connection termination
    pub fn close(mut self) {
        if let Some(id) = self.session {
            info!("Connection closed, releasing session {}", id);
        }
        self.abandon();
    }
}

impl Drop for StreamingController {
    fn drop(&mut self) {
        self.abandon();
    }
}

fn parse_control(text: &str) -> Result<Option<ControlAction>> {
    let message: ControlMessage = serde_json::from_str(text)
        .map_err(|e| AsrError::MalformedControlMessage(e.to_string()))?;

    Ok(message.action())
}

fn preview(text: &str) -> String {
    text.chars().take(100).collect()
}
