//! Transports
//!
//! How a request reaches the engine and how its reply comes back.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};

use crate::engine::Engine;
use crate::error::{QuillError, Result};
use crate::protocol::{
    decode_reply, decode_request, encode_reply, encode_request, ErrorCondition, Reply, Request,
    RequestType,
};

/// Sends a request and waits for its reply
pub trait CommClient: Send + Sync {
    fn send(&self, request: Request) -> Result<Reply>;
}

// =============================================================================
// Direct
// =============================================================================

/// Calls the engine on the caller's thread
#[derive(Clone)]
pub struct DirectCommClient {
    engine: Arc<Engine>,
}

impl DirectCommClient {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

impl CommClient for DirectCommClient {
    fn send(&self, request: Request) -> Result<Reply> {
        Ok(self.engine.handle(request))
    }
}

// =============================================================================
// Channel + dispatcher thread
// =============================================================================

enum Message {
    /// An encoded request frame and where to send the encoded reply
    Request(Vec<u8>, Sender<Vec<u8>>),
    Shutdown,
}

/// A single thread that owns request handling for an engine
///
/// Requests are handled one at a time in arrival order.
pub struct Dispatcher {
    sender: Sender<Message>,
    handle: Option<JoinHandle<()>>,
}

impl Dispatcher {
    /// Start the dispatcher thread
    pub fn spawn(engine: Arc<Engine>) -> Result<Self> {
        let (sender, receiver) = channel::unbounded();

        let handle = thread::Builder::new()
            .name("quill-dispatcher".to_string())
            .spawn(move || Self::run(engine, receiver))?;

        Ok(Self {
            sender,
            handle: Some(handle),
        })
    }

    /// A client sending to this dispatcher
    pub fn client(&self) -> ChannelCommClient {
        ChannelCommClient {
            sender: self.sender.clone(),
        }
    }

    /// Stop the thread after the requests already queued, and wait for it
    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        // Fails only if the thread already exited
        let _ = self.sender.send(Message::Shutdown);

        handle
            .join()
            .map_err(|_| QuillError::Transport("dispatcher thread panicked".to_string()))
    }

    fn run(engine: Arc<Engine>, receiver: Receiver<Message>) {
        tracing::debug!("Dispatcher thread started");

        for message in receiver.iter() {
            let (frame, reply_to) = match message {
                Message::Request(frame, reply_to) => (frame, reply_to),
                Message::Shutdown => break,
            };

            let reply = match decode_request(&frame) {
                Ok(request) => engine.handle(request),
                Err(e) => {
                    tracing::warn!("Undecodable request frame: {}", e);
                    Self::decode_failure(&frame, &e)
                }
            };

            match encode_reply(&reply) {
                // The caller may have given up waiting
                Ok(bytes) => {
                    let _ = reply_to.send(bytes);
                }
                Err(e) => tracing::warn!("Failed to encode reply: {}", e),
            }
        }

        tracing::debug!("Dispatcher thread stopped");
    }

    /// Reply for a frame that could not be decoded, shaped by its kind byte
    fn decode_failure(frame: &[u8], err: &QuillError) -> Reply {
        let condition = ErrorCondition::from(err);
        match frame.first().copied().and_then(RequestType::from_u8) {
            Some(RequestType::Get) | Some(RequestType::GetRange) => Reply::get_failed(0, condition),
            _ => Reply::write(0, condition),
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!("Dispatcher shutdown failed: {}", e);
        }
    }
}

/// Sends encoded frames to a [`Dispatcher`]
#[derive(Clone)]
pub struct ChannelCommClient {
    sender: Sender<Message>,
}

impl ChannelCommClient {
    /// Send a raw frame and return the raw reply frame
    pub fn send_frame(&self, frame: Vec<u8>) -> Result<Vec<u8>> {
        let (reply_to, reply_from) = channel::bounded(1);

        self.sender
            .send(Message::Request(frame, reply_to))
            .map_err(|_| QuillError::Transport("dispatcher has shut down".to_string()))?;

        reply_from
            .recv()
            .map_err(|_| QuillError::Transport("dispatcher dropped the request".to_string()))
    }
}

impl CommClient for ChannelCommClient {
    fn send(&self, request: Request) -> Result<Reply> {
        let frame = encode_request(&request)?;
        decode_reply(&self.send_frame(frame)?)
    }
}
