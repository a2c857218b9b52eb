//! TCP listener accepting MLLP-framed HL7 messages

use super::codec::{encode_frame, FrameDecoder};
use crate::config::ListenerConfig;
use crate::core::pipeline::Router;
use crate::domain::{Result, TriageError};
use crate::hl7::{Acknowledgment, Message};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;

const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Bound MLLP listener
pub struct MllpListener {
    listener: TcpListener,
    max_frame_bytes: usize,
}

impl MllpListener {
    /// Binds to `listener.bind_address`
    pub async fn bind(config: &ListenerConfig) -> Result<Self> {
        let listener = TcpListener::bind(&config.bind_address).await.map_err(|e| {
            TriageError::Transport(format!("Failed to bind {}: {}", config.bind_address, e))
        })?;

        Ok(Self {
            listener,
            max_frame_bytes: config.max_frame_bytes,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until the shutdown signal fires
    ///
    /// Open connections finish the frame they are handling and close. Every
    /// `Router` clone held by this listener is dropped before returning.
    pub async fn serve(self, router: Router, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let addr = self.local_addr()?;
        tracing::info!(address = %addr, "MLLP listener accepting connections");

        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tracing::debug!(peer = %peer, "Connection accepted");
                        connections.spawn(handle_connection(
                            stream,
                            peer,
                            router.clone(),
                            self.max_frame_bytes,
                            shutdown.clone(),
                        ));
                    }
                    Err(e) => tracing::warn!(error = %e, "Failed to accept connection"),
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }

            while let Some(joined) = connections.try_join_next() {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "Connection task panicked");
                }
            }
        }

        tracing::info!(open = connections.len(), "MLLP listener stopping");
        drop(router);

        while let Some(joined) = connections.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Connection task panicked");
            }
        }

        Ok(())
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    router: Router,
    max_frame_bytes: usize,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut decoder = FrameDecoder::new(max_frame_bytes);
    let mut chunk = vec![0u8; READ_CHUNK_BYTES];

    loop {
        loop {
            match decoder.next_frame() {
                Ok(Some(frame)) => {
                    let ack = respond(&router, &frame).await;
                    if let Err(e) = stream.write_all(&encode_frame(&ack)).await {
                        tracing::warn!(peer = %peer, error = %e, "Failed to write acknowledgment");
                        return;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(peer = %peer, error = %e, "Closing connection");
                    return;
                }
            }
        }

        let read = tokio::select! {
            read = stream.read(&mut chunk) => read,
            _ = shutdown.changed() => {
                tracing::debug!(peer = %peer, "Closing connection for shutdown");
                return;
            }
        };

        match read {
            Ok(0) => {
                tracing::debug!(peer = %peer, "Connection closed by peer");
                return;
            }
            Ok(n) => decoder.extend(&chunk[..n]),
            Err(e) => {
                tracing::warn!(peer = %peer, error = %e, "Read failed");
                return;
            }
        }
    }
}

/// Runs one frame through the router and returns the encoded acknowledgment
///
/// Unparsable frames get `AR`, pipeline errors get `AE`.
pub async fn respond(router: &Router, frame: &[u8]) -> String {
    let Ok(text) = std::str::from_utf8(frame) else {
        return Acknowledgment::reject_unparsable("Frame is not valid UTF-8").encode();
    };

    let message = match Message::parse(text) {
        Ok(message) => Arc::new(message),
        Err(e) => {
            tracing::warn!(error = %e, "Rejecting unparsable message");
            return Acknowledgment::reject_unparsable(&e.to_string()).encode();
        }
    };

    match router.ingest(message.clone()).await {
        Ok(outcome) => outcome.into_ack().encode(),
        Err(e) => {
            tracing::error!(error = %e, "Ingest failed");
            Acknowledgment::error(&message, &e.to_string()).encode()
        }
    }
}
