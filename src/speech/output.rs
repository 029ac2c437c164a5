//! Audio output for synthesized clips.
//!
//! ```text
//! SpeechPlayer ──play(clip)──▶ AudioOutput ──▶ device
//!       ▲                         │
//!       └── PlaybackHandle ◀──────┘  stop() / completion
//! ```
//!
//! A [`PlaybackHandle`] is the only way to reach a playing clip.  Stopping it
//! (or dropping it) ends playback; its completion resolves exactly once.

use std::io::Cursor;
use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use thiserror::Error;
use tokio::sync::oneshot;

use super::remote::AudioClip;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("could not decode audio: {0}")]
    Decode(String),

    #[error("audio device error: {0}")]
    Device(String),

    /// Playback was stopped before the clip finished.
    #[error("playback stopped")]
    Stopped,
}

/// Plays clips on some output device.
pub trait AudioOutput: Send + Sync {
    /// Begin playing `clip`.  Returns once playback has started.
    fn play(&self, clip: AudioClip) -> Result<PlaybackHandle, PlaybackError>;
}

// ---------------------------------------------------------------------------
// PlaybackHandle
// ---------------------------------------------------------------------------

/// Controller side of one playing clip.
pub struct PlaybackHandle {
    stop: Option<oneshot::Sender<()>>,
    completion: Option<oneshot::Receiver<Result<(), PlaybackError>>>,
}

/// Device side of one playing clip: watch `stop`, report on `finished`.
pub struct PlaybackSignals {
    pub stop: oneshot::Receiver<()>,
    pub finished: oneshot::Sender<Result<(), PlaybackError>>,
}

/// Resolves once the clip has finished or been stopped.
pub struct PlaybackCompletion {
    rx: oneshot::Receiver<Result<(), PlaybackError>>,
}

impl PlaybackHandle {
    /// Create a connected handle/signals pair for an [`AudioOutput`] impl.
    pub fn channel() -> (PlaybackHandle, PlaybackSignals) {
        let (stop_tx, stop_rx) = oneshot::channel();
        let (finished_tx, finished_rx) = oneshot::channel();
        (
            PlaybackHandle {
                stop: Some(stop_tx),
                completion: Some(finished_rx),
            },
            PlaybackSignals {
                stop: stop_rx,
                finished: finished_tx,
            },
        )
    }

    /// Stop playback.  Idempotent.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop.take() {
            let _ = tx.send(());
        }
    }

    /// Take the completion future.  Returns `None` after the first call.
    pub fn take_completion(&mut self) -> Option<PlaybackCompletion> {
        self.completion.take().map(|rx| PlaybackCompletion { rx })
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl PlaybackCompletion {
    /// A device side that went away without reporting counts as stopped.
    pub async fn wait(self) -> Result<(), PlaybackError> {
        self.rx.await.unwrap_or(Err(PlaybackError::Stopped))
    }
}

// ---------------------------------------------------------------------------
// RodioOutput
// ---------------------------------------------------------------------------

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Default-device output through rodio.
///
/// `rodio::OutputStream` is not `Send`, so it lives on a dedicated thread
/// for as long as this value exists; only the `Send` handle is kept here.
pub struct RodioOutput {
    handle: OutputStreamHandle,
    _keepalive: std_mpsc::Sender<()>,
}

impl RodioOutput {
    pub fn open() -> Result<Self, PlaybackError> {
        let (ready_tx, ready_rx) = std_mpsc::channel();
        let (keepalive_tx, keepalive_rx) = std_mpsc::channel::<()>();

        thread::Builder::new()
            .name("audio-output".into())
            .spawn(move || match OutputStream::try_default() {
                Ok((_stream, handle)) => {
                    let _ = ready_tx.send(Ok(handle));
                    // Returns Err once every sender is dropped.
                    let _ = keepalive_rx.recv();
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(PlaybackError::Device(e.to_string())));
                }
            })
            .map_err(|e| PlaybackError::Device(e.to_string()))?;

        let handle = ready_rx
            .recv()
            .map_err(|e| PlaybackError::Device(e.to_string()))??;

        log::info!("audio output: default device opened");
        Ok(Self {
            handle,
            _keepalive: keepalive_tx,
        })
    }
}

impl AudioOutput for RodioOutput {
    fn play(&self, clip: AudioClip) -> Result<PlaybackHandle, PlaybackError> {
        let source = Decoder::new(Cursor::new(clip.bytes))
            .map_err(|e| PlaybackError::Decode(e.to_string()))?;
        let sink = Sink::try_new(&self.handle).map_err(|e| PlaybackError::Device(e.to_string()))?;
        sink.append(source);

        let (handle, mut signals) = PlaybackHandle::channel();
        thread::Builder::new()
            .name("audio-playback".into())
            .spawn(move || {
                let result = loop {
                    match signals.stop.try_recv() {
                        Ok(()) | Err(oneshot::error::TryRecvError::Closed) => {
                            sink.stop();
                            break Err(PlaybackError::Stopped);
                        }
                        Err(oneshot::error::TryRecvError::Empty) => {}
                    }
                    if sink.empty() {
                        break Ok(());
                    }
                    thread::sleep(POLL_INTERVAL);
                };
                let _ = signals.finished.send(result);
            })
            .map_err(|e| PlaybackError::Device(e.to_string()))?;

        Ok(handle)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
