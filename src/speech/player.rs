//! Single-flight speech player.
//!
//! [`SpeechPlayer`] decides how each reply is voiced and owns the one
//! playback handle.  Network synthesis, playback and local speech run in
//! spawned tasks that report back as [`PlayerEvent`]s; the owner feeds those
//! into [`SpeechPlayer::handle_event`] from its event loop.
//!
//! ```text
//! speak(text)
//!   ├─ within cooldown ──────────────────────────────▶ local engine
//!   └─ otherwise ─▶ wait pre-send delay ─▶ /api/tts
//!                      ├─ clip   ─▶ stop old handle ─▶ play ─▶ PlaybackEnded
//!                      └─ error  ─▶ local engine (or abandon)
//! ```
//!
//! Every event carries the epoch it was started under.  `interrupt` bumps the
//! epoch, so results of cancelled work arrive as [`PlayerUpdate::Stale`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::capability::Capability;
use crate::config::SpeechConfig;
use crate::language::Language;

use super::local::{LocalSynthesisError, LocalSynthesizer};
use super::output::{AudioOutput, PlaybackError, PlaybackHandle};
use super::remote::{AudioClip, SpeechSynthesizer, SynthesisError};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// How an utterance is being voiced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechRoute {
    Remote,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakOutcome {
    Started(SpeechRoute),
    /// Another utterance is still in flight.
    Rejected,
    /// Neither audio output nor a local engine exists.
    Unavailable,
}

/// How a finished utterance ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechEnd {
    Completed,
    Failed,
    /// Remote synthesis failed and no local engine could take over.
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerUpdate {
    /// The event belongs to cancelled work.
    Stale,
    InProgress,
    Finished(SpeechEnd),
}

/// Results posted by the player's background tasks.
#[derive(Debug)]
pub enum PlayerEvent {
    Synthesized {
        epoch: u64,
        result: Result<AudioClip, SynthesisError>,
    },
    PlaybackEnded {
        epoch: u64,
        playback: u64,
        result: Result<(), PlaybackError>,
    },
    LocalSpeechEnded {
        epoch: u64,
        result: Result<(), LocalSynthesisError>,
    },
}

impl PlayerEvent {
    fn epoch(&self) -> u64 {
        match self {
            PlayerEvent::Synthesized { epoch, .. }
            | PlayerEvent::PlaybackEnded { epoch, .. }
            | PlayerEvent::LocalSpeechEnded { epoch, .. } => *epoch,
        }
    }
}

struct Utterance {
    text: String,
    language: Language,
    route: SpeechRoute,
}

// ---------------------------------------------------------------------------
// SpeechPlayer
// ---------------------------------------------------------------------------

pub struct SpeechPlayer {
    remote: Arc<dyn SpeechSynthesizer>,
    local: Capability<Arc<dyn LocalSynthesizer>>,
    output: Capability<Arc<dyn AudioOutput>>,
    cooldown: Duration,
    pre_send_delay: Duration,

    active: Option<Utterance>,
    epoch: u64,
    playback: Option<PlaybackHandle>,
    playback_seq: u64,
    task: Option<JoinHandle<()>>,
    watcher: Option<JoinHandle<()>>,
    last_completed: Option<Instant>,

    events_tx: mpsc::UnboundedSender<PlayerEvent>,
    events_rx: mpsc::UnboundedReceiver<PlayerEvent>,
}

impl SpeechPlayer {
    pub fn new(
        remote: Arc<dyn SpeechSynthesizer>,
        local: Capability<Arc<dyn LocalSynthesizer>>,
        output: Capability<Arc<dyn AudioOutput>>,
        config: &SpeechConfig,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            remote,
            local,
            output,
            cooldown: config.cooldown(),
            pre_send_delay: config.pre_send_delay(),
            active: None,
            epoch: 0,
            playback: None,
            playback_seq: 0,
            task: None,
            watcher: None,
            last_completed: None,
            events_tx,
            events_rx,
        }
    }

    /// `true` from a successful `speak` until the utterance finishes or is
    /// interrupted.
    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    fn in_cooldown(&self, now: Instant) -> bool {
        self.last_completed
            .is_some_and(|at| now.saturating_duration_since(at) < self.cooldown)
    }

    /// Start voicing `text`.  Rejected while another utterance is in flight.
    pub fn speak(&mut self, text: &str, language: Language) -> SpeakOutcome {
        if self.active.is_some() {
            log::debug!("player: busy, rejecting new utterance");
            return SpeakOutcome::Rejected;
        }

        let route = if self.in_cooldown(Instant::now()) && self.local.is_available() {
            SpeechRoute::Local
        } else if self.output.is_available() {
            SpeechRoute::Remote
        } else if self.local.is_available() {
            SpeechRoute::Local
        } else {
            log::warn!("player: no audio output and no local engine; cannot speak");
            return SpeakOutcome::Unavailable;
        };

        self.epoch += 1;
        self.active = Some(Utterance {
            text: text.to_string(),
            language,
            route,
        });

        match route {
            SpeechRoute::Remote => self.spawn_remote(),
            SpeechRoute::Local => self.spawn_local(),
        }
        log::debug!("player: speaking via {route:?} (epoch {})", self.epoch);
        SpeakOutcome::Started(route)
    }

    fn spawn_remote(&mut self) {
        let Some(utterance) = self.active.as_ref() else {
            return;
        };
        let remote = Arc::clone(&self.remote);
        let tx = self.events_tx.clone();
        let epoch = self.epoch;
        let delay = self.pre_send_delay;
        let text = utterance.text.clone();
        let language = utterance.language;

        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let result = remote.synthesize(&text, language).await;
            let _ = tx.send(PlayerEvent::Synthesized { epoch, result });
        }));
    }

    fn spawn_local(&mut self) {
        let (Some(utterance), Capability::Available(local)) = (self.active.as_mut(), &self.local)
        else {
            return;
        };
        utterance.route = SpeechRoute::Local;
        let local = Arc::clone(local);
        let tx = self.events_tx.clone();
        let epoch = self.epoch;
        let text = utterance.text.clone();
        let locale = utterance.language.locale_tag();

        self.task = Some(tokio::spawn(async move {
            let result = local.speak(&text, locale).await;
            let _ = tx.send(PlayerEvent::LocalSpeechEnded { epoch, result });
        }));
    }

    /// Play a clip on the output, stopping and releasing any held handle
    /// first.  Completion is reported as [`PlayerEvent::PlaybackEnded`].
    pub fn play_clip(&mut self, clip: AudioClip) -> Result<(), PlaybackError> {
        let Capability::Available(output) = &self.output else {
            return Err(PlaybackError::Device("no audio output".into()));
        };

        if let Some(mut previous) = self.playback.take() {
            previous.stop();
        }
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }

        let mut handle = output.play(clip)?;
        self.playback_seq += 1;

        if let Some(completion) = handle.take_completion() {
            let tx = self.events_tx.clone();
            let epoch = self.epoch;
            let playback = self.playback_seq;
            self.watcher = Some(tokio::spawn(async move {
                let result = completion.wait().await;
                let _ = tx.send(PlayerEvent::PlaybackEnded {
                    epoch,
                    playback,
                    result,
                });
            }));
        }
        self.playback = Some(handle);
        Ok(())
    }

    /// Apply a background result.
    pub fn handle_event(&mut self, event: PlayerEvent) -> PlayerUpdate {
        if event.epoch() != self.epoch || self.active.is_none() {
            return PlayerUpdate::Stale;
        }

        match event {
            PlayerEvent::Synthesized { result, .. } => {
                self.task = None;
                self.last_completed = Some(Instant::now());
                match result {
                    Ok(clip) => match self.play_clip(clip) {
                        Ok(()) => PlayerUpdate::InProgress,
                        Err(e) => {
                            log::warn!("player: playback failed to start: {e}");
                            self.fall_back_to_local()
                        }
                    },
                    Err(e) if e.is_rate_limited() => {
                        log::warn!("player: speech service rate limited; using local engine");
                        self.fall_back_to_local()
                    }
                    Err(e) => {
                        log::warn!("player: remote synthesis failed: {e}");
                        self.fall_back_to_local()
                    }
                }
            }
            PlayerEvent::PlaybackEnded {
                playback, result, ..
            } => {
                if playback != self.playback_seq {
                    return PlayerUpdate::Stale;
                }
                self.watcher = None;
                match result {
                    Ok(()) => self.finish(SpeechEnd::Completed),
                    Err(e) => {
                        log::warn!("player: playback ended early: {e}");
                        self.finish(SpeechEnd::Failed)
                    }
                }
            }
            PlayerEvent::LocalSpeechEnded { result, .. } => {
                self.task = None;
                match result {
                    Ok(()) => self.finish(SpeechEnd::Completed),
                    Err(e) => {
                        log::warn!("player: local speech failed: {e}");
                        self.finish(SpeechEnd::Failed)
                    }
                }
            }
        }
    }

    fn fall_back_to_local(&mut self) -> PlayerUpdate {
        if self.local.is_available() {
            self.spawn_local();
            PlayerUpdate::InProgress
        } else {
            self.finish(SpeechEnd::Abandoned)
        }
    }

    fn finish(&mut self, end: SpeechEnd) -> PlayerUpdate {
        self.release();
        log::debug!("player: utterance finished ({end:?})");
        PlayerUpdate::Finished(end)
    }

    fn release(&mut self) {
        self.active = None;
        if let Some(mut handle) = self.playback.take() {
            handle.stop();
        }
        self.last_completed = Some(Instant::now());
    }

    /// Cancel the in-flight utterance: pending synthesis, playback and local
    /// speech.  Returns `false` when nothing was in flight.
    pub fn interrupt(&mut self) -> bool {
        let Some(utterance) = self.active.as_ref() else {
            return false;
        };
        let route = utterance.route;

        self.epoch += 1;
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
        if route == SpeechRoute::Local {
            if let Capability::Available(local) = &self.local {
                local.cancel();
            }
        }
        self.release();
        log::debug!("player: interrupted");
        true
    }

    /// Next background result.  Pends while nothing is outstanding.
    pub async fn next_event(&mut self) -> Option<PlayerEvent> {
        self.events_rx.recv().await
    }
}

impl Drop for SpeechPlayer {
    fn drop(&mut self) {
        self.interrupt();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
