//! Conversation orchestrator: the turn-taking state machine.
//!
//! [`Assistant`] owns every piece of conversation state and runs as a single
//! tokio task.  It reacts to one event at a time:
//!
//! ```text
//! AssistantCommand (widget, hotkeys) ─┐
//! RecognitionEvent (capture)         ─┤
//! ReplyReady       (reply task)      ─┼─▶ Assistant::handle ─▶ SharedStatus
//! PlayerEvent      (speech tasks)    ─┤
//! IdleTick         (interval)        ─┘
//! ```
//!
//! # Turn flow
//!
//! ```text
//! utterance ─▶ Generating ──spawn(generate_reply)──▶ ReplyReady
//!           ─▶ stop capture ─▶ Speaking ──player──▶ Finished
//!           ─▶ Idle ─▶ listen again (unless paused)
//! ```
//!
//! Reply tasks are tagged with the epoch they were started under; pausing
//! bumps the epoch, so a reply that arrives afterwards is dropped.

use std::mem;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::capture::{CaptureController, CaptureSignal, RecognitionError};
use crate::language::Language;
use crate::reply::ReplyClient;
use crate::speech::{PlayerUpdate, SpeakOutcome, SpeechPlayer};

use super::event::{AssistantCommand, Event};
use super::state::{lock_status, AssistantState, ConversationTurn, SharedStatus};
use super::supervisor::Supervisor;

// ---------------------------------------------------------------------------
// Assistant
// ---------------------------------------------------------------------------

/// Drives the conversational loop.
///
/// Create with [`Assistant::new`], then spawn [`run`](Self::run).
///
/// ```rust,no_run
/// use barq_voice::assistant::{new_shared_status, Assistant, AssistantCommand, Supervisor};
/// use barq_voice::capture::CaptureController;
/// use barq_voice::config::AssistantConfig;
/// use barq_voice::reply::{HttpReplyGenerator, ReplyClient};
/// use barq_voice::speech::{HttpSpeechSynthesizer, SpeechPlayer};
/// use barq_voice::Capability;
/// use std::sync::Arc;
///
/// # async fn example() {
/// let config = AssistantConfig::default();
/// let status = new_shared_status(config.language);
/// let player = SpeechPlayer::new(
///     Arc::new(HttpSpeechSynthesizer::from_config(&config.backend, &config.speech)),
///     Capability::Unavailable,
///     Capability::Unavailable,
///     &config.speech,
/// );
/// let assistant = Assistant::new(
///     status,
///     config.language,
///     CaptureController::new(Capability::Unavailable),
///     ReplyClient::new(HttpReplyGenerator::from_config(&config.backend)),
///     player,
///     Supervisor::from_config(&config.supervisor),
/// );
///
/// let (tx, rx) = tokio::sync::mpsc::channel(16);
/// tokio::spawn(assistant.run(rx));
/// tx.send(AssistantCommand::SubmitText("What services do you offer?".into()))
///     .await
///     .unwrap();
/// # }
/// ```
pub struct Assistant {
    status: SharedStatus,
    language: Language,
    state: AssistantState,

    capture: CaptureController,
    replies: ReplyClient,
    player: SpeechPlayer,
    supervisor: Supervisor,

    turn: Option<ConversationTurn>,
    first_turn_pending: bool,
    epoch: u64,
    reply_task: Option<JoinHandle<()>>,
    reply_tx: mpsc::UnboundedSender<(u64, String)>,
    reply_rx: mpsc::UnboundedReceiver<(u64, String)>,

    last_activity: Instant,
    ticker: Interval,
}

impl Assistant {
    pub fn new(
        status: SharedStatus,
        language: Language,
        capture: CaptureController,
        replies: ReplyClient,
        player: SpeechPlayer,
        supervisor: Supervisor,
    ) -> Self {
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        let period = supervisor.check_interval();
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let assistant = Self {
            status,
            language,
            state: AssistantState::Idle,
            capture,
            replies,
            player,
            supervisor,
            turn: None,
            first_turn_pending: true,
            epoch: 0,
            reply_task: None,
            reply_tx,
            reply_rx,
            last_activity: Instant::now(),
            ticker,
        };
        assistant.sync_status();
        assistant
    }

    pub fn state(&self) -> AssistantState {
        self.state
    }

    pub fn language(&self) -> Language {
        self.language
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run until `commands` is closed, then release everything.
    pub async fn run(mut self, mut commands: mpsc::Receiver<AssistantCommand>) {
        log::info!("assistant: ready ({})", self.language.code());
        while let Some(event) = self.next_event(&mut commands).await {
            self.handle(event);
        }
        log::info!("assistant: command channel closed, shutting down");
        self.shutdown();
    }

    /// Wait for whichever input is ready first.  `None` once the command
    /// channel is closed.
    pub(crate) async fn next_event(
        &mut self,
        commands: &mut mpsc::Receiver<AssistantCommand>,
    ) -> Option<Event> {
        let event = tokio::select! {
            command = commands.recv() => Event::Command(command?),
            Some((epoch, text)) = self.reply_rx.recv() => Event::ReplyReady { epoch, text },
            recognition = self.capture.next_event() => Event::Recognition(recognition),
            Some(player) = self.player.next_event() => Event::Player(player),
            _ = self.ticker.tick() => Event::IdleTick,
        };
        Some(event)
    }

    pub(crate) fn handle(&mut self, event: Event) {
        match event {
            Event::Command(command) => self.handle_command(command),
            Event::Recognition(recognition) => match self.capture.handle_event(recognition) {
                CaptureSignal::Utterance(text) => self.accept_utterance(&text),
                CaptureSignal::Stopped(fault) => self.capture_stopped(fault),
                CaptureSignal::Ignored => {}
            },
            Event::ReplyReady { epoch, text } => self.reply_ready(epoch, text),
            Event::Player(event) => {
                if let PlayerUpdate::Finished(end) = self.player.handle_event(event) {
                    log::debug!("assistant: speech ended ({end:?})");
                    self.finish_turn();
                }
            }
            Event::IdleTick => self.idle_tick(),
        }
        self.sync_status();
    }

    fn handle_command(&mut self, command: AssistantCommand) {
        log::debug!("assistant: command {command:?} in {:?}", self.state);
        match command {
            AssistantCommand::StartListening => self.begin_listening(),
            AssistantCommand::StopListening => {
                self.capture.stop();
                if self.state == AssistantState::Listening {
                    self.state = AssistantState::Idle;
                }
            }
            AssistantCommand::SubmitText(text) => self.accept_utterance(&text),
            AssistantCommand::TogglePause => {
                if self.supervisor.is_paused() {
                    self.resume();
                } else {
                    self.pause();
                }
            }
            AssistantCommand::Welcome => self.welcome(),
            AssistantCommand::SetLanguage(language) => self.set_language(language),
        }
    }

    // -----------------------------------------------------------------------
    // Listening
    // -----------------------------------------------------------------------

    /// Start the recognizer, interrupting any speech first.
    fn begin_listening(&mut self) {
        if self.supervisor.is_paused() {
            log::debug!("assistant: paused, not listening");
            return;
        }
        if self.state == AssistantState::Generating {
            log::debug!("assistant: reply pending, not listening yet");
            return;
        }

        if self.player.interrupt() {
            log::info!("assistant: barge-in, speech interrupted");
            self.turn = None;
            self.state = AssistantState::Idle;
        }

        match self.capture.start(self.language) {
            Ok(()) => {
                self.state = AssistantState::Listening;
                lock_status(&self.status).error_message = None;
                self.mark_activity();
            }
            Err(RecognitionError::Unavailable) => {
                log::debug!("assistant: no recognizer, voice input disabled");
                self.state = AssistantState::Idle;
            }
            Err(err) => self.capture_stopped(Some(err)),
        }
    }

    fn capture_stopped(&mut self, fault: Option<RecognitionError>) {
        match fault {
            Some(err) if err.is_persistent() => {
                log::error!("assistant: recognizer unusable: {err}");
                lock_status(&self.status).error_message = Some(err.to_string());
                if !self.state.is_busy() && !self.supervisor.is_paused() {
                    self.state = AssistantState::Error;
                }
            }
            Some(err) => {
                log::debug!("assistant: recognizer stopped: {err}");
                self.leave_listening();
            }
            None => self.leave_listening(),
        }
    }

    fn leave_listening(&mut self) {
        if self.state == AssistantState::Listening {
            self.state = AssistantState::Idle;
        }
    }

    fn set_language(&mut self, language: Language) {
        if language == self.language {
            return;
        }
        log::info!("assistant: language → {}", language.code());
        self.language = language;
        if self.capture.is_listening() {
            if let Err(err) = self.capture.start(language) {
                self.capture_stopped(Some(err));
            }
        }
    }

    fn idle_tick(&mut self) {
        let now = Instant::now();
        if self.supervisor.should_stop_listening(
            now,
            self.last_activity,
            self.capture.is_listening(),
            self.player.is_busy(),
        ) {
            log::info!("assistant: no speech for a while, stopping listening");
            self.capture.stop();
            self.leave_listening();
        }
    }

    // -----------------------------------------------------------------------
    // Turns
    // -----------------------------------------------------------------------

    /// Accept a finalized utterance or typed message and request a reply.
    fn accept_utterance(&mut self, text: &str) {
        let utterance = text.trim();
        if utterance.is_empty() {
            return;
        }
        if self.supervisor.is_paused() {
            log::debug!("assistant: paused, dropping utterance");
            return;
        }
        if self.state == AssistantState::Generating {
            log::debug!("assistant: reply pending, dropping utterance");
            return;
        }
        if self.state == AssistantState::Speaking && self.player.interrupt() {
            log::info!("assistant: barge-in, speech interrupted");
        }

        let turn = ConversationTurn {
            utterance: utterance.to_string(),
            is_first: mem::replace(&mut self.first_turn_pending, false),
            started_at: Instant::now(),
        };
        self.mark_activity();
        self.state = AssistantState::Generating;
        {
            let mut status = lock_status(&self.status);
            status.transcript = Some(utterance.to_string());
            status.reply = None;
        }

        self.epoch += 1;
        let epoch = self.epoch;
        let replies = self.replies.clone();
        let tx = self.reply_tx.clone();
        let language = self.language;
        let message = turn.utterance.clone();
        let is_first = turn.is_first;
        log::debug!("assistant: generating reply (first = {is_first})");
        self.turn = Some(turn);

        self.reply_task = Some(tokio::spawn(async move {
            let reply = replies.generate_reply(&message, language, is_first).await;
            let _ = tx.send((epoch, reply));
        }));
    }

    fn reply_ready(&mut self, epoch: u64, text: String) {
        if epoch != self.epoch || self.state != AssistantState::Generating {
            log::debug!("assistant: dropping stale reply");
            return;
        }
        self.reply_task = None;
        if let Some(turn) = &self.turn {
            log::debug!(
                "assistant: reply to {:?} after {:?} (first = {})",
                turn.utterance,
                Instant::now().saturating_duration_since(turn.started_at),
                turn.is_first
            );
        }
        self.start_speaking(text);
    }

    fn welcome(&mut self) {
        if self.supervisor.is_paused() || self.state.is_busy() {
            log::debug!("assistant: busy, skipping welcome");
            return;
        }
        let text = self.language.messages().welcome.to_string();
        self.start_speaking(text);
    }

    fn start_speaking(&mut self, text: String) {
        self.capture.stop();
        lock_status(&self.status).reply = Some(text.clone());

        match self.player.speak(&text, self.language) {
            SpeakOutcome::Started(route) => {
                log::debug!("assistant: speaking via {route:?}");
                self.state = AssistantState::Speaking;
            }
            SpeakOutcome::Rejected => {
                log::warn!("assistant: player still busy, reply not spoken");
                self.finish_turn();
            }
            SpeakOutcome::Unavailable => {
                log::warn!("assistant: no way to play speech, reply shown only");
                self.finish_turn();
            }
        }
    }

    /// Close the current turn and resume listening unless paused.
    fn finish_turn(&mut self) {
        self.turn = None;
        self.state = AssistantState::Idle;
        self.mark_activity();
        if !self.supervisor.is_paused() && self.capture.is_available() {
            self.begin_listening();
        }
    }

    // -----------------------------------------------------------------------
    // Pause gate
    // -----------------------------------------------------------------------

    fn pause(&mut self) {
        if !self.supervisor.pause() {
            return;
        }
        log::info!("assistant: paused");
        self.capture.stop();
        self.epoch += 1;
        if let Some(task) = self.reply_task.take() {
            task.abort();
        }
        self.player.interrupt();
        self.turn = None;
        self.state = AssistantState::Paused;
    }

    fn resume(&mut self) {
        if !self.supervisor.resume() {
            return;
        }
        log::info!("assistant: resumed");
        self.state = AssistantState::Idle;
        self.mark_activity();
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn mark_activity(&mut self) {
        self.last_activity = Instant::now();
    }

    fn sync_status(&self) {
        let mut status = lock_status(&self.status);
        status.state = self.state;
        status.language = self.language;
        status.listening = self.capture.is_listening();
        status.speaking = self.player.is_busy();
        status.voice_input_available = self.capture.is_available();
    }

    fn shutdown(&mut self) {
        self.capture.stop();
        if let Some(task) = self.reply_task.take() {
            task.abort();
        }
        self.player.interrupt();
        self.state = AssistantState::Idle;
        self.sync_status();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
