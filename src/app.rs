//! Barq assistant floating widget, an egui/eframe application.
//!
//! # Architecture
//!
//! [`AssistantApp`] is the top-level [`eframe::App`].  It never touches the
//! conversation directly:
//!
//! * `status`: [`SharedStatus`] snapshot written by the orchestrator,
//!   read once per frame.
//! * `command_tx`: sends [`AssistantCommand`]s to the orchestrator.
//!
//! # Widget States
//!
//! | State | Visual |
//! |-------|--------|
//! | `Idle` | "Click to talk", dim gray |
//! | `Listening` | Pulsing red dot + "Listening..." |
//! | `Generating` | Spinner + "Thinking..." |
//! | `Speaking` | Blue indicator + reply text |
//! | `Paused` | "Paused", amber |
//! | `Error` | Error message, orange |
//!
//! When voice input is unavailable the talk button is replaced by a text
//! field; typed messages go through the same turn logic.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::assistant::{
    lock_status, AssistantCommand, AssistantState, AssistantStatus, SharedStatus,
};
use crate::config::AssistantConfig;
use crate::language::Language;

// ---------------------------------------------------------------------------
// AssistantApp
// ---------------------------------------------------------------------------

pub struct AssistantApp {
    status: SharedStatus,
    command_tx: mpsc::Sender<AssistantCommand>,
    config: AssistantConfig,

    /// Manual text input buffer.
    input: String,
    show_settings: bool,
    spinner_phase: f32,
    /// Last seen outer position of the window, saved on exit.
    window_position: Option<(f32, f32)>,
}

impl AssistantApp {
    pub fn new(
        status: SharedStatus,
        command_tx: mpsc::Sender<AssistantCommand>,
        config: AssistantConfig,
    ) -> Self {
        Self {
            status,
            command_tx,
            input: String::new(),
            show_settings: false,
            spinner_phase: 0.0,
            window_position: config.ui.window_position,
            config,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────────

    fn send(&self, command: AssistantCommand) {
        if let Err(e) = self.command_tx.try_send(command) {
            log::warn!("ui: command dropped: {e}");
        }
    }

    /// Send the typed message, if any, and clear the field.
    fn submit_input(&mut self) {
        let text = self.input.trim();
        if text.is_empty() {
            return;
        }
        self.send(AssistantCommand::SubmitText(text.to_string()));
        self.input.clear();
    }

    fn toggle_language(&self, current: Language) {
        self.send(AssistantCommand::SetLanguage(current.toggled()));
    }

    /// Fold the session's language and window position into the config.
    /// Returns `true` when anything changed and needs saving.
    fn remember_session(&mut self, language: Language) -> bool {
        if language == self.config.language
            && self.window_position == self.config.ui.window_position
        {
            return false;
        }
        self.config.language = language;
        self.config.ui.window_position = self.window_position;
        true
    }

    // ── Custom title bar ─────────────────────────────────────────────────

    fn draw_title_bar(
        &mut self,
        ui: &mut egui::Ui,
        ctx: &egui::Context,
        status: &AssistantStatus,
    ) {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("●").color(state_color(status.state)));

            let title = ui.label(
                egui::RichText::new("Barq · Rady")
                    .color(egui::Color32::from_rgb(200, 200, 200))
                    .size(13.0),
            );
            if title.is_pointer_button_down_on() {
                if let Some(outer_rect) = ctx.input(|i| i.viewport().outer_rect) {
                    let delta = ctx.input(|i| i.pointer.delta());
                    ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(
                        outer_rect.min + delta,
                    ));
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if small_button(ui, "x", egui::Color32::from_rgb(200, 100, 100)).clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
                if small_button(ui, "-", egui::Color32::from_rgb(150, 150, 150)).clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Minimized(true));
                }
                if small_button(ui, "=", egui::Color32::from_rgb(150, 150, 150)).clicked() {
                    self.show_settings = !self.show_settings;
                }
                let other = match status.language.toggled() {
                    Language::En => "EN",
                    Language::Ar => "AR",
                };
                if small_button(ui, other, egui::Color32::from_rgb(150, 180, 220)).clicked() {
                    self.toggle_language(status.language);
                }
            });
        });
    }

    // ── Panels ───────────────────────────────────────────────────────────

    fn draw_status_line(&self, ui: &mut egui::Ui, status: &AssistantStatus) {
        let messages = status.language.messages();
        let label = match status.state {
            AssistantState::Generating => {
                format!("{} {}", self.spinner_char(), status.state.label(messages))
            }
            AssistantState::Error => status
                .error_message
                .clone()
                .unwrap_or_else(|| status.state.label(messages).to_string()),
            AssistantState::Idle if !status.voice_input_available => {
                messages.voice_unavailable.to_string()
            }
            state => state.label(messages).to_string(),
        };
        ui.label(
            egui::RichText::new(label)
                .color(state_color(status.state))
                .size(13.0),
        );
    }

    fn draw_conversation(&self, ui: &mut egui::Ui, status: &AssistantStatus) {
        let messages = status.language.messages();
        if let Some(transcript) = &status.transcript {
            ui.label(
                egui::RichText::new(format!("{}: {transcript}", messages.you))
                    .color(egui::Color32::from_rgb(170, 170, 170))
                    .italics()
                    .size(11.0),
            );
        }
        if let Some(reply) = &status.reply {
            ui.label(
                egui::RichText::new(format!("{}: {reply}", messages.assistant))
                    .color(egui::Color32::from_rgb(120, 190, 255))
                    .size(12.0),
            );
        }
    }

    fn draw_controls(&mut self, ui: &mut egui::Ui, status: &AssistantStatus) {
        let messages = status.language.messages();
        ui.horizontal(|ui| {
            if status.voice_input_available {
                let talk = if status.listening { "■" } else { "🎤" };
                if ui.button(talk).clicked() {
                    self.send(if status.listening {
                        AssistantCommand::StopListening
                    } else {
                        AssistantCommand::StartListening
                    });
                }
            }

            let pause = if status.state == AssistantState::Paused { "▶" } else { "⏸" };
            if ui.button(pause).clicked() {
                self.send(AssistantCommand::TogglePause);
            }

            if ui
                .add_enabled(!status.state.is_busy(), egui::Button::new(messages.welcome_button))
                .clicked()
            {
                self.send(AssistantCommand::Welcome);
            }
        });

        ui.horizontal(|ui| {
            let field = ui.add(
                egui::TextEdit::singleline(&mut self.input)
                    .hint_text(messages.type_message)
                    .desired_width(ui.available_width() - 40.0),
            );
            let entered = field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("➤").clicked() || entered {
                self.submit_input();
            }
        });
    }

    fn draw_settings(&self, ui: &mut egui::Ui) {
        let line = |ui: &mut egui::Ui, text: String| {
            ui.label(
                egui::RichText::new(text)
                    .color(egui::Color32::from_rgb(140, 140, 140))
                    .size(11.0),
            );
        };
        line(ui, format!("Backend: {}", self.config.backend.base_url));
        line(ui, format!("Local voice: {}", self.config.speech.local_command));
        line(
            ui,
            format!(
                "Hotkeys: talk {} / pause {}",
                self.config.hotkey.talk_key, self.config.hotkey.pause_key
            ),
        );
        line(
            ui,
            format!("Idle timeout: {} s", self.config.supervisor.idle_timeout_secs),
        );
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    fn spinner_char(&self) -> char {
        let chars = ['|', '/', '-', '\\'];
        chars[(self.spinner_phase as usize) % chars.len()]
    }
}

fn small_button(ui: &mut egui::Ui, text: &str, color: egui::Color32) -> egui::Response {
    ui.add(egui::Button::new(egui::RichText::new(text).color(color).size(12.0)).frame(false))
}

fn state_color(state: AssistantState) -> egui::Color32 {
    match state {
        AssistantState::Idle => egui::Color32::from_rgb(110, 110, 110),
        AssistantState::Listening => egui::Color32::from_rgb(255, 68, 68),
        AssistantState::Generating => egui::Color32::from_rgb(68, 136, 255),
        AssistantState::Speaking => egui::Color32::from_rgb(80, 200, 120),
        AssistantState::Paused => egui::Color32::from_rgb(230, 180, 60),
        AssistantState::Error => egui::Color32::from_rgb(255, 136, 68),
    }
}

// ---------------------------------------------------------------------------
// Fonts
// ---------------------------------------------------------------------------

/// System fonts with Arabic glyphs, tried in order.
const ARABIC_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/noto/NotoSansArabic-Regular.ttf",
    "/usr/share/fonts/noto/NotoSansArabic-Regular.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "C:\\Windows\\Fonts\\tahoma.ttf",
];

/// egui's bundled fonts have no Arabic glyphs.  Append the first system font
/// found as a fallback for both families.
pub fn install_arabic_font(ctx: &egui::Context) {
    let candidates: Vec<&Path> = ARABIC_FONT_CANDIDATES.iter().map(Path::new).collect();
    match arabic_font_definitions(&candidates) {
        Some(fonts) => ctx.set_fonts(fonts),
        None => log::warn!("ui: no Arabic-capable system font found"),
    }
}

fn arabic_font_definitions(candidates: &[&Path]) -> Option<egui::FontDefinitions> {
    let (path, bytes) = candidates
        .iter()
        .find_map(|path| std::fs::read(path).ok().map(|bytes| (path, bytes)))?;
    log::info!("ui: Arabic fallback font {}", path.display());

    let name = "arabic-fallback".to_string();
    let mut fonts = egui::FontDefinitions::default();
    fonts
        .font_data
        .insert(name.clone(), Arc::new(egui::FontData::from_owned(bytes)));
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        fonts.families.entry(family).or_default().push(name.clone());
    }
    Some(fonts)
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for AssistantApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let status = lock_status(&self.status).clone();

        self.spinner_phase += 0.08;
        if self.spinner_phase >= 4.0 {
            self.spinner_phase = 0.0;
        }

        // The orchestrator updates the snapshot from another thread.
        ctx.request_repaint_after(Duration::from_millis(100));

        if let Some(outer_rect) = ctx.input(|i| i.viewport().outer_rect) {
            self.window_position = Some((outer_rect.min.x, outer_rect.min.y));
        }

        let frame = egui::Frame::new()
            .fill(egui::Color32::from_rgba_premultiplied(30, 30, 30, 225))
            .corner_radius(egui::CornerRadius::same(8))
            .inner_margin(egui::Margin::same(8));

        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            self.draw_title_bar(ui, ctx, &status);
            ui.separator();

            if self.show_settings {
                self.draw_settings(ui);
                return;
            }

            let layout = if status.language.is_rtl() {
                egui::Layout::top_down(egui::Align::Max)
            } else {
                egui::Layout::top_down(egui::Align::Min)
            };
            ui.with_layout(layout, |ui| {
                self.draw_status_line(ui, &status);
                self.draw_conversation(ui, &status);
            });
            ui.add_space(4.0);
            self.draw_controls(ui, &status);
        });
    }

    /// Remember the last language and window position for the next launch
    /// (best-effort).
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        let language = lock_status(&self.status).language;
        if self.remember_session(language) {
            if let Err(e) = self.config.save() {
                log::warn!("ui: could not save settings: {e}");
            }
        }
        log::info!("Barq assistant widget closing");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::new_shared_status;

    fn app() -> (AssistantApp, mpsc::Receiver<AssistantCommand>) {
        let (tx, rx) = mpsc::channel(4);
        let app = AssistantApp::new(
            new_shared_status(Language::En),
            tx,
            AssistantConfig::default(),
        );
        (app, rx)
    }

    #[test]
    fn typed_message_is_trimmed_and_cleared() {
        let (mut app, mut rx) = app();
        app.input = "  What services do you offer? ".into();
        app.submit_input();
        assert_eq!(
            rx.try_recv().unwrap(),
            AssistantCommand::SubmitText("What services do you offer?".into())
        );
        assert!(app.input.is_empty());
    }

    #[test]
    fn blank_message_is_not_sent() {
        let (mut app, mut rx) = app();
        app.input = "   ".into();
        app.submit_input();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn language_toggle_requests_the_other_language() {
        let (app, mut rx) = app();
        app.toggle_language(Language::En);
        assert_eq!(
            rx.try_recv().unwrap(),
            AssistantCommand::SetLanguage(Language::Ar)
        );
    }

    #[test]
    fn session_state_is_saved_only_when_changed() {
        let (mut app, _rx) = app();
        assert!(!app.remember_session(Language::En));

        app.window_position = Some((120.0, 48.0));
        assert!(app.remember_session(Language::En));
        assert_eq!(app.config.ui.window_position, Some((120.0, 48.0)));
        assert!(!app.remember_session(Language::En));

        assert!(app.remember_session(Language::Ar));
        assert_eq!(app.config.language, Language::Ar);
    }

    #[test]
    fn arabic_font_is_appended_as_fallback() {
        let dir = tempfile::tempdir().expect("temp dir");
        let font = dir.path().join("arabic.ttf");
        std::fs::write(&font, b"font bytes").expect("write");
        let missing = dir.path().join("missing.ttf");

        let fonts = arabic_font_definitions(&[missing.as_path(), font.as_path()])
            .expect("second candidate exists");
        assert!(fonts.font_data.contains_key("arabic-fallback"));
        let proportional = &fonts.families[&egui::FontFamily::Proportional];
        assert_eq!(proportional.last().map(String::as_str), Some("arabic-fallback"));
        assert!(proportional.len() > 1);
    }

    #[test]
    fn no_font_candidates_keeps_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("missing.ttf");
        assert!(arabic_font_definitions(&[missing.as_path()]).is_none());
    }

    #[test]
    fn full_command_queue_does_not_panic() {
        let (app, _rx) = app();
        for _ in 0..10 {
            app.send(AssistantCommand::TogglePause);
        }
    }
}
