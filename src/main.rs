//! Application entry point for the Barq voice assistant widget.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AssistantConfig`] from disk (returns default on first run).
//! 3. Create the tokio runtime.
//! 4. Resolve platform capabilities (recognizer, local voice, audio output).
//! 5. Build the reply client, speech player and capture controller.
//! 6. Spawn the orchestrator on the runtime.
//! 7. Spawn the hotkey listener thread.
//! 8. Run [`eframe::run_native`]: blocks the main thread until the window
//!    is closed.

use std::sync::Arc;

use barq_voice::{
    app::AssistantApp,
    assistant::{new_shared_status, Assistant, AssistantCommand, Supervisor},
    capture::{CaptureController, SpeechRecognizer},
    config::AssistantConfig,
    hotkey::{HotkeyBindings, HotkeyListener},
    reply::{HttpReplyGenerator, ReplyClient},
    speech::{
        AudioOutput, EspeakSynthesizer, HttpSpeechSynthesizer, LocalSynthesizer, RodioOutput,
        SpeechPlayer,
    },
    Capability,
};
use eframe::egui;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AssistantConfig) -> eframe::NativeOptions {
    let mut vp = egui::ViewportBuilder::default()
        .with_decorations(false)
        .with_transparent(true)
        .with_inner_size([320.0, 200.0])
        .with_min_inner_size([260.0, 120.0])
        .with_resizable(false);

    if config.ui.always_on_top {
        vp = vp.with_always_on_top();
    }

    if let Some((x, y)) = config.ui.window_position {
        vp = vp.with_position(egui::pos2(x, y));
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Barq voice assistant starting up");

    // 2. Configuration
    let config = AssistantConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AssistantConfig::default()
    });

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 4. Capabilities, resolved once
    let recognizer: Capability<Arc<dyn SpeechRecognizer>> = Capability::Unavailable;
    let voice_input = recognizer.is_available();
    if !voice_input {
        log::info!("No on-device speech recognizer; typed input only");
    }

    let local: Capability<Arc<dyn LocalSynthesizer>> = rt
        .block_on(EspeakSynthesizer::probe(&config.speech))
        .map(|engine| Arc::new(engine) as Arc<dyn LocalSynthesizer>);

    let output: Capability<Arc<dyn AudioOutput>> = match RodioOutput::open() {
        Ok(output) => Capability::Available(Arc::new(output)),
        Err(e) => {
            log::warn!("Audio output unavailable: {e}");
            Capability::Unavailable
        }
    };

    // 5. Collaborators
    let replies = ReplyClient::new(HttpReplyGenerator::from_config(&config.backend));
    let player = SpeechPlayer::new(
        Arc::new(HttpSpeechSynthesizer::from_config(&config.backend, &config.speech)),
        local,
        output,
        &config.speech,
    );
    let status = new_shared_status(config.language);

    // 6. Orchestrator (constructed inside the runtime: it owns a tokio timer)
    let (command_tx, command_rx) = mpsc::channel::<AssistantCommand>(32);
    {
        let _guard = rt.enter();
        let assistant = Assistant::new(
            Arc::clone(&status),
            config.language,
            CaptureController::new(recognizer),
            replies,
            player,
            Supervisor::from_config(&config.supervisor),
        );
        rt.spawn(assistant.run(command_rx));
    }

    // 7. Hotkey listener thread
    let _hotkey_listener = HotkeyBindings::from_config(&config.hotkey, voice_input)
        .map(|bindings| HotkeyListener::start(bindings, command_tx.clone()));

    // 8. Build the egui app and run it (blocks until the window is closed)
    let app = AssistantApp::new(status, command_tx, config.clone());
    let options = native_options(&config);

    let result = eframe::run_native(
        "Barq Assistant",
        options,
        Box::new(move |cc| {
            barq_voice::app::install_arabic_font(&cc.egui_ctx);
            Ok(Box::new(app))
        }),
    );

    rt.shutdown_timeout(std::time::Duration::from_secs(1));
    result
}
