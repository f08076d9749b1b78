//! Application entry point: study-kit.
//!
//! # Startup sequence
//!
//! 1. Parse the command line.
//! 2. Initialise logging.
//! 3. Load [`AppConfig`] (default on first run) and apply env overrides.
//! 4. Dispatch the subcommand:
//!    * `generate`: run the content pipeline on a file, write the guide
//!      and optionally speak the summary.
//!    * `explain` : Feynman review of an explanation against a file.
//!    * `timer`   : status / start / stop / watch the pomodoro service.
//!    * `config`  : show or write `settings.toml`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use study_kit::{
    config::{AppConfig, AppPaths, PipelineBackend},
    extract::extract_document,
    llm::{ApiGenerator, FeynmanReviewer},
    pipeline::{PipelineOrchestrator, StudySession},
    playback::{PlaybackController, ProcessSpeech, SpeechEngine},
    stage::{Artifact, ArtifactKind, Document, HttpStageClient, LocalStageClient, StageClient},
    timer::{TimerHandle, TimerSync, TimerView},
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// study-kit: summaries, flashcards and a study timer from your notes.
#[derive(Parser)]
#[command(name = "study-kit", version, long_about = None)]
struct Cli {
    /// Settings file to use instead of the platform default.
    #[arg(long, global = true, env = "STUDY_KIT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a study kit (summary, flashcards, guide, audio) from a file.
    Generate {
        /// Plain-text or PDF document.
        file: PathBuf,

        /// Title shown in the guide (defaults to the file name).
        #[arg(short, long)]
        title: Option<String>,

        /// Directory for the guide and text summary.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Where the stages run (overrides the settings file).
        #[arg(long, value_enum)]
        backend: Option<BackendArg>,

        /// Read the summary aloud once the kit is ready.
        #[arg(long)]
        speak: bool,
    },

    /// Check your own explanation of a document (Feynman technique).
    Explain {
        /// The study material, plain text or PDF.
        file: PathBuf,

        /// Your explanation in your own words.
        #[arg(short, long)]
        explanation: String,
    },

    /// Pomodoro timer.
    Timer {
        #[command(subcommand)]
        action: TimerAction,
    },

    /// Settings file management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum TimerAction {
    /// Print the current timer state once.
    Status,
    /// Start a focus period.
    Start,
    /// Stop the timer.
    Stop,
    /// Follow the timer until Ctrl-C.
    Watch,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective settings as TOML.
    Show,
    /// Write the default settings file if none exists.
    Init,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Remote,
    Local,
}

impl From<BackendArg> for PipelineBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Remote => PipelineBackend::Remote,
            BackendArg::Local => PipelineBackend::Local,
        }
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Command line
    let cli = Cli::parse();

    // 2. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 3. Configuration
    let settings_file = cli
        .config
        .clone()
        .unwrap_or_else(|| AppPaths::new().settings_file);
    let config = AppConfig::load_from(&settings_file)
        .unwrap_or_else(|e| {
            log::warn!("Failed to load config ({e}); using defaults");
            AppConfig::default()
        })
        .with_env_overrides();

    // 4. Dispatch
    match cli.command {
        Command::Generate {
            file,
            title,
            out,
            backend,
            speak,
        } => {
            let backend = backend.map(Into::into).unwrap_or(config.pipeline.backend);
            generate(&config, &file, title, out, backend, speak).await
        }
        Command::Explain { file, explanation } => explain(&config, &file, &explanation).await,
        Command::Timer { action } => timer(&config, action).await,
        Command::Config { action } => match action {
            ConfigAction::Show => {
                print!("{}", toml::to_string_pretty(&config)?);
                Ok(())
            }
            ConfigAction::Init => {
                if settings_file.exists() {
                    println!("{} already exists", settings_file.display());
                } else {
                    AppConfig::default().save_to(&settings_file)?;
                    println!("wrote {}", settings_file.display());
                }
                Ok(())
            }
        },
    }
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

async fn generate(
    config: &AppConfig,
    file: &Path,
    title: Option<String>,
    out: Option<PathBuf>,
    backend: PipelineBackend,
    speak: bool,
) -> Result<()> {
    let document = Document::from_file(file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    let title = title.unwrap_or_else(|| document.name.clone());

    let engine = ProcessSpeech::from_config(&config.speech).filter(|e| {
        let available = e.is_available();
        if !available {
            log::warn!("speech command not found; audio falls back to text");
        }
        available
    });
    let speech_available = engine.is_some();

    let stages: Arc<dyn StageClient> = match backend {
        PipelineBackend::Remote => Arc::new(
            HttpStageClient::from_config(&config.service).with_speech(speech_available),
        ),
        PipelineBackend::Local => Arc::new(
            LocalStageClient::new(Arc::new(ApiGenerator::from_config(&config.llm)))
                .with_speech(speech_available),
        ),
    };
    log::info!("pipeline backend: {backend:?}");

    let mut orchestrator = PipelineOrchestrator::new(stages)
        .with_max_generation_chars(config.pipeline.max_generation_chars);
    let mut progress = orchestrator.subscribe();
    let printer = tokio::spawn(async move {
        while let Some(state) = progress.recv().await {
            match state.stage() {
                Some(stage) if state.is_busy() => {
                    eprintln!("[{:>3}%] {} ({stage})...", state.progress(), state.label())
                }
                Some(stage) => eprintln!("[{:>3}%] {} at {stage}", state.progress(), state.label()),
                None => eprintln!("[{:>3}%] {}", state.progress(), state.label()),
            }
            if state.is_terminal() {
                break;
            }
        }
    });

    let mut session = StudySession::new();
    let outcome = orchestrator
        .run(&document, &title, session.store_mut())
        .await;
    let _ = printer.await;

    let result = match outcome {
        Ok(result) => result,
        Err(e) => bail!("{} (stage: {}, class: {:?})", e, e.stage, e.class()),
    };
    session.install(result);
    let Some(result) = session.current() else {
        bail!("no study kit was produced");
    };

    // ── Print the kit ─────────────────────────────────────────────────────
    println!("Summary\n=======\n{}\n", result.material.summary);
    println!("Flashcards ({})\n==========", result.material.flashcards.len());
    for (i, card) in result.material.flashcards.iter().enumerate() {
        println!("Q{}: {}\nA: {}\n", i + 1, card.question, card.answer);
    }

    // ── Write artifacts ───────────────────────────────────────────────────
    let out_dir = match out {
        Some(dir) => dir,
        None => AppPaths::new()
            .ensure_output_dir()
            .context("cannot create the output directory")?
            .to_path_buf(),
    };
    if let Some(guide) = session.artifact(result.guide) {
        let path = write_artifact(&out_dir, guide)?;
        println!("Study guide: {}", path.display());
    }

    let audio = result.audio.and_then(|handle| session.artifact(handle));
    match audio {
        Some(artifact) if artifact.kind == ArtifactKind::TextSummary => {
            let path = write_artifact(&out_dir, artifact)?;
            println!("Audio summary (text): {}", path.display());
        }
        Some(artifact) if speak => {
            if let Some(engine) = engine {
                let text = String::from_utf8_lossy(&artifact.bytes).into_owned();
                speak_until_done(engine, &text).await?;
            }
        }
        _ => {}
    }

    Ok(())
}

fn write_artifact(dir: &Path, artifact: &Artifact) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("cannot create {}", dir.display()))?;
    let path = dir.join(&artifact.filename);
    std::fs::write(&path, &artifact.bytes)
        .with_context(|| format!("cannot write {}", path.display()))?;
    Ok(path)
}

/// Speak `text`, returning when playback ends or Ctrl-C is pressed.
async fn speak_until_done(engine: ProcessSpeech, text: &str) -> Result<()> {
    let mut controller = PlaybackController::new(engine);
    controller.play(text)?;
    eprintln!("Speaking summary (Ctrl-C to stop)...");

    let mut ticker = tokio::time::interval(Duration::from_millis(100));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                controller.stop();
                break;
            }
            _ = ticker.tick() => {
                controller.tick();
                if !controller.is_playing() {
                    break;
                }
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// explain
// ---------------------------------------------------------------------------

async fn explain(config: &AppConfig, file: &Path, explanation: &str) -> Result<()> {
    let document = Document::from_file(file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    let material = tokio::task::spawn_blocking(move || extract_document(&document)).await??;

    let reviewer = FeynmanReviewer::from_config(&config.llm);
    let review = reviewer.review(material.as_str(), explanation).await?;

    println!("Feedback\n========\n{}\n", review.feedback);
    println!("Flashcards for the gaps ({})\n=======================", review.flashcards.len());
    for (i, card) in review.flashcards.iter().enumerate() {
        println!("Q{}: {}\nA: {}\n", i + 1, card.question, card.answer);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// timer
// ---------------------------------------------------------------------------

fn print_view(view: &TimerView) {
    let state = if view.is_active() { "running" } else { "stopped" };
    println!("{}  {}  ({state})", view.headline(), view.clock());
    if let Some(err) = view.error() {
        println!("{err}");
    }
}

/// Wait for the first poll to answer so commands are not refused as
/// "in flight".
async fn wait_synced(handle: &TimerHandle) -> TimerView {
    loop {
        let view = handle.snapshot();
        if view.last_poll().is_some() {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

async fn timer(config: &AppConfig, action: TimerAction) -> Result<()> {
    let handle = TimerHandle::spawn(TimerSync::from_config(&config.timer));
    let view = wait_synced(&handle).await;

    match action {
        TimerAction::Status => print_view(&view),
        TimerAction::Start | TimerAction::Stop => {
            if let Some(err) = view.error() {
                bail!("{err}");
            }
            let outcome = match action {
                TimerAction::Start => handle.start().await,
                _ => handle.stop().await,
            };
            let view = handle.snapshot();
            if let Err(e) = outcome {
                bail!("{}", view.error().map(str::to_owned).unwrap_or_else(|| e.to_string()));
            }
            print_view(&view);
        }
        TimerAction::Watch => {
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    _ = ticker.tick() => print_view(&handle.snapshot()),
                }
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}
