//! BPSim CLI - British Parliamentary Debate Simulator
//!
//! A command-line tool for running British Parliamentary debate sessions
//! with AI and human speakers, backed by OpenAI-compatible APIs.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use bpsim_core::{
    ApiEndpoint, AudioCaptureController, BrainstormCoordinator, Chair, Config, CpalInput,
    HistoryStore, OpenAiAnnouncer, OpenAiBrainstormProvider, OpenAiContentGenerator,
    OpenAiTranscriber, ProgressAnalyzer, Role, SessionOrchestrator, SessionStatus, SpeechSource,
    StdinGate, default_config,
};

#[derive(Parser)]
#[command(
    name = "bpsim",
    version,
    about = "British Parliamentary Debate Simulator",
    long_about = "Runs full British Parliamentary debate sessions with eight speakers. \
                  Any seat can be held by an AI speaker or a human speaking into the microphone."
)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a full debate session on the given motion
    Run {
        /// The motion to debate
        #[arg(value_name = "MOTION")]
        motion: String,
    },
    /// Show progress across stored sessions
    Progress {
        /// Restrict the analysis to one role, e.g. "Prime Minister"
        #[arg(long, value_name = "ROLE")]
        role: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => default_config(),
    };

    match cli.command {
        Command::Run { motion } => run_session(&config, &motion).await,
        Command::Progress { role } => report_progress(&config, role.as_deref()),
    }
}

async fn run_session(config: &Config, motion: &str) -> Result<(), Box<dyn std::error::Error>> {
    let assignments = config.role_assignments()?;

    let providers = &config.providers;
    let content = Arc::new(OpenAiContentGenerator::new(ApiEndpoint::new(
        &providers.content.api_base,
        providers.content.api_key()?,
        &providers.content.model,
    )));
    let brainstorm = BrainstormCoordinator::new(Arc::new(OpenAiBrainstormProvider::new(
        ApiEndpoint::new(
            &providers.brainstorm.api_base,
            providers.brainstorm.api_key()?,
            &providers.brainstorm.model,
        ),
    )));
    let announcer = Arc::new(OpenAiAnnouncer::new(
        ApiEndpoint::new(
            &providers.tts.api_base,
            providers.tts.api_key()?,
            &providers.tts.model,
        ),
        &config.chair.voice,
    )?);
    let transcriber = Arc::new(OpenAiTranscriber::new(ApiEndpoint::new(
        &providers.stt.api_base,
        providers.stt.api_key()?,
        &providers.stt.model,
    ))?);

    let capture = Arc::new(AudioCaptureController::new(
        Arc::new(CpalInput),
        Arc::new(StdinGate),
    ));
    let history = HistoryStore::open(&config.session.history_dir)?;

    let orchestrator = SessionOrchestrator::new(
        content,
        Chair::new(announcer, &config.chair.tone),
        transcriber,
        brainstorm,
        capture,
        history,
        config.session.sample_rate,
    );

    println!();
    println!("{}", "═".repeat(70).bright_blue());
    println!("{}", "  BPSim - British Parliamentary Debate".bright_blue().bold());
    println!("{}", "═".repeat(70).bright_blue());
    println!();
    println!("{} {}", "Motion:".bold(), motion.bright_white());
    println!();
    println!("{}", "Speakers:".bold());
    for (i, (role, kind)) in assignments.iter().enumerate() {
        println!(
            "  {}. {} [{}] - {}",
            i + 1,
            role.display_name().bright_cyan(),
            role.team().abbreviation().yellow(),
            kind.speaker_label().dimmed()
        );
    }
    println!();
    println!("{}", "─".repeat(70).dimmed());

    let session = orchestrator.run(motion, assignments).await?;

    if session.status == SessionStatus::Failed {
        println!();
        println!(
            "{}",
            "  Prep time failed; the session was abandoned.".red().bold()
        );
        std::process::exit(1);
    }

    for speech in &session.speech_log {
        println!();
        println!(
            "{} {} {}",
            "▶".bright_cyan(),
            speech.role.display_name().bright_cyan().bold(),
            format!("({})", speech.speaker_label).yellow()
        );
        if speech.content.is_empty() && speech.source == SpeechSource::Human {
            println!("  {}", "(no speech captured)".dimmed());
        } else {
            for line in textwrap(&speech.content, 66).lines() {
                println!("  {line}");
            }
        }
    }

    println!();
    println!("{}", "═".repeat(70).bright_blue());
    println!("{}", "  Debate concluded.".bright_green().bold());
    println!("{}", "═".repeat(70).bright_blue());
    println!();

    Ok(())
}

fn report_progress(config: &Config, role: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let role = match role {
        Some(name) => Some(
            Role::from_name(name)
                .ok_or_else(|| format!("Unknown role: '{name}'. Use the full role name, e.g. \"Prime Minister\"."))?,
        ),
        None => None,
    };

    let history = HistoryStore::open(&config.session.history_dir)?;
    let report = ProgressAnalyzer::new(&history).analyze(role)?;

    println!();
    println!("{}", "Debate Progress".bold().bright_blue());
    println!("{}", "─".repeat(40).dimmed());
    println!(
        "{} {}",
        "Total sessions:".bold(),
        report.total_sessions.to_string().bright_white()
    );
    if !report.recent_motions.is_empty() {
        println!("{}", "Recent motions:".bold());
        for motion in &report.recent_motions {
            println!("  - {motion}");
        }
    }
    println!();
    println!("{} {}", "Recommendation:".bold(), report.recommendation);

    if let Some(analysis) = &report.role_analysis {
        println!();
        println!(
            "{}",
            format!("As {}", analysis.role).bold().bright_cyan()
        );
        println!(
            "{} {}",
            "Sessions in this role:".bold(),
            analysis.sessions_participated
        );
        if !analysis.improvement_areas.is_empty() {
            println!("{}", "Areas to improve:".bold());
            for area in &analysis.improvement_areas {
                println!("  - {area}");
            }
        }
    }
    println!();

    Ok(())
}

/// Simple text wrapping function.
fn textwrap(text: &str, width: usize) -> String {
    let mut result = String::new();
    let mut current_line_len = 0;

    for word in text.split_whitespace() {
        if current_line_len + word.len() + 1 > width && current_line_len > 0 {
            result.push('\n');
            current_line_len = 0;
        }
        if current_line_len > 0 {
            result.push(' ');
            current_line_len += 1;
        }
        result.push_str(word);
        current_line_len += word.len();
    }

    result
}
