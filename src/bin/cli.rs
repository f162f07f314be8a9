use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use clap::Subcommand;
use clap_serde_derive::ClapSerde;

use speech_translate::config::{Config, DEFAULT_CONFIG_FILE};
use speech_translate::detection::{AudioEncoding, AudioInput, SourceLanguage};
use speech_translate::telemetry::init_console;
use speech_translate::AppState;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env, default_value = DEFAULT_CONFIG_FILE)]
    config_file: String,

    /// Configuration options
    #[command(flatten)]
    pub opt_config: <Config as ClapSerde>::Opt,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transcribe a local audio file and translate it
    Transcribe {
        /// Audio file to transcribe
        #[arg(long)]
        file: PathBuf,

        /// Language the transcript is translated into
        #[arg(long)]
        target: String,

        /// Spoken language, or auto to detect it
        #[arg(long, default_value = "auto")]
        source: String,
    },
    /// Print the candidate languages probed during detection
    Languages,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(&args.config_file, args.opt_config)?;
    init_console();
    let state = AppState::from_config(&config)?;

    match args.cmd {
        Commands::Transcribe {
            file,
            target,
            source,
        } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let mut audio = AudioInput::new(bytes, None);
            if audio.encoding().is_unspecified() {
                let extension = file.extension().and_then(|e| e.to_str()).unwrap_or_default();
                audio = audio.with_encoding(AudioEncoding::from_extension(extension));
            }

            let source = SourceLanguage::from_hint(Some(source.as_str()));
            let outcome = state
                .orchestrator
                .transcribe_and_translate(&audio, &target, &source)
                .await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Languages => {
            let tiers = state.orchestrator.tiers();
            for candidate in tiers.primary().iter().chain(tiers.secondary()) {
                println!(
                    "{:<10} {:<9} {}",
                    candidate.code, candidate.tier, candidate.display_name
                );
            }
        }
    }
    Ok(())
}
