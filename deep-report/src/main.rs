//! deep-report - Generate grounded research reports, export them, and listen to them

mod config;
mod export;
mod playback;
mod report;
mod text;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use config::AppConfig;
use export::ExportFormat;
use grounded_llm::{ModelPreset, get_provider};
use indicatif::{ProgressBar, ProgressStyle};
use playback::{CommandSpeechEngine, PlaybackQueue, SpeechProgram, run_player};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::BufReader;
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(name = "deep-report")]
#[command(about = "Generate grounded research reports, export them, and listen to them", long_about = None)]
#[command(version)]
struct Args {
    /// Show progress details
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a report on a topic using web-grounded search
    Generate {
        /// Topic to research
        topic: String,

        /// Additional instructions for the report
        #[arg(short, long)]
        instructions: Option<String>,

        /// Model preset to use (see `config list-models`)
        #[arg(short, long)]
        model: Option<String>,

        /// Export the report as PDF
        #[arg(long)]
        pdf: bool,

        /// Export the report as a Word document
        #[arg(long)]
        docx: bool,

        /// Save the markdown report to this path
        #[arg(long)]
        markdown: Option<PathBuf>,

        /// Read the report aloud when it is ready
        #[arg(long)]
        podcast: bool,
    },
    /// Export a saved markdown report to PDF and/or Word
    Export {
        /// Markdown report file
        file: PathBuf,

        /// Report topic (default: the file name)
        #[arg(short, long)]
        topic: Option<String>,

        /// Export as PDF
        #[arg(long)]
        pdf: bool,

        /// Export as a Word document
        #[arg(long)]
        docx: bool,
    },
    /// Read a text or markdown file aloud
    Podcast {
        /// File to read
        file: PathBuf,

        /// Strip markdown syntax before speaking
        #[arg(long)]
        markdown: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set the speech and report language (e.g. it-IT, en-GB)
    SetLanguage {
        /// BCP 47 language tag
        language: String,
    },
    /// Set the maximum characters per spoken chunk
    SetChunkSize {
        /// Characters per chunk
        size: usize,
    },
    /// Set the speech program used for podcasts
    SetSpeechCommand {
        /// Path or name of the program
        command: PathBuf,
        /// Extra arguments passed before the text
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Set the default model preset
    SetDefaultModel {
        /// Name of the preset to use as default
        preset: String,
    },
    /// List available model presets
    ListModels,
    /// Add a new model preset
    AddModel {
        /// Preset name
        name: String,
        /// Provider (gemini)
        #[arg(short, long)]
        provider: String,
        /// Model identifier
        #[arg(short = 'M', long)]
        model: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.debug);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let result = runtime.block_on(run(args));
    // A pending stdin read holds a blocking thread until a line arrives
    runtime.shutdown_background();
    result
}

fn init_logging(verbose: bool, debug: bool) {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

async fn run(args: Args) -> Result<()> {
    match args.command {
        Commands::Config { action } => handle_config_command(&action),
        Commands::Generate {
            topic,
            instructions,
            model,
            pdf,
            docx,
            markdown,
            podcast,
        } => {
            let config = AppConfig::load().context("Failed to load configuration")?;
            let report =
                generate(&config, &topic, instructions.as_deref(), model.as_deref()).await?;

            println!("{}", report.markdown);
            let sources = report.render_sources();
            if !sources.is_empty() {
                println!();
                print!("{}", sources);
            }

            if let Some(path) = markdown {
                fs::write(&path, &report.markdown)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!("Saved: {}", path.display());
            }
            export_formats(&config, &report.markdown, &report.topic, &formats(pdf, docx))?;

            if podcast {
                play_aloud(&config, &report.plain_text()).await?;
            }
            Ok(())
        }
        Commands::Export {
            file,
            topic,
            pdf,
            docx,
        } => {
            let config = AppConfig::load().context("Failed to load configuration")?;
            let markdown = read_input(&file)?;
            let topic = topic.unwrap_or_else(|| topic_from_path(&file));

            // Without a format flag, export both
            let selected = match formats(pdf, docx) {
                f if f.is_empty() => vec![ExportFormat::Pdf, ExportFormat::Docx],
                f => f,
            };
            export_formats(&config, &markdown, &topic, &selected)
        }
        Commands::Podcast { file, markdown } => {
            let config = AppConfig::load().context("Failed to load configuration")?;
            let mut content = read_input(&file)?;
            if markdown {
                content = text::strip_markdown(&content);
            }
            play_aloud(&config, &content).await
        }
    }
}

async fn generate(
    config: &AppConfig,
    topic: &str,
    instructions: Option<&str>,
    model: Option<&str>,
) -> Result<report::Report> {
    // Check before touching provider credentials
    if topic.trim().is_empty() {
        bail!("Please enter a topic.");
    }

    let llm_config = grounded_llm::Config::load().context("Failed to load model configuration")?;
    let (preset_name, preset) = llm_config.resolve_preset(model)?;
    log::info!(
        "Using preset {} ({} / {})",
        preset_name,
        preset.provider,
        preset.model
    );

    let provider = get_provider(preset, llm_config.get_provider_config(&preset.provider))?;
    provider.is_available()?;

    let pb = spinner(&format!("Researching \"{}\"...", topic.trim()))?;
    let result =
        report::generate_report(provider.as_ref(), topic, instructions, &config.language).await;
    pb.finish_and_clear();

    result
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg} ({elapsed})")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn formats(pdf: bool, docx: bool) -> Vec<ExportFormat> {
    let mut formats = Vec::new();
    if pdf {
        formats.push(ExportFormat::Pdf);
    }
    if docx {
        formats.push(ExportFormat::Docx);
    }
    formats
}

fn export_formats(
    config: &AppConfig,
    markdown: &str,
    topic: &str,
    formats: &[ExportFormat],
) -> Result<()> {
    if formats.is_empty() {
        return Ok(());
    }

    let dir = config.output_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    for format in formats {
        let path = export::export_report(markdown, topic, *format, &dir)
            .with_context(|| format!("Failed to export {}", format.extension().to_uppercase()))?;
        eprintln!("Saved: {}", path.display());
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if !path.exists() {
        bail!("File not found: {}", path.display());
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn topic_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string())
}

fn speech_program(config: &AppConfig) -> Result<SpeechProgram> {
    let path = match &config.speech_command {
        Some(command) => command.clone(),
        None => SpeechProgram::detect()
            .map(|program| program.path().to_path_buf())
            .context(
                "No speech program found. Install espeak-ng or run 'deep-report config set-speech-command'",
            )?,
    };
    Ok(SpeechProgram::new(path, config.speech_args.clone()))
}

async fn play_aloud(config: &AppConfig, text: &str) -> Result<()> {
    let program = speech_program(config)?;

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let engine = CommandSpeechEngine::new(program, events_tx);
    let mut queue =
        PlaybackQueue::from_text(engine, text, config.chunk_size, config.language.clone());
    log::info!("Speaking {} chunks ({})", queue.len(), config.language);

    let input = BufReader::new(tokio::io::stdin());
    run_player(&mut queue, &mut events_rx, input).await
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = AppConfig::load()?;
            println!("Configuration file: {}", AppConfig::config_path()?.display());
            println!();
            println!("language = \"{}\"", config.language);
            println!("chunk_size = {}", config.chunk_size);
            match &config.speech_command {
                Some(command) => println!("speech_command = \"{}\"", command.display()),
                None => println!("speech_command = (auto-detect)"),
            }
            if !config.speech_args.is_empty() {
                println!("speech_args = {:?}", config.speech_args);
            }
            match &config.output_dir {
                Some(dir) => println!("output_dir = \"{}\"", dir.display()),
                None => println!("output_dir = (current directory)"),
            }

            let llm_config = grounded_llm::Config::load()?;
            println!();
            println!("Model file: {}", grounded_llm::Config::config_path()?.display());
            println!("default_model = \"{}\"", llm_config.default_preset);
        }
        ConfigAction::SetLanguage { language } => {
            let language = language.trim();
            if language.is_empty() {
                bail!("Language tag cannot be empty");
            }
            let mut config = AppConfig::load()?;
            config.language = language.to_string();
            config.save()?;
            println!("Language set to: {}", config.language);
        }
        ConfigAction::SetChunkSize { size } => {
            if *size == 0 {
                bail!("Chunk size must be greater than zero");
            }
            let mut config = AppConfig::load()?;
            config.chunk_size = *size;
            config.save()?;
            println!("Chunk size set to: {}", config.chunk_size);
        }
        ConfigAction::SetSpeechCommand { command, args } => {
            let resolved = which::which(command)
                .with_context(|| format!("Speech program not found: {}", command.display()))?;
            let mut config = AppConfig::load()?;
            config.speech_command = Some(resolved);
            config.speech_args = args.clone();
            config.save()?;
            if let Some(command) = &config.speech_command {
                println!("Speech command set to: {}", command.display());
            }
        }
        ConfigAction::SetDefaultModel { preset } => {
            let mut config = grounded_llm::Config::load()?;
            // Verify preset exists
            config.get_preset(preset)?;
            config.default_preset = preset.clone();
            config.save()?;
            println!("Default model preset set to: {}", preset);
        }
        ConfigAction::ListModels => {
            let config = grounded_llm::Config::load()?;
            println!("Available presets:");
            for (name, preset) in &config.presets {
                let default_marker = if *name == config.default_preset {
                    " (default)"
                } else {
                    ""
                };
                println!(
                    "  {} - {} / {}{}",
                    name, preset.provider, preset.model, default_marker
                );
            }
        }
        ConfigAction::AddModel {
            name,
            provider,
            model,
        } => {
            grounded_llm::ProviderKind::parse(provider)?;
            let mut config = grounded_llm::Config::load()?;
            config.presets.insert(
                name.clone(),
                ModelPreset {
                    provider: provider.clone(),
                    model: model.clone(),
                },
            );
            config.save()?;
            println!("Added preset: {} ({} / {})", name, provider, model);
        }
    }
    Ok(())
}
