// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{error, info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};
use clap::{Args, Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use movsub::app_config::{self, Config};
use movsub::app_controller::{Controller, RunOptions};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Transcribe and translate a video, audio or SRT file (default command)
    Translate(TranslateArgs),

    /// Clean an SRT file: strip sound tags, credit lines and repeated cues
    Clean {
        /// SRT file to clean
        #[arg(value_name = "SRT")]
        input: PathBuf,

        /// Write the result here instead of overwriting the input
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract 16 kHz mono WAV audio from a media file
    ExtractAudio {
        /// Media file to read
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output WAV file (defaults to <input>.wav)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing output file
        #[arg(short, long)]
        force: bool,

        /// Configuration file path
        #[arg(short, long, default_value = "conf.json")]
        config_path: PathBuf,
    },

    /// Generate shell completions for movsub
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
struct TranslateArgs {
    /// Input video, audio or SRT file, or a directory to process
    #[arg(value_name = "INPUT")]
    input_path: Option<PathBuf>,

    /// Output directory (defaults to the input's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Target language name or code (e.g. 'Chinese', 'de')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Spoken language of the input (e.g. 'en', 'ja'); detected when omitted
    #[arg(short, long)]
    source_language: Option<String>,

    /// Whisper model name (e.g. 'large-v3-turbo', 'small')
    #[arg(short, long)]
    model: Option<String>,

    /// Cues per translation request
    #[arg(long)]
    batch_size: Option<usize>,

    /// Translation requests in flight at once
    #[arg(long)]
    workers: Option<usize>,

    /// Retries per cue after the first request
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Keep extracted audio and raw transcripts next to the output
    #[arg(long)]
    keep_temp: bool,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini generateContent endpoint
    #[arg(long, env = "GEMINI_API_URL")]
    api_url: Option<String>,
}

/// movsub - turn a movie into translated subtitles
///
/// Extracts the audio track, transcribes it with whisper.cpp, cleans the transcript
/// and translates it in concurrent batches with Gemini.
#[derive(Parser, Debug)]
#[command(name = "movsub")]
#[command(version)]
#[command(about = "Video to translated SRT subtitles")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "movsub extracts audio from a video, transcribes it, cleans the transcript and translates it.

EXAMPLES:
    movsub movie.mkv                          # Translate to the configured language
    movsub -t Japanese -s en movie.mkv        # English audio to Japanese subtitles
    movsub -f --workers 4 movie.mkv           # Overwrite, at most 4 requests at once
    movsub subs.srt                           # Translate an existing subtitle file
    movsub /movies/                           # Process every file in a directory
    movsub clean raw.srt -o clean.srt         # Only clean a transcript
    movsub extract-audio movie.mkv            # Only extract audio
    movsub completions bash > movsub.bash     # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. GEMINI_API_KEY and GEMINI_API_URL override the
    key and endpoint from the file.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    translate: TranslateArgs,
}

// @struct: Custom logger implementation; filtering follows log::max_level()
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} [{}] {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let cli = CommandLineOptions::parse();

    let result = match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "movsub", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Clean { input, output }) => run_clean(&input, output.as_deref()),
        Some(Commands::ExtractAudio { input, output, force, config_path }) => {
            run_extract_audio(&input, output.as_deref(), force, &config_path).await
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => run_translate(cli.translate).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Load the config file and apply command line overrides
fn load_config(options: &TranslateArgs) -> Result<Config> {
    let mut config = Config::load_or_create(&options.config_path)?;

    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(source_lang) = &options.source_language {
        config.source_language = Some(source_lang.clone());
    }
    if let Some(model) = &options.model {
        config.transcription.model = model.clone();
    }
    if let Some(batch_size) = options.batch_size {
        config.translation.batch_size = batch_size;
    }
    if let Some(workers) = options.workers {
        config.translation.concurrent_requests = workers;
    }
    if let Some(max_attempts) = options.max_attempts {
        config.translation.max_attempts = max_attempts;
    }
    if let Some(api_key) = &options.api_key {
        config.translation.api_key = api_key.clone();
    }
    if let Some(api_url) = &options.api_url {
        config.translation.api_url = api_url.clone();
    }
    if let Some(log_level) = options.log_level {
        config.log_level = log_level.into();
    }

    Ok(config)
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = options.log_level {
        let level: app_config::LogLevel = cmd_log_level.into();
        log::set_max_level(level.to_level_filter());
    }

    let input_path = options
        .input_path
        .clone()
        .ok_or_else(|| anyhow!("INPUT is required when no subcommand is specified"))?;

    let config = load_config(&options)?;
    log::set_max_level(config.log_level.to_level_filter());

    let controller = Controller::with_config(config).context("Configuration validation failed")?;

    let run_options = RunOptions {
        force_overwrite: options.force_overwrite,
        keep_temp: options.keep_temp,
        whisper_model: options.model.clone(),
    };

    if input_path.is_file() {
        let output_dir = match &options.output_dir {
            Some(dir) => dir.clone(),
            None => input_path.parent().unwrap_or(Path::new(".")).to_path_buf(),
        };
        controller.run(&input_path, &output_dir, &run_options).await?;
    } else if input_path.is_dir() {
        controller
            .run_folder(&input_path, options.output_dir.as_deref(), &run_options)
            .await?;
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    }

    Ok(())
}

fn run_clean(input: &Path, output: Option<&Path>) -> Result<()> {
    let stats = Controller::clean_file(input, output)?;
    info!("Cleaned {}: {}", input.display(), stats);
    Ok(())
}

async fn run_extract_audio(input: &Path, output: Option<&Path>, force: bool, config_path: &Path) -> Result<()> {
    let config = Config::load_or_create(config_path)?;
    log::set_max_level(config.log_level.to_level_filter());

    let path = Controller::extract_audio(&config, input, output, force).await?;
    info!("Success: {}", path.display());
    Ok(())
}
