use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use docchat::BackendMode;
use docchat::api::{ChatBackend, ChatRequest, HttpBackend, UploadFile};
use docchat::core::config::{self, ResolvedConfig};
use docchat::core::format::{FormatterConfig, TextFormatter};
use docchat::core::session::new_session_id;
use docchat::core::validate::{UploadCandidate, ValidationOutcome};
use docchat::repl;
use simplelog::{ConfigBuilder, WriteLogger};

#[derive(Parser)]
#[command(name = "docchat", about = "Chat client for a document Q&A backend")]
struct Args {
    /// Backend base URL (overrides config and DOCCHAT_BACKEND_URL)
    #[arg(short, long, global = true)]
    backend: Option<String>,

    /// Endpoint used for questions
    #[arg(short, long, value_enum, global = true)]
    mode: Option<BackendMode>,

    /// Config file to use instead of ~/.docchat/config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Format markdown from FILE (or stdin) and print the HTML fragment
    Format {
        file: Option<PathBuf>,
        /// Do not escape HTML in the input
        #[arg(long)]
        raw: bool,
        /// Print the output of every formatting pass
        #[arg(long)]
        trace: bool,
    },
    /// Check files against the upload policy
    Validate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Ask one question and print the formatted answer
    Ask {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Validate and upload one document
    Upload { file: PathBuf },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let file_config = match config::load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let config = config::resolve(&file_config, args.backend.as_deref(), args.mode);

    // Initialize file logger
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create(&config.log_file) {
        let _ = WriteLogger::init(config.log_level, log_config, log_file);
    }

    log::info!(
        "docchat starting: backend={} mode={:?}",
        config.backend_url,
        config.backend_mode
    );

    let result = match args.command {
        None => repl::run(config)
            .await
            .map(|()| ExitCode::SUCCESS)
            .map_err(Into::into),
        Some(Command::Format { file, raw, trace }) => {
            format_command(&config, file.as_deref(), raw, trace)
        }
        Some(Command::Validate { files }) => Ok(validate_command(&config, &files)),
        Some(Command::Ask { text }) => ask_command(&config, &text.join(" ")).await,
        Some(Command::Upload { file }) => upload_command(&config, &file).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

type CommandResult = Result<ExitCode, Box<dyn std::error::Error>>;

fn format_command(
    config: &ResolvedConfig,
    file: Option<&Path>,
    raw: bool,
    trace: bool,
) -> CommandResult {
    let input = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let formatter = TextFormatter::new(FormatterConfig {
        escape_html: config.formatter.escape_html && !raw,
        headings: config.formatter.headings.clone(),
    });

    if trace {
        for (pass, output) in formatter.trace(&input) {
            println!("== {pass} ==\n{output}");
        }
    } else {
        println!("{}", formatter.format(&input));
    }
    Ok(ExitCode::SUCCESS)
}

fn validate_command(config: &ResolvedConfig, files: &[PathBuf]) -> ExitCode {
    let mut all_accepted = true;
    for path in files {
        match UploadCandidate::from_path(path) {
            Ok(candidate) => match config.upload_policy.validate(&candidate) {
                ValidationOutcome::Accepted => println!("{}: accepted", path.display()),
                ValidationOutcome::Rejected(rejection) => {
                    all_accepted = false;
                    println!("{}: {rejection}", path.display());
                }
            },
            Err(e) => {
                all_accepted = false;
                println!("{}: cannot read: {e}", path.display());
            }
        }
    }
    if all_accepted {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn http_backend(config: &ResolvedConfig) -> Result<HttpBackend, docchat::api::BackendError> {
    HttpBackend::new(
        &config.backend_url,
        config.backend_mode,
        Duration::from_secs(config.timeout_secs),
    )
}

async fn ask_command(config: &ResolvedConfig, text: &str) -> CommandResult {
    let backend = http_backend(config)?;
    log::info!(
        "Asking {} via /{}",
        backend.base_url(),
        backend.mode().endpoint()
    );
    let session_id = new_session_id();
    let answer = backend
        .send(ChatRequest {
            session_id: &session_id,
            text,
        })
        .await?;
    println!("{}", TextFormatter::new(config.formatter.clone()).format(&answer));
    Ok(ExitCode::SUCCESS)
}

async fn upload_command(config: &ResolvedConfig, path: &Path) -> CommandResult {
    let candidate = UploadCandidate::from_path(path)?;
    config.upload_policy.validate(&candidate).into_result()?;

    let backend = http_backend(config)?;
    log::info!("Uploading {} to {}", path.display(), backend.base_url());
    let bytes = tokio::fs::read(path).await?;
    let message = backend
        .upload(UploadFile {
            file_name: candidate.file_name,
            mime_type: candidate.declared_mime_type,
            bytes,
        })
        .await?;
    println!("{message}");
    Ok(ExitCode::SUCCESS)
}
