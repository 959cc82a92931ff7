//! prism: command-line front end for the prism image pipeline.
//!
//! Exposes both entry surfaces of the pipeline:
//!
//! - `process` runs one single-stage task on an image, the way an upload
//!   would, and stores `processed_<name>` under the storage root.
//! - `stages` runs one stage-1/stage-2 pair on an image.
//! - `shell` reads interactive two-stage actions from stdin.
//! - `fetch` retrieves a stored artifact by name.
//!
//! # Usage
//!
//! ```text
//! prism process photo.png --task 3 --kernel-size 7
//! prism stages photo.png 7 3
//! prism shell < actions.txt
//! prism fetch processed_photo.png -o out.png
//! ```
//!
//! Logging is controlled by `RUST_LOG` (default `info`).

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use prism_io::{
    ArtifactStore, ConfigError, FileViewer, IoError, Session, StorageConfig, UploadHandler,
    UploadRequest,
};
use prism_pipeline::{OutputFormat, artifact_name, decode, encode, run_stages};

/// Classic raster transformations on uploaded images.
#[derive(Parser)]
#[command(name = "prism", version)]
struct Cli {
    /// JSON storage config. Flags given on the command line override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding originals and artifacts.
    #[arg(long, global = true)]
    storage_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one task on an image and store the result, like an upload.
    Process {
        /// Path to the input image (PNG or JPEG).
        image_path: PathBuf,

        /// Task code: 1 grayscale, 2 box blur, 3 Gaussian blur,
        /// 4 median blur, 5 histogram equalization. Anything else
        /// copies the image unchanged.
        #[arg(long)]
        task: Option<String>,

        /// Odd kernel size greater than 1 (default 5).
        #[arg(long)]
        kernel_size: Option<String>,

        /// Upload name to store under. Defaults to the input file name.
        #[arg(long)]
        name: Option<String>,

        /// Print the upload response as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Run a stage-1/stage-2 code pair on an image.
    Stages {
        /// Path to the input image.
        image_path: PathBuf,

        /// Stage-1 code: 1 equalize + stretch, 6 global threshold,
        /// 7 Otsu, 11 adaptive mean, 12 adaptive Gaussian.
        stage1: u32,

        /// Stage-2 code: 2 low-pass, 3 Laplacian, 4 Canny.
        stage2: u32,

        /// Output file (PNG or JPEG). Defaults to
        /// `<storage root>/processed_<name>`.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Read interactive actions (open, preset, apply, help, quit).
    Shell {
        /// Read actions from this file instead of stdin.
        #[arg(long)]
        script: Option<PathBuf>,

        /// Where shown images are written. Defaults to
        /// `<storage root>/shell`.
        #[arg(long)]
        view_dir: Option<PathBuf>,
    },

    /// Retrieve a stored artifact by name.
    Fetch {
        /// Artifact name, e.g. `processed_photo.png`.
        name: String,

        /// Write to this file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to serialize response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Usage(String),
}

impl From<prism_pipeline::PipelineError> for CliError {
    fn from(e: prism_pipeline::PipelineError) -> Self {
        Self::Io(e.into())
    }
}

/// Resolve the storage config: defaults, then the config file, then flags.
fn storage_config(cli: &Cli) -> Result<StorageConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => StorageConfig::load(path)?,
        None => StorageConfig::default(),
    };
    if let Some(root) = &cli.storage_root {
        config.storage_root.clone_from(root);
    }
    Ok(config)
}

fn read_input(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|source| {
        CliError::Io(IoError::Fs {
            action: "read",
            path: path.to_path_buf(),
            source,
        })
    })
}

fn file_name_of(path: &Path) -> Result<String, CliError> {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(str::to_owned)
        .ok_or_else(|| CliError::Usage(format!("{} has no file name", path.display())))
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, bytes).map_err(|source| {
        CliError::Io(IoError::Fs {
            action: "write",
            path: path.to_path_buf(),
            source,
        })
    })
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = storage_config(cli)?;
    let store = ArtifactStore::new(&config.storage_root);

    match &cli.command {
        Command::Process {
            image_path,
            task,
            kernel_size,
            name,
            json,
        } => {
            let request = UploadRequest {
                file_name: match name {
                    Some(name) => name.clone(),
                    None => file_name_of(image_path)?,
                },
                bytes: read_input(image_path)?,
                task: task.clone(),
                kernel_size: kernel_size.clone(),
            };
            let response = UploadHandler::new(store).handle(&request)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!(
                    "{} -> {}",
                    response.original_name,
                    response.artifact_path.display()
                );
            }
        }

        Command::Stages {
            image_path,
            stage1,
            stage2,
            output,
        } => {
            let image = decode(&read_input(image_path)?)?;
            let artifact = run_stages(&image, *stage1, *stage2);
            let output = match output {
                Some(path) => path.clone(),
                None => {
                    store.ensure_root()?;
                    store.root().join(artifact_name(&file_name_of(image_path)?))
                }
            };
            let format = OutputFormat::from_name(&output.to_string_lossy())?;
            write_output(&output, &encode(&artifact.image, format)?)?;
            log::info!("wrote {}", output.display());
        }

        Command::Shell { script, view_dir } => {
            let mut viewer = FileViewer::new(
                view_dir
                    .clone()
                    .unwrap_or_else(|| config.storage_root.join("shell")),
            );
            let mut session = Session::new();
            let mut stdout = io::stdout().lock();
            match script {
                Some(path) => {
                    let file = File::open(path).map_err(|source| IoError::Fs {
                        action: "open",
                        path: path.clone(),
                        source,
                    })?;
                    prism_io::shell::run(&mut session, BufReader::new(file), &mut viewer, &mut stdout)?;
                }
                None => {
                    prism_io::shell::run(&mut session, io::stdin().lock(), &mut viewer, &mut stdout)?;
                }
            }
        }

        Command::Fetch { name, output } => {
            let bytes = store.open(name)?;
            match output {
                Some(path) => write_output(path, &bytes)?,
                None => io::stdout().lock().write_all(&bytes).map_err(|source| {
                    IoError::Fs {
                        action: "write",
                        path: PathBuf::from("<stdout>"),
                        source,
                    }
                })?,
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
