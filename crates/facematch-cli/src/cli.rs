use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "facematch",
    about = "Enroll faces and identify them against enrolled descriptor sets",
    version
)]
pub struct Cli {
    /// Emit structured JSON to stdout instead of human-readable logs
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase verbosity (may be used multiple times)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Enroll 3 to 10 images for one identity
    Enroll(EnrollArgs),
    /// Identify the largest face in an image against every enrolled identity
    Identify(IdentifyArgs),
    /// Report how many faces an image contains and the largest one's descriptor
    Detect(DetectArgs),
    /// Inspect or edit an identity's stored descriptors
    #[command(subcommand)]
    Samples(SamplesCommands),
    /// Generate a new descriptor store encryption key
    Keygen(KeygenArgs),
}

#[derive(Debug, Subcommand)]
pub enum SamplesCommands {
    /// List stored descriptors in insertion order
    List(SampleListArgs),
    /// Remove the descriptor at a zero-based index
    Remove(SampleRemoveArgs),
    /// Remove every stored descriptor for an identity
    Clear(SampleClearArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct StoreArgs {
    /// Descriptor store directory (falls back to config, then $FACEMATCH_STORE_DIR)
    #[arg(long)]
    pub store_dir: Option<PathBuf>,

    /// Base64 AES-256-GCM key file used to seal descriptor files at rest
    #[arg(long)]
    pub store_key_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ModelArgs {
    /// Path to the dlib landmark predictor model (falls back to $DLIB_LANDMARK_MODEL)
    #[arg(long)]
    pub landmark_model: Option<PathBuf>,

    /// Path to the dlib face recognition network (falls back to $DLIB_ENCODER_MODEL)
    #[arg(long)]
    pub encoder_model: Option<PathBuf>,

    /// Number of image jitters to run before encoding
    #[arg(long)]
    pub jitters: Option<u32>,
}

#[derive(Debug, Clone, Args)]
pub struct EnrollArgs {
    /// Identity id that owns the enrolled descriptors
    #[arg(long)]
    pub identity: String,

    /// Images to enroll, processed in order
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub models: ModelArgs,
}

#[derive(Debug, Clone, Args)]
pub struct IdentifyArgs {
    /// Query image
    pub image: PathBuf,

    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub models: ModelArgs,
}

#[derive(Debug, Clone, Args)]
pub struct DetectArgs {
    pub image: PathBuf,

    #[command(flatten)]
    pub models: ModelArgs,
}

#[derive(Debug, Clone, Args)]
pub struct SampleListArgs {
    #[arg(long)]
    pub identity: String,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Debug, Clone, Args)]
pub struct SampleRemoveArgs {
    #[arg(long)]
    pub identity: String,

    /// Zero-based position as reported by `samples list`
    #[arg(long)]
    pub index: usize,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Debug, Clone, Args)]
pub struct SampleClearArgs {
    #[arg(long)]
    pub identity: String,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Debug, Clone, Args)]
pub struct KeygenArgs {
    /// Destination key file; never overwritten
    #[arg(long)]
    pub output: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl From<bool> for OutputMode {
    fn from(json: bool) -> Self {
        if json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        OutputMode::from(self.json)
    }
}
