//! Command-line interface for lipread
//!
//! Provides argument parsing using clap derive macros. Every option overrides
//! itself, so when a flag appears more than once (typically across `@file`
//! flag files) the last occurrence wins.

use crate::config::{
    AttentionType, Config, CorrectionBackend, DecodeStrategy, LandmarkBackend, RnnType,
};
use crate::workspace::DatasetTier;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::ffi::OsString;
use std::path::PathBuf;

/// Lip reading from video
#[derive(Parser, Debug)]
#[command(
    name = "lipread",
    version,
    about = "Lip reading from video: face landmarks to text",
    args_override_self = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose logging (-v: info, -vv: debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

impl Cli {
    /// Parse arguments after expanding `@file` flag files in place.
    pub fn parse_expanded<I, S>(args: I) -> crate::error::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let expanded = crate::flags::expand_args(args)?;
        Cli::try_parse_from(expanded).map_err(|e| crate::error::LipreadError::Other(e.to_string()))
    }

    /// Like [`Cli::parse_expanded`] over the process arguments, exiting with
    /// clap's usage message on parse errors.
    pub fn parse_env() -> crate::error::Result<Self> {
        let args: Vec<String> = std::env::args_os()
            .map(|a: OsString| a.to_string_lossy().into_owned())
            .collect();
        let expanded = crate::flags::expand_args(args)?;
        Ok(Cli::parse_from(expanded))
    }
}

/// Flags that override configuration file values.
///
/// These are the flags flag files usually carry, e.g. a model
/// architecture file with `--rnn-type gru` and `--hidden-size 256`.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    /// Workspace root (overrides the config file and LIPREAD_ROOT)
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Frame rate for extraction
    #[arg(long, global = true, value_name = "FPS")]
    pub fps: Option<u32>,

    /// Landmark predictor backend
    #[arg(long, global = true, value_enum)]
    pub landmarks: Option<LandmarkBackend>,

    /// Feed only the mouth landmarks to the model
    #[arg(long, global = true, value_name = "BOOL")]
    pub mouth_only: Option<bool>,

    /// Sequence model weights file
    #[arg(long, global = true, value_name = "PATH")]
    pub weights: Option<PathBuf>,

    #[arg(long, global = true, value_enum)]
    pub rnn_type: Option<RnnType>,

    #[arg(long, global = true, value_name = "N")]
    pub hidden_size: Option<usize>,

    #[arg(long, global = true, value_name = "N")]
    pub num_layers: Option<usize>,

    #[arg(long, global = true, value_name = "BOOL")]
    pub bidirectional: Option<bool>,

    #[arg(long, global = true, value_name = "BOOL")]
    pub enable_ctc: Option<bool>,

    #[arg(long, global = true, value_name = "BOOL")]
    pub attention_decoder: Option<bool>,

    #[arg(long, global = true, value_enum)]
    pub attention: Option<AttentionType>,

    #[arg(long, global = true, value_name = "N")]
    pub attn_hidden_size: Option<usize>,

    #[arg(long, global = true, value_name = "N")]
    pub char_dim: Option<usize>,

    /// Decoding strategy
    #[arg(long, global = true, value_enum)]
    pub decoder: Option<DecodeStrategy>,

    #[arg(long, global = true, value_name = "N")]
    pub beam_width: Option<usize>,

    /// Word and sentence correction backend
    #[arg(long, global = true, value_enum)]
    pub correction: Option<CorrectionBackend>,

    /// Frequency dictionary for word correction
    #[arg(long, global = true, value_name = "PATH")]
    pub dictionary: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Write every given flag into `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(root) = &self.root {
            config.workspace.root = Some(root.clone());
        }
        if let Some(fps) = self.fps {
            config.video.fps = fps;
        }
        if let Some(landmarks) = self.landmarks {
            config.vision.landmarks = landmarks;
        }
        if let Some(mouth_only) = self.mouth_only {
            config.vision.mouth_only = mouth_only;
        }

        let model = &mut config.model;
        if let Some(weights) = &self.weights {
            model.weights = Some(weights.clone());
        }
        if let Some(rnn_type) = self.rnn_type {
            model.rnn_type = rnn_type;
        }
        if let Some(n) = self.hidden_size {
            model.hidden_size = n;
        }
        if let Some(n) = self.num_layers {
            model.num_layers = n;
        }
        if let Some(b) = self.bidirectional {
            model.bidirectional = b;
        }
        if let Some(b) = self.enable_ctc {
            model.enable_ctc = b;
        }
        if let Some(b) = self.attention_decoder {
            model.attention_decoder = b;
        }
        if let Some(attention) = self.attention {
            model.attention = attention;
        }
        if let Some(n) = self.attn_hidden_size {
            model.attn_hidden_size = n;
        }
        if let Some(n) = self.char_dim {
            model.char_dim = n;
        }

        if let Some(strategy) = self.decoder {
            config.decode.strategy = strategy;
        }
        if let Some(n) = self.beam_width {
            config.decode.beam_width = n;
        }
        if let Some(backend) = self.correction {
            config.correction.backend = backend;
        }
        if let Some(dictionary) = &self.dictionary {
            config.correction.dictionary = Some(dictionary.clone());
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the workspace directories under the workspace root
    Init,

    /// Extract numbered PNG frames from a video
    Frames {
        video: PathBuf,
        /// Output directory (default: <video stem>_frames next to the video)
        #[arg(long, short, value_name = "DIR")]
        out: Option<PathBuf>,
    },

    /// Detect the face and 68 landmarks in every frame of a clip
    Landmarks {
        /// Video file or directory of extracted frames
        input: PathBuf,
        /// Write the landmark sequence as a dataview JSON into DIR
        #[arg(long, short, value_name = "DIR")]
        out: Option<PathBuf>,
    },

    /// Build or inspect dataviews
    Dataview {
        #[command(subcommand)]
        action: DataviewAction,
    },

    /// Read the lips in one or more videos (or frame directories)
    Transcribe {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Skip word and sentence correction
        #[arg(long)]
        no_correction: bool,
        /// Prefix each line with the clip id
        #[arg(long)]
        show_ids: bool,
    },

    /// Score the recognizer against a dataview tier
    Evaluate {
        #[arg(long, value_enum, default_value = "nano")]
        tier: DatasetTier,
        #[arg(long)]
        no_correction: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage word correction dictionaries
    Dictionary {
        #[command(subcommand)]
        action: DictionaryAction,
    },

    /// Inspect the effective configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum DataviewAction {
    /// Extract frames and landmarks for every raw clip of a tier
    Build {
        #[arg(long, value_enum)]
        tier: DatasetTier,
        /// Rebuild examples that already exist
        #[arg(long)]
        overwrite: bool,
    },
    /// Show example and frame counts per tier
    List,
}

#[derive(Subcommand, Debug)]
pub enum DictionaryAction {
    /// List known dictionaries and whether they are installed
    List,
    /// Download a dictionary into the workspace
    Install {
        /// Language code
        #[arg(default_value = crate::dictionary::DEFAULT_LANGUAGE)]
        language: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Get a configuration value by dotted key (e.g., model.hidden_size)
    Get { key: String },
    /// Show the effective configuration
    List,
    /// Dump the default configuration as TOML
    Dump,
}
