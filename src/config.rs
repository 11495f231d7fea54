use crate::defaults;
use crate::error::{LipreadError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub workspace: WorkspaceConfig,
    pub video: VideoConfig,
    pub vision: VisionConfig,
    pub model: ModelConfig,
    pub decode: DecodeConfig,
    pub correction: CorrectionConfig,
}

/// Workspace location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Workspace root; `LIPREAD_ROOT` overrides it and `--root` overrides both.
    pub root: Option<PathBuf>,
}

/// Frame extraction settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VideoConfig {
    pub fps: u32,
    pub ffmpeg: String,
}

/// Face detection and landmarking settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VisionConfig {
    /// SeetaFace model; defaults to `weights/seeta_fd_frontal_v1.0.bin`.
    pub face_model: Option<PathBuf>,
    pub min_face_size: u32,
    pub landmarks: LandmarkBackend,
    /// Regressor weights; defaults to `weights/landmarks.safetensors`.
    pub landmark_model: Option<PathBuf>,
    /// Feed only the 20 mouth landmarks to the sequence model.
    pub mouth_only: bool,
}

/// Sequence model architecture
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Weights file; defaults to `weights/lipreader.safetensors`.
    pub weights: Option<PathBuf>,
    pub rnn_type: RnnType,
    pub hidden_size: usize,
    pub num_layers: usize,
    pub bidirectional: bool,
    pub enable_ctc: bool,
    pub attention_decoder: bool,
    pub attention: AttentionType,
    pub attn_hidden_size: usize,
    pub char_dim: usize,
    pub alphabet: String,
}

/// Decoding settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DecodeConfig {
    pub strategy: DecodeStrategy,
    pub beam_width: usize,
    pub max_chars: usize,
}

/// Word and sentence correction settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CorrectionConfig {
    pub enabled: bool,
    pub backend: CorrectionBackend,
    /// Frequency dictionary for SymSpell; defaults to the installed English one.
    pub dictionary: Option<PathBuf>,
    /// Edit distance allowed per word.
    pub max_edit_distance: i64,
    /// Sentence model name for the T5 backend.
    pub lm_model: String,
}

/// Landmark predictor backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum LandmarkBackend {
    /// Canonical mean face fitted to the detected box
    MeanShape,
    /// Learned regressor over the face crop
    Regressor,
}

/// Recurrent cell type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum RnnType {
    Lstm,
    Gru,
    Rnn,
}

/// Attention scoring function of the character decoder
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum AttentionType {
    None,
    Dot,
    General,
    #[serde(rename = "1-layer-nn")]
    #[cfg_attr(feature = "cli", value(name = "1-layer-nn"))]
    OneLayerNn,
    Concat,
}

/// How character hypotheses are decoded
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum DecodeStrategy {
    CtcGreedy,
    CtcBeam,
    Attention,
}

/// Word / sentence correction backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum CorrectionBackend {
    None,
    Symspell,
    T5,
}

impl std::str::FromStr for DecodeStrategy {
    type Err = LipreadError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ctc-greedy" => Ok(Self::CtcGreedy),
            "ctc-beam" => Ok(Self::CtcBeam),
            "attention" => Ok(Self::Attention),
            other => Err(LipreadError::ConfigInvalidValue {
                key: "decode.strategy".to_string(),
                message: format!("unknown strategy '{other}' (ctc-greedy, ctc-beam, attention)"),
            }),
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            fps: defaults::FRAME_RATE,
            ffmpeg: "ffmpeg".to_string(),
        }
    }
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            face_model: None,
            min_face_size: defaults::MIN_FACE_SIZE,
            landmarks: LandmarkBackend::MeanShape,
            landmark_model: None,
            mouth_only: false,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            weights: None,
            rnn_type: RnnType::Lstm,
            hidden_size: defaults::HIDDEN_SIZE,
            num_layers: 1,
            bidirectional: true,
            enable_ctc: true,
            attention_decoder: false,
            attention: AttentionType::None,
            attn_hidden_size: 0,
            char_dim: defaults::CHAR_DIM,
            alphabet: defaults::DEFAULT_ALPHABET.to_string(),
        }
    }
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            strategy: DecodeStrategy::CtcGreedy,
            beam_width: defaults::BEAM_WIDTH,
            max_chars: defaults::MAX_DECODE_CHARS,
        }
    }
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CorrectionBackend::Symspell,
            dictionary: None,
            max_edit_distance: 2,
            lm_model: "flan-t5-small".to_string(),
        }
    }
}

impl ModelConfig {
    /// Check cross-field constraints the type system cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.hidden_size == 0 {
            return Err(invalid("model.hidden_size", "must be positive"));
        }
        if self.num_layers == 0 {
            return Err(invalid("model.num_layers", "must be at least 1"));
        }
        if !self.enable_ctc && !self.attention_decoder {
            return Err(invalid(
                "model.enable_ctc",
                "enable the CTC head, the attention decoder, or both",
            ));
        }
        if self.attention_decoder
            && self.attention == AttentionType::Concat
            && self.attn_hidden_size == 0
        {
            return Err(invalid(
                "model.attn_hidden_size",
                "concat attention needs attn_hidden_size > 0",
            ));
        }
        if self.alphabet.is_empty() {
            return Err(invalid("model.alphabet", "must not be empty"));
        }
        Ok(())
    }
}

impl DecodeConfig {
    /// Check the strategy against the heads the model actually has.
    pub fn validate_for(&self, model: &ModelConfig) -> Result<()> {
        match self.strategy {
            DecodeStrategy::CtcGreedy | DecodeStrategy::CtcBeam if !model.enable_ctc => Err(
                invalid("decode.strategy", "CTC decoding needs model.enable_ctc"),
            ),
            DecodeStrategy::Attention if !model.attention_decoder => Err(invalid(
                "decode.strategy",
                "attention decoding needs model.attention_decoder",
            )),
            DecodeStrategy::CtcBeam if self.beam_width == 0 => {
                Err(invalid("decode.beam_width", "must be positive"))
            }
            _ => Ok(()),
        }
    }
}

fn invalid(key: &str, message: &str) -> LipreadError {
    LipreadError::ConfigInvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing fields use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LipreadError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                LipreadError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file, or defaults if the file doesn't exist.
    ///
    /// Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(LipreadError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - LIPREAD_ROOT → workspace.root
    /// - LIPREAD_WEIGHTS → model.weights
    /// - LIPREAD_DECODER → decode.strategy
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(root) = std::env::var(defaults::ROOT_ENV)
            && !root.is_empty()
        {
            self.workspace.root = Some(PathBuf::from(root));
        }

        if let Ok(weights) = std::env::var("LIPREAD_WEIGHTS")
            && !weights.is_empty()
        {
            self.model.weights = Some(PathBuf::from(weights));
        }

        if let Ok(decoder) = std::env::var("LIPREAD_DECODER")
            && !decoder.is_empty()
        {
            self.decode.strategy = decoder.parse()?;
        }

        Ok(self)
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/lipread/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("lipread")
            .join("config.toml")
    }

    /// Look up a value by dotted key (e.g. `model.hidden_size`).
    pub fn get_value(&self, key: &str) -> Option<toml::Value> {
        let mut value = toml::Value::try_from(self).ok()?;
        for part in key.split('.') {
            value = value.get(part)?.clone();
        }
        Some(value)
    }

    /// Render the full configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| LipreadError::Other(format!("Serialize config: {e}")))
    }
}

/// Environment helpers shared by tests that touch `LIPREAD_*` variables.
#[cfg(test)]
pub(crate) mod test_env {
    use std::sync::Mutex;

    // Serializes tests that modify environment variables
    pub(crate) static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: only called with ENV_LOCK held.
    pub(crate) fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    pub(crate) fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    pub(crate) fn clear_lipread_env() {
        remove_env("LIPREAD_ROOT");
        remove_env("LIPREAD_WEIGHTS");
        remove_env("LIPREAD_DECODER");
    }
}
