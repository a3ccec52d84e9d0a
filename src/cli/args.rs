//! CLI argument parsing with preset support

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{DetectorConfig, Preset};
use crate::error::ConfigError;
use crate::serve::DEFAULT_MAX_BODY_BYTES;

#[derive(Parser, Debug)]
#[command(name = "voicecheckr")]
#[command(author, version, about = "Detect whether a voice recording is AI-generated or human")]
pub struct Cli {
    /// Verbose output (-v shows per-family scores and debug logs, -vv traces scoring)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze audio files or directories
    Analyze {
        /// Files or directories (searched recursively)
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Print one JSON report per file
        #[arg(long)]
        json: bool,

        /// Number of parallel workers (default: number of CPUs)
        #[arg(short, long)]
        jobs: Option<usize>,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Classify one base64-encoded clip and print the result as JSON
    Detect {
        /// Base64 payload; read from stdin when omitted
        #[arg(long)]
        audio: Option<String>,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Start the HTTP detection service
    Serve {
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,

        #[arg(long, env = "PORT", default_value_t = 8000)]
        port: u16,

        /// Key clients must send in the X-API-Key header
        #[arg(long, env = "API_KEY", hide_env_values = true)]
        api_key: String,

        /// Request-handling threads
        #[arg(long, default_value_t = 4)]
        workers: usize,

        /// Largest accepted request body
        #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES)]
        max_body_bytes: usize,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Write a synthetic reference WAV (tone, varied, silence)
    Generate {
        kind: String,
        output: PathBuf,

        #[arg(long, default_value_t = 4.0)]
        duration: f32,

        #[arg(long, default_value_t = 22050)]
        sample_rate: u32,

        #[arg(long, default_value_t = 1)]
        channels: u16,
    },

    /// Print the effective configuration as JSON
    ShowConfig {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// List available presets
    ListPresets,
}

/// Configuration selection shared by the subcommands
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// JSON configuration file (overrides --preset)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Preset name (balanced, sensitive, conservative)
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Decision threshold override
    #[arg(long)]
    pub threshold: Option<f64>,
}

impl ConfigArgs {
    pub fn load(&self) -> Result<DetectorConfig, ConfigError> {
        let mut config = match (&self.config, &self.preset) {
            (Some(path), _) => DetectorConfig::from_json_file(path)?,
            (None, Some(name)) => {
                let preset = Preset::from_name(name)
                    .ok_or_else(|| ConfigError::UnknownPreset(name.clone()))?;
                DetectorConfig::from_preset(preset)
            }
            (None, None) => DetectorConfig::default(),
        };

        if let Some(threshold) = self.threshold {
            config.scoring.threshold = threshold;
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::parse_from(["voicecheckr", "-v", "analyze", "a.mp3", "dir", "--json"]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Analyze { paths, json, .. } => {
                assert_eq!(paths.len(), 2);
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_config_args() {
        let args = ConfigArgs {
            preset: Some("sensitive".into()),
            threshold: None,
            config: None,
        };
        assert_eq!(args.load().unwrap().preset, Preset::Sensitive);

        let unknown = ConfigArgs {
            preset: Some("paranoid".into()),
            ..Default::default()
        };
        assert!(matches!(unknown.load(), Err(ConfigError::UnknownPreset(_))));

        let bad_threshold = ConfigArgs {
            threshold: Some(0.0),
            ..Default::default()
        };
        assert!(bad_threshold.load().is_err());
    }
}
