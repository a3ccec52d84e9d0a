// src/cli/mod.rs
//
// Command-line interface module

mod args;
mod output;

pub use args::{Cli, Command, ConfigArgs};
pub use output::{format_failure, format_json, format_report, format_summary, FileOutcome};

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use colorful::Colorful;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::config::Preset;
use crate::core::VoiceAnalyzer;
use crate::detection::DetectionReport;
use crate::error::DetectError;
use crate::serve::{self, ServerConfig};
use crate::testgen::{self, SignalKind};

pub const AUDIO_EXTENSIONS: [&str; 10] = [
    "mp3", "wav", "wave", "flac", "ogg", "oga", "m4a", "aac", "aiff", "aif",
];

/// Run a parsed command line
pub fn run(cli: Cli) -> Result<ExitCode> {
    let verbose = cli.verbose > 0;
    match cli.command {
        Command::Analyze {
            paths,
            json,
            jobs,
            config,
        } => run_analyze(&paths, json, jobs, &config, verbose),
        Command::Detect { audio, config } => run_detect(audio, &config),
        Command::Serve {
            host,
            port,
            api_key,
            workers,
            max_body_bytes,
            config,
        } => {
            if api_key.is_empty() {
                bail!("an API key is required (--api-key or API_KEY)");
            }
            let analyzer = VoiceAnalyzer::with_config(config.load()?)?;
            let server = ServerConfig {
                host,
                port,
                api_key,
                workers,
                max_body_bytes,
            };
            serve::start(server, analyzer).context("HTTP server failed")?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Generate {
            kind,
            output,
            duration,
            sample_rate,
            channels,
        } => run_generate(&kind, &output, duration, sample_rate, channels),
        Command::ShowConfig { config } => {
            println!("{}", config.load()?.to_json_pretty()?);
            Ok(ExitCode::SUCCESS)
        }
        Command::ListPresets => {
            println!("Available presets:\n");
            for preset in Preset::all() {
                println!("  {:<14} {}", preset.name(), preset.description());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Audio files under the given paths; directories are searched recursively
pub fn collect_audio_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && has_audio_extension(e.path()))
                .map(|e| e.path().to_path_buf())
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    files
}

fn has_audio_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn run_analyze(
    paths: &[PathBuf],
    json: bool,
    jobs: Option<usize>,
    config: &ConfigArgs,
    verbose: bool,
) -> Result<ExitCode> {
    let analyzer = VoiceAnalyzer::with_config(config.load()?)?;

    apply_jobs(jobs);

    let files = collect_audio_files(paths);
    if files.is_empty() {
        eprintln!("{}", "No audio files found!".red());
        return Ok(ExitCode::from(1));
    }
    info!("Analyzing {} file(s)", files.len());

    let pb = if !json && files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("=>-"));
        }
        Some(pb)
    } else {
        None
    };

    let results: Vec<(PathBuf, std::result::Result<DetectionReport, DetectError>)> = files
        .par_iter()
        .map(|path| {
            let result = analyze_file(&analyzer, path);
            if let Some(ref pb) = pb {
                pb.inc(1);
                pb.set_message(file_name(path));
            }
            (path.clone(), result)
        })
        .collect();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let (mut ai, mut human, mut failed) = (0, 0, 0);
    for (path, result) in &results {
        let name = path.display().to_string();
        match result {
            Ok(report) => {
                if report.classification().is_ai_generated() {
                    ai += 1;
                } else {
                    human += 1;
                }
                if json {
                    println!(
                        "{}",
                        format_json(&FileOutcome {
                            file: &name,
                            report: Some(report),
                            error: None,
                        })
                    );
                } else {
                    print!("{}", format_report(&name, report, verbose));
                }
            }
            Err(e) => {
                failed += 1;
                warn!("{}: {}", name, e);
                if json {
                    println!(
                        "{}",
                        format_json(&FileOutcome {
                            file: &name,
                            report: None,
                            error: Some(e.to_string()),
                        })
                    );
                } else {
                    print!("{}", format_failure(&name, e));
                }
            }
        }
    }

    if !json && results.len() > 1 {
        eprint!("{}", format_summary(ai, human, failed));
    }

    Ok(if failed > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

/// Size the global rayon pool; false when the pool was already running
fn apply_jobs(jobs: Option<usize>) -> bool {
    let Some(jobs) = jobs else {
        return true;
    };
    match rayon::ThreadPoolBuilder::new().num_threads(jobs).build_global() {
        Ok(()) => true,
        Err(e) => {
            warn!("Could not use {} worker threads: {}", jobs, e);
            false
        }
    }
}

fn analyze_file(
    analyzer: &VoiceAnalyzer,
    path: &Path,
) -> std::result::Result<DetectionReport, DetectError> {
    let bytes = std::fs::read(path).map_err(|source| DetectError::Unreadable {
        path: path.display().to_string(),
        source,
    })?;
    analyzer.detect_bytes(bytes)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn run_detect(audio: Option<String>, config: &ConfigArgs) -> Result<ExitCode> {
    let analyzer = VoiceAnalyzer::with_config(config.load()?)?;

    let payload = match audio {
        Some(audio) => audio,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read base64 payload from stdin")?;
            buffer
        }
    };

    match analyzer.detect(&payload) {
        Ok(result) => {
            println!("{}", serde_json::to_string(&result)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            let status = if e.is_client_fault() { 400 } else { 500 };
            println!(
                "{}",
                serde_json::json!({ "error": e.to_string(), "status_code": status })
            );
            Ok(ExitCode::from(if e.is_client_fault() { 2 } else { 1 }))
        }
    }
}

fn run_generate(
    kind: &str,
    output: &Path,
    duration: f32,
    sample_rate: u32,
    channels: u16,
) -> Result<ExitCode> {
    let kind = SignalKind::from_name(kind).with_context(|| {
        let names: Vec<&str> = SignalKind::all().iter().map(|k| k.name()).collect();
        format!("Unknown signal kind '{}' (expected one of: {})", kind, names.join(", "))
    })?;
    if !(duration > 0.0) || sample_rate == 0 {
        bail!("duration and sample rate must be positive");
    }

    let mono = testgen::generate(kind, sample_rate, duration);
    testgen::write_wav(output, &testgen::interleave(&mono, channels), sample_rate, channels)?;

    eprintln!(
        "{} {} ({}, {:.1}s, {} Hz, {} ch)",
        "Wrote".green(),
        output.display(),
        kind.description(),
        duration,
        sample_rate,
        channels
    );
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_extension_filter() {
        assert!(has_audio_extension(Path::new("clip.MP3")));
        assert!(has_audio_extension(Path::new("dir/clip.wav")));
        assert!(!has_audio_extension(Path::new("notes.txt")));
        assert!(!has_audio_extension(Path::new("README")));
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let analyzer = VoiceAnalyzer::new().unwrap();
        let err = analyze_file(&analyzer, Path::new("no/such/clip.wav")).unwrap_err();

        assert!(matches!(err, DetectError::Unreadable { .. }));
        assert!(err.is_client_fault());
        assert!(format_failure("clip.wav", &err).contains("REJECTED"));
    }

    #[test]
    fn test_jobs_cannot_resize_a_running_pool() {
        assert!(apply_jobs(None));
        apply_jobs(Some(2));
        assert!(!apply_jobs(Some(3)));
    }

    #[test]
    fn test_explicit_files_are_kept() {
        let files = collect_audio_files(&[PathBuf::from("missing.txt")]);
        assert_eq!(files, vec![PathBuf::from("missing.txt")]);
    }
}
