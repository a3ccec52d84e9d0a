//! Output formatting for CLI results

use colorful::Colorful;
use serde::Serialize;

use crate::detection::{Classification, DetectionReport};
use crate::error::DetectError;

/// One line of batch JSON output
#[derive(Serialize)]
pub struct FileOutcome<'a> {
    pub file: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<&'a DetectionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Format a detection report for terminal output
pub fn format_report(file: &str, report: &DetectionReport, verbose: bool) -> String {
    let mut output = String::new();

    let verdict = format!(
        "{} {}",
        report.classification().symbol(),
        report.classification().label()
    );
    let verdict = match report.classification() {
        Classification::AiGenerated => verdict.as_str().red().bold().to_string(),
        Classification::Human => verdict.as_str().green().bold().to_string(),
    };

    output.push_str(&format!(
        "{} {}\n",
        verdict,
        file.cyan()
    ));
    output.push_str(&format!(
        "  confidence {:.0}%  aggregate {:.3} (threshold {:.2})\n",
        report.confidence() * 100.0,
        report.aggregate_score,
        report.threshold
    ));

    if !verbose {
        return output;
    }

    if let Some(audio) = &report.audio {
        output.push_str(&format!(
            "  {}\n",
            format!(
                "{} | {} Hz, {} ch -> {} Hz | {:.2}s",
                audio.codec,
                audio.source_sample_rate,
                audio.source_channels,
                audio.analysis_sample_rate,
                audio.duration_secs
            )
            .as_str()
            .dim()
        ));
    }

    output.push_str(&format!("  {} frames\n", report.features.frame_count));
    for (family, score) in report.scores.iter() {
        let bar = score_bar(score.score);
        output.push_str(&format!(
            "    {:<20} {} {:>4.0}%  var {:<10.3e} w {:.3}\n",
            family.name(),
            bar,
            score.score * 100.0,
            score.variance,
            score.weight
        ));
    }

    output
}

pub fn format_failure(file: &str, error: &DetectError) -> String {
    let kind = if error.is_client_fault() {
        "✗ REJECTED".yellow().to_string()
    } else {
        "✗ FAILED".red().to_string()
    };
    format!("{} {}\n  {}\n", kind, file.cyan(), error)
}

pub fn format_summary(ai: usize, human: usize, failed: usize) -> String {
    let mut output = format!(
        "\n{}\n  {} {}\n  {} {}\n",
        "Summary:".bold(),
        "AI_GENERATED:".red(),
        ai,
        "HUMAN:       ".green(),
        human
    );
    if failed > 0 {
        output.push_str(&format!("  {} {}\n", "Failed:      ".yellow(), failed));
    }
    output
}

pub fn format_json(outcome: &FileOutcome<'_>) -> String {
    serde_json::to_string(outcome).unwrap_or_else(|e| {
        format!("{{\"file\":{:?},\"error\":\"{}\"}}", outcome.file, e)
    })
}

/// Ten-cell bar for a score in [0, 1]
fn score_bar(score: f64) -> String {
    let filled = (score.clamp(0.0, 1.0) * 10.0).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(10 - filled))
}
