//! `skillfortify-scan`: thin CLI adapter around the analyzer core.
//!
//! Reads a JSON array of `ParsedSkill` from a file, analyzes each, applies
//! severity-threshold filtering, and renders the result. File discovery and
//! per-format parsing are out of scope here; this binary consumes the
//! `ParsedSkill` contract directly.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use skillfortify::{AnalysisResult, ParsedSkill, Severity, analyze};

#[derive(Parser)]
#[command(name = "skillfortify-scan", about = "Static analysis for LLM agent skills")]
struct Cli {
    /// Path to a JSON file containing an array of ParsedSkill objects.
    input: PathBuf,

    /// Minimum severity to report; findings below this are filtered out.
    #[arg(long, value_enum, default_value = "low")]
    severity_threshold: SeverityArg,

    /// Output format.
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum SeverityArg {
    Low,
    Medium,
    High,
    Critical,
}

impl From<SeverityArg> for Severity {
    fn from(value: SeverityArg) -> Self {
        match value {
            SeverityArg::Low => Severity::Low,
            SeverityArg::Medium => Severity::Medium,
            SeverityArg::High => Severity::High,
            SeverityArg::Critical => Severity::Critical,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Html,
}

#[derive(Serialize)]
struct ScanReport {
    skill_name: String,
    is_safe: bool,
    findings: Vec<skillfortify::Finding>,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("skillfortify=info")),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(exit_code) => exit_code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let raw = fs::read_to_string(&cli.input)?;
    let skills: Vec<ParsedSkill> = serde_json::from_str(&raw)?;

    if skills.is_empty() {
        eprintln!("no skills discovered in {}", cli.input.display());
        return Ok(ExitCode::from(2));
    }

    let threshold: Severity = cli.severity_threshold.into();
    let reports: Vec<ScanReport> = skills
        .iter()
        .map(|skill| filter_report(analyze(skill), threshold))
        .collect();

    let any_findings = reports.iter().any(|r| !r.is_safe);

    match cli.format {
        OutputFormat::Text => render_text(&reports),
        OutputFormat::Json => render_json(&reports)?,
        OutputFormat::Html => render_html(&reports),
    }

    Ok(ExitCode::from(if any_findings { 1 } else { 0 }))
}

fn filter_report(result: AnalysisResult, threshold: Severity) -> ScanReport {
    let findings: Vec<_> = result
        .findings
        .into_iter()
        .filter(|f| f.severity >= threshold)
        .collect();
    ScanReport {
        skill_name: result.skill_name,
        is_safe: findings.is_empty(),
        findings,
    }
}

fn render_text(reports: &[ScanReport]) {
    for report in reports {
        if report.is_safe {
            println!("{}: SAFE", report.skill_name);
            continue;
        }
        println!("{}: {} finding(s)", report.skill_name, report.findings.len());
        for finding in &report.findings {
            println!(
                "  [{:?}] {} ({:?}) — {}",
                finding.severity, finding.message, finding.attack_class, finding.evidence
            );
        }
    }
}

fn render_json(reports: &[ScanReport]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(reports)?);
    Ok(())
}

fn render_html(reports: &[ScanReport]) {
    let mut out = String::new();
    out.push_str("<!doctype html>\n<html><head><meta charset=\"utf-8\">");
    out.push_str("<title>SkillFortify scan report</title><style>");
    out.push_str(
        "body{font-family:sans-serif}table{border-collapse:collapse;margin-bottom:1.5em}\
         td,th{border:1px solid #ccc;padding:4px 8px;text-align:left}.safe{color:#2a7d2a}",
    );
    out.push_str("</style></head><body>\n<h1>SkillFortify scan report</h1>\n");

    for report in reports {
        out.push_str(&format!("<h2>{}</h2>\n", escape_html(&report.skill_name)));
        if report.is_safe {
            out.push_str("<p class=\"safe\">SAFE</p>\n");
            continue;
        }
        out.push_str(
            "<table>\n<tr><th>Severity</th><th>Message</th><th>Attack class</th><th>Evidence</th></tr>\n",
        );
        for finding in &report.findings {
            out.push_str(&format!(
                "<tr><td>{:?}</td><td>{}</td><td>{:?}</td><td><code>{}</code></td></tr>\n",
                finding.severity,
                escape_html(&finding.message),
                finding.attack_class,
                escape_html(&finding.evidence),
            ));
        }
        out.push_str("</table>\n");
    }
    out.push_str("</body></html>");
    println!("{out}");
}

/// Escapes the five HTML-significant characters so skill-controlled text
/// (names, messages, evidence) can't break out of the surrounding markup.
fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
