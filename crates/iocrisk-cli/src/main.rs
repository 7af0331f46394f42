//! IOC risk assessment CLI
//!
//! The `iocrisk` command validates indicator lists, submits them to the
//! assessment service and renders per-provider findings.
//!
//! ## Commands
//!
//! - `validate`: Check an indicator list without contacting the service
//! - `assess`: Submit indicators and render risk-scored results
//! - `defang`: Print the non-clickable form of one indicator
//! - `health`: Probe the assessment service

use std::fmt::Write as _;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;

use iocrisk_client::{AssessClient, ClientConfig, Endpoint};
use iocrisk_core::{
    build_export, classify, defang, normalize, parse_indicators, sanitize, validate_input,
    write_export_json, AnalysisSession, DisplayBody, SessionOptions, SessionState,
    ValidationIssue, EMPTY_INPUT_MESSAGE, METRICS,
};

#[derive(Parser)]
#[command(name = "iocrisk")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "IOC risk assessment client", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Assessment service root URL
    #[arg(long, global = true, env = "IOCRISK_API_URL")]
    api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "IOCRISK_TIMEOUT_SECS", default_value = "30")]
    timeout: u64,

    /// Service route to submit to
    #[arg(
        long,
        global = true,
        env = "IOCRISK_ENDPOINT",
        value_enum,
        default_value = "assess"
    )]
    endpoint: EndpointArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EndpointArg {
    Assess,
    Enrich,
}

impl From<EndpointArg> for Endpoint {
    fn from(arg: EndpointArg) -> Self {
        match arg {
            EndpointArg::Assess => Endpoint::Assess,
            EndpointArg::Enrich => Endpoint::Enrich,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an indicator list (one per line) without submitting it
    Validate {
        /// Input file (default: stdin)
        file: Option<PathBuf>,
    },

    /// Submit indicators for assessment and render the results
    Assess {
        /// Input file (default: stdin)
        file: Option<PathBuf>,

        /// Show per-source details for every indicator
        #[arg(short, long)]
        details: bool,

        /// Write a timestamped JSON export into this directory
        #[arg(long)]
        export_dir: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the defanged form of an indicator
    Defang {
        indicator: String,

        /// Indicator type (ip, domain, url, hash, file)
        #[arg(short = 't', long = "type", default_value = "ip")]
        indicator_type: String,
    },

    /// Check that the assessment service is reachable
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    iocrisk_core::init_tracing(cli.json, level);

    let result = match &cli.command {
        Commands::Validate { file } => cmd_validate(file.as_deref()),
        Commands::Assess {
            file,
            details,
            export_dir,
            format,
        } => cmd_assess(&cli, file.as_deref(), *details, export_dir.as_deref(), *format).await,
        Commands::Defang {
            indicator,
            indicator_type,
        } => {
            println!("{}", defang(indicator, indicator_type));
            Ok(())
        }
        Commands::Health => cmd_health(&cli).await,
    };

    METRICS.flush();
    result
}

fn client_config(cli: &Cli) -> ClientConfig {
    let config = match &cli.api_url {
        Some(url) => ClientConfig::new(url),
        None => ClientConfig::from_env(),
    };
    config
        .with_timeout(Duration::from_secs(cli.timeout))
        .with_endpoint(cli.endpoint.into())
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {:?}", path)),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

fn cmd_validate(file: Option<&Path>) -> Result<()> {
    let text = read_input(file)?;
    let issues = validate_input(&text);
    print!("{}", render_issues(&issues));
    if issues.iter().any(|issue| issue.kind.blocks_submission()) {
        bail!("{} validation issue(s) block submission", issues.len());
    }
    let count = parse_indicators(&text).len();
    if count == 0 {
        bail!(EMPTY_INPUT_MESSAGE);
    }
    println!("{} indicator(s) ready", count);
    Ok(())
}

async fn cmd_assess(
    cli: &Cli,
    file: Option<&Path>,
    details: bool,
    export_dir: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let text = read_input(file)?;
    let client = AssessClient::new(client_config(cli)).context("Failed to create HTTP client")?;
    let options = SessionOptions {
        request_timeout: Duration::from_secs(cli.timeout),
    };
    let mut session = AnalysisSession::with_options(client, options);
    session.set_input(text);

    let outcome = session.submit().await.map(|_| ());
    if let Err(err) = outcome {
        let state = session.state();
        print!("{}", render_issues(&state.validation_issues));
        if let Some(message) = &state.error_message {
            eprintln!("{}", message);
        }
        return Err(err.into());
    }

    let state = session.state();
    if let Some(message) = &state.error_message {
        bail!("{}", message);
    }

    let now = chrono::Utc::now();
    let doc = build_export(&state.results, now);
    match format {
        OutputFormat::Text => print!("{}", render_results(state, details)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&doc)?),
    }

    if let Some(dir) = export_dir {
        let path = write_export_json(dir, &doc, now)?;
        eprintln!("Exported {} result(s) to {}", doc.total_iocs, path.display());
    }
    Ok(())
}

async fn cmd_health(cli: &Cli) -> Result<()> {
    let client = AssessClient::new(client_config(cli)).context("Failed to create HTTP client")?;
    let url = client.config().health_url();
    let session = AnalysisSession::with_options(
        client,
        SessionOptions {
            request_timeout: Duration::from_secs(cli.timeout),
        },
    );
    let health = session
        .health()
        .await
        .with_context(|| format!("Health check failed for {}", url))?;
    println!("Status:    {}", health.status);
    println!("Version:   {}", health.version);
    println!("Timestamp: {}", health.timestamp);
    Ok(())
}

fn render_issues(issues: &[ValidationIssue]) -> String {
    let mut out = String::new();
    for issue in issues {
        let _ = writeln!(out, "✗ {}", issue.message);
    }
    out
}

fn render_results(state: &SessionState, details: bool) -> String {
    let mut out = String::new();
    if state.results.is_empty() {
        out.push_str("No results returned\n");
    }

    for result in &state.results {
        let risk = classify(result.risk_score);
        let kind = sanitize(&result.indicator_type);
        let _ = writeln!(
            out,
            "{} {}  [{}]  {:.0}% {}  ({} source(s))",
            risk.icon,
            defang(&sanitize(&result.indicator), &kind),
            kind,
            result.risk_score,
            risk.band,
            result.sources.len(),
        );
        if !result.summary.is_empty() {
            let _ = writeln!(out, "    {}", sanitize(&result.summary));
        }

        if details || state.expanded.contains(&result.indicator) {
            for record in normalize(&result.sources) {
                let _ = writeln!(out, "    ── {} ({})", record.source_name, record.status);
                match &record.body {
                    DisplayBody::Fields { rows } => {
                        for row in rows {
                            let _ = writeln!(out, "       {:<18} {}", row.label, row.value);
                        }
                    }
                    DisplayBody::Fallback { note, .. } => {
                        let _ = writeln!(out, "       {}", note);
                    }
                }
            }
        }
    }

    if state.dropped_records > 0 {
        let _ = writeln!(out, "{} malformed result(s) omitted", state.dropped_records);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use iocrisk_core::fakes::{sample_result, ScriptedService};
    use iocrisk_core::AssessResponse;
    use serde_json::json;

    #[test]
    fn test_cli_parses_assess_flags() {
        let cli = Cli::try_parse_from([
            "iocrisk",
            "--api-url",
            "http://intel.local:8000",
            "assess",
            "iocs.txt",
            "--details",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://intel.local:8000"));
        match cli.command {
            Commands::Assess {
                file,
                details,
                format,
                export_dir,
            } => {
                assert_eq!(file, Some(PathBuf::from("iocs.txt")));
                assert!(details);
                assert_eq!(format, OutputFormat::Json);
                assert!(export_dir.is_none());
            }
            _ => panic!("expected assess"),
        }
    }

    #[test]
    fn test_client_config_from_flags() {
        let cli = Cli::try_parse_from([
            "iocrisk",
            "--api-url",
            "http://intel.local:8000/",
            "--timeout",
            "5",
            "--endpoint",
            "enrich",
            "health",
        ])
        .unwrap();
        let config = client_config(&cli);
        assert_eq!(config.assess_url(), "http://intel.local:8000/api/enrich");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_validate_reads_file_and_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let ok = dir.path().join("ok.txt");
        std::fs::write(&ok, "8.8.8.8\nevil.com\n").unwrap();
        assert!(cmd_validate(Some(&ok)).is_ok());

        let bad = dir.path().join("bad.txt");
        std::fs::write(&bad, "8.8.8.8, evil.com\n").unwrap();
        assert!(cmd_validate(Some(&bad)).is_err());
    }

    #[test]
    fn test_validate_rejects_blank_input() {
        let dir = tempfile::tempdir().unwrap();
        let blank = dir.path().join("blank.txt");
        std::fs::write(&blank, "  \n\n\t\n").unwrap();
        let err = cmd_validate(Some(&blank)).unwrap_err();
        assert_eq!(err.to_string(), EMPTY_INPUT_MESSAGE);
    }

    #[test]
    fn test_render_issues() {
        let issues = validate_input("a b c");
        assert_eq!(
            render_issues(&issues),
            "✗ Line 1: Multiple values detected (3 items)\n"
        );
    }

    #[tokio::test]
    async fn test_render_results_defangs_and_details() {
        let mut session = AnalysisSession::new(ScriptedService::echoing(85));
        session.set_input("1.1.1.1");
        session.submit().await.unwrap();

        let brief = render_results(session.state(), false);
        assert!(brief.contains("1[.]1[.]1[.]1"));
        assert!(brief.contains("85% High"));
        assert!(!brief.contains("Abuse Confidence"));

        session.toggle_expanded("1.1.1.1");
        let expanded = render_results(session.state(), false);
        assert!(expanded.contains("── AbuseIPDB (success)"));
        assert!(expanded.contains("Abuse Confidence"));
    }

    #[tokio::test]
    async fn test_render_reports_dropped_records() {
        let response = AssessResponse {
            results: vec![sample_result("8.8.8.8", 5), json!({"ioc": 1})],
            ..Default::default()
        };
        let mut session = AnalysisSession::new(ScriptedService::responding(response));
        session.set_input("8.8.8.8");
        session.submit().await.unwrap();

        let text = render_results(session.state(), true);
        assert!(text.contains("1 malformed result(s) omitted"));
        assert!(text.contains("🟢"));
    }

    #[tokio::test]
    async fn test_render_escapes_indicator_and_type() {
        let response = AssessResponse {
            results: vec![json!({
                "ioc": "<img src=x onerror=alert(1)>evil.com",
                "ioc_type": "<b>domain</b>",
                "risk_score": 90,
                "sources": []
            })],
            ..Default::default()
        };
        let mut session = AnalysisSession::new(ScriptedService::responding(response));
        session.set_input("evil.com");
        session.submit().await.unwrap();

        let text = render_results(session.state(), false);
        assert!(!text.contains('<'), "{}", text);
        assert!(text.contains("evil[.]com"), "{}", text);
        assert!(text.contains("[domain]"), "{}", text);
        assert!(text.contains("90% High"), "{}", text);
    }
}
