//! Case upload utility for seeding a MediMatch backend.
//!
//! Sends one image plus its case metadata to `POST /api/cases` and prints the
//! stored record as JSON.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin upload_case -- --case-id <id> --diagnosis <text> \
//!     --modality <xray|ct|mri> --body-part <chest|head|brain|abdomen> --image <path> \
//!     [--age <n>] [--gender <g>] [--findings <text>] [--clinical-notes <text>] \
//!     [--source <text>] [--api-url <url>]
//! ```
//!
//! The API URL defaults to `MEDIMATCH_API_URL` (then `http://localhost:8000`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};

use medimatch::adapters::sanitize::SanitizingMakeWriter;
use medimatch::adapters::HttpSearchBackend;
use medimatch::application::SearchService;
use medimatch::domain::filters::{parse_filter, FilterValue};
use medimatch::domain::NewCase;
use medimatch::{AppConfig, BodyPart, Modality};

const USAGE: &str = "Usage: upload_case --case-id <id> --diagnosis <text> --modality <xray|ct|mri> \
--body-part <chest|head|brain|abdomen> --image <path> [--age <n>] [--gender <g>] \
[--findings <text>] [--clinical-notes <text>] [--source <text>] [--api-url <url>]";

#[derive(Debug, PartialEq)]
struct UploadArgs {
    case: NewCase,
    image: PathBuf,
    api_url: Option<String>,
}

/// Parse `--flag value` pairs; modality and body part must name a concrete value.
fn parse_args<I: Iterator<Item = String>>(mut args: I) -> Result<UploadArgs, String> {
    let mut case = NewCase::default();
    let mut image: Option<PathBuf> = None;
    let mut api_url = None;

    while let Some(arg) = args.next() {
        if arg == "-h" || arg == "--help" {
            return Err(USAGE.to_string());
        }
        let value = args
            .next()
            .filter(|v| !v.starts_with("--"))
            .ok_or_else(|| format!("{arg} needs a value\n{USAGE}"))?;

        match arg.as_str() {
            "--case-id" => case.case_id = value,
            "--diagnosis" => case.diagnosis = value,
            "--modality" => case.modality = required_filter::<Modality>(&arg, &value)?,
            "--body-part" => case.body_part = required_filter::<BodyPart>(&arg, &value)?,
            "--image" => image = Some(PathBuf::from(value)),
            "--age" => {
                value
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| "--age must be a whole number".to_string())?;
                case.age = Some(value);
            }
            "--gender" => case.gender = Some(value),
            "--findings" => case.findings = Some(value),
            "--clinical-notes" => case.clinical_notes = Some(value),
            "--source" => case.source = Some(value),
            "--api-url" => api_url = Some(value),
            other => return Err(format!("Unknown argument {other}\n{USAGE}")),
        }
    }

    if let Err(missing) = case.validate() {
        return Err(format!("{}\n{USAGE}", missing.join(", ")));
    }
    let image = image.ok_or_else(|| format!("--image is required\n{USAGE}"))?;

    Ok(UploadArgs {
        case,
        image,
        api_url,
    })
}

fn required_filter<T: FilterValue>(flag: &str, raw: &str) -> Result<String, String> {
    match parse_filter::<T>(raw)? {
        Some(v) => Ok(v.as_str().to_string()),
        None => Err(format!("{flag} needs a specific value, not {raw:?}")),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(SanitizingMakeWriter::new(std::io::stderr))
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = parse_args(std::env::args().skip(1)).map_err(|e| anyhow!(e))?;

    let mut config = AppConfig::from_env()?;
    if let Some(url) = args.api_url {
        config.api_url = url;
    }
    if !args.image.is_file() {
        bail!("Image not found: {}", args.image.display());
    }

    let backend = HttpSearchBackend::from_config(&config)
        .with_context(|| format!("Failed to create HTTP client for {}", config.api_url))?;
    let service = SearchService::new(Arc::new(backend), &config);

    let stored = service
        .upload_case(&args.case, &args.image)
        .with_context(|| format!("Upload of case {} failed", args.case.case_id))?;

    println!("{}", serde_json::to_string_pretty(&stored)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> std::vec::IntoIter<String> {
        list.iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    const REQUIRED: [&str; 10] = [
        "--case-id",
        "MM-1",
        "--diagnosis",
        "Pneumonia",
        "--modality",
        "XRAY",
        "--body-part",
        "chest",
        "--image",
        "scan.png",
    ];

    #[test]
    fn test_parses_required_and_optional_flags() {
        let mut list = REQUIRED.to_vec();
        list.extend(["--age", "44", "--findings", "RLL consolidation"]);

        let parsed = parse_args(args(&list)).unwrap();
        assert_eq!(parsed.case.case_id, "MM-1");
        assert_eq!(parsed.case.modality, "xray");
        assert_eq!(parsed.case.age.as_deref(), Some("44"));
        assert_eq!(parsed.case.findings.as_deref(), Some("RLL consolidation"));
        assert_eq!(parsed.image, PathBuf::from("scan.png"));
        assert!(parsed.api_url.is_none());
    }

    #[test]
    fn test_rejects_all_and_unknown_filters() {
        let mut list = REQUIRED.to_vec();
        list[5] = "all";
        assert!(parse_args(args(&list)).unwrap_err().contains("specific value"));

        list[5] = "pet";
        assert!(parse_args(args(&list)).unwrap_err().contains("unknown filter"));
    }

    #[test]
    fn test_reports_missing_fields() {
        let err = parse_args(args(&["--case-id", "MM-2"])).unwrap_err();
        assert!(err.contains("diagnosis is required"));
        assert!(err.contains("modality is required"));
    }

    #[test]
    fn test_flag_without_value() {
        let err = parse_args(args(&["--case-id", "--diagnosis", "x"])).unwrap_err();
        assert!(err.starts_with("--case-id needs a value"));
    }
}
