use clausehound::client::ApiClient;
use clausehound::config::Config;
use clausehound::orchestrator::QueryOrchestrator;
use clausehound::session::{AskStatus, QueryInput};

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const USAGE: &str = "\
Usage: clausehound [OPTIONS]

Options:
  --term <TEXT>       Clause term filter, e.g. \"Governing Law\"
  --attribute <TEXT>  Clause attribute filter, e.g. \"Jurisdiction\"
  --language <TEXT>   Free-text clause language (at least 2 characters)
  --version           Print version and exit
  --help              Print this help and exit

Environment:
  CLAUSEHOUND_BASE_URL  Backend base URL (default http://127.0.0.1:8000)
  CLAUSEHOUND_USER_ID   Caller identity for the x-user-id header
  CLAUSEHOUND_TOKEN     Optional bearer token";

/// Parse `--term/--attribute/--language` from argv.
fn parse_args(args: &[String]) -> Result<QueryInput> {
    let mut input = QueryInput::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let field = match arg.as_str() {
            "--term" => &mut input.term,
            "--attribute" => &mut input.attribute,
            "--language" => &mut input.language,
            "--help" | "-h" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("clausehound {}", VERSION);
                std::process::exit(0);
            }
            other => return Err(eyre!("unknown argument '{}'\n\n{}", other, USAGE)),
        };
        *field = iter
            .next()
            .ok_or_else(|| eyre!("missing value for {}", arg))?
            .clone();
    }
    Ok(input)
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("clausehound=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let input = parse_args(&args)?;
    if !input.is_askable() {
        return Err(eyre!(
            "at least one filter is required (language needs 2+ characters)\n\n{}",
            USAGE
        ));
    }

    let config = Config::from_env()?;
    let orchestrator = Arc::new(QueryOrchestrator::new(ApiClient::new(&config)));

    let ask = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.ask(input).await }
    });

    // Poll snapshots and print the answer as it streams in.
    let mut printed_results = false;
    let mut printed_answer = 0;
    let session = loop {
        let snapshot = orchestrator.snapshot();

        if !printed_results && !matches!(snapshot.status, AskStatus::Idle | AskStatus::Searching) {
            if !snapshot.note.is_empty() {
                println!("{}\n", snapshot.note);
            }
            for (idx, result) in snapshot.results.iter().enumerate() {
                println!(
                    "[{}] {} ({})  relevance {:.3}  docs {}",
                    idx + 1,
                    result.id,
                    result.client_id,
                    result.relevance_score,
                    result.doc_count.unwrap_or(0),
                );
                if !result.text_content.is_empty() {
                    let text: String = result.text_content.chars().take(220).collect();
                    println!("    {}", text);
                }
            }
            println!();
            printed_results = true;
        }

        if snapshot.answer.len() > printed_answer {
            print!("{}", &snapshot.answer[printed_answer..]);
            std::io::stdout().flush().ok();
            printed_answer = snapshot.answer.len();
        }

        if snapshot.status.is_terminal() {
            break snapshot;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    };

    ask.await??;
    println!();

    match session.status {
        AskStatus::Failed(message) => Err(eyre!(message)),
        _ => {
            println!(
                "\n{}",
                if session.evidence_found {
                    "Evidence found"
                } else {
                    "Insufficient evidence"
                }
            );
            for (idx, citation) in session.citations.iter().enumerate() {
                println!("[{}] {}", idx + 1, citation);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args_filters() {
        let input = parse_args(&args(&[
            "--term",
            "Governing Law",
            "--language",
            "governed by laws of England",
        ]))
        .unwrap();
        assert_eq!(input.term, "Governing Law");
        assert_eq!(input.language, "governed by laws of England");
        assert!(input.attribute.is_empty());
    }

    #[test]
    fn test_parse_args_unknown_flag() {
        assert!(parse_args(&args(&["--bogus"])).is_err());
    }

    #[test]
    fn test_parse_args_missing_value() {
        assert!(parse_args(&args(&["--term"])).is_err());
    }

    #[test]
    fn test_parse_args_empty() {
        let input = parse_args(&[]).unwrap();
        assert!(!input.is_askable());
    }
}
