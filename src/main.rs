//! research-agent command line

use clap::{Parser, Subcommand};
use research_agent::agent::{ResearchAgent, ResearchError};
use research_agent::storage::MemoryStore;
use research_agent::types::config::ResearchConfig;
use research_agent::types::research::{ResearchRequest, ResearchResponse, SessionRecord};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "research-agent", version, about = "Search the web, summarize what it finds, keep the results")]
struct Cli {
    /// Directory for memory_store.json and queries_results.json
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a research query
    Research {
        /// The research question
        query: String,

        /// Number of search results to summarize
        #[arg(short = 'k', long)]
        max_results: Option<usize>,

        /// Answer from the memory store when this exact query was seen before
        #[arg(long)]
        reuse_memory: bool,

        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the stored session for a query
    Recall {
        query: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    research_agent::init_logging();

    let cli = Cli::parse();
    let mut config = ResearchConfig::from_env();
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = dir;
    }

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, mut config: ResearchConfig) -> Result<(), ResearchError> {
    match command {
        Command::Research {
            query,
            max_results,
            reuse_memory,
            json,
        } => {
            if let Some(k) = max_results {
                config.max_results = k;
            }
            config.reuse_memory = reuse_memory;
            config.validate();
            config.log_key_status();

            let agent = ResearchAgent::from_config(&config)?;
            let response = agent.research(ResearchRequest::new(query)).await?;

            if json {
                println!("{}", to_json(&response));
            } else {
                print!("{}", render_response(&response));
            }
            Ok(())
        }
        Command::Recall { query } => {
            config.validate();
            match recall(&config, &query)? {
                Some(record) => print!("{}", render_session(&record)),
                None => println!("No stored session for {:?}", query),
            }
            Ok(())
        }
    }
}

/// Reads the memory store only; no search, fetch or model client is built
fn recall(config: &ResearchConfig, query: &str) -> Result<Option<SessionRecord>, ResearchError> {
    Ok(MemoryStore::new(config.memory_path()).load(query)?)
}

fn to_json(response: &ResearchResponse) -> String {
    serde_json::to_string_pretty(response).unwrap_or_else(|_| "{}".to_string())
}

fn render_response(response: &ResearchResponse) -> String {
    let mut out = format!("# {}\n", response.query);
    if response.from_memory {
        out.push_str("(from memory)\n");
    }
    if response.summaries.is_empty() {
        out.push_str("\nNo summaries.\n");
    }
    for summary in &response.summaries {
        out.push_str(&format!("\n## {}\n{}\n", summary.url, summary.summary.trim()));
    }
    if !response.failures.is_empty() {
        out.push_str("\nSkipped:\n");
        for failure in &response.failures {
            out.push_str(&format!("- {} ({:?}): {}\n", failure.url, failure.stage, failure.reason));
        }
    }
    out
}

fn render_session(record: &SessionRecord) -> String {
    let mut out = format!(
        "# {}\nsaved {} - {} results, {} summaries\n",
        record.query,
        record.timestamp,
        record.results.len(),
        record.summaries.len()
    );
    for summary in &record.summaries {
        out.push_str(&format!("\n## {}\n{}\n", summary.url, summary.summary.trim()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use research_agent::types::research::{FailureStage, Summary, UrlFailure};

    #[test]
    fn test_parse_research_command() {
        let cli = Cli::try_parse_from([
            "research-agent",
            "--data-dir",
            "/tmp/x",
            "research",
            "What are the benefits of AI in healthcare?",
            "-k",
            "3",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
        match cli.command {
            Command::Research {
                query,
                max_results,
                reuse_memory,
                json,
            } => {
                assert_eq!(query, "What are the benefits of AI in healthcare?");
                assert_eq!(max_results, Some(3));
                assert!(!reuse_memory);
                assert!(json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_recall_command() {
        let cli = Cli::try_parse_from(["research-agent", "recall", "rust"]).unwrap();
        assert!(matches!(cli.command, Command::Recall { ref query } if query == "rust"));
    }

    #[test]
    fn test_query_is_required() {
        assert!(Cli::try_parse_from(["research-agent", "research"]).is_err());
    }

    #[test]
    fn test_recall_works_without_api_keys() {
        let dir = tempfile::tempdir().unwrap();
        let config = ResearchConfig {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        assert!(config.tavily_api_key.is_none());
        assert!(recall(&config, "rust").unwrap().is_none());

        let summaries = vec![Summary {
            url: "http://a.test".into(),
            summary: "a language".into(),
        }];
        MemoryStore::new(config.memory_path())
            .save("rust", &[], &summaries)
            .unwrap();

        let record = recall(&config, "rust").unwrap().unwrap();
        assert_eq!(record.summaries, summaries);
    }

    #[test]
    fn test_render_response() {
        let response = ResearchResponse {
            query: "test".into(),
            summaries: vec![Summary {
                url: "http://a.test".into(),
                summary: "greeting\n".into(),
            }],
            failures: vec![UrlFailure {
                url: "http://b.test".into(),
                stage: FailureStage::Fetch,
                reason: "HTTP status 404".into(),
            }],
            from_memory: false,
        };

        let text = render_response(&response);
        assert!(text.starts_with("# test\n"));
        assert!(text.contains("\n## http://a.test\ngreeting\n"));
        assert!(text.contains("- http://b.test (Fetch): HTTP status 404\n"));
    }
}
