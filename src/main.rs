use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use research_librarian::config::{load_config, Config, LoggingConfig};
use research_librarian::models::Record;
use research_librarian::tools::{
    help_text, Directive, DirectivePlan, RouteTag, ToolCall, ToolDispatcher, ToolOutcome,
    SYSTEM_PROMPT,
};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Research Librarian - arXiv and Wikipedia search, document download and text extraction
#[derive(Parser, Debug)]
#[command(name = "research-librarian")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tool pipeline for a research-librarian agent", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress everything but errors in the log
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Json)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// Table format for search results, JSON for everything else
    Table,
}

/// Search index to query
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SearchSource {
    #[value(name = "arxiv")]
    Arxiv,
    #[value(name = "wikipedia")]
    Wikipedia,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the tool definitions in function-calling format
    Tools,

    /// Invoke a tool with JSON arguments
    Call {
        /// Tool name (e.g. search_scholarly)
        tool: String,

        /// Arguments as a JSON object
        #[arg(long, short, default_value = "{}")]
        args: String,
    },

    /// Search arXiv or Wikipedia
    #[command(alias = "s")]
    Search {
        /// Search query string
        query: String,

        /// Index to search
        #[arg(long, short, value_enum, default_value_t = SearchSource::Arxiv)]
        source: SearchSource,

        /// Maximum number of results
        #[arg(long, short)]
        max_results: Option<usize>,

        /// Earliest submission date, YYYY-MM-DD (arXiv only)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Latest submission date, YYYY-MM-DD (arXiv only)
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Download a document into the store
    #[command(alias = "d")]
    Download {
        /// Document or page URL
        url: String,

        /// Name to store the document under
        #[arg(required = true, num_args = 1..)]
        filename: Vec<String>,
    },

    /// Extract the text of a stored document
    Read {
        /// Name the document was downloaded under
        #[arg(required = true, num_args = 1..)]
        filename: Vec<String>,
    },

    /// Run a slash directive, e.g. "/searchArxiv graph neural networks"
    Directive {
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        line: Vec<String>,
    },

    /// Print the system prompt for the conversational model
    Prompt,

    /// Print the effective configuration
    Config,
}

fn init_tracing(verbose: u8, quiet: bool, logging: &LoggingConfig) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => logging.level.clone(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("research_librarian={}", level)));

    let registry = tracing_subscriber::registry().with(env_filter);
    if logging.format.as_deref() == Some("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Failed to load configuration from the environment".to_string(),
    })?;

    init_tracing(cli.verbose, cli.quiet, &config.logging);
    tracing::debug!(store = %config.store.root.display(), "configuration loaded");

    match cli.command {
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Prompt => {
            println!("{}", SYSTEM_PROMPT);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Tools => {
            let dispatcher = build_dispatcher(&config)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&dispatcher.definitions())?
            );
            Ok(ExitCode::SUCCESS)
        }
        Commands::Call { tool, args } => {
            let call = ToolCall::from_function_call(&tool, &args)?;
            run_call(&config, call, cli.output).await
        }
        Commands::Search {
            query,
            source,
            max_results,
            from,
            to,
        } => {
            let mut args = json!({ "query": query });
            if let Some(max) = max_results {
                args["max_results"] = json!(max);
            }
            let tool = match source {
                SearchSource::Arxiv => {
                    if let Some(from) = from {
                        args["start_date"] = json!(from.to_string());
                    }
                    if let Some(to) = to {
                        args["end_date"] = json!(to.to_string());
                    }
                    "search_scholarly"
                }
                SearchSource::Wikipedia => {
                    if from.is_some() || to.is_some() {
                        tracing::warn!("Wikipedia search ignores --from/--to");
                    }
                    "search_encyclopedia"
                }
            };
            run_call(&config, ToolCall::new(tool, args), cli.output).await
        }
        Commands::Download { url, filename } => {
            let call = ToolCall::new(
                "download_document",
                json!({ "url": url, "filename": filename.join(" ") }),
            );
            run_call(&config, call, cli.output).await
        }
        Commands::Read { filename } => {
            let call = ToolCall::new("extract_text", json!({ "filename": filename.join(" ") }));
            run_call(&config, call, cli.output).await
        }
        Commands::Directive { line } => run_directive(&config, &line.join(" "), cli.output).await,
    }
}

fn build_dispatcher(config: &Config) -> Result<ToolDispatcher> {
    ToolDispatcher::new(config).context("Failed to initialise the tool dispatcher")
}

async fn run_call(config: &Config, call: ToolCall, format: OutputFormat) -> Result<ExitCode> {
    let dispatcher = build_dispatcher(config)?;
    let outcome = dispatcher.invoke_outcome(&call).await;
    print_outcome(&outcome, format)?;

    Ok(if outcome.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn run_directive(config: &Config, line: &str, format: OutputFormat) -> Result<ExitCode> {
    let directive = match Directive::parse(line) {
        Ok(directive) => directive,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    match directive.plan() {
        DirectivePlan::Tool(call, follow_up) => {
            let code = run_call(config, call, format).await?;
            if let Some(task) = follow_up {
                eprintln!("next step for the model: {}", task.instructions());
            }
            Ok(code)
        }
        DirectivePlan::Reasoning(task) => {
            println!("{}", task.instructions());
            Ok(ExitCode::SUCCESS)
        }
        DirectivePlan::Help => {
            print!("{}", help_text());
            Ok(ExitCode::SUCCESS)
        }
        DirectivePlan::Terminate => {
            println!("TERMINATE");
            Ok(ExitCode::SUCCESS)
        }
        DirectivePlan::Chat => {
            eprintln!("plain chat is handled by the conversational model; nothing to run");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_outcome(outcome: &ToolOutcome, format: OutputFormat) -> Result<()> {
    if let (
        OutputFormat::Table,
        ToolOutcome::Ok {
            route: RouteTag::SearchResults,
            data,
            ..
        },
    ) = (format, outcome)
    {
        let records: Vec<Record> = serde_json::from_value(data.clone())?;
        print_records(&records);
        return Ok(());
    }

    println!("{}", serde_json::to_string_pretty(outcome)?);
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

fn print_records(records: &[Record]) {
    use comfy_table::{Attribute, Cell, ContentArrangement, Table};

    if records.is_empty() {
        println!("No results.");
        return;
    }

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Date", "Title", "Category", "Link"]);

    for record in records {
        let date: String = record.published_date.chars().take(10).collect();
        table.add_row(vec![
            Cell::new(date),
            Cell::new(truncate(&record.title, 60)).add_attribute(Attribute::Bold),
            Cell::new(&record.category),
            Cell::new(&record.link),
        ]);
    }
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_search_arguments() {
        let cli = Cli::parse_from([
            "research-librarian",
            "search",
            "graph neural networks",
            "--from",
            "2020-01-01",
            "-m",
            "3",
        ]);
        match cli.command {
            Commands::Search {
                query,
                source,
                max_results,
                from,
                to,
            } => {
                assert_eq!(query, "graph neural networks");
                assert_eq!(source, SearchSource::Arxiv);
                assert_eq!(max_results, Some(3));
                assert_eq!(from, NaiveDate::from_ymd_opt(2020, 1, 1));
                assert_eq!(to, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_download_joins_filename_words() {
        let cli = Cli::parse_from([
            "research-librarian",
            "download",
            "https://arxiv.org/abs/1706.03762",
            "Attention",
            "Is",
            "All",
            "You",
            "Need",
        ]);
        match cli.command {
            Commands::Download { filename, .. } => {
                assert_eq!(filename.join(" "), "Attention Is All You Need")
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer title", 10), "a much ...");
    }
}
