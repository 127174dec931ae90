//! Command line front-end over [`SearchClient`].

use std::path::{
    Path,
    PathBuf,
};
use std::process::ExitCode;

use anstream::println;
use clap::{
    Args,
    Parser,
    Subcommand,
    ValueEnum,
};
use eyre::{
    Result,
    WrapErr,
    bail,
};
use search_client::consts::env_var::{
    SEARCH_API_VERSION,
    SEARCH_SERVICE_KEY,
    SEARCH_SERVICE_URL,
};
use search_client::{
    Query,
    SearchClient,
    ServiceConfig,
};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Outputs one result per line
    #[default]
    Plain,
    /// Outputs the results as JSON
    Json,
    /// Outputs the results as pretty print JSON
    JsonPretty,
}

impl OutputFormat {
    fn print<T: Serialize>(&self, value: &T) -> Result<()> {
        match self {
            OutputFormat::Plain => match serde_json::to_value(value)? {
                Value::Array(items) => {
                    for item in items {
                        println!("{item}");
                    }
                },
                Value::String(s) => println!("{s}"),
                Value::Null => {},
                other => println!("{other}"),
            },
            OutputFormat::Json => println!("{}", serde_json::to_string(value)?),
            OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(value)?),
        }
        Ok(())
    }
}

/// Extra path segments and `key=value` query parameters for search and suggest.
#[derive(Debug, Args, PartialEq, Eq)]
pub struct QueryArgs {
    /// Query parameter as key=value, e.g. `search=budget` or `$top=10`
    #[arg(long = "param", short, value_parser = parse_key_val)]
    params: Vec<(String, String)>,
    /// Literal path segment appended after the endpoint
    #[arg(long = "filter", visible_alias = "segment")]
    filters: Vec<String>,
}

impl QueryArgs {
    fn to_query(&self) -> Query {
        Query::new()
            .segments(self.filters.iter().cloned())
            .params(self.params.iter().cloned())
    }
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_owned(), value.to_owned())),
        _ => Err(format!("expected key=value, got `{s}`")),
    }
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// List the indexes of the service
    ListIndexes,
    /// Create an index from a JSON schema file
    CreateIndex { schema: PathBuf },
    /// Show an index definition
    GetIndex { index: String },
    /// Show document count and storage size of an index
    IndexStats { index: String },
    /// Delete an index
    DeleteIndex { index: String },
    /// Upload documents from a JSON file holding an array of documents
    AddDocuments { index: String, documents: PathBuf },
    /// Search the documents of an index
    Search {
        index: String,
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Fetch a document by key
    Lookup { index: String, key: String },
    /// Count the documents of an index
    Count { index: String },
    /// Suggest completions for a partial query
    Suggest {
        index: String,
        #[command(flatten)]
        query: QueryArgs,
    },
}

/// Talk to a hosted full-text search service
#[derive(Debug, Parser, PartialEq, Eq)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
    /// Base url of the search service
    #[arg(long, global = true, env = SEARCH_SERVICE_URL)]
    pub url: Option<String>,
    /// Key of the search service
    #[arg(long, global = true, env = SEARCH_SERVICE_KEY, hide_env_values = true)]
    pub key: Option<String>,
    /// Service api version
    #[arg(long, global = true, env = SEARCH_API_VERSION)]
    pub api_version: Option<String>,
    /// Format of the output
    #[arg(long, short, global = true, value_enum, default_value_t)]
    pub format: OutputFormat,
    /// Increase logging verbosity
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

fn read_json(path: &Path) -> Result<Value> {
    let contents = std::fs::read_to_string(path).wrap_err_with(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).wrap_err_with(|| format!("{} is not valid JSON", path.display()))
}

impl Cli {
    /// `None` leaves the choice to `SEARCH_LOG_LEVEL`.
    pub fn log_level(&self) -> Option<String> {
        match self.verbose {
            0 => None,
            1 => Some("warn".to_owned()),
            2 => Some("info".to_owned()),
            3 => Some("debug".to_owned()),
            _ => Some("trace".to_owned()),
        }
    }

    fn config(&self) -> Result<ServiceConfig> {
        let (Some(url), Some(key)) = (&self.url, &self.key) else {
            bail!(
                "the service url and key must be given with --url/--key or {}/{}",
                SEARCH_SERVICE_URL,
                SEARCH_SERVICE_KEY
            );
        };
        let config = ServiceConfig::new(url, key)?;
        Ok(match &self.api_version {
            Some(version) => config.with_api_version(version),
            None => config,
        })
    }

    pub async fn execute(self) -> Result<ExitCode> {
        let client = SearchClient::new(self.config()?);
        let format = self.format;

        match self.command {
            Command::ListIndexes => format.print(&client.list_indexes().await?)?,
            Command::CreateIndex { schema } => {
                let schema = read_json(&schema)?;
                format.print(&client.create_index(schema).await?)?;
            },
            Command::GetIndex { index } => format.print(&client.get_index(&index).await?)?,
            Command::IndexStats { index } => format.print(&client.get_index_stats(&index).await?)?,
            Command::DeleteIndex { index } => format.print(&client.delete_index(&index).await?)?,
            Command::AddDocuments { index, documents } => {
                let documents = read_json(&documents)?;
                format.print(&client.add_documents(&index, documents).await?)?;
            },
            Command::Search { index, query } => format.print(&client.search(&index, &query.to_query()).await?)?,
            Command::Lookup { index, key } => format.print(&client.lookup(&index, &key).await?)?,
            Command::Count { index } => format.print(&client.count(&index).await?)?,
            Command::Suggest { index, query } => format.print(&client.suggest(&index, &query.to_query()).await?)?,
        }

        Ok(ExitCode::SUCCESS)
    }
}
