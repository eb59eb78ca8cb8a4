use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use rigbuild::catalog::{self, DEFAULT_SUGGESTION_LIMIT};
use rigbuild::config::{AppConfig, ConfigError};
use rigbuild::error::ErrorCode;
use rigbuild::normalize::{self, Category, NormalizeError, ResponseShape};
use rigbuild::services::{Assistant, AssistantError, KnowledgeLevel, build, offers};
use rigbuild::storage::StorageError;
use rigbuild::tracker::now_ms;
use rigbuild::webhook::{GameRequest, PcConfigRequest, Quality};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Assistant(#[from] AssistantError),
    #[error("storage: {0}")]
    Storage(#[from] StorageError),
    #[error("normalize: {0}")]
    Normalize(#[from] NormalizeError),
    #[error("failed to read {path}: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("no history entry with id {0}")]
    HistoryNotFound(String),
    #[error("no search with id {0}")]
    SearchNotFound(String),
}

impl CliError {
    fn code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Assistant(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Normalize(e) => e.error_code(),
            Self::ReadFile { .. } => "E_READ_FILE",
            Self::InvalidJson(_) => "E_INVALID_JSON",
            Self::HistoryNotFound(_) | Self::SearchNotFound(_) => "E_NOT_FOUND",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "rigbuild", about = "PC configuration assistant")]
struct Cli {
    /// Directory holding the search registry and history.
    #[arg(long, env = "RIGBUILD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Browse the parts catalog.
    Catalog(CatalogCommand),
    /// Run a configuration flow.
    Build(BuildCommand),
    /// Look up offers for one named part.
    Offers {
        category: Category,
        name: String,
        /// Rank by review score instead of price.
        #[arg(long, default_value_t = false)]
        reviews: bool,
    },
    History(HistoryCommand),
    Searches(SearchesCommand),
    /// Normalize a saved webhook answer.
    Normalize {
        file: PathBuf,
        #[arg(long, default_value_t = false)]
        reviews: bool,
    },
}

#[derive(Args, Debug)]
struct CatalogCommand {
    #[command(subcommand)]
    command: CatalogSubcommand,
}

#[derive(Subcommand, Debug)]
enum CatalogSubcommand {
    /// Part names in one category.
    Names {
        category: Category,
        /// Keep only names containing this text.
        #[arg(long)]
        filter: Option<String>,
    },
    /// Search by name, in one category or across all of them.
    Search {
        term: String,
        #[arg(long)]
        category: Option<String>,
    },
    Suggest {
        term: String,
        #[arg(long, default_value_t = DEFAULT_SUGGESTION_LIMIT)]
        limit: usize,
    },
    All,
}

#[derive(Args, Debug)]
struct BuildCommand {
    #[command(subcommand)]
    command: BuildSubcommand,
}

#[derive(Subcommand, Debug)]
enum BuildSubcommand {
    /// Price a manual selection.
    Advanced {
        #[arg(long, default_value = "")]
        cpu: String,
        #[arg(long, default_value = "")]
        gpu: String,
        #[arg(long, default_value = "")]
        motherboard: String,
        #[arg(long, default_value = "")]
        ram: String,
        #[arg(long, default_value_t = false)]
        reviews: bool,
    },
    /// Suggest parts around one primary component.
    Suggest { primary_component: String },
    /// Suggest a build for a game.
    Game {
        game: String,
        #[arg(long, default_value = "recommended")]
        quality: Quality,
    },
}

#[derive(Args, Debug)]
struct HistoryCommand {
    #[command(subcommand)]
    command: HistorySubcommand,
}

#[derive(Subcommand, Debug)]
enum HistorySubcommand {
    List,
    Show { id: String },
    Clear,
}

#[derive(Args, Debug)]
struct SearchesCommand {
    #[command(subcommand)]
    command: SearchesSubcommand,
}

#[derive(Subcommand, Debug)]
enum SearchesSubcommand {
    List,
    Dismiss { id: String },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error [{}]: {e}", e.code());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let data_dir = cli.data_dir;
    match cli.command {
        // Normalizing a file needs neither config nor state.
        Command::Normalize { file, reviews } => run_normalize(&file, reviews),
        Command::Catalog(catalog) => run_catalog(&open_assistant(data_dir)?, catalog).await,
        Command::Build(build) => run_build(&open_assistant(data_dir)?, build).await,
        Command::Offers { category, name, reviews } => {
            run_offers(&open_assistant(data_dir)?, category, &name, reviews).await
        }
        Command::History(history) => run_history(&open_assistant(data_dir)?, history),
        Command::Searches(searches) => run_searches(&open_assistant(data_dir)?, searches),
    }
}

fn open_assistant(data_dir: Option<PathBuf>) -> Result<Assistant, CliError> {
    let mut config = AppConfig::from_env()?;
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    Ok(Assistant::from_config(&config)?)
}

async fn run_catalog(assistant: &Assistant, command: CatalogCommand) -> Result<(), CliError> {
    let client = assistant.catalog()?;
    match command.command {
        CatalogSubcommand::Names { category, filter } => {
            let names = client
                .list_names(category)
                .await
                .map_err(AssistantError::from)?;
            match filter {
                Some(term) => print_json(&catalog::filter_list(&names, &term)),
                None => print_json(&names),
            }
        }
        CatalogSubcommand::Search { term, category } => {
            let items = match category {
                Some(label) => client
                    .search_by_category(&term, &label)
                    .await
                    .map_err(AssistantError::from)?,
                None => client.quick_search(&term).await,
            };
            print_json(&items)
        }
        CatalogSubcommand::Suggest { term, limit } => print_json(&client.suggestions(&term, limit).await),
        CatalogSubcommand::All => print_json(&client.all_hardware().await),
    }
}

async fn run_build(assistant: &Assistant, command: BuildCommand) -> Result<(), CliError> {
    match command.command {
        BuildSubcommand::Advanced { cpu, gpu, motherboard, ram, reviews } => {
            let request = PcConfigRequest { gpu, cpu, motherboard, ram, consider_reviews: reviews };
            let descriptor = build::advanced_descriptor(&request);
            let priced = assistant
                .run_tracked(descriptor, assistant.advanced_config(request))
                .await?;
            print_json(&priced.data)
        }
        BuildSubcommand::Suggest { primary_component } => {
            let descriptor = build::intermediate_descriptor(&primary_component);
            let result = assistant
                .run_tracked(descriptor, assistant.intermediate_build(&primary_component))
                .await?;
            info!(level = %KnowledgeLevel::Intermediate, components = result.components.len(), "build suggested");
            print_json(&result)
        }
        BuildSubcommand::Game { game, quality } => {
            let request = GameRequest { game, quality };
            let descriptor = build::game_descriptor(&request);
            let result = assistant
                .run_tracked(descriptor, assistant.game_config(request))
                .await?;
            info!(level = %KnowledgeLevel::Beginner, components = result.components.len(), "build suggested");
            print_json(&result)
        }
    }
}

async fn run_offers(assistant: &Assistant, category: Category, name: &str, reviews: bool) -> Result<(), CliError> {
    let descriptor = offers::quick_search_descriptor(category, name);
    let found = assistant
        .run_tracked(descriptor, assistant.quick_search_offers(category, name))
        .await?;
    print_json(&json!({ "category": found.category, "items": found.items(reviews) }))
}

fn run_history(assistant: &Assistant, history: HistoryCommand) -> Result<(), CliError> {
    match history.command {
        HistorySubcommand::List => print_json(&assistant.history().list()),
        HistorySubcommand::Show { id } => {
            let entry = assistant
                .history()
                .get_by_id(&id)
                .ok_or(CliError::HistoryNotFound(id))?;
            print_json(&entry)
        }
        HistorySubcommand::Clear => {
            let removed = assistant.history().len();
            assistant.history().clear()?;
            print_json(&json!({ "removed": removed }))
        }
    }
}

fn run_searches(assistant: &Assistant, searches: SearchesCommand) -> Result<(), CliError> {
    let tracker = assistant.tracker();
    match searches.command {
        SearchesSubcommand::List => {
            let now = now_ms();
            let rows: Vec<Value> = tracker
                .list()
                .into_iter()
                .map(|task| {
                    let elapsed = task.elapsed_label(now);
                    json!({ "task": task, "elapsed": elapsed })
                })
                .collect();
            print_json(&rows)
        }
        SearchesSubcommand::Dismiss { id } => {
            if !tracker.remove_search(&id) {
                return Err(CliError::SearchNotFound(id));
            }
            print_json(&json!({ "dismissed": id }))
        }
    }
}

fn run_normalize(file: &Path, reviews: bool) -> Result<(), CliError> {
    let text = std::fs::read_to_string(file).map_err(|source| CliError::ReadFile { path: file.to_path_buf(), source })?;
    let raw: Value = serde_json::from_str(&text)?;

    let shape = normalize::detect_shape(&raw);
    info!(shape = shape.name(), "payload classified");
    match shape {
        ResponseShape::CategoryArray(_) => print_json(&normalize::normalize_offers(&raw, reviews)?.data),
        ResponseShape::DataArray(ref items) if !normalize::partition_data(items).categories.is_empty() => {
            print_json(&normalize::normalize_offers(&raw, reviews)?.data)
        }
        ResponseShape::LegacyOutput(_) | ResponseShape::DataArray(_) => {
            print_json(&normalize::parse_suggestion(&raw)?)
        }
        ResponseShape::Unknown => Err(NormalizeError::UnrecognizedShape.into()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
