//! ddcalc - offline tools over a directory of workbook resources
//!
//! Resources are `<path>.json` files holding `{"data": ...}`, the layout
//! [`DirectoryFetcher`] reads. Results go to stdout as JSON, logs to stderr.
//! `patch` needs no resources; it nests dotted-path edits into a variation.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dd_catalog::{Catalog, LegacyRehydrator, ReportYears, TechnologyRecord};
use dd_core::{
    fetch_as, resolve_variation, CoreConfig, DirectoryFetcher, ValidationOutcome, VariationPatch,
    VariationValidator,
};
use dd_params::{flatten, tree_from_json, Overlay};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ddcalc", version)]
#[command(about = "Rehydrate, validate and key scenario variations")]
struct Cli {
    /// Directory holding the JSON resources
    #[arg(long, global = true, default_value = ".")]
    resources: PathBuf,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the legacy records a variation rehydrates to
    Rehydrate {
        /// Variation resource path, e.g. `variation/3`
        variation: String,
        #[command(flatten)]
        window: Window,
        /// Only this technology
        #[arg(long)]
        technology: Option<String>,
    },
    /// Validate a variation; exits 1 when rejected
    Validate {
        variation: String,
        #[command(flatten)]
        window: Window,
    },
    /// Print the result cache key of each technology of a variation
    Key {
        variation: String,
        #[command(flatten)]
        window: Window,
    },
    /// Flatten a parameter tree file to dotted paths
    Flatten {
        /// JSON file holding a parameter tree
        file: PathBuf,
    },
    /// Build a variation from files of dotted-path edits
    Patch {
        #[arg(long)]
        scenario_parent: String,
        #[arg(long)]
        reference_parent: String,
        /// JSON object mapping dotted scenario paths to values
        #[arg(long)]
        scenario_edits: Option<PathBuf>,
        /// JSON object mapping dotted reference paths to values
        #[arg(long)]
        reference_edits: Option<PathBuf>,
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Args, Debug, Clone, Copy)]
struct Window {
    /// First report year
    #[arg(long, default_value_t = 2020)]
    start: i32,
    /// Last report year
    #[arg(long, default_value_t = 2050)]
    end: i32,
}

impl Window {
    fn years(self) -> Result<ReportYears> {
        Ok(ReportYears::new(self.start, self.end)?)
    }
}

/// Catalog, configuration and resources shared by the commands
struct Tools {
    fetcher: Arc<DirectoryFetcher>,
    catalog: Arc<Catalog>,
    config: CoreConfig,
}

impl Tools {
    fn new(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => CoreConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => CoreConfig::default(),
        };
        let catalog = Catalog::builtin().context("loading builtin catalog")?;
        Ok(Self {
            fetcher: Arc::new(DirectoryFetcher::new(&cli.resources)),
            catalog: Arc::new(catalog),
            config,
        })
    }

    async fn records(
        &self,
        variation: &str,
        years: ReportYears,
        only: Option<&str>,
    ) -> Result<Vec<TechnologyRecord>> {
        let resolved = resolve_variation(self.fetcher.as_ref(), variation).await?;
        let rehydrator = LegacyRehydrator::new(Arc::clone(&self.catalog));
        let technologies = match only {
            Some(technology) => vec![technology],
            None => self.config.calculated_technologies(&resolved.scenario),
        };

        let mut records = Vec::with_capacity(technologies.len());
        for technology in technologies {
            let record = rehydrator.rehydrate(
                years,
                technology,
                &resolved.scenario,
                &resolved.reference,
                &resolved.overrides,
            );
            if record.is_empty() {
                warn!(technology, "no parameters found, skipping");
                continue;
            }
            records.push(record);
        }
        debug!(variation, records = records.len(), "variation rehydrated");
        Ok(records)
    }

    async fn validate(&self, variation: &str, years: ReportYears) -> Result<ValidationOutcome> {
        let mut patch: VariationPatch =
            fetch_as(self.fetcher.as_ref(), "Variation", variation).await?;
        let validator = VariationValidator::new(
            Arc::clone(&self.fetcher) as _,
            LegacyRehydrator::new(Arc::clone(&self.catalog)),
            self.config.clone(),
        );
        Ok(validator.validate_variation(&mut patch, years).await?)
    }

    async fn keys(&self, variation: &str, years: ReportYears) -> Result<Map<String, Value>> {
        let cache = self
            .config
            .content_cache(self.config.build_store(), &self.catalog);
        let mut keys = Map::new();
        for record in self.records(variation, years, None).await? {
            let key = cache.key_for(&record)?;
            keys.insert(record.technology, Value::String(key.to_string()));
        }
        Ok(keys)
    }
}

async fn flatten_file(file: &Path) -> Result<Map<String, Value>> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let tree = tree_from_json(serde_json::from_str(&text)?)?;
    Ok(flatten(&tree)
        .into_iter()
        .map(|(path, leaf)| (path, leaf.to_json()))
        .collect())
}

async fn read_edits(file: Option<&Path>) -> Result<Overlay> {
    let Some(file) = file else {
        return Ok(Overlay::new());
    };
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing edits in {}", file.display()))
}

async fn build_patch(
    scenario_parent: &str,
    reference_parent: &str,
    scenario_edits: Option<&Path>,
    reference_edits: Option<&Path>,
) -> Result<VariationPatch> {
    let scenario = read_edits(scenario_edits).await?;
    let reference = read_edits(reference_edits).await?;
    debug!(
        scenario = scenario.len(),
        reference = reference.len(),
        "building variation from edits"
    );
    Ok(VariationPatch::from_flat_edits(
        scenario_parent,
        reference_parent,
        &scenario,
        &reference,
    )?)
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);
    let tools = Tools::new(&cli)?;

    match &cli.command {
        Command::Rehydrate {
            variation,
            window,
            technology,
        } => {
            let records = tools
                .records(variation, window.years()?, technology.as_deref())
                .await?;
            print_json(&records)?;
        }
        Command::Validate { variation, window } => {
            let outcome = tools.validate(variation, window.years()?).await?;
            print_json(&outcome)?;
            if !outcome.valid {
                info!(variation = %variation, "variation rejected");
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Key { variation, window } => {
            print_json(&tools.keys(variation, window.years()?).await?)?;
        }
        Command::Flatten { file } => {
            print_json(&flatten_file(file).await?)?;
        }
        Command::Patch {
            scenario_parent,
            reference_parent,
            scenario_edits,
            reference_edits,
            name,
        } => {
            let mut patch = build_patch(
                scenario_parent,
                reference_parent,
                scenario_edits.as_deref(),
                reference_edits.as_deref(),
            )
            .await?;
            patch.name.clone_from(name);
            print_json(&patch)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
