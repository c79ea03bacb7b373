use clap::{Parser, Subcommand};
use site_migrate::bundle::PageBundle;
use site_migrate::config::{self, MigrateConfig};
use site_migrate::schema::Schema;
use site_migrate::{news, output, pages, shows};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Flags for commands that run the page stage.
#[derive(clap::Args, Clone)]
struct SourceArgs {
    /// Copy assets instead of moving them and leave exported pages in place
    #[arg(long)]
    keep_source: bool,
}

#[derive(Parser)]
#[command(name = "site-migrate")]
#[command(about = "Migrate a static HTML export into content files and templates")]
#[command(long_about = "\
Migrate a static HTML export into content files and templates

Pages are split into chrome and content, metadata moves into a front-matter
header, and news and live-show items become per-item content files plus JSON
side-tables.

Export structure:

  export/
  ├── migrate.toml               # Optional config (selectors, paths, manifest)
  ├── index.html                 # Root pages listed in [manifest]
  ├── press.html                 # News index: cards link to news/<slug>.html
  ├── news/                      # One page per article
  ├── live-show/                 # One page per show
  ├── static/ js/                # Asset folders → src/assets/
  └── robots.txt                 # Root files → src/

Output:

  src/pages/        migrated pages with front matter
  src/content/      news/<slug>.md and live-show/<slug>.md
  src/_data/        news.json and shows.json
  .site-migrate/    pages.json, read by the news and shows stages

Run 'site-migrate gen-config' to generate a documented migrate.toml.")]
#[command(version)]
struct Cli {
    /// Export root
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Migrate pages and relocate assets
    Migrate(SourceArgs),
    /// Extract the news collection from migrated pages
    News,
    /// Extract the live-show collection from migrated pages
    Shows,
    /// Run all stages: migrate → news → shows
    Run(SourceArgs),
    /// Preview extraction without writing anything
    Check,
    /// Print a stock migrate.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let root = cli.root.as_path();

    match cli.command {
        Command::Migrate(args) => {
            let (config, schema) = load(root, args.keep_source)?;
            let report = pages::migrate(root, &config, &schema)?;
            output::print_migrate_output(&report, root);
        }
        Command::News => {
            let (config, schema) = load(root, false)?;
            let bundle = load_bundle(root, &config)?;
            let report = news::extract_news(root, &config, &schema, &bundle)?;
            output::print_news_output(&report, root);
        }
        Command::Shows => {
            let (config, schema) = load(root, false)?;
            let bundle = load_bundle(root, &config)?;
            let report = shows::extract_shows(root, &config, &schema, &bundle)?;
            output::print_shows_output(&report, root);
        }
        Command::Run(args) => {
            let (config, schema) = load(root, args.keep_source)?;

            println!("==> Stage 1: Migrating pages in {}", root.display());
            let report = pages::migrate(root, &config, &schema)?;
            output::print_migrate_output(&report, root);

            println!("==> Stage 2: Extracting news");
            let news_report = news::extract_news(root, &config, &schema, &report.bundle)?;
            output::print_news_output(&news_report, root);

            println!("==> Stage 3: Extracting shows");
            let shows_report = shows::extract_shows(root, &config, &schema, &report.bundle)?;
            output::print_shows_output(&shows_report, root);

            println!("==> Migration complete: {}", config.paths.resolve(root).src.display());
        }
        Command::Check => {
            let (config, schema) = load(root, false)?;
            println!("==> Checking {}", root.display());
            let summaries = pages::check(root, &config, &schema)?;
            let entries = news::check(root, &config, &schema)?;
            output::print_check_output(&summaries, &entries);
            println!("==> Export is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load `migrate.toml` for the export root and compile its selectors.
///
/// `--keep-source` can only turn keep-source mode on, never off.
fn load(
    root: &Path,
    keep_source: bool,
) -> Result<(MigrateConfig, Schema), Box<dyn std::error::Error>> {
    let mut config = config::load_config(root)?;
    config.manifest.keep_source |= keep_source;
    let schema = Schema::compile(&config)?;
    Ok((config, schema))
}

fn load_bundle(
    root: &Path,
    config: &MigrateConfig,
) -> Result<PageBundle, Box<dyn std::error::Error>> {
    Ok(PageBundle::load(&config.paths.resolve(root).state)?)
}
