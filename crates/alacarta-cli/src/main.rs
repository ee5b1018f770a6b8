//! alacarta - TV3 "a la carta" catalog browser CLI.

/// Application configuration (TOML).
mod config;

use std::path::{Path, PathBuf};

use alacarta_api::tv3::{
    AlacartaClient, Listing, Operation, Page, PageArgs, PlayVideoArgs, Program, ProgramsArgs,
    ResponseCache, SearchArgs, Video, VideosArgs,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{AppConfig, resolve_config_path};

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Cache responses in this directory (enables the cache).
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Disable the response cache, whatever the config says.
    #[arg(long, global = true)]
    no_cache: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// List the letters programs can be browsed by.
    Letters,
    /// List programs starting with a letter.
    Programs(ProgramsCmdArgs),
    /// List the videos of a program.
    Videos(VideosCmdArgs),
    /// List featured videos.
    Featured(PageCmdArgs),
    /// List the most voted videos.
    Voted(PageCmdArgs),
    /// List the most viewed videos.
    Viewed(PageCmdArgs),
    /// Search videos by text.
    Search(SearchCmdArgs),
    /// Print the playable media URL of a video.
    Play(PlayCmdArgs),
    /// Manage the response cache settings.
    Cache(CacheCommand),
}

/// Page selector shared by the listing subcommands.
#[derive(clap::Args)]
struct PageCmdArgs {
    /// Page number (values below 1 mean the first page).
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    page: i64,
}

/// Arguments for the `programs` subcommand.
#[derive(clap::Args)]
struct ProgramsCmdArgs {
    /// Index letter (A-Z, case-insensitive).
    #[arg(long, required = true)]
    letter: String,

    /// List archived programs instead of the ones on air.
    #[arg(long)]
    archive: bool,

    #[command(flatten)]
    paging: PageCmdArgs,
}

/// Arguments for the `videos` subcommand.
#[derive(clap::Args)]
struct VideosCmdArgs {
    /// Program ID (as listed by `programs`).
    #[arg(long, required = true)]
    program: u64,

    #[command(flatten)]
    paging: PageCmdArgs,
}

/// Arguments for the `search` subcommand.
#[derive(clap::Args)]
struct SearchCmdArgs {
    /// Search term.
    #[arg(long, required = true)]
    term: String,

    #[command(flatten)]
    paging: PageCmdArgs,
}

/// Arguments for the `play` subcommand.
#[derive(clap::Args)]
struct PlayCmdArgs {
    /// Video ID (as listed by the video listings).
    #[arg(long, required = true)]
    video: u64,
}

/// Arguments for the `cache` subcommand.
#[derive(clap::Args)]
struct CacheCommand {
    /// Cache subcommand to run.
    #[command(subcommand)]
    command: CacheSubcommands,
}

/// Available cache subcommands.
#[derive(Subcommand)]
enum CacheSubcommands {
    /// Show the configured cache settings.
    Show,
    /// Enable the cache and save the setting.
    Enable(CacheEnableArgs),
    /// Disable the cache and save the setting. Stored responses are kept.
    Disable,
}

/// Arguments for the `cache enable` subcommand.
#[derive(clap::Args)]
struct CacheEnableArgs {
    /// Cache directory (default: a generated temporary directory).
    #[arg(long)]
    path: Option<PathBuf>,
}

/// Converts a catalog subcommand into its operation.
///
/// Returns `None` for subcommands that do not query the catalog.
fn to_operation(command: Commands) -> Option<Operation> {
    let op = match command {
        Commands::Letters => Operation::ProgramLetters,
        Commands::Programs(args) => Operation::Programs(ProgramsArgs {
            letter: args.letter,
            archive: args.archive,
            page: args.paging.page,
        }),
        Commands::Videos(args) => Operation::Videos(VideosArgs {
            program_id: args.program,
            page: args.paging.page,
        }),
        Commands::Featured(args) => Operation::FeaturedVideos(PageArgs { page: args.page }),
        Commands::Voted(args) => Operation::MostVotedVideos(PageArgs { page: args.page }),
        Commands::Viewed(args) => Operation::MostViewedVideos(PageArgs { page: args.page }),
        Commands::Search(args) => Operation::Search(SearchArgs {
            term: args.term,
            page: args.paging.page,
        }),
        Commands::Play(args) => Operation::PlayVideo(PlayVideoArgs {
            video_id: args.video,
        }),
        Commands::Cache(_) => return None,
    };
    Some(op)
}

/// Builds the TV3 client from the config file and command-line overrides.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded or the client fails to build.
#[instrument(skip_all)]
fn build_client(
    dir: Option<&Path>,
    cache_dir: Option<&Path>,
    no_cache: bool,
) -> Result<AlacartaClient> {
    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;
    let mut config = AppConfig::load(&config_path).context("failed to load config")?;
    let cache = config.cache.resolve(cache_dir, no_cache);
    let generated = cache.enabled && cache.dir.is_none();
    tracing::debug!(?cache, "Cache configuration resolved");

    let client = AlacartaClient::builder()
        .cache(cache)
        .build()
        .context("failed to build TV3 client")?;
    if let Some(cache) = client.cache() {
        tracing::debug!(dir = %cache.dir().display(), "Response cache enabled");
        if generated && config.cache.remember_dir(cache.dir()) {
            config
                .save(&config_path)
                .context("failed to save generated cache directory")?;
            tracing::debug!(dir = %cache.dir().display(), "Generated cache directory saved");
        }
    }
    Ok(client)
}

/// Runs a catalog operation and renders its listing.
///
/// # Errors
///
/// Returns an error if the client fails to build or the operation fails.
#[instrument(skip_all, fields(operation = op.name()))]
async fn run_operation(
    dir: Option<&Path>,
    cache_dir: Option<&Path>,
    no_cache: bool,
    op: Operation,
) -> Result<()> {
    let client = build_client(dir, cache_dir, no_cache)?;
    let name = op.name();
    let listing = alacarta_api::tv3::run(&client, op)
        .await
        .with_context(|| format!("{name} failed"))?;
    render(&listing);
    Ok(())
}

/// Renders a listing through the log output.
fn render(listing: &Listing) {
    match listing {
        Listing::Letters(letters) => {
            let joined: Vec<String> = letters.iter().map(char::to_string).collect();
            tracing::info!("{}", joined.join(" "));
        }
        Listing::Programs(page) => render_programs(page),
        Listing::Videos {
            page,
            show_subtitle,
        } => render_videos(page, *show_subtitle),
        Listing::Playable(url) => tracing::info!("{url}"),
    }
}

fn render_programs(page: &Page<Program>) {
    tracing::info!("ID\tTitle\t\t\t\tImage");
    for program in &page.items {
        tracing::info!(
            "{}\t{}\t\t{}",
            program.id,
            program.title,
            if program.image.is_empty() {
                "-"
            } else {
                program.image.as_str()
            },
        );
    }
    tracing::info!("Total: {} programs", page.items.len());
    tracing::info!("{}", navigation(page));
}

fn render_videos(page: &Page<Video>, show_subtitle: bool) {
    if page.items.is_empty() {
        tracing::info!("No videos found");
        return;
    }
    tracing::info!("ID\tDate\t\tDuration\tTitle");
    for video in &page.items {
        tracing::info!(
            "{}\t{}\t{}\t{}",
            video.id,
            video.date_text.as_deref().unwrap_or("-"),
            video.duration_text.as_deref().unwrap_or("-"),
            video.display_title(show_subtitle),
        );
    }
    tracing::info!("Total: {} videos", page.items.len());
    tracing::info!("{}", navigation(page));
}

/// Describes the page position, e.g. `Page 1 (previous: no, next: yes)`.
fn navigation<T>(page: &Page<T>) -> String {
    let flag = |value: Option<bool>| match value {
        Some(true) => "yes",
        Some(false) => "no",
        None => "unknown",
    };
    page.page_index.map_or_else(
        || String::from("Page: -"),
        |index| {
            format!(
                "Page {index} (previous: {}, next: {})",
                flag(page.has_previous),
                flag(page.has_next)
            )
        },
    )
}

/// Runs the `cache` subcommands.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded or saved.
#[instrument(skip_all)]
fn run_cache(cmd: CacheCommand, dir: Option<&Path>) -> Result<()> {
    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;
    let mut config = AppConfig::load(&config_path).context("failed to load config")?;

    match cmd.command {
        CacheSubcommands::Show => {
            tracing::info!("Config: {}", config_path.display());
            tracing::info!("Enabled: {}", config.cache.enabled);
            tracing::info!(
                "Directory: {}",
                config
                    .cache
                    .dir
                    .as_deref()
                    .map_or_else(
                        || String::from("(generated on first use)"),
                        |d| d.display().to_string()
                    )
            );
            return Ok(());
        }
        CacheSubcommands::Enable(args) => {
            config.cache.enabled = true;
            if args.path.is_some() {
                config.cache.dir = args.path;
            }
            if config.cache.dir.is_none() {
                let generated =
                    ResponseCache::open(None).context("failed to create cache directory")?;
                config.cache.remember_dir(generated.dir());
                tracing::info!("Directory: {}", generated.dir().display());
            }
        }
        CacheSubcommands::Disable => config.cache.enabled = false,
    }

    config.save(&config_path).context("failed to save config")?;
    tracing::info!(
        "Cache {} ({})",
        if config.cache.enabled { "enabled" } else { "disabled" },
        config_path.display()
    );
    Ok(())
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    let dir = cli.dir.as_deref();
    match cli.command {
        Commands::Cache(cmd) => run_cache(cmd, dir),
        command => match to_operation(command) {
            Some(op) => run_operation(dir, cli.cache_dir.as_deref(), cli.no_cache, op).await,
            None => Ok(()),
        },
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn page<T>(
        items: Vec<T>,
        index: Option<u32>,
        next: Option<bool>,
        prev: Option<bool>,
    ) -> Page<T> {
        Page {
            items,
            page_index: index,
            has_next: next,
            has_previous: prev,
        }
    }

    #[test]
    fn test_to_operation_programs() {
        // Arrange
        let cli = Cli::try_parse_from([
            "alacarta", "programs", "--letter", "b", "--archive", "--page", "3",
        ])
        .unwrap();

        // Act
        let op = to_operation(cli.command).unwrap();

        // Assert
        assert_eq!(
            op,
            Operation::Programs(ProgramsArgs {
                letter: String::from("b"),
                archive: true,
                page: 3,
            })
        );
    }

    #[test]
    fn test_to_operation_default_page_and_negative_page() {
        // Arrange
        let featured = Cli::try_parse_from(["alacarta", "featured"]).unwrap();
        let voted = Cli::try_parse_from(["alacarta", "voted", "--page", "-2"]).unwrap();

        // Act & Assert
        assert_eq!(
            to_operation(featured.command),
            Some(Operation::FeaturedVideos(PageArgs { page: 1 }))
        );
        assert_eq!(
            to_operation(voted.command),
            Some(Operation::MostVotedVideos(PageArgs { page: -2 }))
        );
    }

    #[test]
    fn test_to_operation_cache_is_not_an_operation() {
        // Arrange
        let cli = Cli::try_parse_from(["alacarta", "cache", "show"]).unwrap();

        // Act & Assert
        assert_eq!(to_operation(cli.command), None);
    }

    #[test]
    fn test_global_cache_flags() {
        // Arrange & Act
        let cli = Cli::try_parse_from([
            "alacarta",
            "letters",
            "--cache-dir",
            "/tmp/c",
            "--no-cache",
        ])
        .unwrap();

        // Assert
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/c")));
        assert!(cli.no_cache);
    }

    #[test]
    fn test_navigation() {
        // Arrange & Act & Assert
        assert_eq!(
            navigation(&page::<u8>(vec![], Some(2), Some(true), Some(true))),
            "Page 2 (previous: yes, next: yes)"
        );
        assert_eq!(
            navigation(&page::<u8>(vec![], Some(1), Some(false), Some(false))),
            "Page 1 (previous: no, next: no)"
        );
        assert_eq!(navigation(&page::<u8>(vec![], None, None, None)), "Page: -");
    }
}
