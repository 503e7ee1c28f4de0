pub mod api;
pub mod clients;
pub mod config;
pub mod constants;
pub mod models;
pub mod services;
pub mod state;

use std::sync::Arc;

use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub use config::Config;
use models::episode::Recommendation;
use models::guide::{FranchiseWatchGuide, WatchGuide};
use services::resolver::Resolution;
use services::catalog;
use state::SharedState;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let mut log_level = config.general.log_level.clone();
    if config.general.suppress_connection_errors {
        log_level.push_str(",reqwest::retry=off,hyper_util=off");
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "daemon" | "-d" | "--daemon" => run_daemon(config).await,

        "guide" | "g" => {
            if args.len() < 3 {
                println!("Usage: skiparr guide <title, franchise, or id>");
                println!("Example: skiparr guide \"One Piece\"");
                return Ok(());
            }
            let query = args[2..].join(" ");
            cmd_guide(config, &query).await
        }

        "franchise" | "f" => {
            if args.len() < 3 {
                println!("Usage: skiparr franchise <name>");
                println!("Use 'skiparr franchises' to see known names");
                return Ok(());
            }
            let name = args[2..].join(" ");
            cmd_franchise(config, &name).await
        }

        "franchises" => cmd_franchises(),

        "search" | "s" => {
            if args.len() < 3 {
                println!("Usage: skiparr search <query>");
                return Ok(());
            }
            let query = args[2..].join(" ");
            cmd_search(config, &query).await
        }

        "init" | "--init" => {
            Config::create_default_if_missing()?;
            println!("✓ Config file created. Edit config.toml and run again.");
            Ok(())
        }

        "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        _ => {
            println!("Unknown command: {}", args[1]);
            println!();
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("Skiparr - Anime Watch Guide Generator");
    println!("Know which episodes to watch and which filler to skip");
    println!();
    println!("USAGE:");
    println!("  skiparr <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("  guide <query>     Build a watch guide for a title, id, or franchise");
    println!("  franchise <name>  Build the multi-series guide for a franchise");
    println!("  franchises        List the curated franchises");
    println!("  search <query>    Search the catalog without building a guide");
    println!("  daemon            Run the web API");
    println!("  init              Create default config file");
    println!("  help              Show this help message");
    println!();
    println!("EXAMPLES:");
    println!("  skiparr guide \"One Piece\"        # Guide by title");
    println!("  skiparr guide 21                  # Guide by MyAnimeList id");
    println!("  skiparr guide naruto              # Franchise names work too");
    println!("  skiparr franchise \"Dragon Ball\"  # Full franchise watch order");
    println!("  skiparr daemon                    # Serve the API");
    println!();
    println!("CONFIG:");
    println!("  Edit config.toml to tune pacing, cache TTL, and episode duration.");
}

async fn cmd_guide(config: Config, query: &str) -> anyhow::Result<()> {
    println!("Building guide for: {query}");

    let state = SharedState::new(config)?;

    match state.resolver.resolve(query).await {
        Resolution::Guide(guide) => print_guide(&guide),
        Resolution::Franchise(guide) => print_franchise_guide(&guide),
        Resolution::Absent => {
            println!();
            println!("No guide available for '{query}'.");
            println!("Try 'skiparr search \"{query}\"' to find the exact title.");
        }
    }

    Ok(())
}

async fn cmd_franchise(config: Config, name: &str) -> anyhow::Result<()> {
    let Some(franchise) = catalog::find(name) else {
        println!("'{name}' is not a known franchise.");
        println!();
        println!("Known franchises:");
        for f in catalog::all() {
            println!("  • {}", f.name);
        }
        return Ok(());
    };

    println!("Building franchise guide for: {}", franchise.name);

    let state = SharedState::new(config)?;

    match state.resolver.resolve(franchise.name).await {
        Resolution::Franchise(guide) => print_franchise_guide(&guide),
        Resolution::Guide(guide) => print_guide(&guide),
        Resolution::Absent => println!("No guide available for '{name}'."),
    }

    Ok(())
}

fn cmd_franchises() -> anyhow::Result<()> {
    println!("Curated Franchises ({} total)", catalog::all().len());
    println!("{:-<70}", "");

    for franchise in catalog::all() {
        let episodes: u32 = franchise.members.iter().map(|m| m.episode_count).sum();
        println!("• {} ({} series, ~{} episodes)", franchise.name, franchise.members.len(), episodes);
        for member in franchise.ordered_members() {
            println!("    {}. {}", member.watch_order, member.title);
        }
        println!();
    }

    Ok(())
}

async fn cmd_search(config: Config, query: &str) -> anyhow::Result<()> {
    println!("Searching for: {query}");

    let state = SharedState::new(config)?;
    let results = state.catalog.search(query).await;

    if results.is_empty() {
        println!("No anime found matching '{query}'");
        return Ok(());
    }

    println!();
    println!("Search Results:");
    println!("{:-<60}", "");

    for entry in &results {
        let eps = entry
            .episode_count
            .map_or_else(|| "? eps".to_string(), |e| format!("{e} eps"));
        let id = entry
            .mal_id
            .or(entry.anilist_id)
            .map_or_else(|| "?".to_string(), |id| id.to_string());

        println!("• {} ({eps})", entry.title);
        if let Some(en) = &entry.title_english
            && en != &entry.title
        {
            println!("  EN: {en}");
        }
        println!(
            "  Status: {} | ID: {id}",
            entry.status.as_deref().unwrap_or("UNKNOWN")
        );
        println!();
    }

    println!("To build a guide: skiparr guide <id>");

    Ok(())
}

fn print_guide(guide: &WatchGuide) {
    println!();
    println!("Watch Guide: {}", guide.identity.title);
    println!("{:-<70}", "");
    println!("{}", guide.description);
    println!();

    for rec in &guide.recommendations {
        let icon = match rec.recommendation {
            Recommendation::Watch => "✓",
            Recommendation::Recommended => "★",
            Recommendation::Optional => "~",
            Recommendation::Skip => "○",
        };

        if rec.recommendation == Recommendation::Watch {
            println!("{icon} Episode {}: {}", rec.episode, rec.title);
        } else {
            println!(
                "{icon} Episode {}: {} - {}",
                rec.episode, rec.title, rec.reason
            );
        }
    }

    println!();
    println!(
        "Stats: {} canon | {} filler | {} recap | {} mixed",
        guide.stats.canon, guide.stats.filler, guide.stats.recap, guide.stats.mixed
    );
    println!(
        "Time saved: {} min | Watch time: {} min",
        guide.stats.time_saved_minutes, guide.stats.watch_time_minutes
    );
    println!();
    println!("Legend: ✓ Watch | ★ Recommended | ~ Optional | ○ Skip");
}

fn print_franchise_guide(guide: &FranchiseWatchGuide) {
    println!();
    println!("Franchise Guide: {}", guide.franchise_name);
    println!("{:-<70}", "");
    println!("{}", guide.description);
    println!();

    println!("Watch order:");
    for step in &guide.watch_order {
        println!("  {step}");
    }

    if let Some(instructions) = &guide.special_instructions {
        println!();
        println!("Note: {instructions}");
    }

    println!();
    println!(
        "Combined: {} episodes | {} filler | {} recap | save {} min",
        guide.combined_stats.total,
        guide.combined_stats.filler,
        guide.combined_stats.recap,
        guide.combined_stats.time_saved_minutes
    );
    println!();
    println!("Run 'skiparr guide <series title>' for any member's episode list.");
}

async fn run_daemon(config: Config) -> anyhow::Result<()> {
    info!(
        "Skiparr v{} starting in daemon mode...",
        env!("CARGO_PKG_VERSION")
    );

    let port = config.server.port;
    let enabled = config.server.enabled;

    let shared = Arc::new(SharedState::new(config)?);
    let api_state = api::AppState::new(shared);

    let server_handle: Option<tokio::task::JoinHandle<()>> = if enabled {
        info!("Starting Web API on port {}", port);

        let app = api::router(api_state).await;
        let addr = format!("0.0.0.0:{port}");
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        Some(tokio::spawn(async move {
            info!("🌐 Web Server running at http://0.0.0.0:{}", port);
            if let Err(e) = axum::serve(listener, app).await {
                error!("Web server error: {}", e);
            }
        }))
    } else {
        None
    };

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    if let Some(handle) = server_handle {
        handle.abort();
    }
    info!("Daemon stopped");

    Ok(())
}
