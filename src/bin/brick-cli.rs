use std::fmt::Display;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use brick_router::config::{load_config, AppConfig};
use brick_router::routing::{Router, RouterSettings};

#[derive(Parser)]
#[command(name = "brick-cli")]
#[command(about = "Inspect and manage the Brick Router route cache", long_about = None)]
struct Cli {
    /// Configuration file (defaults are used when omitted).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Route cache file, overriding the configured path.
    #[arg(long)]
    cache: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the routes requests are served from
    Routes,
    /// Generate the URL for a named route
    Url {
        name: String,
        /// Parameters as key=value
        params: Vec<String>,
    },
    /// Delete the route cache file
    Clear,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(Path::new(path))?,
        None => AppConfig::default(),
    };
    let mut settings = RouterSettings::from_config(&config);
    if let Some(cache) = cli.cache {
        settings.cache_path = cache;
    }

    let mut router = brick_router::app::build(settings)?;

    match cli.command {
        Commands::Routes => {
            let source = if router.load_cache()? { "cache" } else { "registered" };
            print_routes(&router, source);
        }
        Commands::Url { name, params } => {
            router.load_cache()?;
            let pairs = params
                .iter()
                .map(|p| p.split_once('=').ok_or_else(|| format!("expected key=value, got '{p}'")))
                .collect::<Result<Vec<_>, _>>()?;
            let args: Vec<(&str, &dyn Display)> = pairs
                .iter()
                .map(|(key, value)| (*key, value as &dyn Display))
                .collect();
            println!("{}", router.url(&name, &args)?);
        }
        Commands::Clear => {
            router.clear_cache()?;
            println!("Route cache cleared: {}", router.settings().cache_path.display());
        }
    }

    Ok(())
}

fn print_routes(router: &Router, source: &str) {
    println!("Routes ({source}):");
    println!("{:<8} {:<28} {:<22} {:<30} MIDDLEWARE", "METHOD", "PATH", "NAME", "HANDLER");
    for route in router.routes().iter() {
        let middleware: Vec<String> = route.middleware().iter().map(ToString::to_string).collect();
        println!(
            "{:<8} {:<28} {:<22} {:<30} {}",
            route.method(),
            route.path(),
            route.name().unwrap_or("-"),
            route.handler().to_string(),
            middleware.join(", ")
        );
    }
}
