use clap::{Parser, Subcommand};
use hostbind::{
    commands::{
        cache::{self, CacheAction},
        config::{self, ConfigAction},
        docs::{self, DocsAction},
        inspect::{self, InspectAction},
    },
    common, GlobalOpts,
};
use hostbind_config::Config;

#[derive(Parser)]
#[command(name = "hostbind")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Host application binding toolkit",
    long_about = "hostbind inspects the metadata caches, documentation pages and configuration used to generate host bindings."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure hostbind
    #[command(subcommand_required = false, arg_required_else_help = false)]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
    /// Manage cached metadata
    #[command(subcommand)]
    Cache(CacheAction),
    /// Inspect cached commands and API classes
    #[command(subcommand)]
    Inspect(InspectAction),
    /// Parse host documentation pages
    #[command(subcommand)]
    Docs(DocsAction),
}

fn main() {
    let cli = Cli::parse();

    let log_dir = Config::path()
        .ok()
        .and_then(|path| path.parent().map(std::path::Path::to_path_buf));
    let (verbosity, no_stdout) = (cli.global.verbosity_level(), cli.global.quiet);
    let logged = match log_dir {
        Some(dir) => hostbind_logger::init_in_dir(&dir, verbosity, no_stdout),
        None => hostbind_logger::init_with_verbosity(verbosity, no_stdout),
    };
    if let Err(e) = logged {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }
    common::init_tracing();

    let result = match cli.command {
        Commands::Config { action } => config::handle_config(action, &cli.global),
        Commands::Cache(action) => cache::handle_cache(action, &cli.global),
        Commands::Inspect(action) => inspect::handle_inspect(action),
        Commands::Docs(action) => docs::handle_docs(action),
    };

    if let Err(e) = result {
        hostbind_logger::error(&format!("{:#}", e));
        if cli.global.verbosity_level() > 0 {
            hostbind_logger::show_log_path();
        }
        std::process::exit(1);
    }
}
