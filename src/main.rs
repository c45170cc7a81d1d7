use chrono::Utc;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

use sochi_blocks::io_utils::{io_cli_error, sochi_cli_error, usage_error};
use sochi_blocks::piece::parse_piece_list;
use sochi_blocks::report::{summary_lines, write_history_csv};
use sochi_blocks::{
    import_solutions, select_puzzle, stage_existing, Catalog, Config, DifficultyLevel,
    PublishLayout, Publisher, SelectionPolicy,
};

/// Select, publish and track 3D pentomino puzzles.
#[derive(Parser)]
#[command(name = "sochi", version, about)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Catalog file, overriding SOCHI_CATALOG
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Seed for the random source, for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import solver output into the catalog
    Import {
        /// Directory containing solutions_*.json files
        #[arg(long)]
        json_dir: PathBuf,
        /// Size class to import (e.g. 5x4x3) or "all"
        #[arg(long, default_value = "all")]
        size: String,
    },
    /// Show which puzzle would be published next
    Select,
    /// Publish puzzles and record them in the catalog
    Publish {
        /// Single difficulty to publish
        #[arg(long, value_enum, conflicts_with = "all")]
        difficulty: Option<DifficultyLevel>,
        /// Publish easy, medium and hard
        #[arg(long)]
        all: bool,
    },
    /// Publish an already staged viewer document
    Stage {
        /// Staged puzzle id, e.g. 5x4x3_0010
        #[arg(long)]
        puzzle_id: String,
        /// Comma separated removed pieces, e.g. V,W
        #[arg(long, default_value = "")]
        removed_pieces: String,
    },
    /// Print or export the publication history
    History {
        /// Write CSV to this path instead of stdout
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut cfg = Config::from_env().map_err(|e| sochi_cli_error("loading configuration", e))?;
    if let Some(path) = cli.catalog {
        cfg.catalog_path = path;
    }
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut catalog =
        Catalog::open(&cfg.catalog_path).map_err(|e| sochi_cli_error("opening catalog", e))?;

    match cli.command {
        Commands::Import { json_dir, size } => {
            if !json_dir.is_dir() {
                return Err(
                    usage_error(format!("'{}' is not a directory", json_dir.display())).into(),
                );
            }
            let summary = import_solutions(&mut catalog, &json_dir, &size, true)
                .map_err(|e| sochi_cli_error("importing solutions", e))?;
            catalog
                .save()
                .map_err(|e| sochi_cli_error("saving catalog", e))?;
            println!(
                "Imported {} puzzles ({} cells), skipped {}, failed {}",
                summary.puzzles, summary.cells, summary.skipped, summary.failed
            );
        }

        Commands::Select => {
            let policy = SelectionPolicy::from(&cfg);
            let (selection, reused) = select_puzzle(&catalog, &policy, &mut rng)
                .map_err(|e| sochi_cli_error("selecting puzzle", e))?;
            println!(
                "{} (max similarity to recent: {:.1}%){}",
                selection.candidate,
                selection.closeness * 100.0,
                if reused { " [reused]" } else { "" }
            );
        }

        Commands::Publish { difficulty, all } => {
            let mut publisher = Publisher::new(
                &mut catalog,
                PublishLayout::from_config(&cfg),
                SelectionPolicy::from(&cfg),
                Utc::now(),
                rng,
            );
            let reports = match (difficulty, all) {
                (_, true) => publisher.publish_all(),
                (Some(level), false) => publisher.publish_one(level, None).map(|r| vec![r]),
                (None, false) => {
                    return Err(usage_error("Specify --difficulty or --all").into());
                }
            }
            .map_err(|e| sochi_cli_error("publishing", e))?;
            for r in &reports {
                println!("[OK] Published: {}", r.code);
                println!("[LINK] {}", r.url);
            }
            println!("{}", "=".repeat(60));
            for line in summary_lines(&reports) {
                println!("  {line}");
            }
        }

        Commands::Stage {
            puzzle_id,
            removed_pieces,
        } => {
            let removed = parse_piece_list(&removed_pieces)
                .map_err(|e| sochi_cli_error("parsing removed pieces", e))?;
            let layout = PublishLayout::from_config(&cfg);
            let (path, url) = stage_existing(&layout, &puzzle_id, &removed)
                .map_err(|e| sochi_cli_error("staging puzzle", e))?;
            println!("[OK] Puzzle JSON  -> {}", path.display());
            println!("[LINK] {url}");
        }

        Commands::History { csv } => {
            let rows = match csv {
                Some(path) => {
                    let file = File::create(&path)
                        .map_err(|e| io_cli_error("create", &path, e))?;
                    write_history_csv(&catalog, file)
                }
                None => write_history_csv(&catalog, std::io::stdout().lock()),
            }
            .map_err(|e| sochi_cli_error("writing history", e))?;
            tracing::info!(rows, "history written");
        }
    }

    Ok(())
}
