// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

// Use library instead of local modules
use unit_converter::{
    init_logging, Category, CommentError, CommentStore, Config, ConfigOverrides, ConversionEngine,
    ConversionRequest, UnitTable,
};

#[derive(Parser, Debug)]
#[command(name = "unit-converter", version, about = "Convert units, keep a short history, leave comments")]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Comment board file (overrides the config file)
    #[arg(long, global = true)]
    comments_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive terminal UI (default)
    Tui,

    /// One-shot conversion, e.g. `convert length 1000 Meter Kilometer`
    Convert {
        category: String,
        #[arg(allow_hyphen_values = true)]
        value: f64,
        from: String,
        to: String,
    },

    /// List categories, or the units of one category
    Units { category: Option<String> },

    /// Read or edit the comment board
    Comments {
        #[command(subcommand)]
        action: CommentAction,
    },
}

#[derive(Subcommand, Debug)]
enum CommentAction {
    List,
    Add { name: String, text: String },
    /// Delete by position as listed (1-based)
    Remove { position: usize },
    /// Wipe the board
    Reset,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(
        cli.config.as_deref(),
        ConfigOverrides {
            comments_file: cli.comments_file.clone(),
            ..Default::default()
        },
    )?;

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => run_ui_mode(&config)?,
        Command::Convert { category, value, from, to } => {
            init_logging();
            run_convert(&category, value, &from, &to)?
        }
        Command::Units { category } => run_units(category.as_deref())?,
        Command::Comments { action } => {
            init_logging();
            run_comments(&config, action)?
        }
    }

    Ok(())
}

fn run_convert(category: &str, value: f64, from: &str, to: &str) -> Result<()> {
    let category = Category::parse(category)?;
    let request = ConversionRequest::new(category, value, from, to);
    let record = ConversionEngine::run(&request)?;

    println!("{} {}", category.icon(), record.formatted);
    Ok(())
}

fn run_units(category: Option<&str>) -> Result<()> {
    let categories = match category {
        Some(name) => vec![Category::parse(name)?],
        None => UnitTable::categories().to_vec(),
    };

    for category in categories {
        println!("{}", category.label());
        for unit in category.units() {
            match unit.factor() {
                Some(factor) => println!("   {:<12} × {}", unit.name, factor),
                None => println!("   {}", unit.name),
            }
        }
    }
    Ok(())
}

fn run_comments(config: &Config, action: CommentAction) -> Result<()> {
    let mut store = open_comment_store(&config.comments_file)?;

    match action {
        CommentAction::List => {
            if store.is_empty() {
                println!("💬 No comments yet.");
            }
            for (i, comment) in store.comments().iter().enumerate() {
                println!("{}. {}", i + 1, comment);
            }
        }
        CommentAction::Add { name, text } => {
            store.add(&name, &text)?;
            println!("✓ Comment added!");
        }
        CommentAction::Remove { position } => {
            if position == 0 {
                bail!("Positions start at 1");
            }
            let removed = store.remove(position - 1)?;
            println!("✓ Deleted: {}", removed);
        }
        CommentAction::Reset => {
            store.reset()?;
            println!("✓ Comment board cleared");
        }
    }
    Ok(())
}

/// Open the board; a corrupt file is reported and the user may reset it
fn open_comment_store(path: &Path) -> Result<CommentStore> {
    match CommentStore::open(path) {
        Ok(store) => Ok(store),
        Err(err @ CommentError::CorruptState { .. }) => {
            eprintln!("❌ {}", err);
            if confirm("   Reset the comment board to empty? [y/N] ")? {
                Ok(CommentStore::open_or_reset(path)?)
            } else {
                Err(err).context("Comment board left untouched")
            }
        }
        Err(err) => Err(err.into()),
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{}", prompt);
    io::stderr().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config) -> Result<()> {
    println!("🖥️  Loading Unit Converter...\n");

    let store = open_comment_store(&config.comments_file)?;
    println!("✓ Loaded {} comments from {:?}", store.len(), store.path());

    let mut app = ui::App::new(store);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use web UI: cargo run --bin converter-server --features server");
    std::process::exit(1);
}
