//! Zophar CLI - browse the video game music archive.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zophar::config::Config;
use zophar::console::Console;
use zophar::parsers::{
    parse_game_detail_page, parse_game_list_page, parse_info_page, parse_menu_page,
};
use zophar::{Browsable, GameEntry, GameInfo, InfoValue, MenuPage, MusicBrowser, PageError};

/// Video game music archive browser.
#[derive(Parser, Debug)]
#[command(name = "zophar")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file to use instead of the default one.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the menu categories and search platforms.
    Menu,

    /// List every game of a platform, developer, year, ...
    List {
        /// Path below /music/, e.g. `nintendo-nes-nsf`.
        path: String,
    },

    /// Show a game with its archives and tracks.
    Game {
        /// Path below /music/, e.g. `nintendo-nes-nsf/mega-man-2`.
        path: String,
    },

    /// List the entries of an info page, e.g. `developer`.
    Info { path: String },

    /// Parse a saved HTML page instead of fetching it.
    Parse {
        kind: PageKind,
        file: PathBuf,

        /// Request path of a game page.
        #[arg(long)]
        path: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PageKind {
    Menu,
    List,
    Game,
    Info,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Output {
    Menu(MenuPage),
    List(Vec<GameEntry>),
    Game(Box<GameInfo>),
    Info(Vec<Browsable>),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let console = Console::new();

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let output = run(args.command, &config, &console).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        render(&console, &output);
    }

    Ok(())
}

async fn run(command: Command, config: &Config, console: &Console) -> Result<Output> {
    let browser = || {
        MusicBrowser::from_config(&config.browser).context("Failed to create HTTP client")
    };

    let output = match command {
        Command::Menu => Output::Menu(browser()?.menu().await?),
        Command::List { path } => Output::List(browser()?.game_list(&path).await?),
        Command::Game { path } => Output::Game(Box::new(browser()?.game(&path).await?)),
        Command::Info { path } => Output::Info(browser()?.info(&path).await?),
        Command::Parse { kind, file, path } => {
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;

            match parse_file(kind, &html, path.as_deref()) {
                Ok(output) => output,
                Err(err) if err.is_wrong_page() => {
                    console.warning(&format!(
                        "{} is not a {:?} page, try another kind",
                        file.display(),
                        kind
                    ));
                    return Err(err.into());
                }
                Err(err) => return Err(err).context("Failed to parse page"),
            }
        }
    };

    Ok(output)
}

fn parse_file(kind: PageKind, html: &str, path: Option<&str>) -> Result<Output, PageError> {
    Ok(match kind {
        PageKind::Menu => Output::Menu(parse_menu_page(html)?),
        PageKind::List => {
            let (entries, pages) = parse_game_list_page(html)?;
            tracing::info!("Page of a list with {} pages", pages);
            Output::List(entries)
        }
        PageKind::Game => Output::Game(Box::new(parse_game_detail_page(html, path)?)),
        PageKind::Info => Output::Info(parse_info_page(html)?),
    })
}

fn render(console: &Console, output: &Output) {
    match output {
        Output::Menu(page) => {
            for (category, items) in &page.menu {
                console.section(category);
                for (path, name) in items {
                    console.entry(name, path);
                }
            }

            console.section("Platforms");
            for (name, id) in &page.platforms {
                console.entry(name, id);
            }
        }
        Output::List(entries) => {
            for entry in entries {
                let details: Vec<&str> = [&entry.release_date, &entry.developer]
                    .into_iter()
                    .flatten()
                    .map(InfoValue::name)
                    .collect();
                console.entry(&entry.name, &details.join(", "));
            }
            console.success(&format!("{} games", console.count(entries.len())));
        }
        Output::Game(game) => render_game(console, game),
        Output::Info(items) => {
            for item in items {
                console.entry(&item.name, &item.path);
            }
            if items.is_empty() {
                console.warning("No entries found");
            }
        }
    }
}

fn render_game(console: &Console, game: &GameInfo) {
    console.section(&game.entry.name);
    console.field("Console", &game.console);

    let fields = [
        ("Release date", &game.entry.release_date),
        ("Developer", &game.entry.developer),
        ("Publisher", &game.publisher),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            console.field(key, value.name());
        }
    }

    if let Some(cover) = &game.entry.cover {
        console.field("Cover", cover.as_str());
    }

    if game.archives.is_empty() {
        console.error("No archives available");
    }
    for (kind, url) in &game.archives {
        console.field(kind, url.as_str());
    }

    console.info(&format!(
        "{} tracks, formats: {}",
        console.count(game.tracks.len()),
        game.formats().join(", ")
    ));
    for (number, track) in game.tracks.iter().enumerate() {
        let secs = track.duration.as_secs();
        console.entry(
            &format!("{:>2}. {}", number + 1, track.title),
            &format!("{}:{:02}", secs / 60, secs % 60),
        );
    }
}
