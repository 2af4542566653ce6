//! Zophar - video game music archive scraper.
//!
//! This library provides functionality for:
//! - Parsing the menu, game list, game and info pages of the music archive
//! - Building a browsing tree of the archive's namespace
//! - Fetching pages and aggregating paginated game lists

pub mod browser;
pub mod config;
pub mod console;
pub mod error;
pub mod models;
pub mod parsers;
pub mod utils;

// Re-export commonly used types
pub use browser::{HttpSource, MusicBrowser, PageSource};
pub use config::Config;
pub use console::Console;
pub use error::{BrowserError, ConfigError, PageError, ParseError, TreeError};
pub use models::{
    Browsable, CategoryMap, Folder, GameEntry, GameInfo, GameTrack, InfoValue, MenuPage,
    PlatformMap,
};
pub use parsers::{
    parse_game_detail_page, parse_game_list_page, parse_info_page, parse_menu_page,
};
