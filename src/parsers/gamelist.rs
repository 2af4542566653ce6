//! Paginated game list pages (platform, developer, year, search results).

use super::{find, image_src, info_value, load_page, locate, parse_link, text};
use crate::error::{PageError, ParseError};
use crate::models::GameEntry;
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

/// Page-identity root of game lists.
const ROOT_ID: &str = "gamelistpage";

/// Regex for the pagination counter, e.g. `Page 2 of 7`.
static COUNTER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Page \d{1,3} of (\d{1,3})$").unwrap());

struct Selectors {
    row: Selector,
    name: Selector,
    image: Selector,
    year: Selector,
    developer: Selector,
    counter: Selector,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    row: Selector::parse("tr").unwrap(),
    name: Selector::parse(".name").unwrap(),
    image: Selector::parse(".image").unwrap(),
    year: Selector::parse(".year").unwrap(),
    developer: Selector::parse(".developer").unwrap(),
    counter: Selector::parse(".counter").unwrap(),
});

/// Parses one page of a game list.
///
/// Returns the entries of the page and the total number of pages.
pub fn parse_game_list_page(html: &str) -> Result<(Vec<GameEntry>, u32), PageError> {
    let _span = tracing::debug_span!("parse_game_list_page").entered();

    load_page(html, ROOT_ID, |page| {
        let entries = page
            .select(&SELECTORS.row)
            .filter(|row| {
                row.value()
                    .classes()
                    .any(|class| class.starts_with("regularrow"))
            })
            .map(parse_row)
            .collect::<Result<Vec<_>, _>>()?;

        let pages = parse_page_count(page)?;
        tracing::debug!("Found {} games, {} pages", entries.len(), pages);

        Ok((entries, pages))
    })
}

/// Reads a `regularrow*` row. Only the `name` cell is mandatory.
fn parse_row(row: ElementRef<'_>) -> Result<GameEntry, ParseError> {
    let link = parse_link(locate(row, &SELECTORS.name, "game name")?)?;

    let mut entry = GameEntry::new(link.path, link.name);
    entry.cover = find(row, &SELECTORS.image).and_then(image_src);
    entry.release_date = find(row, &SELECTORS.year).and_then(info_value);
    entry.developer = find(row, &SELECTORS.developer).and_then(info_value);

    Ok(entry)
}

/// Total number of pages; lists that fit on one page have no counter.
fn parse_page_count(page: ElementRef<'_>) -> Result<u32, ParseError> {
    let Some(counter) = find(page, &SELECTORS.counter) else {
        return Ok(1);
    };

    let counter = text(counter);
    let pages = COUNTER_REGEX
        .captures(&counter)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok());

    pages.ok_or(ParseError::PageCounter(counter))
}
