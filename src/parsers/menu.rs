//! Sidebar menu and search form of the music pages.

use super::{load_page, music_path, text};
use crate::error::{PageError, ParseError};
use crate::models::{CategoryMap, MenuPage, PlatformMap};
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

/// Page-identity root of the menu.
const ROOT_ID: &str = "sidebarSearch";

/// Categories left out of the menu.
const BLACKLIST: &[&str] = &["Emulated Files"];

struct Selectors {
    /// Category headings and menu links.
    entry: Selector,
    /// Platform filter of the search form.
    select: Selector,
    option: Selector,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    entry: Selector::parse("h1, h2, h3, h4, h5, h6, a").unwrap(),
    select: Selector::parse("select").unwrap(),
    option: Selector::parse("option").unwrap(),
});

/// Parses the sidebar menu and the platforms of the search form.
///
/// Category headings and their links are siblings in the sidebar, so
/// entries are read as a flat stream: every heading starts a category,
/// every following link belongs to it. Links of blacklisted categories and
/// links outside `/music/` are skipped, and a category without links is
/// absent from the menu.
pub fn parse_menu_page(html: &str) -> Result<MenuPage, PageError> {
    let _span = tracing::debug_span!("parse_menu_page").entered();

    load_page(html, ROOT_ID, |sidebar| {
        let menu = parse_menu(sidebar);
        let platforms = parse_platforms(sidebar)?;

        Ok(MenuPage { menu, platforms })
    })
}

fn parse_menu(sidebar: ElementRef<'_>) -> CategoryMap {
    let mut menu = CategoryMap::new();
    let mut category: Option<String> = None;

    for elem in sidebar.select(&SELECTORS.entry) {
        let name = text(elem);
        if name.is_empty() {
            continue;
        }

        if elem.value().name() != "a" {
            let blacklisted = BLACKLIST.contains(&name.as_str());
            tracing::debug!(
                "Found top menu entry: '{}', blacklisted: {}",
                name,
                blacklisted
            );
            category = (!blacklisted).then_some(name);
            continue;
        }

        let Some(current) = &category else {
            continue;
        };

        let Some(href) = elem.value().attr("href") else {
            continue;
        };
        let path = match music_path(href) {
            Ok(path) if !path.is_empty() => path,
            Ok(_) => continue,
            Err(err) => {
                tracing::debug!("Skipping menu link '{}': {}", name, err);
                continue;
            }
        };

        tracing::debug!("Found menu entry: '{}', path: '{}'", name, path);
        menu.entry(current.clone())
            .or_default()
            .insert(path, name);
    }

    menu
}

/// The platform `<select>` lives in the search form of the sidebar; the
/// whole page is searched in case the form is moved out of it.
fn parse_platforms(sidebar: ElementRef<'_>) -> Result<PlatformMap, ParseError> {
    let select = super::find(sidebar, &SELECTORS.select)
        .or_else(|| page_root(sidebar).select(&SELECTORS.select).next())
        .ok_or_else(|| ParseError::ElementNotFound("platform select".to_string()))?;

    Ok(select
        .select(&SELECTORS.option)
        .map(|option| {
            let name = text(option);
            let value = option
                .value()
                .attr("value")
                .map_or_else(|| name.clone(), str::to_string);
            (name, value)
        })
        .collect())
}

fn page_root(elem: ElementRef<'_>) -> ElementRef<'_> {
    elem.ancestors()
        .filter_map(ElementRef::wrap)
        .last()
        .unwrap_or(elem)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MENU_PAGE: &str = r#"<html><body>
        <div id="sidebarSearch">
            <a href="/music/ignored">Before any category</a>
            <h2>Consoles</h2>
            <ul>
                <li><a href="/music/nintendo-nes-nsf">Nintendo NES</a></li>
                <li><a href="/music/sega-genesis">Sega Genesis</a></li>
                <li><a href="https://www.zophar.net/forums">Forums</a></li>
                <li><a href="https://www.zophar.net/music/sony-playstation-psf">Sony PlayStation</a></li>
                <li><a href="https://example.com/music/elsewhere">Elsewhere</a></li>
            </ul>
            <h2>Emulated Files</h2>
            <ul>
                <li><a href="/music/nsf">NSF</a></li>
            </ul>
            <h2>Handhelds</h2>
            <ul>
                <li><a href="/music/gameboy-gbs">Game Boy</a></li>
                <li><a href="/music/game-watch"><img src="/gw.png"></a></li>
            </ul>
            <form>
                <select name="search_consoleid">
                    <option value="">All platforms</option>
                    <option value="12">Nintendo NES</option>
                    <option value="34">Sega Genesis</option>
                    <option>Other</option>
                </select>
            </form>
        </div>
    </body></html>"#;

    #[test]
    fn test_parse_menu_page() {
        let page = parse_menu_page(MENU_PAGE).unwrap();

        assert_eq!(page.menu.len(), 2);
        let consoles = &page.menu["Consoles"];
        assert_eq!(consoles.len(), 3);
        assert_eq!(consoles["nintendo-nes-nsf"], "Nintendo NES");
        assert_eq!(consoles["sony-playstation-psf"], "Sony PlayStation");
        assert_eq!(consoles["sega-genesis"], "Sega Genesis");

        let handhelds = &page.menu["Handhelds"];
        assert_eq!(handhelds.len(), 1);
        assert_eq!(handhelds["gameboy-gbs"], "Game Boy");
    }

    #[test]
    fn test_blacklisted_category_absent() {
        let page = parse_menu_page(MENU_PAGE).unwrap();

        assert!(!page.menu.contains_key("Emulated Files"));
        assert!(page.menu.values().all(|items| !items.contains_key("nsf")));
        assert!(page.menu.values().all(|items| !items.contains_key("ignored")));
    }

    #[test]
    fn test_parse_platforms() {
        let page = parse_menu_page(MENU_PAGE).unwrap();

        assert_eq!(page.platforms.len(), 4);
        assert_eq!(page.platforms["All platforms"], "");
        assert_eq!(page.platforms["Nintendo NES"], "12");
        assert_eq!(page.platforms["Sega Genesis"], "34");
        assert_eq!(page.platforms["Other"], "Other");
    }

    #[test]
    fn test_platforms_outside_sidebar() {
        let html = r#"<html><body>
            <div id="sidebarSearch"><h2>Consoles</h2><a href="/music/nes">NES</a></div>
            <select><option value="1">NES</option></select>
        </body></html>"#;

        let page = parse_menu_page(html).unwrap();
        assert_eq!(page.platforms["NES"], "1");
        assert_eq!(page.menu["Consoles"]["nes"], "NES");
    }

    #[test]
    fn test_missing_select_is_parse_error() {
        let html = r#"<div id="sidebarSearch"><h2>Consoles</h2></div>"#;

        assert_eq!(
            parse_menu_page(html),
            Err(PageError::Parse(ParseError::ElementNotFound(
                "platform select".to_string()
            )))
        );
    }

    #[test]
    fn test_wrong_page() {
        let html = r#"<div id="gamelistpage"></div>"#;
        assert!(parse_menu_page(html).unwrap_err().is_wrong_page());
    }
}
