//! Page parsers for the music archive templates.
//!
//! Every parser takes raw HTML and returns owned entities, so parsers hold
//! no state and can be called from any thread. A parser first checks the
//! page-identity root element: if it is missing the page belongs to another
//! parser and [`PageError::WrongPage`] is returned. Any other missing
//! mandatory element is a [`ParseError`].
//!
//! This module also holds the element locators shared by the parsers.

mod gamelist;
mod gamepage;
mod infopage;
mod menu;

pub use gamelist::parse_game_list_page;
pub use gamepage::parse_game_detail_page;
pub use infopage::parse_info_page;
pub use menu::parse_menu_page;

use crate::error::{PageError, ParseError};
use crate::models::{Browsable, InfoValue};
use crate::utils::MUSIC_PREFIX;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

/// Origin that relative link targets are resolved against.
static SITE_URL: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://www.zophar.net/").unwrap());

/// Selectors used by the locators.
struct Selectors {
    anchor: Selector,
    image: Selector,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    anchor: Selector::parse("a").unwrap(),
    image: Selector::parse("img").unwrap(),
});

/// Parses the document and runs `parse` on its page-identity root.
///
/// Returns [`PageError::WrongPage`] if no element has the id `root_id`.
pub(crate) fn load_page<T>(
    html: &str,
    root_id: &str,
    parse: impl FnOnce(ElementRef<'_>) -> Result<T, PageError>,
) -> Result<T, PageError> {
    let doc = Html::parse_document(html);

    let root = doc
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|elem| elem.value().id() == Some(root_id))
        .ok_or_else(|| PageError::WrongPage(root_id.to_string()))?;

    parse(root)
}

/// Finds the first descendant of `root` matching `selector`.
pub(crate) fn find<'a>(root: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    root.select(selector).find(|elem| elem.id() != root.id())
}

/// Like [`find`], but a missing element is an error.
pub(crate) fn locate<'a>(
    root: ElementRef<'a>,
    selector: &Selector,
    what: &str,
) -> Result<ElementRef<'a>, ParseError> {
    find(root, selector).ok_or_else(|| ParseError::ElementNotFound(what.to_string()))
}

/// Stripped text nodes of an element, joined by single spaces.
pub(crate) fn text(elem: ElementRef<'_>) -> String {
    elem.text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first descendant matching `selector`.
pub(crate) fn text_of(
    root: ElementRef<'_>,
    selector: &Selector,
    what: &str,
) -> Result<String, ParseError> {
    locate(root, selector, what).map(text)
}

/// Resolves a link target against the site origin.
pub(crate) fn resolve_url(href: &str) -> Result<Url, ParseError> {
    SITE_URL
        .join(href.trim())
        .map_err(|err| ParseError::InvalidUrl {
            url: href.to_string(),
            message: err.to_string(),
        })
}

/// Source of the first image inside the element.
pub(crate) fn image_src(elem: ElementRef<'_>) -> Option<Url> {
    let src = find(elem, &SELECTORS.image)?.value().attr("src")?;

    match resolve_url(src) {
        Ok(url) => Some(url),
        Err(err) => {
            tracing::debug!("Ignoring image: {}", err);
            None
        }
    }
}

/// Reads the name and relative path of a link.
///
/// The element is either the anchor itself or contains one. The name is
/// the element's text; the path is the link target without the `/music/`
/// prefix, query and fragment. Targets outside `/music/` on the site are a
/// [`ParseError::ForeignLink`].
pub(crate) fn parse_link(elem: ElementRef<'_>) -> Result<Browsable, ParseError> {
    let name = text(elem);
    if name.is_empty() {
        return Err(ParseError::EmptyLink);
    }

    let anchor = if elem.value().name() == "a" {
        elem
    } else {
        locate(elem, &SELECTORS.anchor, "a")?
    };

    let href = anchor.value().attr("href").ok_or(ParseError::MissingHref)?;

    Ok(Browsable::new(music_path(href)?, name))
}

/// Resolves a link target and returns its path below `/music/`, without
/// that prefix, query and fragment.
pub(crate) fn music_path(href: &str) -> Result<String, ParseError> {
    let url = resolve_url(href)?;
    if url.host_str() != SITE_URL.host_str() {
        return Err(ParseError::ForeignLink(href.to_string()));
    }

    url.path()
        .strip_prefix(MUSIC_PREFIX)
        .map(str::to_string)
        .ok_or_else(|| ParseError::ForeignLink(href.to_string()))
}

/// [`parse_link`] for optional fields: failures become `None`.
pub(crate) fn browsable_from_link(elem: ElementRef<'_>) -> Option<Browsable> {
    match parse_link(elem) {
        Ok(item) if !item.path.is_empty() => Some(item),
        Ok(item) => {
            tracing::debug!("Ignoring link '{}' without path", item.name);
            None
        }
        Err(err) => {
            tracing::debug!("Ignoring link: {}", err);
            None
        }
    }
}

/// Value of a cell that may hold a link or plain text.
pub(crate) fn info_value(elem: ElementRef<'_>) -> Option<InfoValue> {
    if find(elem, &SELECTORS.anchor).is_some()
        && let Some(item) = browsable_from_link(elem)
    {
        return Some(InfoValue::Linked(item));
    }

    let value = text(elem);
    (!value.is_empty()).then_some(InfoValue::Text(value))
}

/// Anchors below the element, in document order.
pub(crate) fn anchors<'a>(elem: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    elem.select(&SELECTORS.anchor)
        .filter(move |anchor| anchor.id() != elem.id())
}
