//! Game page: metadata, cover, music archives and track list.

use super::{
    anchors, find, image_src, info_value, load_page, locate, resolve_url, text, text_of,
};
use crate::error::{PageError, ParseError};
use crate::models::{GameEntry, GameInfo, GameTrack, InfoValue};
use crate::utils::{extension, file_name, raw_path, strip_music_prefix};
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

/// Page-identity root of game pages.
const ROOT_ID: &str = "gamepage";

/// Regex for the archive type in a mass download file name,
/// e.g. `Mega Man 2 (MP3).zophar.zip`. Parentheses may be percent-encoded.
static ARCHIVE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\(|%28)([A-Za-z0-9_]+)(?:\)|%29)\.zophar\.zip$").unwrap()
});

struct Selectors {
    info: Selector,
    title: Selector,
    field: Selector,
    field_name: Selector,
    field_data: Selector,
    cover: Selector,
    mass_download: Selector,
    tracklist: Selector,
    row: Selector,
    cell: Selector,
    track_name: Selector,
    track_length: Selector,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    info: Selector::parse("#music_info").unwrap(),
    title: Selector::parse("h2").unwrap(),
    field: Selector::parse("p").unwrap(),
    field_name: Selector::parse(".infoname").unwrap(),
    field_data: Selector::parse(".infodata").unwrap(),
    cover: Selector::parse("#music_cover").unwrap(),
    mass_download: Selector::parse("#mass_download").unwrap(),
    tracklist: Selector::parse("#tracklist").unwrap(),
    row: Selector::parse("tr").unwrap(),
    cell: Selector::parse("td").unwrap(),
    track_name: Selector::parse(".name").unwrap(),
    track_length: Selector::parse(".length").unwrap(),
});

/// Fields of the `music_info` block that are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Console,
    Developer,
    Publisher,
    ReleaseDate,
}

impl Field {
    /// Looks up a normalized label (`"Release Date:"` -> `release_date`).
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "console" => Some(Field::Console),
            "developer" => Some(Field::Developer),
            "publisher" => Some(Field::Publisher),
            "release_date" => Some(Field::ReleaseDate),
            _ => None,
        }
    }
}

/// Game record under construction.
#[derive(Debug, Default)]
struct GameInfoBuilder {
    console: Option<String>,
    developer: Option<InfoValue>,
    publisher: Option<InfoValue>,
    release_date: Option<InfoValue>,
}

impl GameInfoBuilder {
    fn set(&mut self, field: Field, value: InfoValue) {
        match field {
            Field::Console => self.console = Some(value.name().to_string()),
            Field::Developer => self.developer = Some(value),
            Field::Publisher => self.publisher = Some(value),
            Field::ReleaseDate => self.release_date = Some(value),
        }
    }
}

/// Parses a game page.
///
/// `path` is the request path of the page; it may keep its `/music/` prefix.
pub fn parse_game_detail_page(html: &str, path: Option<&str>) -> Result<GameInfo, PageError> {
    let path = path.map(|p| raw_path(strip_music_prefix(p))).unwrap_or_default();
    let _span = tracing::debug_span!("parse_game_detail_page", path = %path).entered();

    load_page(html, ROOT_ID, |page| {
        let info = locate(page, &SELECTORS.info, "music_info")?;
        let name = text_of(info, &SELECTORS.title, "game title")?;
        let fields = parse_music_info(info)?;

        let cover = find(page, &SELECTORS.cover).and_then(image_src);

        let archives = match find(page, &SELECTORS.mass_download) {
            Some(block) => parse_mass_download(block)?,
            None => BTreeMap::new(),
        };

        let tracklist = locate(page, &SELECTORS.tracklist, "tracklist")?;
        let tracks = parse_tracklist(tracklist)?;

        let console = fields
            .console
            .filter(|console| !console.is_empty())
            .ok_or(ParseError::MissingField("console"))?;

        Ok(GameInfo {
            entry: GameEntry {
                path: path.to_string(),
                name,
                cover,
                release_date: fields.release_date,
                developer: fields.developer,
            },
            console,
            publisher: fields.publisher,
            archives,
            tracks,
        })
    })
}

/// Reads the label/value pairs of the `music_info` block.
fn parse_music_info(info: ElementRef<'_>) -> Result<GameInfoBuilder, ParseError> {
    let mut builder = GameInfoBuilder::default();

    for row in info.select(&SELECTORS.field) {
        let Some(label) = find(row, &SELECTORS.field_name) else {
            continue;
        };

        let key = field_key(&text(label));
        let data = locate(row, &SELECTORS.field_data, "infodata")?;
        let Some(value) = info_value(data) else {
            tracing::debug!("Field '{}' is empty", key);
            continue;
        };

        match Field::from_key(&key) {
            Some(field) => builder.set(field, value),
            None => tracing::debug!("Discarding unknown field '{}': '{}'", key, value.name()),
        }
    }

    Ok(builder)
}

/// Normalizes a label: `"Release Date:"` -> `"release_date"`.
fn field_key(label: &str) -> String {
    label
        .trim()
        .trim_end_matches(':')
        .trim_end()
        .to_lowercase()
        .replace(' ', "_")
}

/// Archive type from a mass download link, e.g. `mp3`, `flac` or `original`.
fn archive_type(href: &str) -> Result<String, ParseError> {
    ARCHIVE_REGEX
        .captures(file_name(href))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
        .ok_or_else(|| ParseError::ArchiveType(href.to_string()))
}

fn parse_mass_download(block: ElementRef<'_>) -> Result<BTreeMap<String, Url>, ParseError> {
    let mut archives = BTreeMap::new();

    for anchor in anchors(block) {
        let href = anchor.value().attr("href").ok_or(ParseError::MissingHref)?;
        let kind = archive_type(href)?;
        archives.insert(kind, resolve_url(href)?);
    }

    Ok(archives)
}

/// Parses a `minutes:seconds` track length.
fn parse_length(length: &str) -> Result<Duration, ParseError> {
    let invalid = || ParseError::TrackLength(length.to_string());

    let (minutes, seconds) = length.trim().split_once(':').ok_or_else(invalid)?;
    let minutes = parse_digits(minutes).ok_or_else(invalid)?;
    let seconds = parse_digits(seconds).ok_or_else(invalid)?;

    let total = minutes
        .checked_mul(60)
        .and_then(|secs| secs.checked_add(seconds))
        .ok_or_else(invalid)?;

    Ok(Duration::from_secs(total))
}

/// Unsigned decimal number; signs and empty input are rejected.
fn parse_digits(value: &str) -> Option<u64> {
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Reads the tracks in document order. Header rows (no `td`) are skipped.
fn parse_tracklist(tracklist: ElementRef<'_>) -> Result<Vec<GameTrack>, ParseError> {
    let mut tracks = Vec::new();

    for row in tracklist.select(&SELECTORS.row) {
        if find(row, &SELECTORS.cell).is_none() {
            continue;
        }

        let title = text_of(row, &SELECTORS.track_name, "track name")?;
        let length = text_of(row, &SELECTORS.track_length, "track length")?;
        let duration = parse_length(&length)?;

        let mut url = BTreeMap::new();
        for anchor in anchors(row) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };

            let Some(format) = extension(href) else {
                tracing::debug!("Skipping track link without extension: '{}'", href);
                continue;
            };

            url.insert(format, resolve_url(href)?);
        }

        tracks.push(GameTrack {
            title,
            duration,
            url,
        });
    }

    Ok(tracks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Browsable;

    const MASS_DOWNLOAD: &str = r#"
        <div id="mass_download">
            <p><a href="https://fi.zophar.net/soundfiles/nintendo-nes-nsf/mega-man-2/Mega%20Man%202%20(MP3).zophar.zip">MP3</a></p>
            <p><a href="https://fi.zophar.net/soundfiles/nintendo-nes-nsf/mega-man-2/Mega%20Man%202%20%28FLAC%29.zophar.zip">FLAC</a></p>
            <p><a href="https://fi.zophar.net/soundfiles/nintendo-nes-nsf/mega-man-2/Mega Man 2 (Original).zophar.zip">NSF</a></p>
        </div>"#;

    const TRACKLIST: &str = r#"
        <table id="tracklist">
            <tr><th>Track</th><th>Length</th><th>Download</th></tr>
            <tr>
                <td class="name">Title Screen</td>
                <td class="length">1:05</td>
                <td class="download"><a href="https://fi.zophar.net/soundfiles/nes/mm2/01%20Title%20Screen.mp3">MP3</a></td>
                <td class="download"><a href="https://fi.zophar.net/soundfiles/nes/mm2/01%20Title%20Screen.FLAC">FLAC</a></td>
            </tr>
            <tr>
                <td class="name">Dr. Wily Stage 1</td>
                <td class="length">3:45</td>
                <td class="download"><a href="https://fi.zophar.net/soundfiles/nes/mm2/02%20Wily.mp3">MP3</a></td>
            </tr>
        </table>"#;

    const MUSIC_INFO: &str = r#"
        <div id="music_info">
            <h2>Mega Man 2</h2>
            <p><span class="infoname">Alternate Name:</span><span class="infodata">Rockman 2</span></p>
            <p><span class="infoname">Console:</span><span class="infodata"><a href="/music/nintendo-nes-nsf">Nintendo NES</a></span></p>
            <p><span class="infoname">Developer:</span><span class="infodata"><a href="/music/developer/capcom">Capcom</a></span></p>
            <p><span class="infoname">Publisher:</span><span class="infodata">Capcom USA</span></p>
            <p><span class="infoname">Release Date:</span><span class="infodata"><a href="/music/year/1988">1988</a></span></p>
            <p>Ripped by someone.</p>
        </div>"#;

    fn game_page(info: &str, mass_download: &str, tracklist: &str) -> String {
        format!(
            r#"<html><body><div id="gamepage">
                <div id="music_cover"><img src="https://www.zophar.net/images/mm2.jpg"></div>
                {info}
                {mass_download}
                {tracklist}
            </div></body></html>"#
        )
    }

    #[test]
    fn test_parse_game_page() {
        let html = game_page(MUSIC_INFO, MASS_DOWNLOAD, TRACKLIST);
        let game = parse_game_detail_page(&html, Some("/music/nintendo-nes-nsf/mega-man-2")).unwrap();

        assert_eq!(game.entry.path, "nintendo-nes-nsf/mega-man-2");
        assert_eq!(game.entry.name, "Mega Man 2");
        assert_eq!(game.console, "Nintendo NES");
        assert_eq!(
            game.entry.developer,
            Some(InfoValue::Linked(Browsable::new("developer/capcom", "Capcom")))
        );
        assert_eq!(game.publisher, Some(InfoValue::Text("Capcom USA".to_string())));
        assert_eq!(
            game.entry.release_date,
            Some(InfoValue::Linked(Browsable::new("year/1988", "1988")))
        );
        assert_eq!(
            game.entry.cover.as_ref().map(Url::as_str),
            Some("https://www.zophar.net/images/mm2.jpg")
        );
    }

    #[test]
    fn test_parse_archives() {
        let html = game_page(MUSIC_INFO, MASS_DOWNLOAD, TRACKLIST);
        let game = parse_game_detail_page(&html, None).unwrap();

        let kinds: Vec<&str> = game.archives.keys().map(String::as_str).collect();
        assert_eq!(kinds, vec!["flac", "mp3", "original"]);
        assert!(game.archives["mp3"].as_str().ends_with("(MP3).zophar.zip"));
    }

    #[test]
    fn test_parse_tracks() {
        let html = game_page(MUSIC_INFO, MASS_DOWNLOAD, TRACKLIST);
        let game = parse_game_detail_page(&html, None).unwrap();

        assert_eq!(game.tracks.len(), 2);

        let first = &game.tracks[0];
        assert_eq!(first.title, "Title Screen");
        assert_eq!(first.duration, Duration::from_secs(65));
        assert_eq!(first.url.len(), 2);
        assert!(first.url.contains_key("mp3"));
        assert!(first.url.contains_key("flac"));

        let second = &game.tracks[1];
        assert_eq!(second.title, "Dr. Wily Stage 1");
        assert_eq!(second.duration, Duration::from_secs(3 * 60 + 45));

        assert_eq!(game.formats(), vec!["flac", "mp3"]);
    }

    #[test]
    fn test_optional_blocks() {
        let html = format!(
            r#"<div id="gamepage">{MUSIC_INFO}<table id="tracklist"></table></div>"#
        );
        let game = parse_game_detail_page(&html, None).unwrap();

        assert_eq!(game.entry.path, "");
        assert_eq!(game.entry.cover, None);
        assert!(game.archives.is_empty());
        assert!(game.tracks.is_empty());
    }

    #[test]
    fn test_unparsable_archive() {
        let mass_download = r#"<div id="mass_download">
            <a href="https://fi.zophar.net/soundfiles/nes/mm2/Mega%20Man%202.zophar.zip">MP3</a>
        </div>"#;
        let html = game_page(MUSIC_INFO, mass_download, TRACKLIST);

        assert!(matches!(
            parse_game_detail_page(&html, None),
            Err(PageError::Parse(ParseError::ArchiveType(_)))
        ));
    }

    #[test]
    fn test_missing_mandatory_blocks() {
        let html = game_page("", MASS_DOWNLOAD, TRACKLIST);
        assert_eq!(
            parse_game_detail_page(&html, None),
            Err(PageError::Parse(ParseError::ElementNotFound(
                "music_info".to_string()
            )))
        );

        let html = game_page(MUSIC_INFO, MASS_DOWNLOAD, "");
        assert_eq!(
            parse_game_detail_page(&html, None),
            Err(PageError::Parse(ParseError::ElementNotFound(
                "tracklist".to_string()
            )))
        );

        let info = r#"<div id="music_info"><h2>Mystery</h2></div>"#;
        let html = game_page(info, MASS_DOWNLOAD, TRACKLIST);
        assert_eq!(
            parse_game_detail_page(&html, None),
            Err(PageError::Parse(ParseError::MissingField("console")))
        );
    }

    #[test]
    fn test_wrong_page() {
        let html = r#"<html><body><div id="gamelistpage">
            <table><tr class="regularrow"><td class="name"><a href="/music/nes/mm2">Mega Man 2</a></td></tr></table>
        </div></body></html>"#;

        assert_eq!(
            parse_game_detail_page(html, None),
            Err(PageError::WrongPage("gamepage".to_string()))
        );
    }

    #[test]
    fn test_field_key() {
        assert_eq!(field_key("Release Date:"), "release_date");
        assert_eq!(field_key(" Console: "), "console");
        assert_eq!(field_key("Alternate Name"), "alternate_name");
    }

    #[test]
    fn test_field_table() {
        assert_eq!(Field::from_key("release_date"), Some(Field::ReleaseDate));
        assert_eq!(Field::from_key("console"), Some(Field::Console));
        assert_eq!(Field::from_key("alternate_name"), None);
        assert_eq!(Field::from_key("tracks"), None);
    }

    #[test]
    fn test_archive_type() {
        assert_eq!(archive_type("https://x/Game%20(mp3).zophar.zip").unwrap(), "mp3");
        assert_eq!(archive_type("/Game (FLAC).zophar.zip?dl=1").unwrap(), "flac");
        assert_eq!(
            archive_type("https://x/Game.zophar.zip"),
            Err(ParseError::ArchiveType("https://x/Game.zophar.zip".to_string()))
        );
        assert!(archive_type("https://x/Game (mp3).zip").is_err());
    }

    #[test]
    fn test_parse_length() {
        assert_eq!(parse_length("3:45").unwrap(), Duration::from_secs(225));
        assert_eq!(parse_length("0:07").unwrap(), Duration::from_secs(7));
        assert!(parse_length("345").is_err());
        assert!(parse_length("1:02:03").is_err());
        assert!(parse_length("a:bc").is_err());
        assert_eq!(parse_length(" 12 : 00 ").unwrap(), Duration::from_secs(720));
    }

    #[test]
    fn test_parse_length_rejects_signs_and_overflow() {
        assert_eq!(
            parse_length("+3:+45"),
            Err(ParseError::TrackLength("+3:+45".to_string()))
        );
        assert!(parse_length("3:-5").is_err());
        assert!(parse_length(":45").is_err());
        assert_eq!(
            parse_length("400000000000000000:00"),
            Err(ParseError::TrackLength("400000000000000000:00".to_string()))
        );
        assert!(parse_length("307445734561825860:59").is_err());
    }

    #[test]
    fn test_unknown_field_is_discarded() {
        let info = r#"<div id="music_info">
            <h2>Mega Man 2</h2>
            <p><span class="infoname">Alternate Name:</span><span class="infodata">Rockman 2</span></p>
            <p><span class="infoname">Console:</span><span class="infodata">Nintendo NES</span></p>
        </div>"#;
        let html = game_page(info, "", TRACKLIST);
        let game = parse_game_detail_page(&html, None).unwrap();

        assert_eq!(game.console, "Nintendo NES");
        assert_eq!(game.entry.name, "Mega Man 2");
        assert_eq!(game.entry.developer, None);
        assert_eq!(game.entry.release_date, None);
        assert_eq!(game.publisher, None);

        let json = serde_json::to_string(&game).unwrap();
        assert!(!json.contains("Rockman"));
    }

    #[test]
    fn test_label_without_data() {
        let info = r#"<div id="music_info">
            <h2>Mega Man 2</h2>
            <p><span class="infoname">Console:</span><span class="infodata">Nintendo NES</span></p>
            <p><span class="infoname">Developer:</span></p>
        </div>"#;
        let html = game_page(info, MASS_DOWNLOAD, TRACKLIST);

        assert_eq!(
            parse_game_detail_page(&html, None),
            Err(PageError::Parse(ParseError::ElementNotFound(
                "infodata".to_string()
            )))
        );
    }

    #[test]
    fn test_invalid_track_length() {
        let tracklist = r#"<table id="tracklist"><tr>
            <td class="name">Intro</td><td class="length">1.05</td>
        </tr></table>"#;
        let html = game_page(MUSIC_INFO, MASS_DOWNLOAD, tracklist);

        assert_eq!(
            parse_game_detail_page(&html, None),
            Err(PageError::Parse(ParseError::TrackLength("1.05".to_string())))
        );
    }
}
