//! Error types for the Zophar music archive scraper.
//!
//! Uses `thiserror` for structured error definitions that provide
//! clear context about what went wrong.

use thiserror::Error;

/// Structural failure inside a page of the expected type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The required element isn't found in HTML
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Link element has no text to use as a name
    #[error("Link without name")]
    EmptyLink,

    /// Link target is not below `/music/` on the site
    #[error("Link outside of the music pages: '{0}'")]
    ForeignLink(String),

    /// Anchor has no `href` attribute
    #[error("Link without target")]
    MissingHref,

    /// Page counter text doesn't match `Page <n> of <m>`
    #[error("Unexpected page counter: '{0}'")]
    PageCounter(String),

    /// Mass download link without `(<type>).zophar.zip` suffix
    #[error("Could not find archive type in '{0}'")]
    ArchiveType(String),

    /// Track length is not `minutes:seconds`
    #[error("Invalid track length: '{0}'")]
    TrackLength(String),

    /// Link target could not be turned into an URL
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// Mandatory field absent from the page
    #[error("Missing mandatory field: {0}")]
    MissingField(&'static str),
}

/// Error returned by the page parsers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    /// The page has no root element with the given id, so it belongs
    /// to another parser (or the site template changed).
    #[error("Page is not handled by this parser: element #{0} not found")]
    WrongPage(String),

    /// The page matched, but its content is malformed.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl PageError {
    /// Returns true if this HTML is meant for another parser.
    pub fn is_wrong_page(&self) -> bool {
        matches!(self, PageError::WrongPage(_))
    }
}

/// Error type for folder tree lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// No child along the given path
    #[error("Not found: {0}")]
    NotFound(String),

    /// Paths are relative to the folder, never absolute
    #[error("Absolute paths are not supported: {0}")]
    AbsolutePath(String),

    /// Neither the path nor the name yields a child identifier
    #[error("Cannot derive an identifier for '{0}'")]
    NoIdentifier(String),
}

/// Error type for browsing operations.
#[derive(Error, Debug)]
pub enum BrowserError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Fetched page could not be parsed
    #[error("Failed to parse '{path}': {source}")]
    Page {
        path: String,
        #[source]
        source: PageError,
    },

    /// Folder tree lookup failed
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// URL parsing or validation failed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Browser settings are unusable
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Error type for configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid config value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config directory not found
    #[error("Could not determine config directory")]
    NoConfigDir,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_page_is_distinct() {
        let wrong = PageError::WrongPage("gamepage".to_string());
        assert!(wrong.is_wrong_page());

        let parse: PageError = ParseError::EmptyLink.into();
        assert!(!parse.is_wrong_page());
        assert_eq!(parse.to_string(), "Link without name");
    }
}
