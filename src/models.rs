//! Entities extracted from the music archive pages.
//!
//! Every entity is built fresh by a parser call and owned by the caller.
//! The [`Folder`] tree is the only one meant to be grown afterwards, as
//! info pages reveal deeper levels of the browsing namespace.

use crate::error::TreeError;
use crate::utils::slugify;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Menu items of one category: path - display name.
pub type MenuItems = BTreeMap<String, String>;

/// Sidebar menu: category name - menu items.
pub type CategoryMap = BTreeMap<String, MenuItems>;

/// Search form platforms: display name - internal id.
pub type PlatformMap = BTreeMap<String, String>;

/// An entity addressable by a path relative to the `/music/` namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Browsable {
    /// Request path, without the `/music/` prefix.
    pub path: String,

    /// Display name.
    pub name: String,
}

impl Browsable {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    /// Parent path and identifier (last path segment).
    pub fn parts(&self) -> (&str, &str) {
        split_path(&self.path)
    }

    /// Last path segment; empty when the path ends with `/`.
    pub fn id(&self) -> &str {
        self.parts().1
    }
}

fn split_path(path: &str) -> (&str, &str) {
    path.rsplit_once('/').unwrap_or(("", path))
}

/// Value of a field that is a link on some pages and plain text on others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum InfoValue {
    Text(String),
    Linked(Browsable),
}

impl InfoValue {
    /// Display text of the value.
    pub fn name(&self) -> &str {
        match self {
            InfoValue::Text(text) => text,
            InfoValue::Linked(item) => &item.name,
        }
    }

    /// Path of the linked entity, if the value is a link.
    pub fn path(&self) -> Option<&str> {
        match self {
            InfoValue::Text(_) => None,
            InfoValue::Linked(item) => Some(&item.path),
        }
    }
}

/// Node of the browsing tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Folder {
    pub path: String,
    pub name: String,

    /// Children keyed by identifier.
    pub children: BTreeMap<String, Folder>,
}

impl Folder {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            children: BTreeMap::new(),
        }
    }

    /// Creates an empty tree root.
    pub fn root() -> Self {
        Self::new("", "")
    }

    /// Last path segment.
    pub fn id(&self) -> &str {
        split_path(&self.path).1
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Walks the children by successive segments of a relative path.
    ///
    /// An empty path resolves to the folder itself.
    pub fn get(&self, path: &str) -> Result<&Folder, TreeError> {
        let mut node = self;
        for segment in segments(path)? {
            node = node
                .children
                .get(segment)
                .ok_or_else(|| TreeError::NotFound(path.to_string()))?;
        }
        Ok(node)
    }

    /// Mutable version of [`Folder::get`].
    pub fn get_mut(&mut self, path: &str) -> Result<&mut Folder, TreeError> {
        let mut node = self;
        for segment in segments(path)? {
            node = node
                .children
                .get_mut(segment)
                .ok_or_else(|| TreeError::NotFound(path.to_string()))?;
        }
        Ok(node)
    }

    /// Alias of [`Folder::get`].
    pub fn resolve(&self, path: &str) -> Result<&Folder, TreeError> {
        self.get(path)
    }

    /// Adds (or updates) the folder at `path` and returns it.
    ///
    /// The child key is the last path segment, or the slug of `name` when
    /// the path ends with `/`. Missing intermediate folders are created and
    /// named by their segment. Re-adding an existing key renames it and
    /// keeps the children discovered so far.
    pub fn add(&mut self, path: &str, name: &str) -> Result<&mut Folder, TreeError> {
        if path.starts_with('/') {
            return Err(TreeError::AbsolutePath(path.to_string()));
        }

        let (parent_path, id) = split_path(path);
        let id = if id.is_empty() {
            slugify(name)
        } else {
            id.to_string()
        };

        if id.is_empty() {
            return Err(TreeError::NoIdentifier(path.to_string()));
        }

        let mut parent = self;
        let mut prefix = String::new();
        for segment in parent_path.split('/').filter(|s| !s.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);

            parent = parent
                .children
                .entry(segment.to_string())
                .or_insert_with(|| Folder::new(prefix.clone(), segment));
        }

        let child = parent
            .children
            .entry(id)
            .or_insert_with(Folder::root);
        child.path = path.to_string();
        child.name = name.to_string();

        Ok(child)
    }

    /// Adds a browsable entity at its own path.
    pub fn add_browsable(&mut self, item: &Browsable) -> Result<&mut Folder, TreeError> {
        self.add(&item.path, &item.name)
    }
}

fn segments(path: &str) -> Result<impl Iterator<Item = &str>, TreeError> {
    if path.starts_with('/') {
        return Err(TreeError::AbsolutePath(path.to_string()));
    }
    Ok(path.split('/').filter(|s| !s.is_empty()))
}

/// Entry of a game list page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameEntry {
    pub path: String,
    pub name: String,

    /// URL to cover image.
    pub cover: Option<Url>,

    pub release_date: Option<InfoValue>,
    pub developer: Option<InfoValue>,
}

impl GameEntry {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            cover: None,
            release_date: None,
            developer: None,
        }
    }
}

/// One track of a soundtrack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameTrack {
    pub title: String,
    pub duration: Duration,

    /// Audio file URLs by lowercase extension (`mp3`, `flac`, ...).
    pub url: BTreeMap<String, Url>,
}

/// Full record of a game page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameInfo {
    #[serde(flatten)]
    pub entry: GameEntry,

    pub console: String,
    pub publisher: Option<InfoValue>,

    /// Music archive URLs by archive type (`mp3`, `flac`, `original`, ...).
    pub archives: BTreeMap<String, Url>,

    /// Tracks in track number order.
    pub tracks: Vec<GameTrack>,
}

impl GameInfo {
    fn first_track(&self) -> Option<&BTreeMap<String, Url>> {
        self.tracks.first().map(|track| &track.url)
    }

    /// Audio formats available for the tracks.
    pub fn formats(&self) -> Vec<&str> {
        self.first_track()
            .map(|urls| urls.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Returns true if tracks can be downloaded in the given format.
    pub fn has_format(&self, format: &str) -> bool {
        self.first_track()
            .is_some_and(|urls| urls.contains_key(format))
    }
}

/// Result of the menu page parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MenuPage {
    pub menu: CategoryMap,
    pub platforms: PlatformMap,
}

impl MenuPage {
    /// Builds the browsing tree from the menu items.
    pub fn tree(&self) -> Folder {
        let mut root = Folder::root();

        for (path, name) in self.menu.values().flatten() {
            if let Err(err) = root.add(path, name) {
                tracing::warn!("Skipping menu entry '{}': {}", name, err);
            }
        }

        root
    }
}
