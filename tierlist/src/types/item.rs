//! Media items: the cards placed on a board and returned by search.

use super::ids::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The closed set of catalog entry kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Album,
    Artist,
    Song,
}

impl MediaType {
    pub const ALL: [MediaType; 3] = [MediaType::Album, MediaType::Artist, MediaType::Song];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Album => "album",
            Self::Artist => "artist",
            Self::Song => "song",
        }
    }

    /// Structured facets the catalog understands for this type
    pub fn facets(&self) -> &'static [&'static str] {
        match self {
            Self::Album => &["genre", "release_type"],
            Self::Artist => &["genre", "country"],
            Self::Song => &["genre"],
        }
    }

    pub fn supports_facet(&self, facet: &str) -> bool {
        self.facets().contains(&facet)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "album" => Ok(Self::Album),
            "artist" => Ok(Self::Artist),
            "song" => Ok(Self::Song),
            other => Err(format!("unknown media type '{other}'")),
        }
    }
}

/// Deep metadata fetched lazily from the catalog's details endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tracks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, String>,
}

/// A single catalog entry.
///
/// Secondary fields depend on the type: albums and songs carry `artist`,
/// songs also carry `album`, artists may carry a `disambiguation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: ItemId,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disambiguation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ItemDetails>,
}

impl MediaItem {
    pub fn new(id: impl Into<ItemId>, media_type: MediaType, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            media_type,
            title: title.into(),
            artist: None,
            album: None,
            disambiguation: None,
            year: None,
            image_url: None,
            details: None,
        }
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn with_details(mut self, details: ItemDetails) -> Self {
        self.details = Some(details);
        self
    }

    /// True once deep details have been fetched
    pub fn is_enriched(&self) -> bool {
        self.details.is_some()
    }

    /// One-line secondary label for display
    pub fn subtitle(&self) -> Option<String> {
        match self.media_type {
            MediaType::Album => self.artist.clone(),
            MediaType::Song => match (&self.artist, &self.album) {
                (Some(artist), Some(album)) => Some(format!("{artist} · {album}")),
                (Some(artist), None) => Some(artist.clone()),
                (None, album) => album.clone(),
            },
            MediaType::Artist => self.disambiguation.clone(),
        }
    }
}

/// Partial update for a [`MediaItem`]. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disambiguation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ItemDetails>,
}

impl ItemPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn details(details: ItemDetails) -> Self {
        Self {
            details: Some(details),
            ..Self::default()
        }
    }

    /// Patch carrying every populated field of `item` (ids and type excluded)
    pub fn from_item(item: &MediaItem) -> Self {
        Self {
            title: Some(item.title.clone()).filter(|t| !t.is_empty()),
            artist: item.artist.clone(),
            album: item.album.clone(),
            disambiguation: item.disambiguation.clone(),
            year: item.year,
            image_url: item.image_url.clone(),
            details: item.details.clone(),
        }
    }
}
