//! MangaDex: title search, then the volume 1 cover from the cover list.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::provider::{CoverProvider, HttpClient, pick_best};
use crate::types::{CoverResult, MatchPolicy};

const API_BASE: &str = "https://api.mangadex.org";
const UPLOADS_BASE: &str = "https://uploads.mangadex.org/covers";
const REFERER: &str = "https://mangadex.org/";
const SEARCH_LIMIT: &str = "5";
const COVER_LIMIT: &str = "100";

lazy_static! {
    /// Volume labels that mean a whole number, e.g. "01" or "1.0".
    static ref INT_VOLUME_REGEX: Regex = Regex::new(r"^\s*0*(\d+)(?:\.0+)?\s*$").unwrap();
}

/// Which rendition of the cover file to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoverSize {
    #[default]
    Original,
    /// 512px wide thumbnail
    Medium,
    /// 256px wide thumbnail
    Small,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MangaItem {
    pub id: String,
    #[serde(default)]
    pub attributes: MangaAttributes,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MangaAttributes {
    #[serde(default)]
    pub title: BTreeMap<String, String>,
    #[serde(default, rename = "altTitles")]
    pub alt_titles: Vec<BTreeMap<String, String>>,
}

impl MangaAttributes {
    /// English title if present, else any title.
    fn main_title(&self) -> String {
        self.title
            .get("en")
            .or_else(|| self.title.values().next())
            .cloned()
            .unwrap_or_default()
    }

    fn alt_title_list(&self) -> Vec<String> {
        self.alt_titles
            .iter()
            .flat_map(|m| m.values().cloned())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CoverItem {
    #[serde(default)]
    pub attributes: CoverAttributes,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CoverAttributes {
    #[serde(default)]
    pub volume: Option<String>,
    #[serde(default, rename = "fileName")]
    pub file_name: Option<String>,
}

/// Parses a MangaDex volume label as a whole number.
pub(crate) fn parse_int_volume(volume: &str) -> Option<u32> {
    INT_VOLUME_REGEX.captures(volume)?.get(1)?.as_str().parse().ok()
}

/// MangaDex: title search, then the cover art uploaded for volume 1.
pub struct MangaDex {
    client: HttpClient,
    policy: MatchPolicy,
    size: CoverSize,
}

impl MangaDex {
    pub const NAME: &'static str = "mangadex";

    pub fn new(client: HttpClient, policy: MatchPolicy) -> Self {
        Self {
            client,
            policy,
            size: CoverSize::default(),
        }
    }

    pub fn with_size(mut self, size: CoverSize) -> Self {
        self.size = size;
        self
    }

    /// Chooses the manga id that best matches `title` from a search response.
    pub(crate) fn pick_manga(
        response: ListResponse<MangaItem>,
        title: &str,
        policy: MatchPolicy,
    ) -> Option<String> {
        pick_best(response.data, title, policy, |item| {
            (
                item.attributes.main_title(),
                item.attributes.alt_title_list(),
            )
        })
        .map(|item| item.id)
    }

    /// File name of the first cover whose volume is 1.
    pub(crate) fn first_volume_file(response: ListResponse<CoverItem>) -> Option<String> {
        response.data.into_iter().find_map(|cover| {
            let volume = cover.attributes.volume.as_deref()?;
            if parse_int_volume(volume) == Some(1) {
                cover.attributes.file_name
            } else {
                None
            }
        })
    }

    pub(crate) fn cover_url(manga_id: &str, file_name: &str, size: CoverSize) -> String {
        let suffix = match size {
            CoverSize::Original => "",
            CoverSize::Medium => ".512.jpg",
            CoverSize::Small => ".256.jpg",
        };
        format!("{UPLOADS_BASE}/{manga_id}/{file_name}{suffix}")
    }
}

impl CoverProvider for MangaDex {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn attempt(&self, title: &str) -> Result<Option<CoverResult>> {
        let search: ListResponse<MangaItem> = self.client.get_json(
            &format!("{API_BASE}/manga"),
            &[("title", title.to_string()), ("limit", SEARCH_LIMIT.to_string())],
        )?;
        let Some(manga_id) = Self::pick_manga(search, title, self.policy) else {
            return Ok(None);
        };
        debug!("mangadex: matched manga {manga_id}");

        let covers: ListResponse<CoverItem> = self.client.get_json(
            &format!("{API_BASE}/cover"),
            &[
                ("manga[]", manga_id.clone()),
                ("limit", COVER_LIMIT.to_string()),
                ("order[createdAt]", "asc".to_string()),
            ],
        )?;
        let Some(file_name) = Self::first_volume_file(covers) else {
            return Ok(None);
        };

        Ok(Some(CoverResult {
            source: Self::NAME.to_string(),
            url: Self::cover_url(&manga_id, &file_name, self.size),
        }))
    }

    fn download(&self, cover: &CoverResult) -> Result<Vec<u8>> {
        if !cover.url.starts_with(UPLOADS_BASE) {
            return Err(Error::provider(Self::NAME, format!("unexpected url {}", cover.url)));
        }
        self.client.download(&cover.url, Some(REFERER))
    }
}
