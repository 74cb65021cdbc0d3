//! Kitsu: JSON:API title search, poster art before the banner.

use std::collections::BTreeMap;

use log::debug;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::provider::{CoverProvider, HttpClient, pick_best};
use crate::types::{CoverResult, MatchPolicy};

const SEARCH_URL: &str = "https://kitsu.io/api/edge/manga";
const SEARCH_LIMIT: &str = "5";

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    data: Vec<MangaResource>,
}

#[derive(Debug, Deserialize)]
struct MangaResource {
    #[serde(default)]
    attributes: MangaAttributes,
}

#[derive(Debug, Default, Deserialize)]
struct MangaAttributes {
    #[serde(default, rename = "canonicalTitle")]
    canonical_title: Option<String>,
    #[serde(default)]
    titles: BTreeMap<String, Option<String>>,
    #[serde(default, rename = "abbreviatedTitles")]
    abbreviated_titles: Option<Vec<String>>,
    #[serde(default, rename = "posterImage")]
    poster_image: Option<ImageSet>,
    #[serde(default, rename = "coverImage")]
    cover_image: Option<ImageSet>,
}

#[derive(Debug, Default, Deserialize)]
struct ImageSet {
    original: Option<String>,
    large: Option<String>,
    small: Option<String>,
    tiny: Option<String>,
}

impl ImageSet {
    /// Largest available rendition.
    fn best(&self) -> Option<&str> {
        [&self.original, &self.large, &self.small, &self.tiny]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|url| !url.is_empty())
    }
}

impl MangaAttributes {
    fn ranking_titles(&self) -> (String, Vec<String>) {
        let main = self.canonical_title.clone().unwrap_or_default();
        let alts = self
            .titles
            .values()
            .flatten()
            .cloned()
            .chain(self.abbreviated_titles.iter().flatten().cloned())
            .collect();
        (main, alts)
    }

    /// The poster is the volume-style portrait art; `coverImage` is a banner.
    fn image_url(&self) -> Option<String> {
        self.poster_image
            .as_ref()
            .and_then(ImageSet::best)
            .or_else(|| self.cover_image.as_ref().and_then(ImageSet::best))
            .map(str::to_string)
    }
}

/// Kitsu JSON:API text search.
pub struct Kitsu {
    client: HttpClient,
    policy: MatchPolicy,
}

impl Kitsu {
    pub const NAME: &'static str = "kitsu";

    pub fn new(client: HttpClient, policy: MatchPolicy) -> Self {
        Self { client, policy }
    }

    /// Ranks the search hits and returns the image URL of the winner.
    pub(crate) fn pick_cover(
        response: SearchResponse,
        title: &str,
        policy: MatchPolicy,
    ) -> Option<String> {
        let best = pick_best(response.data, title, policy, |hit| {
            hit.attributes.ranking_titles()
        })?;
        best.attributes.image_url()
    }
}

impl CoverProvider for Kitsu {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn attempt(&self, title: &str) -> Result<Option<CoverResult>> {
        let response: SearchResponse = self.client.get_json(
            SEARCH_URL,
            &[
                ("filter[text]", title.to_string()),
                ("page[limit]", SEARCH_LIMIT.to_string()),
            ],
        )?;

        Ok(Self::pick_cover(response, title, self.policy).map(|url| {
            debug!("kitsu: cover {url}");
            CoverResult {
                source: Self::NAME.to_string(),
                url,
            }
        }))
    }

    fn download(&self, cover: &CoverResult) -> Result<Vec<u8>> {
        if cover.url.is_empty() {
            return Err(Error::provider(Self::NAME, "empty cover url"));
        }
        self.client.download(&cover.url, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> SearchResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_picks_ranked_poster() {
        let response = parse(
            r#"{"data":[
                {"id":"1","attributes":{"canonicalTitle":"Series Spin-off",
                    "posterImage":{"original":"https://k/spin.jpg"}}},
                {"id":"2","attributes":{"canonicalTitle":"Shirizu",
                    "titles":{"en":"Series","ja_jp":null},
                    "abbreviatedTitles":["SRS"],
                    "posterImage":{"original":null,"large":"https://k/l.jpg","tiny":"https://k/t.jpg"}}}
            ]}"#,
        );
        assert_eq!(
            Kitsu::pick_cover(response, "Series", MatchPolicy::Best).as_deref(),
            Some("https://k/l.jpg")
        );
    }

    #[test]
    fn test_falls_back_to_cover_image() {
        let response = parse(
            r#"{"data":[{"id":"1","attributes":{"canonicalTitle":"Series",
                "posterImage":null,"coverImage":{"small":"https://k/banner.jpg"}}}]}"#,
        );
        assert_eq!(
            Kitsu::pick_cover(response, "Series", MatchPolicy::Best).as_deref(),
            Some("https://k/banner.jpg")
        );
    }

    #[test]
    fn test_strict_policy_rejects_loose_match() {
        let json = r#"{"data":[{"id":"1","attributes":{"canonicalTitle":"Series Gaiden",
            "posterImage":{"original":"https://k/g.jpg"}}}]}"#;
        assert!(Kitsu::pick_cover(parse(json), "Series", MatchPolicy::Exact).is_none());
        assert!(Kitsu::pick_cover(parse(json), "Series", MatchPolicy::Best).is_some());
    }

    #[test]
    fn test_no_hits() {
        assert!(Kitsu::pick_cover(parse(r#"{"data":[]}"#), "Series", MatchPolicy::Best).is_none());
    }
}
