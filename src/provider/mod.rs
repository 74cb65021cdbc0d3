//! Remote cover providers.
//!
//! This module contains the common interface for metadata services that can
//! supply a series cover, the shared blocking HTTP client they use, and the
//! title ranking heuristic applied to search results.

use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::types::{CoverResult, MatchPolicy};

pub mod anilist;
pub mod kitsu;
pub mod mangadex;

pub use anilist::AniList;
pub use kitsu::Kitsu;
pub use mangadex::MangaDex;

/// Default User-Agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "tankobon/",
    env!("CARGO_PKG_VERSION"),
    " (manga volume batcher)"
);
/// Lowest score [`MatchPolicy::Exact`] accepts (a lowercased alt title equal to the query).
const EXACT_MATCH_SCORE: u8 = 3;

lazy_static! {
    static ref NON_ALNUM_REGEX: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

/// Common interface for all remote cover sources.
///
/// Implementations look a series up by title and download the chosen image.
/// Both calls are blocking. Errors are reported to the caller, which treats
/// them as "no result" and moves on to the next provider.
pub trait CoverProvider {
    /// Short identifier used in logs and in [`CoverResult::source`].
    fn name(&self) -> &'static str;

    /// Searches for `title` and returns the best matching cover, if any.
    fn attempt(&self, title: &str) -> Result<Option<CoverResult>>;

    /// Downloads the image a previous [`attempt`](CoverProvider::attempt) pointed at.
    fn download(&self, cover: &CoverResult) -> Result<Vec<u8>>;
}

/// Blocking HTTP client shared by the providers.
///
/// Lookups and downloads use separate fixed timeouts; nothing is retried.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::blocking::Client,
    lookup_timeout: Duration,
    download_timeout: Duration,
}

impl HttpClient {
    pub fn new(
        user_agent: &str,
        lookup_timeout: Duration,
        download_timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(lookup_timeout)
            .build()?;
        Ok(Self {
            client,
            lookup_timeout,
            download_timeout,
        })
    }

    /// GETs `url` with query parameters and decodes the JSON body.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let response = self
            .client
            .get(url)
            .query(query)
            .timeout(self.lookup_timeout)
            .send()?
            .error_for_status()?;
        Ok(response.json()?)
    }

    /// POSTs a JSON body to `url` and decodes the JSON response.
    pub fn post_json<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        let response = self
            .client
            .post(url)
            .json(body)
            .timeout(self.lookup_timeout)
            .send()?
            .error_for_status()?;
        Ok(response.json()?)
    }

    /// Downloads raw bytes, optionally with a `Referer` header.
    pub fn download(&self, url: &str, referer: Option<&str>) -> Result<Vec<u8>> {
        let mut request = self.client.get(url).timeout(self.download_timeout);
        if let Some(referer) = referer {
            request = request.header(reqwest::header::REFERER, referer);
        }
        let response = request.send()?.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }
}

/// Lowercases and strips everything but ASCII letters and digits.
pub fn normalize_title(title: &str) -> String {
    NON_ALNUM_REGEX
        .replace_all(&title.trim().to_ascii_lowercase(), "")
        .into_owned()
}

/// Scores how well a search hit matches the query.
///
/// | score | condition                              |
/// |-------|----------------------------------------|
/// | 6     | normalized main title equals query     |
/// | 5     | a normalized alt title equals query    |
/// | 4     | lowercased main title equals query     |
/// | 3     | a lowercased alt title equals query    |
/// | 2     | main title contains the query          |
/// | 1     | anything else                          |
pub fn score_title(main: &str, alts: &[String], query: &str) -> u8 {
    let query_l = query.trim().to_ascii_lowercase();
    let query_n = normalize_title(query);
    let main_l = main.trim().to_ascii_lowercase();
    let alts_l: Vec<String> = alts.iter().map(|a| a.trim().to_ascii_lowercase()).collect();

    if !query_n.is_empty() && normalize_title(&main_l) == query_n {
        6
    } else if !query_n.is_empty() && alts_l.iter().any(|a| normalize_title(a) == query_n) {
        5
    } else if main_l == query_l {
        4
    } else if alts_l.iter().any(|a| *a == query_l) {
        3
    } else if main_l.contains(&query_l) {
        2
    } else {
        1
    }
}

/// Picks the best-scoring candidate; the earliest wins ties.
///
/// `titles` extracts `(main title, alt titles)` from a candidate. Returns `None`
/// when there are no candidates, or when `policy` rejects the best one.
pub fn pick_best<T, F>(candidates: Vec<T>, query: &str, policy: MatchPolicy, titles: F) -> Option<T>
where
    F: Fn(&T) -> (String, Vec<String>),
{
    let mut best: Option<(u8, T)> = None;
    for candidate in candidates {
        let (main, alts) = titles(&candidate);
        let score = score_title(&main, &alts, query);
        if best.as_ref().is_none_or(|(top, _)| score > *top) {
            best = Some((score, candidate));
        }
    }

    let (score, candidate) = best?;
    match policy {
        MatchPolicy::Exact if score < EXACT_MATCH_SCORE => None,
        _ => Some(candidate),
    }
}

/// The providers in cascade order: MangaDex, AniList, Kitsu.
pub fn default_providers(client: HttpClient, policy: MatchPolicy) -> Vec<Box<dyn CoverProvider>> {
    vec![
        Box::new(MangaDex::new(client.clone(), policy)),
        Box::new(AniList::new(client.clone())),
        Box::new(Kitsu::new(client, policy)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  Kimi ni Todoke! "), "kiminitodoke");
        assert_eq!(normalize_title("Dr. STONE"), "drstone");
    }

    #[test]
    fn test_score_ladder() {
        let alts = vec!["Ore no Series".to_string(), "My Series: Extra".to_string()];
        assert_eq!(score_title("My-Series", &[], "my series"), 6);
        assert_eq!(score_title("Other", &["My_Series".to_string()], "my series"), 5);
        assert_eq!(score_title("Other", &alts, "ore no series"), 5);
        assert_eq!(score_title("The My Series Saga", &[], "my series"), 2);
        assert_eq!(score_title("Other", &alts, "series: extra"), 1);
        assert_eq!(score_title("Other", &alts, "unrelated"), 1);
    }

    #[test]
    fn test_pick_best_prefers_exact_and_keeps_first_on_ties() {
        let hits = vec![
            ("Series Gaiden", 1),
            ("Series", 2),
            ("series", 3),
        ];
        let best = pick_best(hits, "Series", MatchPolicy::Best, |h| {
            (h.0.to_string(), Vec::new())
        });
        assert_eq!(best.map(|h| h.1), Some(2));

        let loose = pick_best(vec![("Series Gaiden", 1)], "Series", MatchPolicy::Best, |h| {
            (h.0.to_string(), Vec::new())
        });
        assert!(loose.is_some());
        let strict = pick_best(vec![("Series Gaiden", 1)], "Series", MatchPolicy::Exact, |h| {
            (h.0.to_string(), Vec::new())
        });
        assert!(strict.is_none());
    }

    #[test]
    fn test_pick_best_empty() {
        let none: Option<(&str, u8)> =
            pick_best(Vec::new(), "x", MatchPolicy::Best, |h: &(&str, u8)| {
                (h.0.to_string(), Vec::new())
            });
        assert!(none.is_none());
    }

    #[test]
    fn test_default_order() {
        let client = HttpClient::new(
            DEFAULT_USER_AGENT,
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap();
        let names: Vec<&str> = default_providers(client, MatchPolicy::Best)
            .iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(names, vec!["mangadex", "anilist", "kitsu"]);
    }
}
