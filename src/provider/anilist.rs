//! AniList: one GraphQL media lookup, preferring the extra-large cover.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::provider::{CoverProvider, HttpClient};
use crate::types::CoverResult;

const GRAPHQL_URL: &str = "https://graphql.anilist.co";

const MEDIA_QUERY: &str = r#"
query ($search: String) {
  Media(search: $search, type: MANGA) {
    id
    coverImage { extraLarge large }
  }
}
"#;

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'static str,
    variables: Variables<'a>,
}

#[derive(Debug, Serialize)]
struct Variables<'a> {
    search: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MediaResponse {
    #[serde(default)]
    data: Option<MediaData>,
}

#[derive(Debug, Deserialize)]
struct MediaData {
    #[serde(rename = "Media")]
    media: Option<Media>,
}

#[derive(Debug, Deserialize)]
struct Media {
    #[serde(rename = "coverImage")]
    cover_image: Option<CoverImage>,
}

#[derive(Debug, Deserialize)]
struct CoverImage {
    #[serde(rename = "extraLarge")]
    extra_large: Option<String>,
    large: Option<String>,
}

/// AniList GraphQL: the single best `Media` match for the title.
///
/// AniList does its own ranking, so there is no candidate list to score here.
pub struct AniList {
    client: HttpClient,
}

impl AniList {
    pub const NAME: &'static str = "anilist";

    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Largest cover URL in the response, `extraLarge` before `large`.
    pub(crate) fn cover_url(response: MediaResponse) -> Option<String> {
        let cover = response.data?.media?.cover_image?;
        cover
            .extra_large
            .filter(|url| !url.is_empty())
            .or(cover.large.filter(|url| !url.is_empty()))
    }
}

impl CoverProvider for AniList {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn attempt(&self, title: &str) -> Result<Option<CoverResult>> {
        let request = GraphQlRequest {
            query: MEDIA_QUERY,
            variables: Variables { search: title },
        };
        let response: MediaResponse = self.client.post_json(GRAPHQL_URL, &request)?;

        Ok(Self::cover_url(response).map(|url| {
            debug!("anilist: cover {url}");
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

    fn parse(json: &str) -> MediaResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_prefers_extra_large() {
        let response = parse(
            r#"{"data":{"Media":{"id":1,"coverImage":{"extraLarge":"https://a/xl.jpg","large":"https://a/l.jpg"}}}}"#,
        );
        assert_eq!(AniList::cover_url(response).as_deref(), Some("https://a/xl.jpg"));
    }

    #[test]
    fn test_falls_back_to_large() {
        let response = parse(
            r#"{"data":{"Media":{"id":1,"coverImage":{"extraLarge":null,"large":"https://a/l.jpg"}}}}"#,
        );
        assert_eq!(AniList::cover_url(response).as_deref(), Some("https://a/l.jpg"));
    }

    #[test]
    fn test_null_media_is_no_result() {
        assert!(AniList::cover_url(parse(r#"{"data":{"Media":null}}"#)).is_none());
        assert!(AniList::cover_url(parse(r#"{"errors":[{"message":"Not Found."}]}"#)).is_none());
    }

    #[test]
    fn test_request_body_shape() {
        let request = GraphQlRequest {
            query: MEDIA_QUERY,
            variables: Variables { search: "Series" },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["variables"]["search"], "Series");
        assert!(value["query"].as_str().unwrap().contains("type: MANGA"));
    }
}
