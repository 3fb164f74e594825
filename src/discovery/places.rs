//! Places text-search and place-details client

use reqwest::Client as ReqwestClient;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::discovery::config::DiscoveryConfig;
use crate::discovery::error::DiscoveryError;
use crate::discovery::region::AddressComponent;

const TEXT_SEARCH_PATH: &str = "/maps/api/place/textsearch/json";
const DETAILS_PATH: &str = "/maps/api/place/details/json";
const DETAILS_FIELDS: &str = "website,formatted_phone_number";

/// One result of a text search
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceResult {
    #[serde(default)]
    pub place_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub formatted_address: String,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
    #[serde(default)]
    pub types: Vec<String>,
    pub business_status: Option<String>,
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
    pub website: Option<String>,
    pub formatted_phone_number: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceResult>,
    next_page_token: Option<String>,
    error_message: Option<String>,
}

/// One page of text-search results
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub results: Vec<PlaceResult>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DetailsResult {
    website: Option<String>,
    formatted_phone_number: Option<String>,
    international_phone_number: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    #[serde(default)]
    result: DetailsResult,
    error_message: Option<String>,
}

/// Website and phone from a place-details lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceDetails {
    pub website: Option<String>,
    pub phone: Option<String>,
}

/// Thin client for the places API.
///
/// Every method makes exactly one request; budget accounting belongs to the
/// caller.
#[derive(Debug, Clone)]
pub struct PlacesClient {
    client: ReqwestClient,
    api_key: String,
    base_url: String,
}

impl PlacesClient {
    pub fn new(api_key: impl Into<String>, config: &DiscoveryConfig) -> Result<Self, DiscoveryError> {
        let client = ReqwestClient::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build a client from `GOOGLE_PLACES_API_KEY`, falling back to `GOOGLE_API_KEY`
    pub fn from_env(config: &DiscoveryConfig) -> Result<Self, DiscoveryError> {
        let api_key = std::env::var("GOOGLE_PLACES_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(DiscoveryError::MissingApiKey)?;
        Self::new(api_key, config)
    }

    /// Run a text search, or fetch the follow-up page for `page_token`.
    ///
    /// `ZERO_RESULTS` and `NOT_FOUND` are an empty page; any other non-`OK`
    /// status is an [`DiscoveryError::Api`].
    #[instrument(skip(self), level = "debug")]
    pub async fn text_search(
        &self,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<SearchPage, DiscoveryError> {
        let url = format!("{}{}", self.base_url, TEXT_SEARCH_PATH);
        let request = match page_token {
            Some(token) => self
                .client
                .get(&url)
                .query(&[("pagetoken", token), ("key", self.api_key.as_str())]),
            None => self
                .client
                .get(&url)
                .query(&[("query", query), ("key", self.api_key.as_str())]),
        };

        let response = request.send().await?.error_for_status()?;
        let body: TextSearchResponse = response.json().await?;
        debug!(status = %body.status, results = body.results.len(), "text search response");

        match body.status.as_str() {
            "OK" => Ok(SearchPage {
                results: body.results,
                next_page_token: body.next_page_token.filter(|t| !t.is_empty()),
            }),
            "ZERO_RESULTS" | "NOT_FOUND" => Ok(SearchPage::default()),
            _ => Err(DiscoveryError::Api {
                status: body.status,
                message: body
                    .error_message
                    .unwrap_or_else(|| "Unknown error".to_string()),
            }),
        }
    }

    /// Look up website and phone for a place
    #[instrument(skip(self), level = "debug")]
    pub async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, DiscoveryError> {
        let url = format!("{}{}", self.base_url, DETAILS_PATH);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("place_id", place_id),
                ("fields", DETAILS_FIELDS),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;
        let body: DetailsResponse = response.json().await?;

        if body.status != "OK" {
            return Err(DiscoveryError::Api {
                status: body.status,
                message: body
                    .error_message
                    .unwrap_or_else(|| "Unknown error".to_string()),
            });
        }

        let result = body.result;
        Ok(PlaceDetails {
            website: result.website.filter(|w| !w.trim().is_empty()),
            phone: result
                .formatted_phone_number
                .or(result.international_phone_number)
                .filter(|p| !p.trim().is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn client(base_url: &str) -> PlacesClient {
        let config = DiscoveryConfig::builder().base_url(base_url).build();
        PlacesClient::new("test-key", &config).unwrap()
    }

    #[tokio::test]
    async fn test_text_search_ok() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", TEXT_SEARCH_PATH)
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("query".into(), "Christian schools in Kent County, Delaware".into()),
                Matcher::UrlEncoded("key".into(), "test-key".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"status":"OK","next_page_token":"tok",
                    "results":[{"place_id":"p1","name":"Grace Academy","types":["school"]}]}"#,
            )
            .create_async()
            .await;

        let page = client(&server.url())
            .text_search("Christian schools in Kent County, Delaware", None)
            .await
            .unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].name, "Grace Academy");
        assert_eq!(page.next_page_token.as_deref(), Some("tok"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_zero_results_is_empty_and_errors_are_typed() {
        let mut server = Server::new_async().await;
        let _zero = server
            .mock("GET", TEXT_SEARCH_PATH)
            .match_query(Matcher::UrlEncoded("query".into(), "empty".into()))
            .with_body(r#"{"status":"ZERO_RESULTS","results":[]}"#)
            .create_async()
            .await;
        let _denied = server
            .mock("GET", TEXT_SEARCH_PATH)
            .match_query(Matcher::UrlEncoded("query".into(), "denied".into()))
            .with_body(r#"{"status":"REQUEST_DENIED","error_message":"bad key"}"#)
            .create_async()
            .await;

        let client = client(&server.url());
        let empty = client.text_search("empty", None).await.unwrap();
        assert!(empty.results.is_empty());
        assert!(empty.next_page_token.is_none());

        let err = client.text_search("denied", None).await.unwrap_err();
        assert!(matches!(err, DiscoveryError::Api { ref status, .. } if status == "REQUEST_DENIED"));
    }

    #[tokio::test]
    async fn test_place_details() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", DETAILS_PATH)
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("place_id".into(), "p1".into()),
                Matcher::UrlEncoded("fields".into(), DETAILS_FIELDS.into()),
            ]))
            .with_body(
                r#"{"status":"OK","result":{"website":"https://grace.org","formatted_phone_number":"(302) 555-0100"}}"#,
            )
            .create_async()
            .await;

        let details = client(&server.url()).place_details("p1").await.unwrap();
        assert_eq!(details.website.as_deref(), Some("https://grace.org"));
        assert_eq!(details.phone.as_deref(), Some("(302) 555-0100"));
    }
}
