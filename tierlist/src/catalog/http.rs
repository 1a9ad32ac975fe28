//! HTTP transport for the catalog service

use super::error::extract_error_message;
use super::{Catalog, CatalogError, SearchPage};
use crate::search::SearchRequest;
use crate::types::{ItemDetails, ItemId, MediaType};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Catalog reached over HTTP at `{base}/search` and `{base}/details`
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: Client,
    base_url: Url,
}

impl HttpCatalog {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CatalogError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(CatalogError::InvalidUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tierlist/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, name: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(name);
        }
        url
    }

    /// Build the search URL for `request`
    pub fn search_url(&self, request: &SearchRequest) -> Url {
        let mut url = self.endpoint("search");
        url.query_pairs_mut()
            .extend_pairs(request.filter_pairs())
            .append_pair("page", &request.page.to_string());
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CatalogError> {
        debug!(%url, "catalog request");
        let response = self.client.get(url).send().await?;
        let response = check_response(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| CatalogError::decode(e.to_string()))
    }
}

/// Map non-2xx responses to [`CatalogError::Status`]
async fn check_response(response: Response) -> Result<Response, CatalogError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(CatalogError::status(status.as_u16(), extract_error_message(&body)))
}

#[async_trait]
impl Catalog for HttpCatalog {
    #[instrument(skip(self), fields(key = %request.key(), page = request.page))]
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage, CatalogError> {
        self.get_json(self.search_url(request)).await
    }

    #[instrument(skip(self))]
    async fn details(&self, id: &ItemId, media_type: MediaType) -> Result<ItemDetails, CatalogError> {
        let mut url = self.endpoint("details");
        url.query_pairs_mut()
            .append_pair("id", id.as_str())
            .append_pair("type", media_type.as_str());
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchFilters;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn catalog(server: &MockServer) -> HttpCatalog {
        HttpCatalog::new(&format!("{}/api", server.uri()), Duration::from_secs(5)).unwrap()
    }

    fn thriller_request() -> SearchRequest {
        let mut filters = SearchFilters {
            query: "thriller".into(),
            ..SearchFilters::default()
        };
        filters.toggle_facet("genre", "pop");
        SearchRequest::new(MediaType::Album, &filters)
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(HttpCatalog::new("not a url", Duration::from_secs(1)).is_err());
        assert!(HttpCatalog::new("mailto:someone", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_search_url() {
        let catalog = HttpCatalog::new("http://localhost:9000/api/", Duration::from_secs(1)).unwrap();
        let url = catalog.search_url(&thriller_request().with_page(2));
        assert_eq!(url.path(), "/api/search");
        let query = url.query().unwrap();
        assert!(query.contains("type=album"));
        assert!(query.contains("query=thriller"));
        assert!(query.contains("genre=pop"));
        assert!(query.contains("page=2"));
    }

    #[tokio::test]
    async fn test_search_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/search"))
            .and(query_param("query", "thriller"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"id": "mbid-1", "type": "album", "title": "Thriller", "artist": "Michael Jackson"}],
                "page": 1,
                "totalPages": 4
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = catalog(&server).search(&thriller_request()).await.unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].artist.as_deref(), Some("Michael Jackson"));
        assert!(page.has_more());
    }

    #[tokio::test]
    async fn test_error_status_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/search"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "bad facet"})))
            .mount(&server)
            .await;

        let err = catalog(&server).search(&thriller_request()).await.unwrap_err();
        match err {
            CatalogError::Status { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad facet");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = catalog(&server).search(&thriller_request()).await.unwrap_err();
        assert!(matches!(err, CatalogError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_details() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/details"))
            .and(query_param("id", "mbid-1"))
            .and(query_param("type", "album"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "description": "Sixth studio album",
                "genres": ["pop", "funk"],
                "tracks": ["Wanna Be Startin' Somethin'"]
            })))
            .mount(&server)
            .await;

        let details = catalog(&server)
            .details(&ItemId::from("mbid-1"), MediaType::Album)
            .await
            .unwrap();
        assert_eq!(details.genres, vec!["pop", "funk"]);
        assert_eq!(details.tracks.len(), 1);
    }
}
