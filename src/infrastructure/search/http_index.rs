//! HTTP vector index client
//!
//! Queries a remote vector index service (Pinecone-style wire shape):
//! `POST {base_url}/query {vector, top_k, namespace}` returning
//! `{matches: [{id, score, metadata}]}`.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::search::{SearchHit, SearchLayer, SearchRequest, VectorIndex};
use crate::domain::DomainError;
use crate::infrastructure::llm::HttpClientTrait;

/// Remote vector index reached over HTTP
#[derive(Debug)]
pub struct HttpVectorIndex<C: HttpClientTrait> {
    client: C,
    base_url: String,
    index_name: String,
    api_key: Option<String>,
}

impl<C: HttpClientTrait> HttpVectorIndex<C> {
    pub fn new(client: C, base_url: impl Into<String>, index_name: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            index_name: index_name.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn query_url(&self) -> String {
        format!("{}/query", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        let mut headers = vec![("Content-Type", "application/json")];
        if let Some(key) = &self.api_key {
            headers.push(("Api-Key", key.as_str()));
        }
        headers
    }
}

#[async_trait]
impl<C: HttpClientTrait> VectorIndex for HttpVectorIndex<C> {
    async fn query(
        &self,
        layer: &SearchLayer,
        request: &SearchRequest,
    ) -> Result<Vec<SearchHit>, DomainError> {
        let body = serde_json::json!({
            "vector": request.vector,
            "top_k": request.top_k,
            "namespace": layer.namespace,
            "include_metadata": true,
        });

        let response = self
            .client
            .post_json(&self.query_url(), self.headers(), &body)
            .await
            .map_err(|e| DomainError::search_layer(&layer.name, e.to_string()))?;

        let parsed: QueryResponse = serde_json::from_value(response).map_err(|e| {
            DomainError::search_layer(&layer.name, format!("malformed index response: {}", e))
        })?;

        Ok(parsed
            .matches
            .into_iter()
            .map(|m| SearchHit::new(m.id, m.score).with_metadata(m.metadata))
            .collect())
    }

    fn index_name(&self) -> &str {
        &self.index_name
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    score: f32,
    #[serde(default)]
    metadata: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::MockHttpClient;

    const TEST_URL: &str = "http://index.local/query";

    #[tokio::test]
    async fn test_query_parses_matches() {
        let client = MockHttpClient::new().with_response(
            TEST_URL,
            serde_json::json!({
                "matches": [
                    {"id": "doc-1", "score": 0.91, "metadata": {"question": "q1", "answer": "a1"}},
                    {"id": "doc-2", "score": 0.73, "metadata": {"question": "q2", "answer": "a2"}}
                ]
            }),
        );
        let index = HttpVectorIndex::new(client, "http://index.local", "support-faq");

        let layer = SearchLayer::new("general", "ns-0");
        let request = SearchRequest::new(vec![0.1, 0.2], 5, 0.8);

        let hits = index.query(&layer, &request).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "doc-1");
        assert!((hits[0].score - 0.91).abs() < 0.001);
        assert_eq!(hits[0].metadata_str("question"), Some("q1"));
    }

    #[tokio::test]
    async fn test_query_empty_matches() {
        let client =
            MockHttpClient::new().with_response(TEST_URL, serde_json::json!({"matches": []}));
        let index = HttpVectorIndex::new(client, "http://index.local", "support-faq");

        let layer = SearchLayer::new("general", "ns-0");
        let request = SearchRequest::new(vec![0.1], 5, 0.8);

        let hits = index.query(&layer, &request).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_query_failure_is_layer_error() {
        let client = MockHttpClient::new().with_error(TEST_URL, "503 unavailable");
        let index = HttpVectorIndex::new(client, "http://index.local", "support-faq");

        let layer = SearchLayer::new("general", "ns-0");
        let request = SearchRequest::new(vec![0.1], 5, 0.8);

        let result = index.query(&layer, &request).await;
        assert!(matches!(result, Err(DomainError::SearchLayer { .. })));
    }

    #[test]
    fn test_index_name() {
        let index =
            HttpVectorIndex::new(MockHttpClient::new(), "http://index.local/", "support-faq");
        assert_eq!(index.index_name(), "support-faq");
    }
}
