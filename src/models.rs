//! Wire DTOs for the precedent search API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result count requested from the search endpoint.
pub const DEFAULT_TOP_K: u32 = 5;

/// Request body for the structured endpoints.
///
/// Only non-empty trimmed filters are serialized. The chat endpoint takes
/// the same filters without `top_k`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StructuredRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

/// One precedent record returned by the search phase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterResult {
    /// Cluster identifier; opaque, also used as a citation target.
    pub id: String,
    /// Owning bank stream.
    pub client_id: String,
    /// Clause text.
    #[serde(default)]
    pub text_content: String,
    /// Codified decision for the cluster, shape owned by the backend.
    #[serde(default)]
    pub codified_data: Option<Value>,
    /// Prior queries that touched this cluster.
    #[serde(default)]
    pub query_history: Option<Value>,
    /// How many documents use the clause.
    #[serde(default)]
    pub doc_count: Option<i64>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    /// Similarity score in [0, 1].
    pub relevance_score: f64,
}

/// Success body of `POST /api/search/structured`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SearchResponse {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub evidence_found: bool,
    /// Advisory note, displayed verbatim.
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub results: Vec<ClusterResult>,
    #[serde(default)]
    pub searched_clients: Vec<String>,
}

/// Failure body for either endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structured_request_skips_empty_filters() {
        let request = StructuredRequest {
            term: Some("Governing Law".to_string()),
            attribute: None,
            language: None,
            top_k: Some(DEFAULT_TOP_K),
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body, json!({"term": "Governing Law", "top_k": 5}));
    }

    #[test]
    fn test_structured_request_chat_has_no_top_k() {
        let request = StructuredRequest {
            language: Some("governed by laws of England".to_string()),
            ..Default::default()
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body, json!({"language": "governed by laws of England"}));
    }

    #[test]
    fn test_search_response_deserialization() {
        let body = json!({
            "query": "Governing Law",
            "scope": "ALL",
            "threshold": 0.62,
            "evidence_found": true,
            "note": "2 precedents found",
            "results": [
                {
                    "id": "c1",
                    "client_id": "bank-a",
                    "text_content": "This Agreement shall be governed by...",
                    "codified_data": {"jurisdiction": "England"},
                    "query_history": [{"q": "governing law"}],
                    "doc_count": 12,
                    "last_updated": "2025-06-01T12:00:00Z",
                    "relevance_score": 0.91
                },
                {
                    "id": "c2",
                    "client_id": "bank-b",
                    "text_content": "",
                    "codified_data": null,
                    "query_history": null,
                    "doc_count": null,
                    "last_updated": null,
                    "relevance_score": 0.77
                }
            ],
            "searched_clients": ["bank-a", "bank-b"]
        });

        let response: SearchResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].id, "c1");
        assert_eq!(response.results[0].relevance_score, 0.91);
        assert!(response.results[1].codified_data.is_none());
        assert_eq!(response.note, "2 precedents found");
    }

    #[test]
    fn test_search_response_tolerates_missing_fields() {
        let response: SearchResponse = serde_json::from_value(json!({"results": []})).unwrap();
        assert!(response.results.is_empty());
        assert!(response.note.is_empty());
    }

    #[test]
    fn test_error_detail() {
        let detail: ErrorDetail = serde_json::from_str(r#"{"detail": "Search failed"}"#).unwrap();
        assert_eq!(detail.detail, "Search failed");
    }
}
