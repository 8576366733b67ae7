//! Wikidata client over the MediaWiki action API.
//!
//! Uses `wbgetentities` with `props=claims|labels`. Requests are chunked to
//! the configured batch size (the API accepts at most 50 ids per call).
//!
//! # Example
//!
//! ```ignore
//! let client = WikidataClient::new(&config.wikidata)?;
//! let claims = client.get_entity_claims("Q64", Relation::InstanceOf).await?;
//! ```

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::config::WikidataConfig;
use crate::error::AppError;
use crate::graph::traits::{ClaimsBatch, EntityClaims, GraphClient, Relation};
use crate::models::EntityMetadata;

// ----------------------------------------------------------------------------
// Wire types
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct EntitiesResponse {
    #[serde(default)]
    entities: HashMap<String, RawEntity>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Debug, Deserialize)]
struct RawEntity {
    #[serde(default)]
    missing: Option<JsonValue>,
    #[serde(default)]
    labels: HashMap<String, RawLabel>,
    #[serde(default)]
    claims: HashMap<String, Vec<RawStatement>>,
    /// Present when the requested id redirects to a merged item.
    #[serde(default)]
    redirects: Option<RawRedirect>,
}

#[derive(Debug, Deserialize)]
struct RawRedirect {
    from: String,
    to: String,
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    value: String,
}

#[derive(Debug, Deserialize)]
struct RawStatement {
    mainsnak: RawSnak,
    #[serde(default)]
    rank: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSnak {
    snaktype: String,
    #[serde(default)]
    datavalue: Option<RawDataValue>,
}

#[derive(Debug, Deserialize)]
struct RawDataValue {
    value: JsonValue,
}

impl RawStatement {
    /// Entity id this statement points to, if it is a usable entity value.
    fn target_id(&self) -> Option<&str> {
        if self.rank.as_deref() == Some("deprecated") || self.mainsnak.snaktype != "value" {
            return None;
        }
        self.mainsnak
            .datavalue
            .as_ref()
            .and_then(|dv| dv.value.get("id"))
            .and_then(JsonValue::as_str)
    }
}

impl RawEntity {
    fn into_metadata(self) -> EntityMetadata {
        let labels = self
            .labels
            .into_iter()
            .map(|(lang, label)| (lang, label.value))
            .collect();

        let claims = self
            .claims
            .iter()
            .filter_map(|(property, statements)| {
                let mut targets: Vec<String> = Vec::new();
                for id in statements.iter().filter_map(RawStatement::target_id) {
                    if !targets.iter().any(|t| t == id) {
                        targets.push(id.to_string());
                    }
                }
                (!targets.is_empty()).then(|| (property.clone(), targets))
            })
            .collect();

        EntityMetadata { labels, claims }
    }
}

// ----------------------------------------------------------------------------
// Client
// ----------------------------------------------------------------------------

/// Knowledge-graph client backed by the Wikidata API.
///
/// This type is cheap to clone - `reqwest::Client` is `Arc`-based.
#[derive(Clone)]
pub struct WikidataClient {
    client: Client,
    endpoint: String,
    language: String,
    batch_size: usize,
}

impl WikidataClient {
    pub fn new(config: &WikidataConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            language: config.language.clone(),
            batch_size: config.batch_size.clamp(1, 50),
        })
    }

    /// Fetches entities in chunks; missing entities are left out.
    async fn fetch(&self, ids: &[String]) -> Result<HashMap<String, EntityMetadata>, AppError> {
        let mut result = HashMap::with_capacity(ids.len());

        for chunk in ids.chunks(self.batch_size) {
            let joined = chunk.join("|");
            tracing::debug!(ids = %joined, "wbgetentities");

            let response = self
                .client
                .get(&self.endpoint)
                .query(&[
                    ("action", "wbgetentities"),
                    ("format", "json"),
                    ("props", "claims|labels"),
                    ("languages", self.language.as_str()),
                    ("ids", joined.as_str()),
                ])
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::GraphApi {
                    status: status.as_u16(),
                    body,
                });
            }

            let parsed: EntitiesResponse = response.json().await?;
            if let Some(err) = parsed.error {
                return Err(AppError::Graph(format!("{}: {}", err.code, err.info)));
            }

            for (id, mut entity) in parsed.entities {
                if entity.missing.is_some() {
                    continue;
                }
                // Redirected items come back keyed by their target; file them
                // under the id that was asked for, and the target too if it
                // was also requested.
                let Some(redirect) = entity.redirects.take() else {
                    result.insert(id, entity.into_metadata());
                    continue;
                };
                tracing::debug!(from = %redirect.from, to = %redirect.to, "Followed redirect");
                let metadata = entity.into_metadata();
                if chunk.contains(&redirect.to) {
                    result.insert(redirect.to, metadata.clone());
                }
                result.insert(redirect.from, metadata);
            }
        }

        Ok(result)
    }
}

#[async_trait]
impl GraphClient for WikidataClient {
    async fn get_entity_claims(
        &self,
        id: &str,
        relation: Relation,
    ) -> Result<EntityClaims, AppError> {
        let mut entities = self.fetch(&[id.to_string()]).await?;
        Ok(entities
            .remove(id)
            .map(|entity| EntityClaims {
                targets: entity.targets(relation).to_vec(),
                label: entity.label(&self.language).unwrap_or_default().to_string(),
            })
            .unwrap_or_default())
    }

    async fn get_entity_claims_batch(
        &self,
        ids: &[String],
        relation: Relation,
    ) -> Result<ClaimsBatch, AppError> {
        let entities = self.fetch(ids).await?;

        let mut batch = ClaimsBatch::default();
        for (id, entity) in entities {
            batch
                .labels
                .insert(id.clone(), entity.label(&self.language).unwrap_or_default().to_string());
            batch.targets.insert(id, entity.targets(relation).to_vec());
        }
        Ok(batch)
    }

    async fn get_entities_batch(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, EntityMetadata>, AppError> {
        self.fetch(ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, batch_size: usize) -> WikidataConfig {
        WikidataConfig {
            endpoint: format!("{}/w/api.php", server.uri()),
            batch_size,
            ..WikidataConfig::default()
        }
    }

    fn item(id: &str) -> JsonValue {
        json!({
            "mainsnak": {
                "snaktype": "value",
                "property": "P31",
                "datavalue": {
                    "value": { "entity-type": "item", "id": id },
                    "type": "wikibase-entityid"
                }
            },
            "type": "statement",
            "rank": "normal"
        })
    }

    #[tokio::test]
    async fn test_get_entity_claims() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("action", "wbgetentities"))
            .and(query_param("ids", "Q64"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entities": {
                    "Q64": {
                        "id": "Q64",
                        "labels": { "en": { "language": "en", "value": "Berlin" } },
                        "claims": {
                            "P31": [
                                item("Q515"),
                                item("Q515"),
                                { "mainsnak": { "snaktype": "novalue", "property": "P31" }, "rank": "normal" },
                                {
                                    "mainsnak": {
                                        "snaktype": "value",
                                        "datavalue": { "value": { "id": "Q1637706" } }
                                    },
                                    "rank": "deprecated"
                                },
                                item("Q1549591")
                            ]
                        }
                    }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = WikidataClient::new(&config_for(&server, 50)).unwrap();
        let claims = client
            .get_entity_claims("Q64", Relation::InstanceOf)
            .await
            .unwrap();

        assert_eq!(claims.label, "Berlin");
        assert_eq!(
            claims.targets,
            vec!["Q515".to_string(), "Q1549591".to_string()]
        );
    }

    #[tokio::test]
    async fn test_batch_is_chunked_and_skips_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("ids", "Q1|Q2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entities": {
                    "Q1": { "id": "Q1", "claims": { "P279": [item("Q10")] } },
                    "Q2": { "id": "Q2", "missing": "" }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("ids", "Q3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entities": {
                    "Q3": { "id": "Q3", "labels": {}, "claims": {} }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = WikidataClient::new(&config_for(&server, 2)).unwrap();
        let ids = vec!["Q1".to_string(), "Q2".to_string(), "Q3".to_string()];
        let batch = client
            .get_entity_claims_batch(&ids, Relation::SubclassOf)
            .await
            .unwrap();

        assert_eq!(batch.targets["Q1"], vec!["Q10".to_string()]);
        assert!(!batch.targets.contains_key("Q2"));
        assert!(batch.targets["Q3"].is_empty());
    }

    #[tokio::test]
    async fn test_redirected_entity_is_keyed_by_requested_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("ids", "Q1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entities": {
                    "Q2": {
                        "id": "Q2",
                        "redirects": { "from": "Q1", "to": "Q2" },
                        "labels": { "en": { "language": "en", "value": "merged" } },
                        "claims": { "P279": [item("Q515")] }
                    }
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("ids", "Q1|Q2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entities": {
                    "Q2": {
                        "id": "Q2",
                        "redirects": { "from": "Q1", "to": "Q2" },
                        "claims": { "P279": [item("Q515")] }
                    }
                }
            })))
            .mount(&server)
            .await;

        let client = WikidataClient::new(&config_for(&server, 50)).unwrap();

        let claims = client
            .get_entity_claims("Q1", Relation::SubclassOf)
            .await
            .unwrap();
        assert_eq!(claims.targets, vec!["Q515".to_string()]);
        assert_eq!(claims.label, "merged");

        let single = client
            .get_entity_claims_batch(&["Q1".to_string()], Relation::SubclassOf)
            .await
            .unwrap();
        assert_eq!(single.targets["Q1"], vec!["Q515".to_string()]);
        assert!(!single.targets.contains_key("Q2"));

        let both = client
            .get_entity_claims_batch(&["Q1".to_string(), "Q2".to_string()], Relation::SubclassOf)
            .await
            .unwrap();
        assert_eq!(both.targets["Q1"], vec!["Q515".to_string()]);
        assert_eq!(both.targets["Q2"], vec!["Q515".to_string()]);
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let client = WikidataClient::new(&config_for(&server, 50)).unwrap();
        let err = client
            .get_entity_claims("Q64", Relation::InstanceOf)
            .await
            .unwrap_err();

        match err {
            AppError::GraphApi { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_api_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": { "code": "no-such-entity", "info": "Could not find an entity" }
            })))
            .mount(&server)
            .await;

        let client = WikidataClient::new(&config_for(&server, 50)).unwrap();
        let err = client
            .get_entities_batch(&["Qx".to_string()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no-such-entity"));
    }
}
