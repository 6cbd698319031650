//! One-shot JSON lookups: cat facts and relationship quips.

use std::time::Duration;

use async_trait::async_trait;
use otter_core::config::{ApiConfig, EXTERNAL_CALL_TIMEOUT_SECS};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{CommandError, Result};

const CAT_FACT_ERROR: &str = "error getting cat fact";
const RELATIONSHIP_ERROR: &str = "error getting relationship";

#[derive(Debug, Clone, Deserialize)]
pub struct CatFact {
    pub fact: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub synergy: String,
}

impl Relationship {
    /// The objective when `args` asks for one, otherwise the synergy.
    pub fn pick(&self, args: &str) -> &str {
        if args.to_lowercase().contains("objective") {
            &self.objective
        } else {
            &self.synergy
        }
    }
}

#[async_trait]
pub trait FactSource: Send + Sync {
    async fn cat_fact(&self) -> Result<CatFact>;
    async fn relationship(&self) -> Result<Relationship>;
}

pub struct HttpFactSource {
    client: reqwest::Client,
    catfact_url: String,
    relationships_url: Option<String>,
}

impl HttpFactSource {
    pub fn new(apis: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(EXTERNAL_CALL_TIMEOUT_SECS))
            .build()
            .map_err(|e| CommandError::Http {
                message: CAT_FACT_ERROR,
                source: e,
            })?;
        Ok(Self {
            client,
            catfact_url: apis.catfact_url.clone(),
            relationships_url: apis.relationships_url.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, message: &'static str) -> Result<T> {
        debug!(%url, "fetching");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CommandError::Http { message, source: e })?;
        if !resp.status().is_success() {
            return Err(CommandError::Upstream {
                message,
                status: resp.status().as_u16(),
            });
        }
        resp.json()
            .await
            .map_err(|e| CommandError::Http { message, source: e })
    }
}

#[async_trait]
impl FactSource for HttpFactSource {
    async fn cat_fact(&self) -> Result<CatFact> {
        self.get_json(&self.catfact_url, CAT_FACT_ERROR).await
    }

    async fn relationship(&self) -> Result<Relationship> {
        let url = self
            .relationships_url
            .as_deref()
            .ok_or(CommandError::NotConfigured("relationships"))?;
        self.get_json(url, RELATIONSHIP_ERROR).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_objective_or_synergy() {
        let rel = Relationship {
            objective: "Leverage the otters".to_string(),
            synergy: "Otters, together".to_string(),
        };
        assert_eq!(rel.pick("objective please"), "Leverage the otters");
        assert_eq!(rel.pick("Objective"), "Leverage the otters");
        assert_eq!(rel.pick("synergy"), "Otters, together");
        assert_eq!(rel.pick(""), "Otters, together");
    }

    #[test]
    fn cat_fact_decodes_with_extra_fields() {
        let fact: CatFact =
            serde_json::from_str(r#"{"fact":"Cats sleep a lot.","length":17}"#).unwrap();
        assert_eq!(fact.fact, "Cats sleep a lot.");
    }

    #[tokio::test]
    async fn missing_relationship_url_is_not_configured() {
        let source = HttpFactSource::new(&ApiConfig::default()).unwrap();
        let err = source.relationship().await.unwrap_err();
        assert_eq!(err.to_string(), "relationships is not configured");
    }
}
