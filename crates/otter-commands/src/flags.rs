//! Per-role feature flag evaluation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use otter_core::config::{FlagsConfig, EXTERNAL_CALL_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CommandError, Result};

/// Answers "is `flag` on for this user acting in this role".
#[async_trait]
pub trait FlagBackend: Send + Sync {
    async fn evaluate(&self, flag: &str, user_id: u64, role: &str) -> Result<bool>;
}

/// Backend used when no flag key is configured: everything is off.
pub struct DenyAll;

#[async_trait]
impl FlagBackend for DenyAll {
    async fn evaluate(&self, _flag: &str, _user_id: u64, _role: &str) -> Result<bool> {
        Ok(false)
    }
}

#[derive(Debug, Serialize)]
struct EvaluationRequest<'a> {
    flag: &'a str,
    user: String,
    role: &'a str,
}

#[derive(Debug, Deserialize)]
struct EvaluationResponse {
    #[serde(default)]
    enabled: bool,
}

/// Flag service reached over HTTP: `POST {url}` with
/// `{"flag","user","role"}`, answering `{"enabled": bool}`.
pub struct HttpFlagBackend {
    client: reqwest::Client,
    url: String,
    key: String,
}

impl HttpFlagBackend {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(EXTERNAL_CALL_TIMEOUT_SECS))
            .build()
            .map_err(|e| CommandError::Http {
                message: "flag service unavailable",
                source: e,
            })?;
        Ok(Self {
            client,
            url: url.into(),
            key: key.into(),
        })
    }
}

#[async_trait]
impl FlagBackend for HttpFlagBackend {
    async fn evaluate(&self, flag: &str, user_id: u64, role: &str) -> Result<bool> {
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.key)
            .json(&EvaluationRequest {
                flag,
                user: user_id.to_string(),
                role,
            })
            .send()
            .await
            .map_err(|e| CommandError::Http {
                message: "flag service unavailable",
                source: e,
            })?;

        if !resp.status().is_success() {
            return Err(CommandError::Upstream {
                message: "flag service unavailable",
                status: resp.status().as_u16(),
            });
        }

        let body: EvaluationResponse = resp.json().await.map_err(|e| CommandError::Http {
            message: "flag service unavailable",
            source: e,
        })?;
        Ok(body.enabled)
    }
}

/// Pick the backend for the configured flag settings.
///
/// A missing key or URL means default deny.
pub fn backend_from_config(config: &FlagsConfig) -> Result<Arc<dyn FlagBackend>> {
    let key = config.key.as_deref().map(str::trim).filter(|k| !k.is_empty());
    let url = config.url.as_deref().map(str::trim).filter(|u| !u.is_empty());
    match (key, url) {
        (Some(key), Some(url)) => Ok(Arc::new(HttpFlagBackend::new(url, key)?)),
        (Some(_), None) => {
            warn!("flag key set without flags.url, gated commands are disabled");
            Ok(Arc::new(DenyAll))
        }
        _ => {
            info!("no flag key configured, gated commands are disabled");
            Ok(Arc::new(DenyAll))
        }
    }
}

/// Role-by-role gate over a [`FlagBackend`].
#[derive(Clone)]
pub struct FeatureGate {
    backend: Arc<dyn FlagBackend>,
}

impl FeatureGate {
    pub fn new(backend: Arc<dyn FlagBackend>) -> Self {
        Self { backend }
    }

    /// `true` as soon as any role in `roles` (checked in order) has `flag`
    /// enabled. An empty list is `false`; a backend error counts as
    /// disabled for that role only.
    pub async fn is_enabled(&self, user_id: u64, roles: &[String], flag: &str) -> bool {
        for role in roles {
            match self.backend.evaluate(flag, user_id, role).await {
                Ok(true) => {
                    debug!(%flag, user_id, %role, "flag enabled");
                    return true;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(%flag, user_id, %role, error = %e.detail(), "flag evaluation failed");
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Enabled for a fixed set of roles; records every role it is asked about.
    struct ScriptedBackend {
        enabled: HashSet<&'static str>,
        failing: HashSet<&'static str>,
        asked: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(enabled: &[&'static str], failing: &[&'static str]) -> Arc<Self> {
            Arc::new(Self {
                enabled: enabled.iter().copied().collect(),
                failing: failing.iter().copied().collect(),
                asked: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl FlagBackend for ScriptedBackend {
        async fn evaluate(&self, _flag: &str, _user_id: u64, role: &str) -> Result<bool> {
            self.asked.lock().unwrap().push(role.to_string());
            if self.failing.contains(role) {
                return Err(CommandError::Timeout { ms: 10_000 });
            }
            Ok(self.enabled.contains(role))
        }
    }

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn empty_roles_is_disabled_without_asking() {
        let backend = ScriptedBackend::new(&["admin"], &[]);
        let gate = FeatureGate::new(backend.clone());
        assert!(!gate.is_enabled(1, &[], "catfact-command").await);
        assert!(backend.asked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn later_enabled_role_wins_in_order() {
        let backend = ScriptedBackend::new(&["mods"], &[]);
        let gate = FeatureGate::new(backend.clone());
        assert!(gate.is_enabled(1, &roles(&["everyone", "mods"]), "mc-admin").await);
        assert_eq!(*backend.asked.lock().unwrap(), roles(&["everyone", "mods"]));
    }

    #[tokio::test]
    async fn short_circuits_on_first_enabled() {
        let backend = ScriptedBackend::new(&["mods", "admins"], &[]);
        let gate = FeatureGate::new(backend.clone());
        assert!(gate.is_enabled(1, &roles(&["mods", "admins", "everyone"]), "x").await);
        assert_eq!(*backend.asked.lock().unwrap(), roles(&["mods"]));
    }

    #[tokio::test]
    async fn error_for_one_role_is_not_fatal() {
        let backend = ScriptedBackend::new(&["mods"], &["broken"]);
        let gate = FeatureGate::new(backend.clone());
        assert!(gate.is_enabled(1, &roles(&["broken", "mods"]), "x").await);

        let only_broken = ScriptedBackend::new(&[], &["broken"]);
        let gate = FeatureGate::new(only_broken);
        assert!(!gate.is_enabled(1, &roles(&["broken"]), "x").await);
    }

    #[tokio::test]
    async fn deny_all_denies() {
        let gate = FeatureGate::new(Arc::new(DenyAll));
        assert!(!gate.is_enabled(1, &roles(&["admin"]), "catfact-command").await);
    }

    #[test]
    fn missing_key_selects_deny_all() {
        let cfg = FlagsConfig {
            key: None,
            url: Some("https://flags.example/eval".to_string()),
        };
        assert!(backend_from_config(&cfg).is_ok());
    }
}
