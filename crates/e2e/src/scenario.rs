//! Per-scenario execution context and the evidence surface exposed to steps

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use storefront_common::ArtifactDescriptor;

use crate::artifact::ArtifactStore;
use crate::error::E2eResult;

/// Accepts evidence payloads from scenario steps. Never fails.
pub trait EvidenceSink: Send + Sync {
    fn attach(&self, payload: &[u8], media_type: &str);
}

impl EvidenceSink for ArtifactStore {
    fn attach(&self, payload: &[u8], media_type: &str) {
        let descriptor = ArtifactDescriptor::attachment(payload.to_vec(), media_type);
        if let Err(e) = self.capture(&descriptor) {
            warn!("Could not capture {} evidence: {}", media_type, e);
        }
    }
}

/// An attachment recorded against the current scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub media_type: String,
    pub payload: Vec<u8>,
}

/// State owned by one scenario, from its first step to its last.
///
/// Created fresh for every scenario and dropped when it finishes, so nothing
/// leaks from one scenario into the next.
pub struct ScenarioContext {
    name: String,
    state: BTreeMap<String, serde_json::Value>,
    attachments: Vec<Attachment>,
    sink: Arc<dyn EvidenceSink>,
}

impl ScenarioContext {
    pub fn new(name: impl Into<String>, sink: Arc<dyn EvidenceSink>) -> Self {
        Self {
            name: name.into(),
            state: BTreeMap::new(),
            attachments: Vec::new(),
            sink,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.state.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.state.get(key)
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Attach evidence to this scenario and persist it to the artifact directory.
    pub fn attach(&mut self, payload: &[u8], media_type: &str) {
        self.attachments.push(Attachment {
            media_type: media_type.to_string(),
            payload: payload.to_vec(),
        });
        self.sink.attach(payload, media_type);
    }

    /// Attach a JSON value, pretty-printed.
    pub fn attach_json<T: Serialize>(&mut self, value: &T) {
        match serde_json::to_vec_pretty(value) {
            Ok(bytes) => self.attach(&bytes, "application/json"),
            Err(e) => warn!("Could not serialize attachment for {}: {}", self.name, e),
        }
    }

    /// Attach the page HTML captured after a failed assertion.
    pub fn attach_page_source(&mut self, html: &str) {
        self.attach(html.as_bytes(), "text/html");
    }
}

/// Request side of an intercepted network exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterceptedRequest {
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_data: Option<String>,
}

/// Response that was served in place of the real one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FulfilledResponse {
    pub status: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub body: serde_json::Value,
}

/// Request/response evidence recorded by a network interception
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterceptedExchange {
    pub request: InterceptedRequest,
    pub response: FulfilledResponse,
}

/// Executes named steps against a scenario context
#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn execute_step(&self, ctx: &mut ScenarioContext, step: &str) -> E2eResult<()>;
}

/// Result of running one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub success: bool,
    pub steps_run: usize,
    pub duration_ms: u64,
    pub attachments: usize,
    pub error: Option<String>,
}

/// Run steps in order with a fresh context, stopping at the first failure.
pub async fn run_scenario<E>(
    executor: &E,
    sink: Arc<dyn EvidenceSink>,
    name: &str,
    steps: &[&str],
) -> ScenarioOutcome
where
    E: StepExecutor + ?Sized,
{
    let start = Instant::now();
    let mut ctx = ScenarioContext::new(name, sink);
    let mut steps_run = 0;
    let mut error = None;

    debug!("Running scenario: {}", name);

    for step in steps {
        steps_run += 1;
        if let Err(e) = executor.execute_step(&mut ctx, step).await {
            error = Some(e.to_string());
            break;
        }
    }

    let outcome = ScenarioOutcome {
        name: name.to_string(),
        success: error.is_none(),
        steps_run,
        duration_ms: start.elapsed().as_millis() as u64,
        attachments: ctx.attachments().len(),
        error,
    };

    if outcome.success {
        info!("✓ {} ({} ms)", outcome.name, outcome.duration_ms);
    } else {
        warn!(
            "✗ {} - {}",
            outcome.name,
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::E2eError;
    use parking_lot::Mutex;
    use serde_json::json;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingSink {
        seen: Mutex<Vec<String>>,
    }

    impl EvidenceSink for RecordingSink {
        fn attach(&self, payload: &[u8], media_type: &str) {
            self.seen
                .lock()
                .push(format!("{}:{}", media_type, payload.len()));
        }
    }

    struct OrdersSteps;

    #[async_trait]
    impl StepExecutor for OrdersSteps {
        async fn execute_step(&self, ctx: &mut ScenarioContext, step: &str) -> E2eResult<()> {
            match step {
                "open" => {
                    assert!(ctx.get("page").is_none(), "context leaked between scenarios");
                    ctx.set("page", json!("dashboard"));
                    Ok(())
                }
                "intercept" => {
                    ctx.attach_json(&InterceptedExchange {
                        request: InterceptedRequest {
                            url: "https://shop.test/api/ecom/order/get-orders".into(),
                            method: "GET".into(),
                            headers: BTreeMap::new(),
                            post_data: None,
                        },
                        response: FulfilledResponse {
                            status: 404,
                            headers: BTreeMap::from([(
                                "Content-Type".to_string(),
                                "application/json".to_string(),
                            )]),
                            body: json!({"message": "No orders - forced 404 by test"}),
                        },
                    });
                    Ok(())
                }
                "fail" => {
                    ctx.attach_page_source("<html><body>Loading...</body></html>");
                    Err(E2eError::StepFailed {
                        step: step.to_string(),
                        reason: "message not visible".to_string(),
                    })
                }
                other => Err(E2eError::StepFailed {
                    step: other.to_string(),
                    reason: "undefined step".to_string(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_run_scenario_stops_at_first_failure() {
        let sink = Arc::new(RecordingSink::default());
        let outcome = run_scenario(
            &OrdersSteps,
            sink.clone(),
            "no orders",
            &["open", "intercept", "fail", "open"],
        )
        .await;

        assert!(!outcome.success);
        assert_eq!(outcome.steps_run, 3);
        assert_eq!(outcome.attachments, 2);
        assert!(outcome.error.unwrap().contains("message not visible"));

        let seen = sink.seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].starts_with("application/json:"));
        assert!(seen[1].starts_with("text/html:"));
    }

    #[tokio::test]
    async fn test_each_scenario_gets_fresh_context() {
        let sink: Arc<dyn EvidenceSink> = Arc::new(RecordingSink::default());
        let first = run_scenario(&OrdersSteps, sink.clone(), "a", &["open"]).await;
        let second = run_scenario(&OrdersSteps, sink, "b", &["open"]).await;
        assert!(first.success);
        assert!(second.success);
    }

    #[tokio::test]
    async fn test_artifact_store_as_sink() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path().join("allure-results"));
        store.reset();

        let outcome = run_scenario(&OrdersSteps, Arc::new(store.clone()), "orders", &[
            "intercept",
        ])
        .await;
        assert!(outcome.success);

        let names = store.list();
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with("-attachment.json"));

        let body = std::fs::read_to_string(store.dir().join(&names[0])).unwrap();
        let exchange: InterceptedExchange = serde_json::from_str(&body).unwrap();
        assert_eq!(exchange.response.status, 404);
        assert_eq!(exchange.request.method, "GET");
    }

    #[test]
    fn test_sink_swallows_capture_errors() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("plain-file");
        std::fs::write(&file, "x").unwrap();

        let store = ArtifactStore::new(file.join("allure-results"));
        store.attach(b"{}", "application/json");
    }
}
