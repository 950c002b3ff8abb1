//! Deep-research API client.
//!
//! Thin reqwest wrapper over the vendor's task endpoints: create, status and
//! cancel. The vendor runs the actual research; this client only moves JSON.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ResearchTask, TaskProgress, TaskSource, TaskStatus, TaskUsage};
use crate::error::RelayError;

/// Client for the vendor deep-research task API.
pub struct DeepResearchClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

/// Body sent to the task creation endpoint.
#[derive(Debug, Serialize)]
struct CreateTaskBody<'a> {
    input: &'a str,
    model: &'a str,
    urls: &'a [String],
    output_formats: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct CreateTaskReply {
    deepresearch_id: Option<String>,
}

/// Status snapshot as the vendor serializes it (snake_case wire format).
#[derive(Debug, Deserialize)]
struct StatusReply {
    deepresearch_id: String,
    status: TaskStatus,
    #[serde(default)]
    progress: Option<WireProgress>,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    sources: Option<Vec<WireSource>>,
    #[serde(default)]
    usage: Option<WireUsage>,
    #[serde(default)]
    pdf_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireProgress {
    current_step: u32,
    total_steps: u32,
}

#[derive(Debug, Deserialize)]
struct WireSource {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize, Default)]
struct WireUsage {
    #[serde(default)]
    search_cost: f64,
    #[serde(default)]
    ai_cost: f64,
    #[serde(default)]
    compute_cost: f64,
    #[serde(default)]
    total_cost: f64,
}

#[derive(Debug, Deserialize)]
struct CancelReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

impl DeepResearchClient {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    /// Create a deep-research task.
    ///
    /// Fire-and-forget: returns the task id as soon as the vendor has queued
    /// the job; the job itself may run for tens of minutes.
    pub async fn create_task(&self, input: &str, urls: &[String]) -> Result<String, RelayError> {
        let body = CreateTaskBody {
            input,
            model: &self.model,
            urls,
            output_formats: &["markdown", "pdf"],
        };

        let response = self
            .client
            .post(format!("{}/v1/deepresearch", self.base_url))
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Upstream(format!("create task request failed: {e}")))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(RelayError::Upstream(format!(
                "create task returned {status}: {text}"
            )));
        }

        let reply: CreateTaskReply = serde_json::from_str(&text)
            .map_err(|e| RelayError::Upstream(format!("bad create reply: {e}")))?;

        let id = reply
            .deepresearch_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                RelayError::Upstream("create reply carried no task id".to_string())
            })?;

        tracing::info!(task_id = %id, "research task created");
        Ok(id)
    }

    /// Fetch the current snapshot of a task. Read-only and safe to repeat.
    pub async fn status(&self, task_id: &str) -> Result<ResearchTask, RelayError> {
        let response = self
            .client
            .get(format!("{}/v1/deepresearch/{task_id}", self.base_url))
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| RelayError::Upstream(format!("status request failed: {e}")))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(RelayError::Upstream(format!(
                "status returned {status}: {text}"
            )));
        }

        let reply: StatusReply = serde_json::from_str(&text)
            .map_err(|e| RelayError::Upstream(format!("bad status reply: {e}")))?;

        if let Some(p) = &reply.progress {
            tracing::debug!(
                task_id,
                "progress {}/{}",
                p.current_step,
                p.total_steps
            );
        }

        Ok(ResearchTask {
            id: reply.deepresearch_id,
            status: reply.status,
            progress: reply.progress.map(|p| TaskProgress {
                current_step: p.current_step,
                total_steps: p.total_steps,
            }),
            output: reply.output,
            sources: reply.sources.map(|s| {
                s.into_iter()
                    .map(|src| TaskSource {
                        title: src.title,
                        url: src.url,
                    })
                    .collect()
            }),
            usage: reply.usage.map(|u| TaskUsage {
                search_cost: u.search_cost,
                ai_cost: u.ai_cost,
                compute_cost: u.compute_cost,
                total_cost: u.total_cost,
            }),
            pdf_url: reply.pdf_url,
        })
    }

    /// Ask the vendor to cancel a task.
    ///
    /// A task that already finished counts as a successful cancellation; the
    /// caller only wants the job to not be running anymore.
    pub async fn cancel(&self, task_id: &str) -> Result<(), RelayError> {
        let response = self
            .client
            .delete(format!("{}/v1/deepresearch/{task_id}", self.base_url))
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| RelayError::Upstream(format!("cancel request failed: {e}")))?;

        let text = response.text().await.unwrap_or_default();
        let reply: CancelReply = serde_json::from_str(&text).unwrap_or(CancelReply {
            success: false,
            error: Some(text.clone()),
        });

        if normalize_cancel(reply.success, reply.error.as_deref()) {
            tracing::info!(task_id, "research task cancelled");
            Ok(())
        } else {
            Err(RelayError::Upstream(format!(
                "cancel failed: {}",
                reply.error.unwrap_or_else(|| "unknown error".to_string())
            )))
        }
    }
}

/// Decide whether a cancel reply counts as success.
///
/// The vendor reports "task already cancelled/completed" only through its
/// error string, so this matches on substrings. Replace with a status-code
/// check once the API exposes one.
pub fn normalize_cancel(success: bool, error: Option<&str>) -> bool {
    if success {
        return true;
    }
    match error {
        Some(msg) => msg.contains("cancelled") || msg.contains("completed"),
        None => false,
    }
}
