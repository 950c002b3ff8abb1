//! Request/response types for the relay API.
//!
//! The relay speaks camelCase JSON to its own clients; the vendor wire
//! formats stay inside the upstream clients.

use serde::{Deserialize, Serialize};

use crate::research::{
    MeetingBriefResult, ResearchTask, TaskProgress, TaskSource, TaskStatus, TaskUsage,
};

/// Body for `POST /api/research-task`.
///
/// Either `websiteUrl` + `summaryText` (competitor analysis) or a free-text
/// `topic` must be present.
#[derive(Debug, Deserialize)]
pub struct CreateResearchRequest {
    #[serde(rename = "websiteUrl", default)]
    pub website_url: Option<String>,
    #[serde(rename = "summaryText", default)]
    pub summary_text: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateResearchResponse {
    pub success: bool,
    #[serde(rename = "taskId")]
    pub task_id: String,
    pub status: TaskStatus,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    #[serde(rename = "taskId")]
    pub task_id: String,
}

/// Snapshot reply for `GET /api/research-task/status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    #[serde(rename = "taskId")]
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<TaskSource>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TaskUsage>,
    #[serde(rename = "pdfUrl", skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<TaskProgress>,
}

impl StatusResponse {
    pub fn from_task(task: ResearchTask) -> Self {
        Self {
            success: true,
            task_id: task.id,
            status: task.status,
            output: task.output,
            sources: task.sources,
            usage: task.usage,
            pdf_url: task.pdf_url,
            progress: task.progress,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    #[serde(rename = "taskId")]
    pub task_id: String,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub success: bool,
    #[serde(rename = "taskId")]
    pub task_id: String,
    pub status: TaskStatus,
    pub message: String,
}

/// Body for `POST /api/auth/token`.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(rename = "codeVerifier", default)]
    pub code_verifier: Option<String>,
}

/// Query the OAuth provider sends to `GET /api/auth/callback`.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(rename = "error_description", default)]
    pub error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BriefRequest {
    #[serde(default)]
    pub topic: Option<String>,
}

/// Body for `POST /api/generate-pdf`.
#[derive(Debug, Deserialize)]
pub struct GeneratePdfRequest {
    pub result: PdfPayload,
    #[serde(default)]
    pub filename: Option<String>,
}

/// What gets printed: either a finished research report or a meeting brief.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PdfPayload {
    Brief(MeetingBriefResult),
    Report {
        #[serde(default)]
        title: Option<String>,
        output: String,
        #[serde(default)]
        sources: Vec<TaskSource>,
    },
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub dev_mode: bool,
}
