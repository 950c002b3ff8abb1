//! Research task route handlers: create, status, cancel, SSE stream, brief.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::sse::{Event, Sse},
    Json,
};
use futures::stream::Stream;
use url::Url;

use super::routes::AppState;
use super::types::*;
use crate::error::RelayError;
use crate::research::{MeetingBriefResult, StatusSource, TaskPoller, TaskStatus};

/// Build the research prompt for a competitor analysis.
fn competitor_query(website_url: &str, summary_text: &str) -> String {
    format!(
        "Analyze the competitor: {website_url}. {summary_text}.\n\
         Provide a comprehensive analysis including:\n\
         - Company overview and what they do\n\
         - Key products and services\n\
         - Target market and customer base\n\
         - Competitive advantages and unique value propositions\n\
         - Recent developments and news\n\
         - Market positioning and strategy\n\
         - Find other companies or products doing something similar to the competitor"
    )
}

/// Resolve the request into a research prompt and the source URLs to include.
fn resolve_input(req: &CreateResearchRequest) -> Result<(String, Vec<String>), RelayError> {
    let website_url = req.website_url.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let summary_text = req.summary_text.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let topic = req.topic.as_deref().map(str::trim).filter(|s| !s.is_empty());

    match (website_url, summary_text, topic) {
        (Some(url), Some(summary), _) => {
            Url::parse(url).map_err(|_| {
                RelayError::Validation(format!("'{url}' is not a valid URL"))
            })?;
            Ok((competitor_query(url, summary), vec![url.to_string()]))
        }
        (_, _, Some(topic)) => Ok((
            format!("Research the topic in depth and produce a structured report: {topic}"),
            Vec::new(),
        )),
        _ => Err(RelayError::Validation(
            "Website URL and summary text are required".to_string(),
        )),
    }
}

/// `POST /api/research-task`: create a task and return immediately; the
/// client polls the status endpoint afterwards.
pub async fn create_research(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateResearchRequest>,
) -> Result<Json<CreateResearchResponse>, RelayError> {
    let (input, urls) = resolve_input(&req)?;
    let task_id = state.research.create_task(&input, &urls).await?;

    Ok(Json(CreateResearchResponse {
        success: true,
        task_id,
        status: TaskStatus::Queued,
        message: "Research task created. Poll the status endpoint to check progress.".to_string(),
    }))
}

/// `GET /api/research-task/status?taskId=`: snapshot passthrough.
pub async fn research_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusResponse>, RelayError> {
    let task = state.research.status(&query.task_id).await?;
    Ok(Json(StatusResponse::from_task(task)))
}

/// `POST /api/research-task/cancel`: best-effort cancellation; a task that
/// already finished still answers success.
pub async fn cancel_research(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<CancelResponse>, RelayError> {
    if req.task_id.trim().is_empty() {
        return Err(RelayError::Validation("Task ID is required".to_string()));
    }
    state.research.cancel(&req.task_id).await?;

    Ok(Json(CancelResponse {
        success: true,
        task_id: req.task_id,
        status: TaskStatus::Cancelled,
        message: "Research task cancelled successfully".to_string(),
    }))
}

/// Serialize a snapshot into an SSE event, named `done` at a terminal
/// status. Returns `None` (and logs) if serialization fails, so the stream
/// skips the tick instead of panicking.
fn snapshot_event(task: crate::research::ResearchTask) -> Option<Event> {
    let terminal = task.status.is_terminal();
    let task_id = task.id.clone();
    Event::default()
        .event(if terminal { "done" } else { "snapshot" })
        .json_data(StatusResponse::from_task(task))
        .map_err(|e| {
            tracing::warn!(task_id = %task_id, error = %e, "failed to serialize snapshot event");
        })
        .ok()
}

/// `GET /api/research-task/stream?taskId=`: server-driven SSE alternative
/// to client polling: one `snapshot` event per poll, a final `done` event at
/// a terminal status. Dropping the connection cancels the poll loop.
pub async fn stream_research(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let source: Arc<dyn StatusSource> = state.research.clone();
    let handle = TaskPoller::spawn(source, query.task_id, state.config.poll_interval);

    let stream = async_stream::stream! {
        let mut rx = handle.snapshots();
        // The handle lives inside the stream: client disconnect drops it
        // and stops the poll loop.
        let _handle = handle;

        while rx.changed().await.is_ok() {
            let Some(task) = rx.borrow().clone() else { continue };
            let terminal = task.status.is_terminal();
            if let Some(event) = snapshot_event(task) {
                yield Ok(event);
            }
            if terminal {
                break;
            }
        }
    };

    Sse::new(stream)
}

/// `POST /api/meeting-brief`: synchronous structured brief for a topic.
pub async fn meeting_brief(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BriefRequest>,
) -> Result<Json<MeetingBriefResult>, RelayError> {
    let topic = req
        .topic
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| RelayError::Validation("Topic is required".to_string()))?;

    let result = state.answer.brief(topic).await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn competitor_input_builds_query_and_url_list() {
        let req = CreateResearchRequest {
            website_url: Some("https://acme.com".to_string()),
            summary_text: Some("B2B SaaS".to_string()),
            topic: None,
        };
        let (input, urls) = resolve_input(&req).unwrap();
        assert!(input.starts_with("Analyze the competitor: https://acme.com. B2B SaaS."));
        assert!(input.contains("Company overview"));
        assert_eq!(urls, vec!["https://acme.com".to_string()]);
    }

    #[test]
    fn topic_only_input_is_accepted() {
        let req = CreateResearchRequest {
            website_url: None,
            summary_text: None,
            topic: Some("quantum networking startups".to_string()),
        };
        let (input, urls) = resolve_input(&req).unwrap();
        assert!(input.contains("quantum networking startups"));
        assert!(urls.is_empty());
    }

    #[test]
    fn missing_fields_are_a_validation_error() {
        let req = CreateResearchRequest {
            website_url: Some("https://acme.com".to_string()),
            summary_text: None,
            topic: None,
        };
        assert!(matches!(
            resolve_input(&req),
            Err(RelayError::Validation(_))
        ));

        let empty = CreateResearchRequest {
            website_url: Some("  ".to_string()),
            summary_text: Some("".to_string()),
            topic: None,
        };
        assert!(matches!(
            resolve_input(&empty),
            Err(RelayError::Validation(_))
        ));
    }

    #[test]
    fn snapshot_events_are_named_by_terminality() {
        let running = crate::research::ResearchTask {
            id: "abc123".to_string(),
            status: TaskStatus::Running,
            progress: None,
            output: None,
            sources: None,
            usage: None,
            pdf_url: None,
        };
        let mut done = running.clone();
        done.status = TaskStatus::Completed;

        // Both serialize without panicking; event names reflect the status.
        let snapshot = format!("{:?}", snapshot_event(running).unwrap());
        let terminal = format!("{:?}", snapshot_event(done).unwrap());
        assert!(snapshot.contains("snapshot"));
        assert!(terminal.contains("done"));
    }

    #[test]
    fn invalid_website_url_is_rejected() {
        let req = CreateResearchRequest {
            website_url: Some("not a url".to_string()),
            summary_text: Some("B2B SaaS".to_string()),
            topic: None,
        };
        assert!(matches!(
            resolve_input(&req),
            Err(RelayError::Validation(_))
        ));
    }
}
