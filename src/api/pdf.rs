//! PDF export route handler.

use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use super::routes::AppState;
use super::types::{GeneratePdfRequest, PdfPayload};
use crate::error::RelayError;
use crate::pdf::report_html;
use crate::research::MeetingBriefResult;

/// Render a structured brief into markdown for printing.
fn brief_markdown(result: &MeetingBriefResult) -> String {
    let mut md = format!(
        "# Meeting Brief: {}\n\n## Executive Summary\n\n{}\n",
        result.topic, result.brief.executive_summary
    );

    let sections: [(&str, &[String]); 4] = [
        ("Key Developments", &result.brief.key_developments),
        ("Key People", &result.brief.key_people),
        ("Important Dates", &result.brief.important_dates),
        ("Talking Points", &result.brief.talking_points),
    ];
    for (heading, items) in sections {
        if items.is_empty() {
            continue;
        }
        md.push_str(&format!("\n## {heading}\n\n"));
        for item in items {
            md.push_str(&format!("- {item}\n"));
        }
    }
    md
}

/// Keep the download filename quote- and control-character free.
fn sanitize_filename(filename: Option<&str>) -> String {
    let name = filename.unwrap_or("research-report.pdf").trim();
    let cleaned: String = name
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\' && *c != '/')
        .collect();
    if cleaned.is_empty() {
        "research-report.pdf".to_string()
    } else {
        cleaned
    }
}

/// `POST /api/generate-pdf`: print the given result to a downloadable PDF.
pub async fn generate_pdf(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GeneratePdfRequest>,
) -> Result<Response, RelayError> {
    let html = match &req.result {
        PdfPayload::Report {
            title,
            output,
            sources,
        } => {
            if output.trim().is_empty() {
                return Err(RelayError::Validation(
                    "Report output is required".to_string(),
                ));
            }
            report_html(
                title.as_deref().unwrap_or("Research Report"),
                output,
                sources,
            )
        }
        PdfPayload::Brief(result) => {
            let markdown = brief_markdown(result);
            let sources: Vec<crate::research::TaskSource> = result
                .sources
                .iter()
                .map(|s| crate::research::TaskSource {
                    title: s.title.clone(),
                    url: s.url.clone(),
                })
                .collect();
            report_html(&format!("Meeting Brief: {}", result.topic), &markdown, &sources)
        }
    };

    let bytes = state.pdf.render(&html).await?;
    let filename = sanitize_filename(req.filename.as_deref());

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        bytes,
    )
        .into_response())
}
