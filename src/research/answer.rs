//! Structured answer client.
//!
//! The vendor also offers a synchronous answer endpoint that conforms its
//! free-text answer to a caller-supplied JSON schema. Used here to build a
//! meeting brief over the last seven days of news about a topic.

use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::RelayError;

/// Client for the vendor answer endpoint.
pub struct AnswerClient {
    client: Client,
    base_url: String,
    api_key: String,
}

/// Structured brief extracted from the answer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeetingBrief {
    #[serde(rename = "executiveSummary", alias = "executive_summary", default)]
    pub executive_summary: String,
    #[serde(rename = "keyDevelopments", alias = "key_developments", default)]
    pub key_developments: Vec<String>,
    #[serde(rename = "keyPeople", alias = "key_people", default)]
    pub key_people: Vec<String>,
    #[serde(rename = "importantDates", alias = "important_dates", default)]
    pub important_dates: Vec<String>,
    #[serde(rename = "talkingPoints", alias = "talking_points", default)]
    pub talking_points: Vec<String>,
}

/// One cited search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefSource {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "publishedDate", skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// Complete brief as returned to the relay's client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingBriefResult {
    pub topic: String,
    #[serde(rename = "generatedAt")]
    pub generated_at: String,
    pub brief: MeetingBrief,
    pub sources: Vec<BriefSource>,
}

#[derive(Debug, Deserialize)]
struct AnswerReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    contents: Option<serde_json::Value>,
    #[serde(default)]
    search_results: Option<Vec<WireSearchResult>>,
}

#[derive(Debug, Deserialize)]
struct WireSearchResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    publication_date: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// JSON schema the answer must conform to.
fn brief_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "executive_summary": {
                "type": "string",
                "description": "2-minute read summary of key information"
            },
            "key_developments": {
                "type": "array",
                "items": { "type": "string" },
                "description": "List of recent key developments or news"
            },
            "key_people": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Key people or leaders mentioned"
            },
            "important_dates": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Important upcoming dates or recent events"
            },
            "talking_points": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Key talking points to prepare"
            }
        }
    })
}

impl AnswerClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Build a meeting brief for `topic` from the last seven days of news.
    pub async fn brief(&self, topic: &str) -> Result<MeetingBriefResult, RelayError> {
        let today = Utc::now().date_naive();
        let week_ago = today - chrono::Duration::days(7);

        let body = json!({
            "query": format!("Latest news and key developments about {topic}"),
            "search_type": "news",
            "start_date": week_ago.format("%Y-%m-%d").to_string(),
            "end_date": today.format("%Y-%m-%d").to_string(),
            "structured_output": brief_schema(),
        });

        let response = self
            .client
            .post(format!("{}/v1/answer", self.base_url))
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Upstream(format!("answer request failed: {e}")))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(RelayError::Upstream(format!(
                "answer returned {status}: {text}"
            )));
        }

        let reply: AnswerReply = serde_json::from_str(&text)
            .map_err(|e| RelayError::Upstream(format!("bad answer reply: {e}")))?;

        if !reply.success {
            return Err(RelayError::Upstream(
                "answer endpoint reported failure".to_string(),
            ));
        }

        let brief = parse_brief(reply.contents.unwrap_or(serde_json::Value::Null))?;

        Ok(MeetingBriefResult {
            topic: topic.to_string(),
            generated_at: Utc::now().to_rfc3339(),
            brief,
            sources: reply
                .search_results
                .unwrap_or_default()
                .into_iter()
                .map(|r| BriefSource {
                    title: r.title,
                    url: r.url,
                    published_date: r.publication_date,
                    snippet: r.description,
                })
                .collect(),
        })
    }
}

/// The vendor returns `contents` either as a JSON object or as a string of
/// JSON, depending on the structured-output path taken.
fn parse_brief(contents: serde_json::Value) -> Result<MeetingBrief, RelayError> {
    let value = match contents {
        serde_json::Value::String(s) => serde_json::from_str(&s)
            .map_err(|e| RelayError::Upstream(format!("unparseable brief contents: {e}")))?,
        other => other,
    };
    serde_json::from_value(value)
        .map_err(|e| RelayError::Upstream(format!("brief did not match schema: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_brief_from_object_contents() {
        let brief = parse_brief(json!({
            "executive_summary": "Quiet week.",
            "key_developments": ["Launched v2"],
            "key_people": [],
            "important_dates": ["2026-09-01"],
            "talking_points": ["Ask about v2"]
        }))
        .unwrap();
        assert_eq!(brief.executive_summary, "Quiet week.");
        assert_eq!(brief.key_developments, vec!["Launched v2"]);
    }

    #[test]
    fn parses_brief_from_string_contents() {
        let brief = parse_brief(json!(
            "{\"executive_summary\": \"ok\", \"key_developments\": []}"
        ))
        .unwrap();
        assert_eq!(brief.executive_summary, "ok");
        assert!(brief.talking_points.is_empty());
    }

    #[test]
    fn rejects_unparseable_contents() {
        assert!(parse_brief(json!("not json at all")).is_err());
    }
}
