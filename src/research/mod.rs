//! Research task domain model.
//!
//! A research task is created remotely and only ever observed through status
//! snapshots; all transitions happen on the vendor side. The relay's job is
//! to create tasks, read snapshots, and stop caring at the right moment.

pub mod answer;
pub mod client;
pub mod poller;

pub use answer::{AnswerClient, MeetingBrief, MeetingBriefResult};
pub use client::DeepResearchClient;
pub use poller::{PollHandle, StatusSource, TaskPoller};

use serde::{Deserialize, Serialize};

/// Remote lifecycle state of a research task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    /// Terminal statuses end polling; nothing is fetched after one is seen.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

/// Step counter reported while a task is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProgress {
    #[serde(rename = "currentStep", alias = "current_step")]
    pub current_step: u32,
    #[serde(rename = "totalSteps", alias = "total_steps")]
    pub total_steps: u32,
}

impl TaskProgress {
    /// Completed fraction in `[0, 1]`, or `None` when `total_steps` is zero.
    pub fn fraction(&self) -> Option<f64> {
        if self.total_steps == 0 {
            return None;
        }
        Some(f64::from(self.current_step.min(self.total_steps)) / f64::from(self.total_steps))
    }
}

/// Cost breakdown attached to a finished task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskUsage {
    #[serde(rename = "searchCost", alias = "search_cost", default)]
    pub search_cost: f64,
    #[serde(rename = "aiCost", alias = "ai_cost", default)]
    pub ai_cost: f64,
    #[serde(rename = "computeCost", alias = "compute_cost", default)]
    pub compute_cost: f64,
    #[serde(rename = "totalCost", alias = "total_cost", default)]
    pub total_cost: f64,
}

/// One cited source of a finished report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSource {
    pub title: String,
    pub url: String,
}

/// Point-in-time snapshot of a remote research task.
///
/// `output` and `sources` are only present once `status` is `completed`;
/// `pdf_url` may trail behind `output` by a few polls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchTask {
    pub id: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<TaskProgress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<TaskSource>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TaskUsage>,
    #[serde(rename = "pdfUrl", skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(!TaskStatus::Queued.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
    }

    #[test]
    fn progress_fraction_stays_in_unit_interval() {
        let p = TaskProgress {
            current_step: 3,
            total_steps: 10,
        };
        assert_eq!(p.fraction(), Some(0.3));

        // A lagging total never pushes the fraction above 1.
        let over = TaskProgress {
            current_step: 12,
            total_steps: 10,
        };
        assert_eq!(over.fraction(), Some(1.0));

        let unknown = TaskProgress {
            current_step: 1,
            total_steps: 0,
        };
        assert_eq!(unknown.fraction(), None);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::Completed).unwrap(),
            "\"completed\""
        );
        let s: TaskStatus = serde_json::from_str("\"queued\"").unwrap();
        assert_eq!(s, TaskStatus::Queued);
    }
}
