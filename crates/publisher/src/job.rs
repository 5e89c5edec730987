use creative_core::Platform;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    Queued,
    InProgress,
    Success,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failed)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::InProgress => "in-progress",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
        }
    }
}

/// Per-platform unit of publish work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishJob {
    pub platform: Platform,
    /// Number of distinct creatives being published.
    pub items: usize,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub network_ids: Vec<String>,
}

impl PublishJob {
    pub fn queued(platform: Platform, items: usize) -> Self {
        Self {
            platform,
            items,
            status: JobStatus::Queued,
            error: None,
            network_ids: Vec::new(),
        }
    }

    pub(crate) fn start(&mut self) {
        if self.status == JobStatus::Queued {
            self.status = JobStatus::InProgress;
        }
    }

    pub(crate) fn succeed(&mut self, network_ids: Vec<String>) {
        if !self.status.is_terminal() {
            self.status = JobStatus::Success;
            self.network_ids = network_ids;
        }
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        if !self.status.is_terminal() {
            self.status = JobStatus::Failed;
            self.error = Some(message.into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_moves_forward_only() {
        let mut job = PublishJob::queued(Platform::Meta, 2);
        job.start();
        assert_eq!(job.status, JobStatus::InProgress);
        job.succeed(vec!["ad_1".into()]);
        assert_eq!(job.status, JobStatus::Success);

        job.fail("late error");
        assert_eq!(job.status, JobStatus::Success);
        assert!(job.error.is_none());
        job.start();
        assert_eq!(job.status, JobStatus::Success);
    }

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_string(&JobStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        assert_eq!(JobStatus::InProgress.display_name(), "in-progress");
    }
}
