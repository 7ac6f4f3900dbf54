//! Job and run domain types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type JobId = i64;
pub type RunId = i64;

/// Job settings as listed by the workspace; only the name is needed here
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobSettings {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: JobId,
    #[serde(default)]
    pub settings: JobSettings,
}

/// Page of the job listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobList {
    #[serde(default)]
    pub jobs: Vec<JobSummary>,
    #[serde(default)]
    pub has_more: bool,
}

impl JobList {
    /// Map job names to ids
    ///
    /// Unnamed jobs are skipped. When two jobs share a name the one listed
    /// last wins.
    pub fn by_name(&self) -> HashMap<String, JobId> {
        self.jobs
            .iter()
            .filter_map(|job| {
                job.settings
                    .name
                    .as_ref()
                    .map(|name| (name.clone(), job.job_id))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunNowResponse {
    pub run_id: RunId,
    #[serde(default)]
    pub number_in_job: Option<i64>,
}

/// Run state; `life_cycle_state` is the value polled on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub life_cycle_state: String,
    #[serde(default)]
    pub result_state: Option<String>,
    #[serde(default)]
    pub state_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub run_id: RunId,
    #[serde(default)]
    pub job_id: Option<JobId>,
    #[serde(default)]
    pub run_page_url: Option<String>,
    pub state: RunState,
}

/// Output of a finished run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunOutput {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_trace: Option<String>,
    #[serde(default)]
    pub logs: Option<String>,
    #[serde(default)]
    pub logs_truncated: bool,
}

impl RunOutput {
    /// Present sections in display order, labelled and with escaped
    /// newlines (`\\n` as two characters) expanded
    pub fn sections(&self) -> Vec<(&'static str, String)> {
        [
            ("ERROR", &self.error),
            ("ERROR_TRACE", &self.error_trace),
            ("LOGS", &self.logs),
        ]
        .into_iter()
        .filter_map(|(label, text)| {
            text.as_deref()
                .map(|text| (label, text.split("\\n").collect::<Vec<_>>().join("\n")))
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_list_by_name() {
        let list: JobList = serde_json::from_str(
            r#"{"jobs": [
                {"job_id": 1, "settings": {"name": "nightly-etl"}},
                {"job_id": 2, "settings": {}},
                {"job_id": 3, "settings": {"name": "nightly-etl"}},
                {"job_id": 4, "settings": {"name": "hourly"}}
            ], "has_more": false}"#,
        )
        .unwrap();

        let by_name = list.by_name();
        assert_eq!(by_name.len(), 2);
        assert_eq!(by_name["nightly-etl"], 3);
        assert_eq!(by_name["hourly"], 4);
    }

    #[test]
    fn test_empty_listing_has_no_jobs() {
        let list: JobList = serde_json::from_str("{}").unwrap();
        assert!(list.by_name().is_empty());
    }

    #[test]
    fn test_run_deserializes() {
        let run: Run = serde_json::from_str(
            r#"{"run_id": 9, "job_id": 42, "run_page_url": "https://ws/#job/42/run/9",
                "state": {"life_cycle_state": "RUNNING", "state_message": ""}}"#,
        )
        .unwrap();

        assert_eq!(run.state.life_cycle_state, "RUNNING");
        assert_eq!(run.state.result_state, None);
        assert_eq!(run.run_page_url.as_deref(), Some("https://ws/#job/42/run/9"));
    }

    #[test]
    fn test_output_sections_expand_escaped_newlines() {
        let output = RunOutput {
            error: None,
            error_trace: Some("Traceback\\n  line 1".to_string()),
            logs: Some("hello".to_string()),
            logs_truncated: false,
        };

        assert_eq!(
            output.sections(),
            vec![
                ("ERROR_TRACE", "Traceback\n  line 1".to_string()),
                ("LOGS", "hello".to_string()),
            ]
        );
    }
}
