use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use digest_datastore::SummaryRecord;
use digest_pulse::Summarizer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizeCall {
    pub transcript: String,
    pub title: String,
}

#[derive(Clone)]
pub struct MockSummarizer {
    pub calls: Arc<Mutex<Vec<SummarizeCall>>>,
    pub fail_with: Option<String>,
    /// Titles whose summarization fails.
    pub fail_titles: HashSet<String>,
    pub empty_detail: bool,
}

impl Default for MockSummarizer {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
            fail_titles: HashSet::new(),
            empty_detail: false,
        }
    }
}

impl MockSummarizer {
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }

    pub fn failing_for(titles: &[&str]) -> Self {
        Self {
            fail_titles: titles.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn returning_empty_detail() -> Self {
        Self {
            empty_detail: true,
            ..Default::default()
        }
    }

    pub fn short_summary_for(title: &str) -> String {
        format!("Short summary of {title}")
    }
}

impl Summarizer for MockSummarizer {
    const SUMMARIZER_MODEL: &'static str = "mock-llm";
    type Error = anyhow::Error;

    async fn summarize(&self, transcript: &str, title: &str) -> Result<SummaryRecord, Self::Error> {
        self.calls.lock().unwrap().push(SummarizeCall {
            transcript: transcript.to_string(),
            title: title.to_string(),
        });
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        if self.fail_titles.contains(title) {
            return Err(anyhow::anyhow!("model refused {title}"));
        }

        Ok(SummaryRecord {
            short_summary: Self::short_summary_for(title),
            detail_summary: if self.empty_detail {
                String::new()
            } else {
                format!("## {title}\n- detail")
            },
        })
    }
}
