//! Replay command implementation
//!
//! Feeds HL7 files through the pipeline, waits for every message to drain
//! and prints the summary. A file may hold several messages; each `MSH`
//! line starts a new one.

use super::load_valid_config;
use crate::core::pipeline::{IngestOutcome, Pipeline, PipelineServices};
use crate::hl7::Message;
use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the replay command
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// HL7 files to replay
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Fixed end of the record search window (YYYY-MM-DD)
    #[arg(long)]
    pub window_end: Option<NaiveDate>,
}

impl ReplayArgs {
    /// Execute the replay command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let mut config = match load_valid_config(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        if self.window_end.is_some() {
            config.pipeline.window_end = self.window_end;
        }

        let services = match PipelineServices::from_config(&config) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize pipeline services");
                eprintln!("Failed to initialize pipeline: {e}");
                return Ok(4);
            }
        };

        let (pipeline, router) = Pipeline::start(services, &config.pipeline);

        let mut unreadable = 0usize;
        for path in &self.files {
            let text = match std::fs::read_to_string(path) {
                Ok(t) => t,
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Failed to read file");
                    eprintln!("❌ {}: {e}", path.display());
                    unreadable += 1;
                    continue;
                }
            };

            for (index, raw) in split_messages(&text).into_iter().enumerate() {
                let message = match Message::parse(&raw) {
                    Ok(m) => Arc::new(m),
                    Err(e) => {
                        eprintln!("❌ {} #{}: {e}", path.display(), index + 1);
                        unreadable += 1;
                        continue;
                    }
                };

                match router.ingest(message).await {
                    Ok(IngestOutcome::Queued { message_id, .. }) => {
                        println!("  ➜ {} #{} queued ({message_id})", path.display(), index + 1);
                    }
                    Ok(IngestOutcome::Stopped { message_id, .. }) => {
                        println!("  ■ {} #{} stopped, no tenant ({message_id})", path.display(), index + 1);
                    }
                    Err(e) => {
                        eprintln!("❌ {} #{}: {e}", path.display(), index + 1);
                    }
                }
            }
        }

        drop(router);
        let summary = pipeline.shutdown().await;

        println!();
        println!("📊 Replay Summary:");
        println!("  Received: {}", summary.received);
        println!("  Unreadable: {unreadable}");
        println!("  Halted (no tenant): {}", summary.halted_no_tenant);
        println!("  Halted (no identity): {}", summary.halted_no_identity);
        println!("  Delivered: {}", summary.delivered);
        println!("  Resources: {}", summary.resources_delivered);
        println!("  Failed: {}", summary.failed());
        println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
        println!();

        if summary.is_successful() && unreadable == 0 {
            println!("✅ Replay completed successfully!");
            Ok(0)
        } else {
            println!("⚠️  Replay completed with failures");
            Ok(1)
        }
    }
}

/// Splits a batch file into message texts at each `MSH` segment
pub fn split_messages(text: &str) -> Vec<String> {
    let mut messages = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.split(['\r', '\n']).filter(|l| !l.trim().is_empty()) {
        let line = line.trim_start_matches('\u{feff}');
        if line.starts_with("MSH") && !current.is_empty() {
            messages.push(current.join("\r"));
            current.clear();
        }
        current.push(line);
    }
    if !current.is_empty() {
        messages.push(current.join("\r"));
    }

    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_single_message() {
        let text = "MSH|^~\\&|A|MDA\nPID|1||MRN123^^^MDA^MR\n";
        let messages = split_messages(text);
        assert_eq!(messages, vec!["MSH|^~\\&|A|MDA\rPID|1||MRN123^^^MDA^MR"]);
    }

    #[test]
    fn test_split_batch() {
        let text = "MSH|^~\\&|A|MDA\r\nPID|1\r\n\r\nMSH|^~\\&|A|PSJ\r\nPID|2\r\n";
        let messages = split_messages(text);
        assert_eq!(messages.len(), 2);
        assert!(messages[1].starts_with("MSH|^~\\&|A|PSJ"));
    }

    #[test]
    fn test_split_empty() {
        assert!(split_messages("\n\n").is_empty());
    }
}
