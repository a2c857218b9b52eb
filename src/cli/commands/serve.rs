//! Serve command implementation
//!
//! Starts the pipeline behind an MLLP listener and runs until the shutdown
//! signal fires.

use super::load_valid_config;
use crate::adapters::mllp::MllpListener;
use crate::core::pipeline::{Pipeline, PipelineServices};
use clap::Args;
use tokio::sync::watch;

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Override listener.bind_address
    #[arg(long)]
    pub bind: Option<String>,
}

impl ServeArgs {
    /// Execute the serve command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting serve command");

        let mut config = match load_valid_config(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }

        let services = match PipelineServices::from_config(&config) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize pipeline services");
                eprintln!("Failed to initialize pipeline: {e}");
                return Ok(4);
            }
        };

        let listener = match MllpListener::bind(&config.listener).await {
            Ok(l) => l,
            Err(e) => {
                tracing::error!(error = %e, "Failed to bind listener");
                eprintln!("Failed to bind listener: {e}");
                return Ok(4);
            }
        };

        let (pipeline, router) = Pipeline::start(services, &config.pipeline);

        println!(
            "🚀 Listening for HL7 on {}",
            listener.local_addr()?
        );

        let served = listener.serve(router, shutdown_signal).await;

        println!("⏳ Draining pipeline...");
        let summary = pipeline.shutdown().await;

        println!();
        println!("📊 Pipeline Summary:");
        println!("  Received: {}", summary.received);
        println!("  Halted (no tenant): {}", summary.halted_no_tenant);
        println!("  Halted (no identity): {}", summary.halted_no_identity);
        println!("  Delivered: {}", summary.delivered);
        println!("  Failed: {}", summary.failed());
        println!("  Uptime: {:.2}s", summary.duration.as_secs_f64());
        println!();

        if let Err(e) = served {
            tracing::error!(error = %e, "Listener failed");
            eprintln!("Listener failed: {e}");
            return Ok(5);
        }

        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_args_defaults() {
        let args = ServeArgs { bind: None };
        assert!(args.bind.is_none());
    }

    #[tokio::test]
    async fn test_missing_config_is_config_error() {
        let (_tx, rx) = watch::channel(false);
        let code = ServeArgs { bind: None }
            .execute("/nonexistent/triage.toml", rx)
            .await
            .unwrap();
        assert_eq!(code, 2);
    }
}
