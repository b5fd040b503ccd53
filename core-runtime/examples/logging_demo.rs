//! Logging system demonstration
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run --example logging_demo
//!
//! # JSON format
//! cargo run --example logging_demo -- json
//!
//! # With custom filter
//! cargo run --example logging_demo -- pretty "core_runtime=trace"
//! ```

use core_runtime::logging::{
    init_logging, redact_if_sensitive, LogFormat, LogLevel, LoggingConfig,
};
use std::env;
use tracing::{debug, info, span, warn, Instrument, Level};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    let format = if args.len() > 1 {
        match args[1].as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    } else {
        LogFormat::default()
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Trace)
        .with_target(true);

    if let Some(filter) = args.get(2) {
        config = config.with_filter(filter.clone());
    }

    init_logging(config).expect("Failed to initialize logging");

    info!(format = ?format, "Logging initialized");

    demo_structured_logging();
    demo_spans().await;
    demo_redaction();
}

fn demo_structured_logging() {
    info!(
        operation_id = "0192d7a2-9c4e-7000-8000-5f2b3c4d5e6f",
        kind = "create",
        collection = "medications",
        priority = "high",
        "Enqueuing operation"
    );

    info!(
        pending = 4,
        failed = 1,
        discarded = 0,
        "Queue summary"
    );

    warn!(
        operation_id = "0192d7a2-9c4e-7000-8000-5f2b3c4d5e6f",
        retry_count = 2,
        "Operation attempt failed"
    );
}

async fn demo_spans() {
    // Entering a span guard across an await point would detach the span on
    // resume, so the future is instrumented instead
    let span = span!(Level::INFO, "processing_pass", ready_count = 3);
    async {
        info!("Starting processing pass");
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
        debug!(succeeded = 2, failed = 1, "Pass finished");
    }
    .instrument(span)
    .await;
}

fn demo_redaction() {
    // Field values that might identify a person never reach the logs whole
    info!(
        owner = %redact_if_sensitive("owner_email", "patient@example.com"),
        token = %redact_if_sensitive("access_token", "secret_token_12345"),
        "Owner authenticated"
    );
}
