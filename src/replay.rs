//! Offline replay: drive a full measurement session from a captured
//! link event log.
//!
//! The capture format is JSON Lines, one `{"method": ..., "params":
//! ...}` record per line, in delivery order. A record with method
//! `probe.snapshot` is not a link event; its params are the page
//! metrics the probe should answer with at stop time. Events are fed
//! to the engine synchronously in file order, so replays are
//! deterministic.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use inspector_link::{InspectorLink, LinkEvent, StubLink};
use loadscope_core_types::{SessionOptions, TargetId};
use loadscope_engine::{EngineConfig, SessionEngine};
use page_probe::{PageMetrics, PageProbe, StaticProbe};
use run_report::RunReport;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Record method that carries page metrics instead of a link event.
const PROBE_SNAPSHOT: &str = "probe.snapshot";

#[derive(Debug, Deserialize)]
struct CaptureRecord {
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ReplayOptions {
    pub cold_load: bool,
    pub trace_enabled: bool,
}

pub async fn replay_file(path: &Path, options: ReplayOptions) -> Result<RunReport> {
    let capture = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading capture {}", path.display()))?;
    replay_capture(&capture, options).await
}

/// Run one session over a capture and return its report.
pub async fn replay_capture(capture: &str, options: ReplayOptions) -> Result<RunReport> {
    let records = parse_capture(capture)?;

    let link = Arc::new(StubLink::new(records.len().max(1)));
    let probe = Arc::new(StaticProbe::new(None));
    let engine = SessionEngine::new(
        Arc::clone(&link) as Arc<dyn InspectorLink>,
        Arc::clone(&probe) as Arc<dyn PageProbe>,
        EngineConfig {
            // Nothing trails a finished capture; don't sit in the
            // trace grace wait.
            trace_grace_ms: 10,
            trace_poll_ms: 1,
        },
    );
    let target = TargetId::new();
    engine
        .start(
            &target,
            SessionOptions {
                cold_load: options.cold_load,
                trace_enabled: options.trace_enabled,
            },
        )
        .await?;

    for record in records {
        if record.method == PROBE_SNAPSHOT {
            match serde_json::from_value::<PageMetrics>(record.params) {
                Ok(metrics) => probe.set_metrics(Some(metrics)),
                Err(err) => debug!(%err, "unusable probe snapshot record skipped"),
            }
            continue;
        }
        engine
            .handle_link_event(LinkEvent::new(target.clone(), record.method, record.params))
            .await;
    }

    engine.stop(&target).await.map_err(Into::into)
}

fn parse_capture(capture: &str) -> Result<Vec<CaptureRecord>> {
    let mut records = Vec::new();
    for (index, line) in capture.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: CaptureRecord = serde_json::from_str(line)
            .with_context(|| format!("capture line {}", index + 1))?;
        records.push(record);
    }
    Ok(records)
}
