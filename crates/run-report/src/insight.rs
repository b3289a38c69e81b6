use crate::model::{Insight, RunReport, Severity};
use crate::thresholds::Thresholds;

/// Evaluate the rule table with the canonical thresholds.
pub fn derive_insights(report: &RunReport) -> Vec<Insight> {
    derive_insights_with(report, &Thresholds::default())
}

/// Evaluate the fixed, ordered rule table. Rules are independent;
/// several may fire. An all-quiet report yields exactly one synthetic
/// "good" finding.
pub fn derive_insights_with(report: &RunReport, limits: &Thresholds) -> Vec<Insight> {
    let mut findings = Vec::new();
    let timings = &report.timings;
    let network = &report.network;

    if let Some(lcp) = timings.lcp {
        if lcp > limits.lcp_poor_ms {
            findings.push(Insight::new(
                "lcp",
                Severity::Poor,
                format!("largest contentful paint took {lcp:.0} ms"),
            ));
        } else if lcp > limits.lcp_slow_ms {
            findings.push(Insight::new(
                "lcp",
                Severity::NeedsImprovement,
                format!("largest contentful paint took {lcp:.0} ms"),
            ));
        }
    }

    if let Some(inp) = timings.inp {
        if inp > limits.inp_slow_ms {
            findings.push(Insight::new(
                "inp",
                Severity::Poor,
                format!("slowest interaction took {inp:.0} ms to next paint"),
            ));
        }
    }

    if report.long_tasks.total_ms > limits.long_task_budget_ms {
        findings.push(Insight::new(
            "long-tasks",
            Severity::Poor,
            format!(
                "{} long tasks blocked the main thread for {:.0} ms",
                report.long_tasks.count, report.long_tasks.total_ms
            ),
        ));
    }

    if let Some(cls) = timings.cls {
        if cls > limits.cls_poor {
            findings.push(Insight::new(
                "cls",
                Severity::Poor,
                format!("cumulative layout shift score is {cls:.3}"),
            ));
        } else if cls > limits.cls_slow {
            findings.push(Insight::new(
                "cls",
                Severity::NeedsImprovement,
                format!("cumulative layout shift score is {cls:.3}"),
            ));
        }
    }

    if let Some(ttfb) = timings.ttfb {
        if ttfb > limits.ttfb_slow_ms {
            findings.push(Insight::new(
                "ttfb",
                Severity::NeedsImprovement,
                format!("time to first byte was {ttfb:.0} ms"),
            ));
        }
    }

    if network.transferred_bytes >= limits.page_weight_poor_bytes {
        findings.push(Insight::new(
            "page-weight",
            Severity::Poor,
            format!(
                "{:.1} MiB transferred over the network",
                network.transferred_bytes as f64 / (1024.0 * 1024.0)
            ),
        ));
    }

    if network.requests_total > limits.request_count_poor {
        findings.push(Insight::new(
            "request-count",
            Severity::Poor,
            format!("{} network requests issued", network.requests_total),
        ));
    }

    if let Some(share) = third_party_share(report) {
        if share > limits.third_party_share_high {
            findings.push(Insight::new(
                "third-party-share",
                Severity::NeedsImprovement,
                format!("{:.0}% of bytes came from third-party domains", share * 100.0),
            ));
        }
    }

    if network.requests_total > limits.cache_rate_min_requests {
        if let Some(rate) = network.cache_hit_rate {
            if rate < limits.cache_rate_floor {
                findings.push(Insight::new(
                    "cache-hit-rate",
                    Severity::NeedsImprovement,
                    format!("only {:.0}% of requests were served from cache", rate * 100.0),
                ));
            }
        }
    }

    if !network.failures.is_empty() {
        findings.push(Insight::new(
            "request-failures",
            Severity::Poor,
            format!("{} requests failed", network.failures.len()),
        ));
    }

    if findings.is_empty() {
        findings.push(Insight::new(
            "all-good",
            Severity::Good,
            "no performance problems detected",
        ));
    }
    findings
}

fn third_party_share(report: &RunReport) -> Option<f64> {
    if report.network.transferred_bytes == 0 {
        return None;
    }
    let third_party_bytes: u64 = report
        .network
        .by_domain
        .iter()
        .filter(|entry| entry.third_party)
        .map(|entry| entry.bytes)
        .sum();
    Some(third_party_bytes as f64 / report.network.transferred_bytes as f64)
}
