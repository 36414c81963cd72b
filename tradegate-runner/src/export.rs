//! Artifact export: CSV, JSON and the Markdown verdict.
//!
//! Layout under the output directory:
//! - `<mode>/trades.csv`, `<mode>/equity_curve.csv`, `<mode>/warnings.csv`
//! - `<mode>/metrics.json`, `<mode>/segment_metrics.json`, `<mode>/decisions.json`
//! - `summary.json` (schema-versioned) and `go_no_go.md`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use tradegate_core::domain::{EquityPoint, ExperimentMode, SegmentSpec, TradeRecord};
use tradegate_core::engine::RunWarning;

use crate::gate::GoNoGo;
use crate::metrics::SummaryMetrics;
use crate::result::{BacktestReport, SCHEMA_VERSION};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv serialization failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush csv writer: {0}")]
    Flush(String),
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: mode, symbol, opened_at, closed_at, close_reason, qty,
/// entry_price, exit_price, stop_loss, pnl, pnl_pct, ai_decision, ai_confidence
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "mode",
        "symbol",
        "opened_at",
        "closed_at",
        "close_reason",
        "qty",
        "entry_price",
        "exit_price",
        "stop_loss",
        "pnl",
        "pnl_pct",
        "ai_decision",
        "ai_confidence",
    ])?;

    for t in trades {
        wtr.write_record([
            t.mode.as_str(),
            &t.symbol,
            &t.opened_at.to_rfc3339(),
            &t.closed_at.to_rfc3339(),
            t.close_reason.as_str(),
            &t.qty.to_string(),
            &t.entry_price.to_string(),
            &t.exit_price.to_string(),
            &t.stop_loss.to_string(),
            &t.pnl.to_string(),
            &t.pnl_pct.to_string(),
            t.ai_decision.as_str(),
            &t.ai_confidence.to_string(),
        ])?;
    }

    finish_csv(wtr)
}

/// Columns: timestamp, equity, regime
pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "equity", "regime"])?;
    for p in equity_curve {
        wtr.write_record([
            &p.timestamp.to_rfc3339(),
            &p.equity.to_string(),
            p.regime.as_str(),
        ])?;
    }
    finish_csv(wtr)
}

/// Columns: timestamp, warning
pub fn export_warnings_csv(warnings: &[RunWarning]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "warning"])?;
    for w in warnings {
        wtr.write_record([w.at().to_rfc3339(), w.to_string()])?;
    }
    finish_csv(wtr)
}

fn finish_csv(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let data = wtr
        .into_inner()
        .map_err(|e| ExportError::Flush(e.to_string()))?;
    String::from_utf8(data).map_err(|e| ExportError::Flush(e.to_string()))
}

// ─── JSON export ────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ExperimentSummary<'a> {
    metrics: &'a SummaryMetrics,
    segment_metrics: &'a BTreeMap<String, SummaryMetrics>,
    warnings: &'a [RunWarning],
}

#[derive(Debug, Serialize)]
struct SummaryDocument<'a> {
    schema_version: u32,
    symbol: &'a str,
    started_at: String,
    source: &'a str,
    dataset_hash: &'a str,
    segments: &'a [SegmentSpec],
    experiments: BTreeMap<ExperimentMode, ExperimentSummary<'a>>,
    go_no_go: &'a GoNoGo,
}

/// The `summary.json` document: metrics, segment metrics and warnings per
/// mode (no trade or equity detail) plus the verdict.
pub fn export_summary_json(report: &BacktestReport) -> Result<String, ExportError> {
    let experiments = report
        .experiments
        .iter()
        .map(|(mode, result)| {
            (
                *mode,
                ExperimentSummary {
                    metrics: &result.metrics,
                    segment_metrics: &result.segment_metrics,
                    warnings: &result.warnings,
                },
            )
        })
        .collect();
    let doc = SummaryDocument {
        schema_version: SCHEMA_VERSION,
        symbol: &report.symbol,
        started_at: report.started_at.to_rfc3339(),
        source: &report.source,
        dataset_hash: &report.dataset_hash,
        segments: &report.segments,
        experiments,
        go_no_go: &report.go_no_go,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

// ─── Markdown ───────────────────────────────────────────────────────

/// Render the Go/No-Go review. Missing checks render as an empty section.
pub fn render_go_no_go_markdown(report: &BacktestReport) -> String {
    let verdict = &report.go_no_go;
    let mut md = String::new();

    md.push_str("# Go / No-Go Review\n\n");
    md.push_str(&format!(
        "- Decision: {}\n",
        if verdict.go { "GO" } else { "NO-GO" }
    ));
    md.push_str(&format!(
        "- Selected AI Mode: {}\n",
        verdict
            .selected_ai_mode
            .map(|m| m.as_str())
            .unwrap_or("n/a")
    ));
    if let Some(reason) = &verdict.reason {
        md.push_str(&format!("- Reason: {reason}\n"));
    }

    md.push_str("\n## Checks\n\n");
    if let Some(checks) = &verdict.checks {
        for (key, passed) in checks.entries() {
            md.push_str(&format!(
                "- {key}: {}\n",
                if passed { "PASS" } else { "FAIL" }
            ));
        }
    }

    if !report.experiments.is_empty() {
        md.push_str("\n## Modes\n\n");
        md.push_str("| Mode | Trades | Return % | Max DD % | Recovery Bars | Expectancy | Trades/30d | Win % |\n");
        md.push_str("|------|--------|----------|----------|---------------|------------|------------|-------|\n");
        for (mode, result) in &report.experiments {
            let m = &result.metrics;
            md.push_str(&format!(
                "| {} | {} | {:.2} | {:.2} | {} | {:.2} | {:.2} | {:.1} |\n",
                mode,
                m.trade_count,
                m.total_return_pct,
                m.max_drawdown_pct,
                m.max_drawdown_recovery_bars
                    .map(|b| b.to_string())
                    .unwrap_or_else(|| "n/a".to_string()),
                m.expectancy_per_trade,
                m.trade_frequency_per_30d,
                m.win_rate_pct,
            ));
        }
    }

    md
}

// ─── Artifact bundle ────────────────────────────────────────────────

fn write_file(path: &Path, contents: &str) -> Result<(), ExportError> {
    std::fs::write(path, contents).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn create_dir(path: &Path) -> Result<(), ExportError> {
    std::fs::create_dir_all(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write every artifact for `report` under `output_dir`, creating it if needed.
pub fn write_backtest_artifacts(report: &BacktestReport, output_dir: &Path) -> Result<(), ExportError> {
    create_dir(output_dir)?;

    for (mode, result) in &report.experiments {
        let mode_dir = output_dir.join(mode.as_str());
        create_dir(&mode_dir)?;
        write_file(&mode_dir.join("trades.csv"), &export_trades_csv(&result.trades)?)?;
        write_file(
            &mode_dir.join("equity_curve.csv"),
            &export_equity_csv(&result.equity_curve)?,
        )?;
        write_file(
            &mode_dir.join("warnings.csv"),
            &export_warnings_csv(&result.warnings)?,
        )?;
        write_file(
            &mode_dir.join("metrics.json"),
            &serde_json::to_string_pretty(&result.metrics)?,
        )?;
        write_file(
            &mode_dir.join("segment_metrics.json"),
            &serde_json::to_string_pretty(&result.segment_metrics)?,
        )?;
        write_file(
            &mode_dir.join("decisions.json"),
            &serde_json::to_string_pretty(&result.decisions)?,
        )?;
    }

    write_file(&output_dir.join("summary.json"), &export_summary_json(report)?)?;
    write_file(&output_dir.join("go_no_go.md"), &render_go_no_go_markdown(report))?;

    info!(dir = %output_dir.display(), modes = report.experiments.len(), "artifacts written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{GateChecks, MISSING_RESULTS_REASON};
    use crate::result::ExperimentResult;
    use chrono::{Duration, TimeZone, Utc};
    use tradegate_core::domain::{CloseReason, Decision, Trend};
    use tradegate_core::risk::GuardReason;

    fn t0() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn sample_trade() -> TradeRecord {
        TradeRecord {
            mode: ExperimentMode::AiFilter,
            symbol: "BTCUSDT".into(),
            opened_at: t0(),
            closed_at: t0() + Duration::days(2),
            close_reason: CloseReason::StopLoss,
            qty: 0.05,
            entry_price: 50_000.0,
            exit_price: 49_000.0,
            stop_loss: 49_010.0,
            pnl: -50.0,
            pnl_pct: -2.0,
            ai_decision: Decision::Reduce,
            ai_confidence: 0.6,
        }
    }

    fn sample_report() -> BacktestReport {
        let mut baseline = ExperimentResult::empty(ExperimentMode::Baseline, 10_000.0);
        baseline.equity_curve = vec![
            EquityPoint::new(t0(), 10_000.0, Trend::Up),
            EquityPoint::new(t0() + Duration::hours(4), 9_950.0, Trend::Up),
        ];
        let mut ai = ExperimentResult::empty(ExperimentMode::AiFilter, 10_000.0);
        ai.trades = vec![sample_trade()];
        let mut experiments = BTreeMap::new();
        experiments.insert(ExperimentMode::Baseline, baseline);
        experiments.insert(ExperimentMode::AiFilter, ai);
        BacktestReport {
            schema_version: SCHEMA_VERSION,
            symbol: "BTCUSDT".into(),
            started_at: t0(),
            source: "synthetic".into(),
            dataset_hash: "abc".into(),
            segments: Vec::new(),
            experiments,
            go_no_go: GoNoGo {
                go: false,
                reason: None,
                selected_ai_mode: Some(ExperimentMode::AiFilter),
                checks: Some(GateChecks {
                    drawdown_or_recovery_improved: true,
                    frequency_reduced: true,
                    expectancy_not_significantly_worse: false,
                    segment_consistency: false,
                }),
            },
        }
    }

    // ─── CSV ────────────────────────────────────────────────────────

    #[test]
    fn csv_trades_content() {
        let csv = export_trades_csv(&[sample_trade()]).unwrap();
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with("mode,symbol,opened_at"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("ai_filter,BTCUSDT,"));
        assert!(row.contains("stop_loss"));
        assert!(row.contains("REDUCE"));
        assert!(row.contains(",-50,-2,"));
    }

    #[test]
    fn csv_empty_trades_has_header_only() {
        let csv = export_trades_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn csv_equity_rows() {
        let report = sample_report();
        let csv = export_equity_csv(&report.experiments[&ExperimentMode::Baseline].equity_curve).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "timestamp,equity,regime");
        assert_eq!(lines.len(), 3);
        assert!(lines[2].ends_with(",9950,UP"));
    }

    #[test]
    fn csv_keeps_full_precision_for_accounting() {
        let mut trade = sample_trade();
        trade.pnl = -50.123456789;
        let before = 10_000.0_f64;
        let after = before + trade.pnl;
        let trades_csv = export_trades_csv(&[trade]).unwrap();
        let equity_csv = export_equity_csv(&[EquityPoint::new(t0(), after, Trend::Up)]).unwrap();

        let pnl: f64 = trades_csv.lines().nth(1).unwrap().split(',').nth(9).unwrap().parse().unwrap();
        let equity: f64 = equity_csv.lines().nth(1).unwrap().split(',').nth(1).unwrap().parse().unwrap();
        assert_eq!(equity, before + pnl);
    }

    #[test]
    fn csv_warnings_carry_timestamp_and_label() {
        let warnings = vec![
            RunWarning::QtyZeroAfterRisk { at: t0() },
            RunWarning::RiskGuardBlock {
                at: t0() + Duration::hours(4),
                reasons: vec![GuardReason::MaxWeeklyDrawdownReached],
            },
        ];
        let csv = export_warnings_csv(&warnings).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "timestamp,warning");
        assert_eq!(lines[1], format!("{},qty_zero_after_risk", t0().to_rfc3339()));
        assert!(lines[2].ends_with(",risk_guard_block:max_weekly_drawdown_reached"));
    }

    // ─── Markdown ───────────────────────────────────────────────────

    #[test]
    fn markdown_lists_each_check() {
        let md = render_go_no_go_markdown(&sample_report());
        assert!(md.starts_with("# Go / No-Go Review"));
        assert!(md.contains("- Decision: NO-GO"));
        assert!(md.contains("- Selected AI Mode: ai_filter"));
        assert!(md.contains("- drawdown_or_recovery_improved: PASS"));
        assert!(md.contains("- expectancy_not_significantly_worse: FAIL"));
        assert!(md.contains("| baseline |"));
    }

    #[test]
    fn markdown_for_missing_results() {
        let mut report = sample_report();
        report.go_no_go = GoNoGo {
            go: false,
            reason: Some(MISSING_RESULTS_REASON.to_string()),
            selected_ai_mode: None,
            checks: None,
        };
        let md = render_go_no_go_markdown(&report);
        assert!(md.contains("- Selected AI Mode: n/a"));
        assert!(md.contains(MISSING_RESULTS_REASON));
        assert!(!md.contains("PASS"));
    }

    // ─── Artifact bundle ────────────────────────────────────────────

    #[test]
    fn writes_full_layout() {
        let report = sample_report();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("run");
        write_backtest_artifacts(&report, &out).unwrap();

        for mode in ["baseline", "ai_filter"] {
            for file in [
                "trades.csv",
                "equity_curve.csv",
                "warnings.csv",
                "metrics.json",
                "segment_metrics.json",
                "decisions.json",
            ] {
                assert!(out.join(mode).join(file).exists(), "{mode}/{file}");
            }
        }
        assert!(out.join("go_no_go.md").exists());

        let summary: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.join("summary.json")).unwrap()).unwrap();
        assert_eq!(summary["schema_version"], SCHEMA_VERSION);
        assert_eq!(summary["dataset_hash"], "abc");
        assert_eq!(summary["go_no_go"]["selected_ai_mode"], "ai_filter");
        assert!(summary["experiments"]["baseline"]["metrics"].is_object());
        assert!(summary["experiments"]["ai_filter"].get("trades").is_none());
    }
}
