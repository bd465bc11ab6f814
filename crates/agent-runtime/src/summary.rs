//! Human-readable summaries of a finished run

use agent_core::{AgentOutcome, HistoryEntry};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use serde_json::Value;
use std::fmt::Write;

const INDICATOR_ROWS: &[(&str, &str)] = &[
    ("latest_price", "最新价"),
    ("ma_5", "MA5"),
    ("ma_20", "MA20"),
    ("ma_60", "MA60"),
    ("rsi_14", "RSI(14)"),
    ("macd", "MACD"),
    ("macd_signal", "MACD 信号线"),
];

const SIGNAL_ROWS: &[(&str, &str)] = &[
    ("macd_cross", "MACD 交叉"),
    ("rsi_signal", "RSI 信号"),
    ("ma_cross", "均线交叉"),
];

fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    table
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn status_of(result: &Value) -> &str {
    result
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
}

/// Status line, counts, and one row per tool call
pub fn render_execution_summary(outcome: &AgentOutcome) -> String {
    let mut out = String::new();
    let status = if outcome.success {
        "成功".to_string()
    } else {
        format!("失败 ({})", outcome.error.as_deref().unwrap_or("unknown"))
    };
    let _ = writeln!(out, "执行状态: {status}");
    let _ = writeln!(out, "迭代次数: {}", outcome.iterations());
    let _ = writeln!(out, "工具调用: {}", outcome.tool_calls().count());

    let mut calls = table(&["#", "工具", "状态", "说明"]);
    let mut any = false;
    for entry in &outcome.history {
        if let HistoryEntry::ToolCall {
            iteration,
            action,
            result,
            ..
        } = entry
        {
            any = true;
            let note = result
                .get("message")
                .or_else(|| result.get("data_id"))
                .or_else(|| result.get("chart_path"));
            calls.add_row([
                iteration.to_string(),
                action.clone(),
                status_of(result).to_string(),
                cell(note),
            ]);
        }
    }
    if any {
        let _ = writeln!(out, "{calls}");
    }
    out
}

/// Indicator and signal tables for the first successful `analyze_and_plot`
pub fn render_analysis_tables(outcome: &AgentOutcome) -> Option<String> {
    let result = outcome
        .tool_calls()
        .filter(|entry| entry.action() == Some("analyze_and_plot"))
        .filter_map(HistoryEntry::result)
        .find(|result| status_of(result) == "success")?;

    let analysis = result.get("analysis");
    let mut indicators = table(&["指标", "数值"]);
    for (key, label) in INDICATOR_ROWS {
        indicators.add_row([(*label).to_string(), cell(analysis.and_then(|a| a.get(*key)))]);
    }

    let signals = result.get("signals");
    let mut signal_table = table(&["信号", "状态"]);
    for (key, label) in SIGNAL_ROWS {
        signal_table.add_row([(*label).to_string(), cell(signals.and_then(|s| s.get(*key)))]);
    }

    let mut out = String::new();
    let symbol = result.get("symbol").and_then(Value::as_str).unwrap_or("-");
    let _ = writeln!(out, "技术指标 ({symbol})");
    let _ = writeln!(out, "{indicators}");
    let _ = writeln!(out, "交易信号");
    let _ = writeln!(out, "{signal_table}");
    if let Some(path) = result.get("chart_path").and_then(Value::as_str) {
        let _ = writeln!(out, "图表: {path}");
    }
    Some(out)
}
