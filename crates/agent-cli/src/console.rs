//! Terminal output

use agent_core::AgentOutcome;
use agent_runtime::{ExecutorEventHandler, ToolCall, render_analysis_tables, render_execution_summary};
use agent_skills::SkillOrchestrator;
use agent_utils::preview;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Write;

/// Progress lines on stderr while the loop runs
pub struct ConsoleEvents;

#[async_trait]
impl ExecutorEventHandler for ConsoleEvents {
    async fn on_iteration(&self, iteration: usize, max_iterations: usize) {
        eprintln!("[{iteration}/{max_iterations}] 思考中...");
    }

    async fn on_tool_start(&self, call: &ToolCall) {
        if !call.thought.is_empty() {
            eprintln!("  💭 {}", preview(&call.thought, 80));
        }
        eprintln!("  🔧 {} {}", call.action, call.action_input);
    }

    async fn on_tool_done(&self, name: &str, result: &Value, duration_ms: u64) {
        let status = result.get("status").and_then(Value::as_str).unwrap_or("unknown");
        eprintln!("  ✓ {name} -> {status} ({duration_ms} ms)");
    }

    async fn on_error(&self, error: &str) {
        eprintln!("  ✗ {error}");
    }
}

/// Final answer followed by the analysis and execution tables
pub fn render_outcome(outcome: &AgentOutcome) -> String {
    let mut out = String::new();
    if let Some(answer) = &outcome.final_answer {
        let _ = writeln!(out, "\n{answer}\n");
    }
    if let Some(tables) = render_analysis_tables(outcome) {
        let _ = writeln!(out, "{tables}");
    }
    out.push_str(&render_execution_summary(outcome));
    out
}

/// One block per loaded skill
pub fn render_skills(skills: &SkillOrchestrator) -> String {
    if skills.is_empty() {
        return format!("未在 {} 下发现技能\n", skills.root().display());
    }
    let mut out = format!("已加载 {} 个技能 ({})\n", skills.len(), skills.root().display());
    for skill in skills.summary() {
        let _ = writeln!(out, "\n{}: {}", skill.name, skill.description);
        let _ = writeln!(out, "  工具: {}", skill.tools.join(", "));
    }
    out
}

/// Which model providers have credentials configured
pub fn render_key_status(status: &[(&str, bool)]) -> String {
    status
        .iter()
        .map(|(provider, set)| format!("{provider:<10} {}\n", if *set { "✓ 已配置" } else { "✗ 未配置" }))
        .collect()
}

pub fn print_banner() {
    println!(
        r"
╔══════════════════════════════════════════════════════════╗
║                  A 股 / ETF 技术分析助手                  ║
║                                                          ║
║  直接输入问题，例如：                                     ║
║    分析贵州茅台最近两个月的走势                           ║
║    看看 510300 近一周的表现                               ║
║                                                          ║
║  /reset  开始新会话      exit / quit  退出                ║
╚══════════════════════════════════════════════════════════╝
"
    );
}
