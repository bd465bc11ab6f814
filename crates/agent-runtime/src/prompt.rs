//! System prompt
//!
//! The prompt is rendered at the start of every run so relative periods such
//! as "最近两个月" are read against today's date rather than the model's
//! training cutoff.

use agent_core::{Error, Result};
use chrono::{Local, NaiveDate};
use minijinja::{Environment, context};
use serde::Serialize;
use std::sync::Arc;

/// Produces the system prompt for one run
pub type PromptProvider = Arc<dyn Fn() -> Result<String> + Send + Sync>;

const TEMPLATE_NAME: &str = "system";

const SYSTEM_TEMPLATE: &str = r#"你是一名专业的量化金融分析师助手。你的任务是协助用户获取金融市场数据，计算技术指标，并生成可视化图表来分析市场趋势。

**重要时间信息**: 今天是 {{ today }}。
当用户提到"最近X天/月"、"近期"、"当前"等相对时间词时，请基于 {{ today }} 来计算日期范围。

你的能力包括：
1. 获取 A 股和 ETF 的历史行情数据
2. 计算技术指标（MA、MACD、RSI、布林带等）
3. 生成专业的 K 线图和指标图表
4. 基于技术指标提供客观的市场分析

你的回答应当：
- 数据驱动，基于实际的市场数据
- 客观中立，不做主观预测
- 优先展示可视化分析结果
- 清晰解释技术指标的含义

你可以使用以下工具：
{% for tool in tools %}
**{{ tool.name }}**
{{ tool.summary }}
参数：
{%- for param in tool.params %}
- {{ param.name }}: {{ param.doc }}
{%- endfor %}
{% if tool.days_hint %}
**推荐**：优先使用 `days` 参数，系统会自动计算对应的日期范围（从今天往前推）。
  * 如果用户说"最近两个月"，请传递 60
  * 如果用户说"近一周"，请传递 7
  * 如果用户说"三个月"，请传递 90
{% endif %}
{%- endfor %}

当用户提出请求时，你应该：
1. 解析用户意图，提取股票代码、时间范围等关键信息
2. 将相对时间转换为天数（如"最近两个月" = 60天）
3. 调用相应的工具获取数据（优先使用 `days` 参数）
4. **必须调用 analyze_and_plot 生成分析图表**
5. 图表生成后，基于技术指标提供简短的分析报告

**重要**：你必须实际执行工具调用，而不是描述将要调用什么工具。

请以 JSON 格式返回你的工具调用：
```json
{
  "thought": "你的思考过程",
  "action": "工具名称",
  "action_input": {
    "参数名": "参数值"
  }
}
```

**只有在所有工具都已执行完毕后**，才能提供最终的文字分析报告。
在提供最终答案时，不要使用 JSON 格式，直接用自然语言回答即可。
"#;

#[derive(Debug, Serialize)]
struct ParamDoc {
    name: &'static str,
    doc: &'static str,
}

#[derive(Debug, Serialize)]
struct ToolDoc {
    name: &'static str,
    summary: &'static str,
    params: Vec<ParamDoc>,
    days_hint: bool,
}

fn fetch_doc(name: &'static str, summary: &'static str, symbol_doc: &'static str) -> ToolDoc {
    ToolDoc {
        name,
        summary,
        params: vec![
            ParamDoc {
                name: "symbol",
                doc: symbol_doc,
            },
            ParamDoc {
                name: "days",
                doc: "获取最近 N 天的数据（整数，推荐使用此参数）",
            },
            ParamDoc {
                name: "start_date",
                doc: "开始日期（格式：YYYYMMDD，可选）",
            },
            ParamDoc {
                name: "end_date",
                doc: "结束日期（格式：YYYYMMDD，可选）",
            },
        ],
        days_hint: true,
    }
}

fn tool_docs() -> Vec<ToolDoc> {
    vec![
        fetch_doc(
            "fetch_stock_data",
            "获取 A 股历史数据。",
            "股票代码（例如 \"600519\" 表示贵州茅台）",
        ),
        fetch_doc(
            "fetch_etf_data",
            "获取 ETF 历史数据。",
            "ETF 代码（例如 \"510300\" 表示沪深300ETF）",
        ),
        ToolDoc {
            name: "analyze_and_plot",
            summary: "分析数据并生成图表。",
            params: vec![
                ParamDoc {
                    name: "data_id",
                    doc: "数据标识符（由前面的 fetch 工具返回）",
                },
                ParamDoc {
                    name: "chart_type",
                    doc: "图表类型（\"auto\", \"basic\", \"ma\", \"macd\", \"comprehensive\"）",
                },
            ],
            days_hint: false,
        },
    ]
}

/// Render the system prompt for `today`
pub fn render_system_prompt(today: NaiveDate) -> Result<String> {
    let mut env = Environment::new();
    env.add_template(TEMPLATE_NAME, SYSTEM_TEMPLATE)
        .map_err(|e| Error::InitializationFailed(format!("system prompt template: {e}")))?;
    let template = env
        .get_template(TEMPLATE_NAME)
        .map_err(|e| Error::InitializationFailed(format!("system prompt template: {e}")))?;

    template
        .render(context! {
            today => today.format("%Y年%m月%d日").to_string(),
            tools => tool_docs(),
        })
        .map_err(|e| Error::ProcessingFailed(format!("system prompt rendering: {e}")))
}

/// Prompt rendered against the local date at call time
pub fn default_prompt_provider() -> PromptProvider {
    Arc::new(|| render_system_prompt(Local::now().date_naive()))
}

/// Provider that always returns `prompt`
pub fn fixed_prompt(prompt: impl Into<String>) -> PromptProvider {
    let prompt = prompt.into();
    Arc::new(move || Ok(prompt.clone()))
}
