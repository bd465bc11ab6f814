//! `chart-generation`: candlestick and full technical charts for a stored dataset

use super::stored_dataset;
use crate::descriptor::SkillDescriptor;
use crate::error::{Result, SkillError};
use crate::skill::{Skill, SkillContext, SkillServices, failure};
use agent_market::indicators::{IndicatorFrame, add_all_indicators};
use agent_market::{ChartKind, ChartRenderer, ChartTheme, SvgChartRenderer};
use agent_tools::{ToolSignature, schema};
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::warn;

pub struct ChartGenerationSkill {
    descriptor: SkillDescriptor,
    services: SkillServices,
}

impl ChartGenerationSkill {
    pub const NAME: &'static str = "chart-generation";

    pub fn new(context: SkillContext) -> Self {
        Self {
            descriptor: context.descriptor,
            services: context.services,
        }
    }

    pub fn factory(context: SkillContext) -> Box<dyn Skill> {
        Box::new(Self::new(context))
    }

    fn signature(name: &str, description: &str) -> ToolSignature {
        ToolSignature::new(
            name,
            description,
            schema::object(
                json!({
                    "data_id": schema::string("数据标识符（由 fetch 工具返回的 data_id）"),
                    "symbol": schema::string("股票代码（如'000001'），用于标题"),
                    "title": schema::string("自定义图表标题"),
                    "theme": schema::string_enum("图表主题（dark深色/light浅色）", &["dark", "light"], "dark"),
                }),
                &["data_id"],
            ),
        )
    }

    async fn generate(&self, kind: ChartKind, args: &Value) -> Result<Value> {
        let theme = match args.get("theme").and_then(Value::as_str) {
            None => ChartTheme::Dark,
            Some(raw) => match ChartTheme::parse(raw) {
                Some(theme) => theme,
                None => {
                    return Ok(failure(format!(
                        "无效的主题: {raw}（必须是 'dark' 或 'light'）"
                    )));
                }
            },
        };

        let dataset = match stored_dataset(&self.services.store, args).await {
            Ok(dataset) => dataset,
            Err(rejection) => return Ok(rejection),
        };
        let rows = dataset.series.len();

        let symbol = args
            .get("symbol")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty());
        let title = match args.get("title").and_then(Value::as_str).filter(|t| !t.is_empty()) {
            Some(title) => title.to_string(),
            None => default_title(kind, symbol, rows),
        };

        let frame = match kind {
            ChartKind::Comprehensive => add_all_indicators(&dataset.series)?,
            _ => IndicatorFrame::new(dataset.series),
        };

        let renderer = SvgChartRenderer::new(&self.services.chart_dir).with_theme(theme);
        let chart_title = title.clone();
        let rendered = tokio::task::spawn_blocking(move || renderer.render(&frame, &chart_title, kind))
            .await
            .map_err(|e| SkillError::Task(e.to_string()))?;

        let path = match rendered {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, "Chart rendering failed");
                return Ok(failure(format!("生成图表失败: {e}")));
            }
        };

        let mut result = json!({
            "success": true,
            "message": format!("成功生成{}: {title}", kind_label(kind)),
            "saved_path": path.display().to_string(),
            "chart_type": kind.as_str(),
            "theme": theme.as_str(),
        });
        if kind == ChartKind::Comprehensive {
            result["rows"] = json!(rows);
        }
        Ok(result)
    }
}

fn kind_label(kind: ChartKind) -> &'static str {
    match kind {
        ChartKind::Comprehensive => "综合图表",
        _ => "K线图",
    }
}

fn default_title(kind: ChartKind, symbol: Option<&str>, rows: usize) -> String {
    match (kind, symbol) {
        (ChartKind::Comprehensive, Some(symbol)) => format!("{symbol} 技术分析（{rows}日）"),
        (ChartKind::Comprehensive, None) => "技术分析图表".to_string(),
        (_, Some(symbol)) => format!("{symbol} K线图"),
        (_, None) => "K线图".to_string(),
    }
}

#[async_trait]
impl Skill for ChartGenerationSkill {
    fn descriptor(&self) -> &SkillDescriptor {
        &self.descriptor
    }

    fn list_tool_signatures(&self) -> Vec<ToolSignature> {
        vec![
            Self::signature(
                "generate_candlestick_chart",
                "生成基础K线图（蜡烛图+成交量），返回保存路径。",
            ),
            Self::signature(
                "generate_comprehensive_chart",
                "生成综合技术分析图表（K线+MA+MACD+RSI+成交量），指标按数据长度自动计算，返回保存路径。",
            ),
        ]
    }

    async fn invoke(&self, tool: &str, args: Value) -> Result<Value> {
        match tool {
            "generate_candlestick_chart" => self.generate(ChartKind::Basic, &args).await,
            "generate_comprehensive_chart" => self.generate(ChartKind::Comprehensive, &args).await,
            other => Err(SkillError::UnknownTool(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::tests::{context, seed};
    use agent_market::testing::StubProvider;
    use std::path::Path;

    async fn setup(len: usize, dir: &Path) -> (ChartGenerationSkill, String) {
        let mut context = context(ChartGenerationSkill::NAME, StubProvider::with_len(0));
        context.services.chart_dir = dir.to_path_buf();
        let id = seed(&context, len).await;
        (ChartGenerationSkill::new(context), id)
    }

    #[tokio::test]
    async fn test_candlestick_chart() {
        let dir = tempfile::tempdir().unwrap();
        let (skill, id) = setup(20, dir.path()).await;

        let result = skill
            .invoke(
                "generate_candlestick_chart",
                json!({ "data_id": id, "symbol": "600519" }),
            )
            .await
            .unwrap();

        assert_eq!(result["success"], true);
        assert_eq!(result["chart_type"], "basic");
        assert_eq!(result["theme"], "dark");
        assert_eq!(result["message"], "成功生成K线图: 600519 K线图");
        assert!(Path::new(result["saved_path"].as_str().unwrap()).exists());
    }

    #[tokio::test]
    async fn test_comprehensive_chart() {
        let dir = tempfile::tempdir().unwrap();
        let (skill, id) = setup(80, dir.path()).await;

        let result = skill
            .invoke(
                "generate_comprehensive_chart",
                json!({ "data_id": id, "theme": "light" }),
            )
            .await
            .unwrap();

        assert_eq!(result["chart_type"], "comprehensive");
        assert_eq!(result["theme"], "light");
        assert_eq!(result["rows"], 80);
        assert_eq!(result["message"], "成功生成综合图表: 技术分析图表");
    }

    #[tokio::test]
    async fn test_custom_title_and_invalid_theme() {
        let dir = tempfile::tempdir().unwrap();
        let (skill, id) = setup(5, dir.path()).await;

        let result = skill
            .invoke(
                "generate_candlestick_chart",
                json!({ "data_id": id, "title": "我的图" }),
            )
            .await
            .unwrap();
        assert_eq!(result["message"], "成功生成K线图: 我的图");

        let result = skill
            .invoke(
                "generate_candlestick_chart",
                json!({ "data_id": id, "theme": "neon" }),
            )
            .await
            .unwrap();
        assert_eq!(result["success"], false);
        assert!(result["error"].as_str().unwrap().contains("neon"));
    }

    #[test]
    fn test_default_titles() {
        assert_eq!(default_title(ChartKind::Basic, None, 10), "K线图");
        assert_eq!(
            default_title(ChartKind::Comprehensive, Some("510300"), 60),
            "510300 技术分析（60日）"
        );
    }
}
