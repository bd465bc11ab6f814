//! `financial-data-fetch`: daily bars for A-share stocks and ETFs

use crate::descriptor::SkillDescriptor;
use crate::error::{Result, SkillError};
use crate::skill::{Skill, SkillContext, SkillServices, failure};
use agent_market::{
    Adjustment, DatasetMetadata, DateRange, InstrumentKind, MarketError, OhlcvSeries,
};
use agent_tools::{ToolSignature, schema};
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{info, warn};

/// Largest accepted look-back
pub const MAX_DAYS: i64 = 365;

pub struct FinancialDataSkill {
    descriptor: SkillDescriptor,
    services: SkillServices,
}

impl FinancialDataSkill {
    pub const NAME: &'static str = "financial-data-fetch";

    pub fn new(context: SkillContext) -> Self {
        Self {
            descriptor: context.descriptor,
            services: context.services,
        }
    }

    pub fn factory(context: SkillContext) -> Box<dyn Skill> {
        Box::new(Self::new(context))
    }

    fn signature(name: &str, description: &str, symbol_doc: &str) -> ToolSignature {
        ToolSignature::new(
            name,
            description,
            schema::object(
                json!({
                    "symbol": schema::string(symbol_doc),
                    "days": schema::integer("数据天数（从今天往前推算），范围 1-365，优先于 start_date/end_date"),
                    "start_date": schema::string("开始日期 YYYYMMDD（未提供 days 时使用）"),
                    "end_date": schema::string("结束日期 YYYYMMDD（未提供 days 时使用）"),
                    "adjust": schema::string_enum("复权方式", &["qfq", "hfq", ""], "qfq"),
                }),
                &["symbol"],
            ),
        )
    }

    async fn fetch(&self, kind: InstrumentKind, args: &Value) -> Value {
        let label = match kind {
            InstrumentKind::Stock => "股票",
            InstrumentKind::Etf => "ETF",
        };

        let request = match FetchRequest::from_args(args, label) {
            Ok(request) => request,
            Err(message) => return failure(message),
        };

        let series = match self
            .services
            .provider
            .fetch_instrument_series(kind, &request.symbol, request.range, request.adjustment)
            .await
        {
            Ok(series) if !series.is_empty() => series,
            Ok(_) | Err(MarketError::NotFound { .. }) => {
                return failure(format!(
                    "未获取到数据（{label}代码: {}）。可能原因：代码错误、已退市或停牌",
                    request.symbol
                ));
            }
            Err(e) => {
                warn!(symbol = %request.symbol, error = %e, "Skill fetch failed");
                return failure(format!("获取{label}数据失败: {e}"));
            }
        };

        let name = self
            .services
            .provider
            .fetch_display_name(&request.symbol)
            .await
            .unwrap_or_else(|| request.symbol.clone());

        let rows = series_rows(&series);
        let count = series.len();
        let metadata = DatasetMetadata {
            kind,
            symbol: request.symbol.clone(),
            name: name.clone(),
            start_date: request.range.start_compact(),
            end_date: request.range.end_compact(),
        };
        let data_id = self.services.store.lock().await.store(series, metadata);
        info!(data_id = %data_id, symbol = %request.symbol, rows = count, "Skill fetch stored");

        json!({
            "success": true,
            "data_id": data_id,
            "symbol": request.symbol,
            "name": name,
            "rows": count,
            "start_date": request.range.start_compact(),
            "end_date": request.range.end_compact(),
            "message": format!("成功获取{label} {} 的 {count} 条数据", request.symbol),
            "data": rows,
        })
    }
}

/// Validated fetch input
#[derive(Debug, Clone, PartialEq)]
struct FetchRequest {
    symbol: String,
    range: DateRange,
    adjustment: Adjustment,
}

impl FetchRequest {
    fn from_args(args: &Value, label: &str) -> std::result::Result<Self, String> {
        let symbol = match args.get("symbol") {
            None | Some(Value::Null) => return Err("缺少必需参数: symbol".to_string()),
            Some(Value::String(s)) if is_exchange_code(s) => s.clone(),
            Some(other) => {
                return Err(format!("{label}代码格式错误: {}（必须为6位数字）", display(other)));
            }
        };

        let days = match args.get("days") {
            None | Some(Value::Null) => None,
            Some(raw) => match raw.as_i64() {
                Some(days) if (1..=MAX_DAYS).contains(&days) => Some(days),
                _ => {
                    return Err(format!(
                        "天数参数错误: {}（范围: [1, {MAX_DAYS}]）",
                        display(raw)
                    ));
                }
            },
        };

        let adjustment = match args.get("adjust").and_then(Value::as_str) {
            None => Adjustment::default(),
            Some(code) => {
                Adjustment::parse(code).ok_or_else(|| format!("复权参数错误: {code}"))?
            }
        };

        let start = args.get("start_date").and_then(Value::as_str);
        let end = args.get("end_date").and_then(Value::as_str);
        let range = DateRange::resolve_today(days, start, end).map_err(|e| e.to_string())?;

        Ok(Self {
            symbol,
            range,
            adjustment,
        })
    }
}

fn is_exchange_code(symbol: &str) -> bool {
    symbol.len() == 6 && symbol.bytes().all(|b| b.is_ascii_digit())
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn series_rows(series: &OhlcvSeries) -> Vec<Value> {
    series
        .bars()
        .iter()
        .map(|bar| {
            json!({
                "date": bar.date.format("%Y-%m-%d").to_string(),
                "open": bar.open,
                "high": bar.high,
                "low": bar.low,
                "close": bar.close,
                "volume": bar.volume,
            })
        })
        .collect()
}

#[async_trait]
impl Skill for FinancialDataSkill {
    fn descriptor(&self) -> &SkillDescriptor {
        &self.descriptor
    }

    fn list_tool_signatures(&self) -> Vec<ToolSignature> {
        vec![
            Self::signature(
                "fetch_stock_data",
                "获取A股历史数据（日K线），返回 data_id 及开盘、收盘、最高、最低、成交量等字段。",
                "股票代码（6位数字，如 '000001' 表示平安银行）",
            ),
            Self::signature(
                "fetch_etf_data",
                "获取ETF历史数据（日K线），返回 data_id 及开盘、收盘、最高、最低、成交量等字段。",
                "ETF代码（6位数字，如 '510300' 表示沪深300ETF）",
            ),
        ]
    }

    async fn invoke(&self, tool: &str, args: Value) -> Result<Value> {
        match tool {
            "fetch_stock_data" => Ok(self.fetch(InstrumentKind::Stock, &args).await),
            "fetch_etf_data" => Ok(self.fetch(InstrumentKind::Etf, &args).await),
            other => Err(SkillError::UnknownTool(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::tests::context;
    use agent_market::testing::StubProvider;
    use chrono::{Duration, Local};

    fn skill(provider: StubProvider) -> (FinancialDataSkill, SkillServices) {
        let context = context(FinancialDataSkill::NAME, provider);
        let services = context.services.clone();
        (FinancialDataSkill::new(context), services)
    }

    #[tokio::test]
    async fn test_fetch_stores_dataset() {
        let (skill, services) = skill(StubProvider::with_len(30).named("贵州茅台"));
        let result = skill
            .invoke("fetch_stock_data", json!({ "symbol": "600519", "days": 7 }))
            .await
            .unwrap();

        assert_eq!(result["success"], true);
        assert_eq!(result["data_id"], "data_1");
        assert_eq!(result["name"], "贵州茅台");
        assert_eq!(result["rows"], 30);
        assert_eq!(result["data"].as_array().unwrap().len(), 30);

        let today = Local::now().date_naive();
        assert_eq!(result["end_date"], today.format("%Y%m%d").to_string());
        assert_eq!(
            result["start_date"],
            (today - Duration::days(7)).format("%Y%m%d").to_string()
        );

        let store = services.store.lock().await;
        let stored = store.get("data_1").unwrap();
        assert_eq!(stored.metadata.kind, InstrumentKind::Stock);
        assert_eq!(stored.metadata.name, "贵州茅台");
    }

    #[tokio::test]
    async fn test_name_falls_back_to_symbol() {
        let (skill, _) = skill(StubProvider::with_len(5));
        let result = skill
            .invoke("fetch_etf_data", json!({ "symbol": "510300" }))
            .await
            .unwrap();
        assert_eq!(result["name"], "510300");
    }

    #[tokio::test]
    async fn test_symbol_validation() {
        let (skill, services) = skill(StubProvider::with_len(5));

        let result = skill
            .invoke("fetch_stock_data", json!({ "symbol": "60051" }))
            .await
            .unwrap();
        assert_eq!(result["success"], false);
        assert!(result["error"].as_str().unwrap().starts_with("股票代码格式错误"));

        let result = skill
            .invoke("fetch_etf_data", json!({ "symbol": 510_300 }))
            .await
            .unwrap();
        assert!(result["error"].as_str().unwrap().starts_with("ETF代码格式错误"));

        let result = skill.invoke("fetch_stock_data", json!({})).await.unwrap();
        assert_eq!(result["error"], "缺少必需参数: symbol");

        assert!(services.store.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_days_validation() {
        let (skill, _) = skill(StubProvider::with_len(5));
        for days in [json!(0), json!(366), json!("7")] {
            let result = skill
                .invoke("fetch_stock_data", json!({ "symbol": "600519", "days": days }))
                .await
                .unwrap();
            assert!(result["error"].as_str().unwrap().starts_with("天数参数错误"));
        }
    }

    #[tokio::test]
    async fn test_empty_and_failing_provider() {
        let (skill, _) = skill(StubProvider::with_len(0));
        let result = skill
            .invoke("fetch_stock_data", json!({ "symbol": "600519" }))
            .await
            .unwrap();
        assert!(result["error"].as_str().unwrap().starts_with("未获取到数据"));

        let (skill, _) = self::skill(StubProvider::failing("timeout"));
        let result = skill
            .invoke("fetch_stock_data", json!({ "symbol": "600519" }))
            .await
            .unwrap();
        assert!(result["error"].as_str().unwrap().contains("timeout"));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let (skill, _) = skill(StubProvider::with_len(5));
        assert!(matches!(
            skill.invoke("fetch_bond_data", json!({})).await,
            Err(SkillError::UnknownTool(_))
        ));
        assert!(skill.declares("fetch_etf_data"));
    }
}
