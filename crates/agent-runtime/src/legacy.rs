//! Built-in tools of the static tool table
//!
//! These are the three tools advertised in the system prompt. The skill tier
//! may serve the two fetch tools first; `analyze_and_plot` is always served
//! from here.

use agent_core::{Error, Result};
use agent_market::indicators::add_all_indicators;
use agent_market::{
    Adjustment, ChartKind, ChartRenderer, DatasetMetadata, DateRange, FetchSummary,
    InstrumentKind, IndicatorSummary, LatestSignals, MarketDataProvider, MarketError,
    SharedDataStore, generate_signals, round_to,
};
use agent_tools::{Tool, ToolRegistry, error_result, schema};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// `fetch_stock_data` / `fetch_etf_data`
pub struct FetchDataTool {
    kind: InstrumentKind,
    provider: Arc<dyn MarketDataProvider>,
    store: SharedDataStore,
}

impl FetchDataTool {
    pub fn new(kind: InstrumentKind, provider: Arc<dyn MarketDataProvider>, store: SharedDataStore) -> Self {
        Self {
            kind,
            provider,
            store,
        }
    }

    fn empty_message(&self, symbol: &str) -> String {
        match self.kind {
            InstrumentKind::Stock => format!("无法获取股票 {symbol} 的数据，请检查股票代码是否正确。"),
            InstrumentKind::Etf => format!("无法获取 ETF {symbol} 的数据，请检查代码是否正确。"),
        }
    }
}

#[async_trait]
impl Tool for FetchDataTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let symbol = params
            .get("symbol")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::tool(self.name(), "missing required argument 'symbol'"))?;

        let days = params.get("days").and_then(Value::as_i64);
        let start = params.get("start_date").and_then(Value::as_str);
        let end = params.get("end_date").and_then(Value::as_str);
        let range = match DateRange::resolve_today(days, start, end) {
            Ok(range) => range,
            Err(e) => return Ok(error_result(format!("获取数据时出错: {e}"))),
        };

        debug!(tool = self.name(), symbol, start = %range.start_compact(), end = %range.end_compact(), "Fetching series");
        let series = match self
            .provider
            .fetch_instrument_series(self.kind, symbol, range, Adjustment::Forward)
            .await
        {
            Ok(series) if !series.is_empty() => series,
            Ok(_) | Err(MarketError::NotFound { .. }) => {
                return Ok(error_result(self.empty_message(symbol)));
            }
            Err(e) => {
                warn!(tool = self.name(), symbol, error = %e, "Fetch failed");
                return Ok(error_result(format!("获取数据时出错: {e}")));
            }
        };

        let name = self
            .provider
            .fetch_display_name(symbol)
            .await
            .unwrap_or_else(|| symbol.to_string());

        let metadata = DatasetMetadata {
            kind: self.kind,
            symbol: symbol.to_string(),
            name: name.clone(),
            start_date: range.start_compact(),
            end_date: range.end_compact(),
        };
        let mut store = self.store.lock().await;
        let data_id = store.store(series, metadata);
        let summary = store
            .get(&data_id)
            .and_then(|dataset| FetchSummary::from_series(&data_id, symbol, &name, &dataset.series))
            .ok_or_else(|| Error::DatasetNotFound(data_id.clone()))?;
        drop(store);

        info!(data_id = %data_id, symbol, records = summary.records, "Fetched series");
        Ok(serde_json::to_value(summary)?)
    }

    fn name(&self) -> &str {
        match self.kind {
            InstrumentKind::Stock => "fetch_stock_data",
            InstrumentKind::Etf => "fetch_etf_data",
        }
    }

    fn description(&self) -> &str {
        match self.kind {
            InstrumentKind::Stock => "获取 A 股历史数据",
            InstrumentKind::Etf => "获取 ETF 历史数据",
        }
    }

    fn input_schema(&self) -> Value {
        let symbol_doc = match self.kind {
            InstrumentKind::Stock => "股票代码（例如 \"600519\" 表示贵州茅台）",
            InstrumentKind::Etf => "ETF 代码（例如 \"510300\" 表示沪深300ETF）",
        };
        schema::object(
            json!({
                "symbol": schema::string(symbol_doc),
                "days": schema::integer("获取最近 N 天的数据（推荐）"),
                "start_date": schema::string("开始日期（YYYYMMDD，可选）"),
                "end_date": schema::string("结束日期（YYYYMMDD，可选）"),
            }),
            &["symbol"],
        )
    }
}

/// `analyze_and_plot`: indicators, signals and a chart for a stored dataset
pub struct AnalyzeAndPlotTool {
    store: SharedDataStore,
    renderer: Arc<dyn ChartRenderer>,
}

impl AnalyzeAndPlotTool {
    pub fn new(store: SharedDataStore, renderer: Arc<dyn ChartRenderer>) -> Self {
        Self { store, renderer }
    }
}

/// Chart title: `name(symbol) 技术分析`, or `symbol 技术分析` without a name
pub fn analysis_title(metadata: &DatasetMetadata) -> String {
    if metadata.has_display_name() {
        format!("{}({}) 技术分析", metadata.name, metadata.symbol)
    } else {
        format!("{} 技术分析", metadata.symbol)
    }
}

fn rounded(value: Option<f64>, places: i32) -> Value {
    value.map_or(Value::Null, |v| json!(round_to(v, places)))
}

fn analysis_json(summary: &IndicatorSummary) -> Value {
    json!({
        "latest_price": rounded(summary.close_price, 2),
        "ma_5": rounded(summary.ma_5, 2),
        "ma_20": rounded(summary.ma_20, 2),
        "ma_60": rounded(summary.ma_60, 2),
        "rsi_14": rounded(summary.rsi_14, 2),
        "macd": rounded(summary.macd, 4),
        "macd_signal": rounded(summary.macd_signal, 4),
    })
}

fn signals_json(signals: &LatestSignals) -> Value {
    json!({
        "macd_cross": signals.macd_cross.as_str(),
        "rsi_signal": signals.rsi_signal.as_str(),
        "ma_cross": signals.ma_cross.as_str(),
    })
}

#[async_trait]
impl Tool for AnalyzeAndPlotTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let data_id = params
            .get("data_id")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::tool(self.name(), "missing required argument 'data_id'"))?;
        let chart_type = params
            .get("chart_type")
            .and_then(Value::as_str)
            .unwrap_or("auto");
        let Some(kind) = ChartKind::parse(chart_type) else {
            return Ok(error_result(format!("分析数据时出错: 不支持的图表类型 {chart_type}")));
        };

        let dataset = {
            let store = self.store.lock().await;
            match store.get(data_id) {
                Some(dataset) => dataset.clone(),
                None => return Ok(error_result(Error::DatasetNotFound(data_id.to_string()).to_string())),
            }
        };

        let frame = match add_all_indicators(&dataset.series) {
            Ok(frame) => frame,
            Err(e) => return Ok(error_result(format!("分析数据时出错: {e}"))),
        };
        let signals = generate_signals(&frame).latest();
        let summary = frame.summary();
        let title = analysis_title(&dataset.metadata);

        let renderer = Arc::clone(&self.renderer);
        let rendered = tokio::task::spawn_blocking(move || {
            let kind = kind.resolve(&frame);
            renderer.render(&frame, &title, kind)
        })
        .await
        .map_err(|e| Error::tool(self.name(), e.to_string()))?;

        let chart_path = match rendered {
            Ok(path) => path,
            Err(e) => return Ok(error_result(format!("分析数据时出错: {e}"))),
        };
        info!(data_id, chart = %chart_path.display(), "Analysis chart written");

        Ok(json!({
            "status": "success",
            "chart_path": chart_path.display().to_string(),
            "symbol": dataset.metadata.symbol,
            "analysis": analysis_json(&summary),
            "signals": signals_json(&signals),
        }))
    }

    fn name(&self) -> &str {
        "analyze_and_plot"
    }

    fn description(&self) -> &str {
        "分析数据并生成图表"
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "data_id": schema::string("数据标识符（由前面的 fetch 工具返回）"),
                "chart_type": schema::string_enum(
                    "图表类型",
                    &["auto", "basic", "ma", "macd", "comprehensive"],
                    "auto",
                ),
            }),
            &["data_id"],
        )
    }
}

/// Static table holding the three built-in tools
pub fn legacy_registry(
    store: &SharedDataStore,
    provider: &Arc<dyn MarketDataProvider>,
    renderer: &Arc<dyn ChartRenderer>,
) -> ToolRegistry {
    let registry = ToolRegistry::new();
    for kind in [InstrumentKind::Stock, InstrumentKind::Etf] {
        registry.register(Arc::new(FetchDataTool::new(
            kind,
            Arc::clone(provider),
            Arc::clone(store),
        )));
    }
    registry.register(Arc::new(AnalyzeAndPlotTool::new(
        Arc::clone(store),
        Arc::clone(renderer),
    )));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_market::testing::{StubProvider, ramp_series};
    use agent_market::{DataStore, SvgChartRenderer};
    use chrono::{Duration, Local};

    fn registry(provider: StubProvider, dir: &std::path::Path) -> (ToolRegistry, SharedDataStore) {
        let store = DataStore::shared();
        let provider: Arc<dyn MarketDataProvider> = Arc::new(provider);
        let renderer: Arc<dyn ChartRenderer> = Arc::new(SvgChartRenderer::new(dir));
        (legacy_registry(&store, &provider, &renderer), store)
    }

    #[tokio::test]
    async fn test_registry_contents() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = registry(StubProvider::with_len(10), dir.path());
        assert_eq!(
            registry.names(),
            vec!["analyze_and_plot", "fetch_etf_data", "fetch_stock_data"]
        );
    }

    #[tokio::test]
    async fn test_fetch_stock_summary() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, store) = registry(StubProvider::with_len(30).named("贵州茅台"), dir.path());

        let result = registry
            .execute("fetch_stock_data", json!({"symbol": "600519", "days": 7}))
            .await;

        assert_eq!(result["status"], "success");
        assert_eq!(result["data_id"], "data_1");
        assert_eq!(result["name"], "贵州茅台");
        assert_eq!(result["records"], 30);

        let store = store.lock().await;
        let metadata = &store.get("data_1").unwrap().metadata;
        let today = Local::now().date_naive();
        assert_eq!(metadata.end_date, today.format("%Y%m%d").to_string());
        assert_eq!(
            metadata.start_date,
            (today - Duration::days(7)).format("%Y%m%d").to_string()
        );
    }

    #[tokio::test]
    async fn test_fetch_empty_series_messages() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, store) = registry(StubProvider::with_len(0), dir.path());

        let result = registry
            .execute("fetch_stock_data", json!({"symbol": "000000"}))
            .await;
        assert_eq!(result["status"], "error");
        assert_eq!(
            result["message"],
            "无法获取股票 000000 的数据，请检查股票代码是否正确。"
        );

        let result = registry.execute("fetch_etf_data", json!({"symbol": "159999"})).await;
        assert_eq!(result["message"], "无法获取 ETF 159999 的数据，请检查代码是否正确。");
        assert!(store.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_provider_failure_and_bad_dates() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = registry(StubProvider::failing("connection reset"), dir.path());

        let result = registry
            .execute("fetch_stock_data", json!({"symbol": "600519"}))
            .await;
        let message = result["message"].as_str().unwrap();
        assert!(message.starts_with("获取数据时出错: "));
        assert!(message.contains("connection reset"));

        let result = registry
            .execute(
                "fetch_stock_data",
                json!({"symbol": "600519", "start_date": "2024-01-01", "end_date": "20240301"}),
            )
            .await;
        assert!(result["message"].as_str().unwrap().starts_with("获取数据时出错: "));
    }

    #[tokio::test]
    async fn test_fetch_out_of_range_days_is_structured_error() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, store) = registry(StubProvider::with_len(30), dir.path());

        let result = registry
            .execute(
                "fetch_stock_data",
                json!({"symbol": "600519", "days": 1_000_000_000_000_i64}),
            )
            .await;

        assert_eq!(result["status"], "error");
        let message = result["message"].as_str().unwrap();
        assert!(message.starts_with("获取数据时出错: Invalid date: "));
        assert!(store.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_missing_symbol_is_structured_error() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = registry(StubProvider::with_len(5), dir.path());
        let result = registry.execute("fetch_stock_data", json!({"days": 5})).await;
        assert_eq!(result["status"], "error");
        assert!(result["message"].as_str().unwrap().contains("symbol"));
    }

    #[tokio::test]
    async fn test_analyze_and_plot() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = registry(StubProvider::with_len(90).named("贵州茅台"), dir.path());
        registry
            .execute("fetch_stock_data", json!({"symbol": "600519", "days": 90}))
            .await;

        let result = registry
            .execute("analyze_and_plot", json!({"data_id": "data_1"}))
            .await;

        assert_eq!(result["status"], "success");
        assert_eq!(result["symbol"], "600519");
        let path = result["chart_path"].as_str().unwrap();
        assert!(std::path::Path::new(path).exists());
        assert!(path.contains("comprehensive_"));

        let analysis = &result["analysis"];
        let last_close = ramp_series(90).unwrap().last().unwrap().close;
        assert_eq!(analysis["latest_price"], json!(round_to(last_close, 2)));
        assert!(analysis["ma_60"].is_number());
        assert!(analysis["macd"].is_number());
        assert!(analysis["rsi_14"].is_number());
        assert_eq!(result["signals"]["rsi_signal"], "OVERBOUGHT");
    }

    #[tokio::test]
    async fn test_analyze_short_series_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = registry(StubProvider::with_len(8), dir.path());
        registry
            .execute("fetch_etf_data", json!({"symbol": "510300"}))
            .await;

        let result = registry
            .execute("analyze_and_plot", json!({"data_id": "data_1", "chart_type": "basic"}))
            .await;

        assert_eq!(result["status"], "success");
        assert!(result["analysis"]["ma_20"].is_null());
        assert!(result["analysis"]["macd"].is_null());
        assert_eq!(
            result["signals"],
            json!({"macd_cross": "HOLD", "rsi_signal": "NEUTRAL", "ma_cross": "HOLD"})
        );
    }

    #[tokio::test]
    async fn test_analyze_unknown_id() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = registry(StubProvider::with_len(8), dir.path());
        let result = registry
            .execute("analyze_and_plot", json!({"data_id": "data_7"}))
            .await;
        assert_eq!(result, json!({"status": "error", "message": "找不到数据 ID: data_7"}));
    }

    #[test]
    fn test_analysis_title() {
        let mut metadata = DatasetMetadata {
            kind: InstrumentKind::Stock,
            symbol: "600519".to_string(),
            name: "贵州茅台".to_string(),
            start_date: "20240101".to_string(),
            end_date: "20240301".to_string(),
        };
        assert_eq!(analysis_title(&metadata), "贵州茅台(600519) 技术分析");
        metadata.name = "600519".to_string();
        assert_eq!(analysis_title(&metadata), "600519 技术分析");
    }
}
