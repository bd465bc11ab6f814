//! `technical-indicators`: indicator calculators over a stored dataset

use super::stored_dataset;
use crate::descriptor::SkillDescriptor;
use crate::error::{Result, SkillError};
use crate::skill::{Skill, SkillContext, SkillServices, failure};
use agent_market::indicators::{self, IndicatorFrame};
use agent_market::{MarketError, round_to};
use agent_tools::{ToolSignature, schema};
use async_trait::async_trait;
use serde_json::{Map, Value, json};

const DEFAULT_MA_PERIODS: [i64; 4] = [5, 10, 20, 60];

pub struct TechnicalIndicatorsSkill {
    descriptor: SkillDescriptor,
    services: SkillServices,
}

impl TechnicalIndicatorsSkill {
    pub const NAME: &'static str = "technical-indicators";

    pub fn new(context: SkillContext) -> Self {
        Self {
            descriptor: context.descriptor,
            services: context.services,
        }
    }

    pub fn factory(context: SkillContext) -> Box<dyn Skill> {
        Box::new(Self::new(context))
    }
}

fn data_id_schema() -> Value {
    schema::string("数据标识符（由 fetch 工具返回的 data_id）")
}

fn usize_arg(args: &Value, key: &str, default: usize) -> std::result::Result<usize, String> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(raw) => raw
            .as_u64()
            .filter(|&v| v > 0)
            .map(|v| v as usize)
            .ok_or_else(|| format!("参数 {key} 必须为正整数: {raw}")),
    }
}

fn too_short(needed: usize, have: usize) -> String {
    format!("数据不足: 需要至少 {needed} 条数据，当前 {have} 条")
}

/// Latest value of each listed column, 4 dp, `null` when undefined
fn latest(frame: &IndicatorFrame, columns: &[String]) -> Value {
    let map: Map<String, Value> = columns
        .iter()
        .map(|name| {
            let value = frame.latest(name).map(|v| round_to(v, 4));
            (name.clone(), json!(value))
        })
        .collect();
    Value::Object(map)
}

/// Outcome of one calculator: columns added, or a message for the model
type Calculation = std::result::Result<(IndicatorFrame, String), String>;

fn calculate_ma(mut frame: IndicatorFrame, args: &Value) -> Calculation {
    let periods: Vec<usize> = match args.get("periods") {
        None | Some(Value::Null) => DEFAULT_MA_PERIODS.iter().map(|&p| p as usize).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_u64().filter(|&p| p > 0).map(|p| p as usize))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| "参数 periods 必须为正整数列表".to_string())?,
        Some(other) => return Err(format!("参数 periods 必须为正整数列表: {other}")),
    };

    let len = frame.len();
    let usable: Vec<usize> = periods.iter().copied().filter(|&p| p <= len).collect();
    if usable.is_empty() {
        let needed = periods.iter().copied().min().unwrap_or(1);
        return Err(too_short(needed, len));
    }

    let closes = frame.series().closes();
    for &period in &usable {
        let column = indicators::moving_average(&closes, period).map_err(ma_error)?;
        frame
            .insert(format!("ma_{period}"), column)
            .map_err(ma_error)?;
    }
    Ok((frame, format!("成功计算 MA 指标（周期: {usable:?}）")))
}

fn ma_error(e: MarketError) -> String {
    format!("MA 计算失败: {e}")
}

fn calculate_macd(mut frame: IndicatorFrame, args: &Value) -> Calculation {
    let fast = usize_arg(args, "fast_period", 12)?;
    let slow = usize_arg(args, "slow_period", 26)?;
    let signal = usize_arg(args, "signal_period", 9)?;
    if frame.len() < slow {
        return Err(too_short(slow, frame.len()));
    }

    let error = |e: MarketError| format!("MACD 计算失败: {e}");
    let columns = indicators::macd(&frame.series().closes(), fast, slow, signal).map_err(error)?;
    frame.insert("macd", columns.macd).map_err(error)?;
    frame.insert("macd_signal", columns.signal).map_err(error)?;
    frame.insert("macd_hist", columns.hist).map_err(error)?;
    Ok((frame, format!("成功计算 MACD 指标（{fast}-{slow}-{signal}）")))
}

fn calculate_rsi(mut frame: IndicatorFrame, args: &Value) -> Calculation {
    let period = usize_arg(args, "period", 14)?;
    if frame.len() <= period {
        return Err(too_short(period + 1, frame.len()));
    }

    let error = |e: MarketError| format!("RSI 计算失败: {e}");
    let column = indicators::rsi(&frame.series().closes(), period).map_err(error)?;
    frame.insert(format!("rsi_{period}"), column).map_err(error)?;
    Ok((frame, format!("成功计算 RSI 指标（周期: {period}）")))
}

fn calculate_boll(mut frame: IndicatorFrame, args: &Value) -> Calculation {
    let period = usize_arg(args, "period", 20)?;
    let num_std = match args.get("std_dev") {
        None | Some(Value::Null) => 2.0,
        Some(raw) => raw
            .as_f64()
            .filter(|v| *v > 0.0)
            .ok_or_else(|| format!("参数 std_dev 必须为正数: {raw}"))?,
    };
    if frame.len() < period {
        return Err(too_short(period, frame.len()));
    }

    let error = |e: MarketError| format!("BOLL 计算失败: {e}");
    let bands = indicators::bollinger_bands(&frame.series().closes(), period, num_std).map_err(error)?;
    frame.insert("bb_upper", bands.upper).map_err(error)?;
    frame.insert("bb_middle", bands.middle).map_err(error)?;
    frame.insert("bb_lower", bands.lower).map_err(error)?;
    Ok((
        frame,
        format!("成功计算 BOLL 指标（周期: {period}, 标准差: {num_std}）"),
    ))
}

fn calculate_all(frame: IndicatorFrame, _args: &Value) -> Calculation {
    let frame = indicators::add_all_indicators(frame.series())
        .map_err(|e| format!("批量计算失败: {e}"))?;
    Ok((frame, "成功计算所有技术指标（MA、MACD、RSI、BOLL）".to_string()))
}

#[async_trait]
impl Skill for TechnicalIndicatorsSkill {
    fn descriptor(&self) -> &SkillDescriptor {
        &self.descriptor
    }

    fn list_tool_signatures(&self) -> Vec<ToolSignature> {
        vec![
            ToolSignature::new(
                "calculate_ma",
                "计算移动平均线（MA），返回各周期的最新值。",
                schema::object(
                    json!({
                        "data_id": data_id_schema(),
                        "periods": schema::integer_array("MA周期列表（如[5,10,20]）", &DEFAULT_MA_PERIODS),
                    }),
                    &["data_id"],
                ),
            ),
            ToolSignature::new(
                "calculate_macd",
                "计算MACD指标（DIF、DEA、柱状图），返回最新值。",
                schema::object(
                    json!({
                        "data_id": data_id_schema(),
                        "fast_period": schema::integer_with_default("快线周期", 12),
                        "slow_period": schema::integer_with_default("慢线周期", 26),
                        "signal_period": schema::integer_with_default("信号线周期", 9),
                    }),
                    &["data_id"],
                ),
            ),
            ToolSignature::new(
                "calculate_rsi",
                "计算RSI指标，返回最新值。",
                schema::object(
                    json!({
                        "data_id": data_id_schema(),
                        "period": schema::integer_with_default("RSI周期", 14),
                    }),
                    &["data_id"],
                ),
            ),
            ToolSignature::new(
                "calculate_boll",
                "计算布林带（BOLL）上轨、中轨、下轨，返回最新值。",
                schema::object(
                    json!({
                        "data_id": data_id_schema(),
                        "period": schema::integer_with_default("MA周期", 20),
                        "std_dev": schema::number_with_default("标准差倍数", 2.0),
                    }),
                    &["data_id"],
                ),
            ),
            ToolSignature::new(
                "calculate_all_indicators",
                "按数据长度批量计算 MA、MACD、RSI、BOLL 及成交量均线，返回最新值。",
                schema::object(json!({ "data_id": data_id_schema() }), &["data_id"]),
            ),
        ]
    }

    async fn invoke(&self, tool: &str, args: Value) -> Result<Value> {
        let calculator: fn(IndicatorFrame, &Value) -> Calculation = match tool {
            "calculate_ma" => calculate_ma,
            "calculate_macd" => calculate_macd,
            "calculate_rsi" => calculate_rsi,
            "calculate_boll" => calculate_boll,
            "calculate_all_indicators" => calculate_all,
            other => return Err(SkillError::UnknownTool(other.to_string())),
        };

        let dataset = match stored_dataset(&self.services.store, &args).await {
            Ok(dataset) => dataset,
            Err(rejection) => return Ok(rejection),
        };

        Ok(match calculator(IndicatorFrame::new(dataset.series), &args) {
            Ok((frame, message)) => {
                let columns: Vec<String> = frame.column_names().map(str::to_string).collect();
                json!({
                    "success": true,
                    "data_id": dataset.id,
                    "rows": frame.len(),
                    "message": message,
                    "latest": latest(&frame, &columns),
                })
            }
            Err(message) => failure(message),
        })
    }
}
