//! Skills compiled into the binary

mod chart_generation;
mod financial_data;
mod technical_indicators;

pub use chart_generation::ChartGenerationSkill;
pub use financial_data::{FinancialDataSkill, MAX_DAYS};
pub use technical_indicators::TechnicalIndicatorsSkill;

use crate::skill::failure;
use agent_market::{SharedDataStore, StoredDataset};
use serde_json::Value;

/// Look up `data_id` from the arguments, or explain why not
async fn stored_dataset(store: &SharedDataStore, args: &Value) -> Result<StoredDataset, Value> {
    let Some(data_id) = args.get("data_id").and_then(Value::as_str) else {
        return Err(failure("缺少必需参数: data_id"));
    };
    let store = store.lock().await;
    match store.get(data_id) {
        Some(dataset) if dataset.series.is_empty() => Err(failure("数据为空，无法处理")),
        Some(dataset) => Ok(dataset.clone()),
        None => Err(failure(format!("找不到数据 ID: {data_id}"))),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::descriptor::SkillDescriptor;
    use crate::skill::{SkillContext, SkillServices};
    use agent_market::testing::{StubProvider, ramp_series};
    use agent_market::{DataStore, DatasetMetadata, InstrumentKind};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    pub(crate) fn context(name: &str, provider: StubProvider) -> SkillContext {
        let chart_dir = std::env::temp_dir().join("agent-skills-tests");
        SkillContext {
            descriptor: SkillDescriptor {
                name: name.to_string(),
                description: format!("{name} skill"),
                extra: BTreeMap::new(),
                instructions: String::new(),
                dir: name.into(),
            },
            services: SkillServices {
                provider: Arc::new(provider),
                store: DataStore::shared(),
                chart_dir,
            },
        }
    }

    /// Put a ramp of `len` bars in the context's store
    pub(crate) async fn seed(context: &SkillContext, len: usize) -> String {
        context.services.store.lock().await.store(
            ramp_series(len).unwrap(),
            DatasetMetadata {
                kind: InstrumentKind::Stock,
                symbol: "600519".to_string(),
                name: "贵州茅台".to_string(),
                start_date: "20240101".to_string(),
                end_date: "20240401".to_string(),
            },
        )
    }
}
