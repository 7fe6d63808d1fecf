use serde_json::{json, Map, Value};

use super::{decode_envelope, AlertSpec};
use crate::domain::{
    AlertKind, DynoSelector, KindSettings, MemorySettings, TaskConfig, MEMORY_METRIC,
};
use crate::template::scripts;
use crate::vars::{VarError, VariableBag};

/// Memory usage per dyno class, with critical and warning thresholds in MB.
pub struct MemoryUsageSpec;

fn settings(config: &TaskConfig) -> Option<&MemorySettings> {
    match &config.settings {
        KindSettings::MemoryUsage(m) => Some(m),
        _ => None,
    }
}

impl AlertSpec for MemoryUsageSpec {
    fn kind(&self) -> AlertKind {
        AlertKind::MemoryUsage
    }

    fn template_source(&self) -> &'static str {
        scripts::MEMORY_USAGE
    }

    fn script_fields(&self, config: &TaskConfig) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("metric".into(), json!(MEMORY_METRIC));
        if let Some(m) = settings(config) {
            fields.insert(
                "dyno_filter".into(),
                json!(DynoSelector::from_class(&m.dyno_class).pattern()),
            );
            fields.insert("crit".into(), json!(m.critical_mb));
            fields.insert("warn".into(), json!(m.warning_mb));
            fields.insert("window".into(), json!(m.window));
            fields.insert("every".into(), json!(m.every));
        }
        fields
    }

    fn encode_fields(&self, config: &TaskConfig, bag: &mut VariableBag) -> Result<(), VarError> {
        bag.put_str("metric", MEMORY_METRIC);
        if let Some(m) = settings(config) {
            let selector = DynoSelector::from_class(&m.dyno_class);
            bag.put_str("dynotyperequest", selector.class_name());
            bag.put_str("dynotype", &selector.pattern());
            bag.put_int("crit", m.critical_mb);
            bag.put_int("warn", m.warning_mb);
            bag.put_str("window", &m.window);
            bag.put_str("every", &m.every);
        }
        Ok(())
    }

    fn decode(&self, bag: &VariableBag) -> TaskConfig {
        let class = bag.str_value("dynotyperequest");
        decode_envelope(
            bag,
            KindSettings::MemoryUsage(MemorySettings {
                dyno_class: DynoSelector::from_class(&class).class_name().to_string(),
                critical_mb: bag.int_value("crit"),
                warning_mb: bag.int_value("warn"),
                window: bag.str_value("window"),
                every: bag.str_value("every"),
            }),
        )
    }
}
