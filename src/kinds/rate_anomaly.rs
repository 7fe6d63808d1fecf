use serde_json::{json, Map, Value};

use super::{decode_envelope, AlertSpec};
use crate::domain::{sigma_literal, tolerance_to_sigma, AlertKind, KindSettings, TaskConfig};
use crate::template::scripts;
use crate::vars::{VarError, VarType, VariableBag};

/// Deviation of the router 5xx count from its norm, scaled by a tolerance.
#[derive(Debug, Clone, Default)]
pub struct RateAnomalySpec {
    dashboard_url: Option<String>,
}

impl RateAnomalySpec {
    /// `dashboard_url` may contain `{fqdn}`, replaced per task.
    pub fn new(dashboard_url: Option<String>) -> Self {
        Self { dashboard_url }
    }

    fn dashboard_link(&self, fqdn: &str) -> String {
        self.dashboard_url
            .as_deref()
            .map(|url| url.replace("{fqdn}", fqdn))
            .unwrap_or_default()
    }
}

fn settings(config: &TaskConfig) -> (&str, &str) {
    match &config.settings {
        KindSettings::RateAnomaly { tolerance, fqdn } => (
            tolerance.as_str(),
            fqdn.as_deref().unwrap_or(config.app.as_str()),
        ),
        _ => ("", config.app.as_str()),
    }
}

impl AlertSpec for RateAnomalySpec {
    fn kind(&self) -> AlertKind {
        AlertKind::RateAnomaly
    }

    fn template_source(&self) -> &'static str {
        scripts::RATE_ANOMALY
    }

    fn script_fields(&self, config: &TaskConfig) -> Map<String, Value> {
        let (tolerance, fqdn) = settings(config);
        let mut fields = Map::new();
        fields.insert("fqdn".into(), json!(fqdn));
        fields.insert("dashboard".into(), json!(self.dashboard_link(fqdn)));
        fields.insert(
            "sigma".into(),
            json!(sigma_literal(tolerance_to_sigma(tolerance))),
        );
        fields
    }

    fn encode_fields(&self, config: &TaskConfig, bag: &mut VariableBag) -> Result<(), VarError> {
        if let KindSettings::RateAnomaly { tolerance, fqdn } = &config.settings {
            bag.put_str("tolerance", tolerance);
            bag.put_str("fqdn", fqdn.as_deref().unwrap_or_default());
            bag.encode(
                "sigma",
                &sigma_literal(tolerance_to_sigma(tolerance)),
                VarType::Float,
            )?;
        }
        Ok(())
    }

    fn decode(&self, bag: &VariableBag) -> TaskConfig {
        let fqdn = bag.str_value("fqdn");
        decode_envelope(
            bag,
            KindSettings::RateAnomaly {
                tolerance: bag.str_value("tolerance"),
                fqdn: (!fqdn.is_empty()).then_some(fqdn),
            },
        )
    }
}
