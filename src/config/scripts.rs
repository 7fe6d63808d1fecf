//! Rule script rendering configuration.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    /// Dashboard link added to rate-anomaly alert details. `{fqdn}` is
    /// replaced with the task's display host. No link when unset.
    pub dashboard_url: Option<String>,
}
