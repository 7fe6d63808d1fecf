//! Event-driven kinds: crashes and releases. Neither carries settings of its
//! own beyond the notification targets.

use serde_json::{json, Map, Value};

use super::{decode_envelope, AlertSpec};
use crate::domain::{AlertKind, AppParts, KindSettings, TaskConfig};
use crate::template::scripts;
use crate::vars::{VarError, VariableBag};

/// Fires whenever the platform reports an app crash.
pub struct CrashEventSpec;

impl AlertSpec for CrashEventSpec {
    fn kind(&self) -> AlertKind {
        AlertKind::CrashEvent
    }

    fn template_source(&self) -> &'static str {
        scripts::CRASH_EVENT
    }

    fn script_fields(&self, config: &TaskConfig) -> Map<String, Value> {
        let parts = AppParts::parse(&config.app);
        let mut fields = Map::new();
        fields.insert("short_app".into(), json!(parts.short_app));
        fields.insert("dyno_type".into(), json!(parts.dyno_type));
        fields.insert("space".into(), json!(parts.space));
        fields
    }

    fn encode_fields(&self, _config: &TaskConfig, _bag: &mut VariableBag) -> Result<(), VarError> {
        Ok(())
    }

    fn decode(&self, bag: &VariableBag) -> TaskConfig {
        decode_envelope(bag, KindSettings::CrashEvent)
    }
}

/// Fires whenever a new image of the app is released.
pub struct ReleaseEventSpec;

impl AlertSpec for ReleaseEventSpec {
    fn kind(&self) -> AlertKind {
        AlertKind::ReleaseEvent
    }

    fn template_source(&self) -> &'static str {
        scripts::RELEASE_EVENT
    }

    fn script_fields(&self, _config: &TaskConfig) -> Map<String, Value> {
        Map::new()
    }

    fn encode_fields(&self, _config: &TaskConfig, _bag: &mut VariableBag) -> Result<(), VarError> {
        Ok(())
    }

    fn decode(&self, bag: &VariableBag) -> TaskConfig {
        decode_envelope(bag, KindSettings::ReleaseEvent)
    }
}
