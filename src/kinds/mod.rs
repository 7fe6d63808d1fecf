//! Per-kind descriptors.
//!
//! Every alert kind runs through the same lifecycle. What differs is captured
//! by an [`AlertSpec`]: the script template, the values substituted into it
//! and the variable bag registered next to it.

mod events;
mod memory;
mod rate_anomaly;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::config::ScriptsConfig;
use crate::domain::task::split_emails;
use crate::domain::{AlertKind, KindSettings, NotificationTargets, TaskConfig, TaskId, TaskStatus};
use crate::error::Result;
use crate::template::{Template, TemplateError};
use crate::vars::{VarError, VariableBag};

pub use events::{CrashEventSpec, ReleaseEventSpec};
pub use memory::MemoryUsageSpec;
pub use rate_anomaly::RateAnomalySpec;

/// Compiled rule text, handed to the engine as-is and never parsed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleScript(String);

impl RuleScript {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for RuleScript {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl fmt::Display for RuleScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strategy describing one alert kind.
pub trait AlertSpec: Send + Sync {
    fn kind(&self) -> AlertKind;

    fn template_source(&self) -> &'static str;

    /// Kind-specific values substituted into the script, merged over the
    /// shared envelope (`app`, `slack`, `post`, `emails`).
    fn script_fields(&self, config: &TaskConfig) -> Map<String, Value>;

    /// Add kind-specific entries to a bag already holding the shared envelope.
    fn encode_fields(
        &self,
        config: &TaskConfig,
        bag: &mut VariableBag,
    ) -> std::result::Result<(), VarError>;

    /// Rebuild a configuration from a bag. Never fails; missing entries decode
    /// to zero values.
    fn decode(&self, bag: &VariableBag) -> TaskConfig;
}

// ============================================================================
// Shared envelope
// ============================================================================

fn envelope_context(config: &TaskConfig) -> Map<String, Value> {
    let targets = &config.targets;
    let mut context = Map::new();
    context.insert("app".into(), json!(config.app));
    context.insert(
        "slack".into(),
        json!(targets.chat_channel.clone().unwrap_or_default()),
    );
    context.insert(
        "post".into(),
        json!(targets.webhook_url.clone().unwrap_or_default()),
    );
    context.insert("emails".into(), json!(targets.emails));
    context
}

/// Build the complete bag for a task.
pub fn encode(
    spec: &dyn AlertSpec,
    id: &TaskId,
    config: &TaskConfig,
) -> std::result::Result<VariableBag, VarError> {
    let mut bag = VariableBag::new();
    bag.put_str("type", "batch");
    bag.put_str("id", id.as_str());
    bag.put_str("app", &config.app);
    if let Some(slack) = &config.targets.chat_channel {
        bag.put_str("slack", slack);
    }
    if let Some(post) = &config.targets.webhook_url {
        bag.put_str("post", post);
    }
    bag.put_str("email", &config.targets.email_list());
    spec.encode_fields(config, &mut bag)?;
    Ok(bag)
}

/// Decode the shared envelope of a bag around the given settings.
fn decode_envelope(bag: &VariableBag, settings: KindSettings) -> TaskConfig {
    let slack = bag.str_value("slack");
    let post = bag.str_value("post");
    TaskConfig {
        app: bag.str_value("app"),
        targets: NotificationTargets {
            chat_channel: (!slack.is_empty()).then_some(slack),
            webhook_url: (!post.is_empty()).then_some(post),
            emails: split_emails(&bag.str_value("email")),
        },
        settings,
        status: TaskStatus::Enabled,
    }
}

// ============================================================================
// Registry
// ============================================================================

/// A kind descriptor together with its parsed template.
pub struct CompiledKind {
    spec: Box<dyn AlertSpec>,
    template: Template,
}

impl CompiledKind {
    pub fn new(spec: Box<dyn AlertSpec>) -> std::result::Result<Self, TemplateError> {
        let template = Template::parse(spec.template_source())?;
        Ok(Self { spec, template })
    }

    pub fn kind(&self) -> AlertKind {
        self.spec.kind()
    }

    pub fn spec(&self) -> &dyn AlertSpec {
        self.spec.as_ref()
    }

    /// Render the script for a configuration.
    pub fn compile(&self, config: &TaskConfig) -> Result<RuleScript> {
        let mut context = envelope_context(config);
        context.extend(self.spec.script_fields(config));
        Ok(RuleScript(self.template.render(&Value::Object(context))?))
    }

    pub fn encode(&self, id: &TaskId, config: &TaskConfig) -> Result<VariableBag> {
        Ok(encode(self.spec(), id, config)?)
    }

    pub fn decode(&self, bag: &VariableBag) -> TaskConfig {
        self.spec.decode(bag)
    }
}

impl fmt::Debug for CompiledKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledKind")
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

/// All known kinds, with templates parsed up front.
#[derive(Debug, Clone)]
pub struct KindRegistry {
    kinds: HashMap<AlertKind, Arc<CompiledKind>>,
}

impl KindRegistry {
    /// Registry of the four built-in kinds with default script options.
    pub fn standard() -> std::result::Result<Self, TemplateError> {
        Self::new(&ScriptsConfig::default())
    }

    /// Registry of the four built-in kinds.
    ///
    /// Fails if any bundled template does not parse.
    pub fn new(config: &ScriptsConfig) -> std::result::Result<Self, TemplateError> {
        let specs: Vec<Box<dyn AlertSpec>> = vec![
            Box::new(RateAnomalySpec::new(config.dashboard_url.clone())),
            Box::new(CrashEventSpec),
            Box::new(MemoryUsageSpec),
            Box::new(ReleaseEventSpec),
        ];
        let mut kinds = HashMap::new();
        for spec in specs {
            let compiled = CompiledKind::new(spec)?;
            kinds.insert(compiled.kind(), Arc::new(compiled));
        }
        Ok(Self { kinds })
    }

    pub fn get(&self, kind: AlertKind) -> Option<Arc<CompiledKind>> {
        self.kinds.get(&kind).cloned()
    }
}
