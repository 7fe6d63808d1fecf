//! Static lookup tables from user-facing levels to engine-facing values.

/// Map a tolerance level to the sigma threshold used by rate-anomaly scripts.
///
/// Unknown levels yield `None`, meaning "no threshold configured".
pub fn tolerance_to_sigma(level: &str) -> Option<f64> {
    match level {
        "low" => Some(0.5),
        "medium" => Some(1.0),
        "high" => Some(1.5),
        _ => None,
    }
}

/// Render a sigma the way the script expects it (`0.5`, `1.0`, `1.5`).
pub fn sigma_literal(sigma: Option<f64>) -> String {
    sigma.map(|s| format!("{s:.1}")).unwrap_or_default()
}

/// Dyno class selector for memory-usage scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DynoSelector {
    /// Every dyno of the app.
    All,
    /// Web dynos: names without a `--` class segment.
    Web,
    /// Dynos whose name contains the given class.
    Class(String),
}

impl DynoSelector {
    /// An empty class is treated as `all`.
    pub fn from_class(class: &str) -> Self {
        match class {
            "" | "all" => DynoSelector::All,
            "web" => DynoSelector::Web,
            other => DynoSelector::Class(other.to_string()),
        }
    }

    pub fn class_name(&self) -> &str {
        match self {
            DynoSelector::All => "all",
            DynoSelector::Web => "web",
            DynoSelector::Class(class) => class,
        }
    }

    /// Filter fragment placed after `"dyno"` in the script's query.
    pub fn pattern(&self) -> String {
        match self {
            DynoSelector::All => " =~ /.*/ ".to_string(),
            DynoSelector::Web => " !~ /--/ ".to_string(),
            DynoSelector::Class(class) => format!(" =~ /{class}/ "),
        }
    }
}
