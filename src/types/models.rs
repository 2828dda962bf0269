//! Model catalog: families, context windows, and execution placement.

/// Model family, derived from the model id.
///
/// The fallback chain walks families in the order flash, pro, normal,
/// other, skipping the family of the model that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFamily {
    /// Latency-optimized models.
    Flash,
    /// Capability-optimized models.
    Pro,
    /// Baseline generation models.
    Normal,
    /// Anything else, including on-device models.
    Other,
}

impl ModelFamily {
    /// Family ordering used by the fallback chain.
    pub const FALLBACK_ORDER: [ModelFamily; 4] = [
        ModelFamily::Flash,
        ModelFamily::Pro,
        ModelFamily::Normal,
        ModelFamily::Other,
    ];
}

/// Static description of a model the core can route to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    /// Model id as used on the wire.
    pub id: &'static str,
    /// Family the model belongs to.
    pub family: ModelFamily,
    /// Maximum prompt tokens the model accepts.
    pub context_window: u32,
    /// True when the model executes on-device.
    pub local: bool,
}

/// Models the core knows how to route to, in preference order within
/// each family.
pub const MODEL_CATALOG: &[ModelSpec] = &[
    ModelSpec {
        id: "gemini-2.0-flash",
        family: ModelFamily::Flash,
        context_window: 1_048_576,
        local: false,
    },
    ModelSpec {
        id: "gemini-1.5-flash",
        family: ModelFamily::Flash,
        context_window: 1_048_576,
        local: false,
    },
    ModelSpec {
        id: "gemini-1.5-pro",
        family: ModelFamily::Pro,
        context_window: 2_097_152,
        local: false,
    },
    ModelSpec {
        id: "gemini-pro",
        family: ModelFamily::Normal,
        context_window: 32_768,
        local: false,
    },
    ModelSpec {
        id: "gemini-nano",
        family: ModelFamily::Other,
        context_window: 8_192,
        local: true,
    },
];

/// Looks up a model in the catalog.
pub fn find_model(id: &str) -> Option<&'static ModelSpec> {
    MODEL_CATALOG.iter().find(|m| m.id == id)
}

/// The family of a model id.
///
/// Catalog entries are authoritative; unknown ids are classified from
/// the id text.
pub fn model_family(id: &str) -> ModelFamily {
    if let Some(spec) = find_model(id) {
        return spec.family;
    }
    let lowered = id.to_lowercase();
    if lowered.contains("flash") {
        ModelFamily::Flash
    } else if lowered.contains("pro") {
        ModelFamily::Pro
    } else if lowered.starts_with("gemini") {
        ModelFamily::Normal
    } else {
        ModelFamily::Other
    }
}

/// The context window of a model, with a conservative default for
/// unknown ids.
pub fn context_window(id: &str) -> u32 {
    find_model(id).map(|m| m.context_window).unwrap_or(32_768)
}

/// First catalog model of the given family, preferring cloud execution.
pub fn family_representative(family: ModelFamily) -> Option<&'static ModelSpec> {
    MODEL_CATALOG
        .iter()
        .find(|m| m.family == family && !m.local)
        .or_else(|| MODEL_CATALOG.iter().find(|m| m.family == family))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lookup() {
        assert!(find_model("gemini-1.5-pro").is_some());
        assert!(find_model("gpt-oops").is_none());
    }

    #[test]
    fn test_family_from_catalog() {
        assert_eq!(model_family("gemini-pro"), ModelFamily::Normal);
        assert_eq!(model_family("gemini-1.5-flash"), ModelFamily::Flash);
        assert_eq!(model_family("gemini-nano"), ModelFamily::Other);
    }

    #[test]
    fn test_family_from_unknown_id() {
        assert_eq!(model_family("gemini-9.9-flash-exp"), ModelFamily::Flash);
        assert_eq!(model_family("gemini-9.9-pro-exp"), ModelFamily::Pro);
        assert_eq!(model_family("gemini-9.9"), ModelFamily::Normal);
        assert_eq!(model_family("llama-3"), ModelFamily::Other);
    }

    #[test]
    fn test_unknown_window_is_conservative() {
        assert_eq!(context_window("mystery-model"), 32_768);
    }

    #[test]
    fn test_family_representative_prefers_cloud() {
        let flash = family_representative(ModelFamily::Flash).unwrap();
        assert!(!flash.local);
        let other = family_representative(ModelFamily::Other).unwrap();
        assert_eq!(other.id, "gemini-nano");
    }
}
