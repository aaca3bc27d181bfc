use serde::{Deserialize, Serialize};

/// Resolver configuration
///
/// Mirrors the `object_resolver` configuration block of the hosting application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Metadata tag holding alternate source names for a field.
    /// `None` disables alternate-name lookup.
    pub serialized_name_tag: Option<String>,
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the alternate-name metadata tag
    pub fn serialized_name_tag(mut self, tag: &str) -> Self {
        self.serialized_name_tag = Some(tag.to_string());
        self
    }

    /// Parse from a JSON configuration block
    ///
    /// Format: `{"serialized_name_tag": "SerializedName"}`; missing keys keep defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, String> {
        let config: Self = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if let Some(tag) = &self.serialized_name_tag {
            if tag.trim().is_empty() {
                return Err("serialized_name_tag cannot be blank".to_string());
            }
        }

        Ok(())
    }
}

/// Options fixed for the whole recursive tree of one `resolve_object` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionFlags {
    /// Fail with `UnableToSetId` when an identity cannot be written.
    pub error_if_cant_set_id: bool,
    /// Look up targets in the store and stage every resolved entity.
    pub persist: bool,
    /// Use the given class identifier verbatim.
    pub skip_resolving_class_name: bool,
}

impl ResolutionFlags {
    pub const ERROR_IF_CANT_SET_ID: u8 = 0b0001;
    pub const PERSIST: u8 = 0b0010;
    pub const SKIP_RESOLVING_CLASS_NAME: u8 = 0b0100;

    /// All options cleared: transient resolution, identity mismatches skipped.
    pub const fn none() -> Self {
        Self {
            error_if_cant_set_id: false,
            persist: false,
            skip_resolving_class_name: false,
        }
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self {
            error_if_cant_set_id: bits & Self::ERROR_IF_CANT_SET_ID != 0,
            persist: bits & Self::PERSIST != 0,
            skip_resolving_class_name: bits & Self::SKIP_RESOLVING_CLASS_NAME != 0,
        }
    }

    pub const fn bits(&self) -> u8 {
        let mut bits = 0;
        if self.error_if_cant_set_id {
            bits |= Self::ERROR_IF_CANT_SET_ID;
        }
        if self.persist {
            bits |= Self::PERSIST;
        }
        if self.skip_resolving_class_name {
            bits |= Self::SKIP_RESOLVING_CLASS_NAME;
        }
        bits
    }

    pub fn error_if_cant_set_id(mut self, enabled: bool) -> Self {
        self.error_if_cant_set_id = enabled;
        self
    }

    pub fn persist(mut self, enabled: bool) -> Self {
        self.persist = enabled;
        self
    }

    pub fn skip_resolving_class_name(mut self, enabled: bool) -> Self {
        self.skip_resolving_class_name = enabled;
        self
    }
}

impl Default for ResolutionFlags {
    fn default() -> Self {
        Self::from_bits(Self::PERSIST | Self::ERROR_IF_CANT_SET_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_disables_alternate_names() {
        let config = ResolverConfig::default();
        assert_eq!(config.serialized_name_tag, None);
    }

    #[test]
    fn test_config_from_json() {
        let config = ResolverConfig::from_json_str(r#"{"serialized_name_tag": "SerializedName"}"#)
            .unwrap();
        assert_eq!(config.serialized_name_tag.as_deref(), Some("SerializedName"));

        let config = ResolverConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ResolverConfig::default());
    }

    #[test]
    fn test_invalid_config() {
        assert!(ResolverConfig::from_json_str(r#"{"serialized_name_tag": "  "}"#).is_err());
        assert!(ResolverConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn test_default_flags() {
        let flags = ResolutionFlags::default();
        assert!(flags.persist);
        assert!(flags.error_if_cant_set_id);
        assert!(!flags.skip_resolving_class_name);
        assert_eq!(flags.bits(), 0b0011);
    }

    #[test]
    fn test_flags_bits_round_trip() {
        for bits in 0..8u8 {
            assert_eq!(ResolutionFlags::from_bits(bits).bits(), bits);
        }
        assert_eq!(ResolutionFlags::from_bits(0), ResolutionFlags::none());
    }

    #[test]
    fn test_flags_builder() {
        let flags = ResolutionFlags::none().persist(true).skip_resolving_class_name(true);
        assert_eq!(
            flags.bits(),
            ResolutionFlags::PERSIST | ResolutionFlags::SKIP_RESOLVING_CLASS_NAME
        );
    }
}
