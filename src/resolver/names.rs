use crate::core::Result;
use crate::metadata::inflector::{camel_to_snake, snake_to_camel};
use crate::metadata::{AlternateNameSource, DescriptorCache, EntityMetadataProvider};

/// Candidate source names for a target field.
pub(crate) struct PropertyNameResolver<'r> {
    cache: &'r DescriptorCache,
    metadata: &'r dyn EntityMetadataProvider,
    alternates: Option<(&'r dyn AlternateNameSource, &'r str)>,
}

impl<'r> PropertyNameResolver<'r> {
    pub(crate) fn new(
        cache: &'r DescriptorCache,
        metadata: &'r dyn EntityMetadataProvider,
        alternates: Option<(&'r dyn AlternateNameSource, &'r str)>,
    ) -> Self {
        Self {
            cache,
            metadata,
            alternates,
        }
    }

    /// Alternate names declared for `class::field` first, then `field` itself.
    pub(crate) fn names_for(&self, class: &str, field: &str) -> Result<Vec<String>> {
        // Fails with ClassNotFound before any lookup happens.
        self.cache.get_or_load(class, self.metadata)?;

        let mut names = match self.alternates {
            Some((source, tag)) => source.alternate_names(class, field, tag),
            None => Vec::new(),
        };
        names.push(field.to_string());
        Ok(names)
    }
}

/// Lexical spellings tried for one name: as declared, camelCase, then snake_case.
pub(crate) fn variants(name: &str) -> [String; 3] {
    [name.to_string(), snake_to_camel(name), camel_to_snake(name)]
}
