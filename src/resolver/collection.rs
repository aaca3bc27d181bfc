use super::access::ValueAccessor;
use super::node::{NodeResolver, Resolved};
use crate::core::{ResolveError, Result, Value};
use crate::entity::EntityHandle;
use crate::metadata::FieldDescriptor;
use serde_json::Value as JsonValue;
use tracing::{Level, event};

/// Brings one collection field of a target in line with a source list.
///
/// Members are matched to source elements by identity. Matched members are
/// re-resolved and replaced, unmatched ones removed, and unmatched source
/// elements resolved and added. Each identity ends up in the collection at
/// most once; the first source element carrying it wins.
pub(crate) struct CollectionReconciler<'a, 'r> {
    resolver: &'a NodeResolver<'r>,
    class: &'a str,
    field: &'a FieldDescriptor,
}

impl<'a, 'r> CollectionReconciler<'a, 'r> {
    pub(crate) fn new(resolver: &'a NodeResolver<'r>, class: &'a str, field: &'a FieldDescriptor) -> Self {
        Self {
            resolver,
            class,
            field,
        }
    }

    pub(crate) fn reconcile(&self, items: &[&JsonValue], owner: &EntityHandle) -> Result<()> {
        let Some((add, remove)) = self.field.mutators() else {
            return Ok(());
        };

        let source_ids = items
            .iter()
            .map(|node| ValueAccessor::identity(node))
            .collect::<Result<Vec<_>>>()?;

        let mut kept: Vec<Value> = Vec::new();
        let (mut added, mut updated, mut removed) = (0usize, 0usize, 0usize);

        // Snapshot: mutators change the live collection while we walk it.
        for member in owner.collection(&self.field.name)? {
            let matched = member
                .identity()?
                .filter(|id| !kept.iter().any(|seen| seen.identical(id)))
                .and_then(|id| {
                    source_ids
                        .iter()
                        .position(|source| source.as_ref().is_some_and(|source| source.identical(&id)))
                        .map(|pos| (id, pos))
                });

            let Some((id, pos)) = matched else {
                self.mutate(owner, remove, member)?;
                removed += 1;
                continue;
            };

            let replacement = self.resolve_element(items[pos])?;
            self.mutate(owner, remove, member)?;
            match replacement {
                Some(entity) => {
                    self.mutate(owner, add, entity)?;
                    kept.push(id);
                    updated += 1;
                }
                None => removed += 1,
            }
        }

        for (node, id) in items.iter().zip(&source_ids) {
            if id.as_ref().is_some_and(|id| kept.iter().any(|seen| seen.identical(id))) {
                continue;
            }
            let Some(entity) = self.resolve_element(node)? else {
                continue;
            };

            self.mutate(owner, add, entity)?;
            if let Some(id) = id {
                kept.push(id.clone());
            }
            added += 1;
        }

        event!(
            Level::DEBUG,
            class = self.class,
            field = %self.field.name,
            added,
            updated,
            removed,
            "collection reconciled"
        );
        Ok(())
    }

    fn resolve_element(&self, node: &JsonValue) -> Result<Option<EntityHandle>> {
        let element_class = self.field.target_class().unwrap_or_default();
        match self.resolver.resolve(node, element_class, None)? {
            Some(Resolved::Entity(entity)) => Ok(Some(entity)),
            Some(Resolved::Plain(_)) => Err(ResolveError::set_value(
                self.class,
                &self.field.name,
                "collection element has no class",
            )),
            None => Ok(None),
        }
    }

    fn mutate(&self, owner: &EntityHandle, mutator: &str, item: EntityHandle) -> Result<()> {
        event!(Level::TRACE, class = self.class, mutator, "collection mutator");
        owner
            .write()?
            .apply_mutator(mutator, item)
            .map_err(|reason| ResolveError::set_value(self.class, &self.field.name, reason))
    }
}
