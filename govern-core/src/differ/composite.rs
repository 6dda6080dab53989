//! Field-by-field and method-by-method diffing of structs and interfaces.
//!
//! Only exported members are indexed. Each side is indexed once, then the
//! removed, added and common members are walked in declaration order:
//! removals are major, additions are minor, common members recurse.

use std::collections::HashMap;

use tracing::trace;

use crate::differ::changes::{ChangeKind, Outcome};
use crate::differ::comparator::TypeComparator;
use crate::differ::guard::ComparisonPair;
use crate::types::{Field, Method, TypeId};

impl TypeComparator<'_> {
    pub(super) fn compare_structs(
        &self,
        old: TypeId,
        new: TypeId,
        old_fields: &[Field],
        new_fields: &[Field],
        guard: Option<&ComparisonPair<'_>>,
    ) -> Outcome {
        let pair = ComparisonPair::new(old, new, guard);
        if pair.is_repeat() {
            trace!(%old, %new, depth = pair.depth(), "struct pair already open");
            return Outcome::identical();
        }

        let old_by_name: HashMap<&str, &Field> = old_fields
            .iter()
            .filter(|f| f.exported)
            .map(|f| (f.name.as_str(), f))
            .collect();
        let new_by_name: HashMap<&str, &Field> = new_fields
            .iter()
            .filter(|f| f.exported)
            .map(|f| (f.name.as_str(), f))
            .collect();

        let mut outcome = Outcome::identical();

        // Removed fields (breaking)
        for field in old_fields.iter().filter(|f| f.exported) {
            if !new_by_name.contains_key(field.name.as_str()) {
                outcome.merge(Outcome::change(
                    ChangeKind::FieldRemoved,
                    format!("field missing: {:?}", field.name),
                ));
            }
        }

        // Added fields
        for field in new_fields.iter().filter(|f| f.exported) {
            if !old_by_name.contains_key(field.name.as_str()) {
                outcome.merge(Outcome::change(
                    ChangeKind::FieldAdded,
                    format!("field added: {:?}", field.name),
                ));
            }
        }

        // Fields on both sides
        for x in old_fields.iter().filter(|f| f.exported) {
            let Some(y) = new_by_name.get(x.name.as_str()) else {
                continue;
            };

            if x.embedded != y.embedded {
                outcome.merge(Outcome::change(
                    ChangeKind::FieldEmbeddingMismatch,
                    format!(
                        "field {:?} embedded mismatch: {} != {}",
                        x.name, x.embedded, y.embedded
                    ),
                ));
                continue;
            }
            if x.tag != y.tag {
                outcome.merge(Outcome::change(
                    ChangeKind::FieldTagMismatch,
                    format!("field {:?} tag mismatch: {:?} != {:?}", x.name, x.tag, y.tag),
                ));
                continue;
            }

            outcome.merge(
                self.compare(x.ty, y.ty, Some(&pair))
                    .within(format!("field {:?}", x.name)),
            );
        }

        outcome
    }

    pub(super) fn compare_interfaces(
        &self,
        old: TypeId,
        new: TypeId,
        old_methods: &[Method],
        new_methods: &[Method],
        guard: Option<&ComparisonPair<'_>>,
    ) -> Outcome {
        let pair = ComparisonPair::new(old, new, guard);
        if pair.is_repeat() {
            trace!(%old, %new, depth = pair.depth(), "interface pair already open");
            return Outcome::identical();
        }

        let old_by_id: HashMap<String, &Method> = old_methods
            .iter()
            .filter(|m| m.exported)
            .map(|m| (m.id(), m))
            .collect();
        let new_by_id: HashMap<String, &Method> = new_methods
            .iter()
            .filter(|m| m.exported)
            .map(|m| (m.id(), m))
            .collect();

        let mut outcome = Outcome::identical();

        // Removed methods (breaking)
        for method in old_methods.iter().filter(|m| m.exported) {
            if !new_by_id.contains_key(&method.id()) {
                outcome.merge(Outcome::change(
                    ChangeKind::MethodRemoved,
                    format!("method missing: {:?}", method.id()),
                ));
            }
        }

        // Added methods
        for method in new_methods.iter().filter(|m| m.exported) {
            if !old_by_id.contains_key(&method.id()) {
                outcome.merge(Outcome::change(
                    ChangeKind::MethodAdded,
                    format!("method added: {:?}", method.id()),
                ));
            }
        }

        // Methods on both sides
        for x in old_methods.iter().filter(|m| m.exported) {
            let id = x.id();
            let Some(y) = new_by_id.get(&id) else {
                continue;
            };
            outcome.merge(
                self.compare(x.signature, y.signature, Some(&pair))
                    .within(format!("method {:?}", id)),
            );
        }

        outcome
    }
}
