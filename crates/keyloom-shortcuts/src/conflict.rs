//! Conflict detection and resolution for shortcuts
//!
//! Every place that has to pick one shortcut out of several candidates uses
//! the same ordering: higher priority first, then context-specific before
//! global, then earlier registration.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{Platform, ShortcutConflict, ShortcutContext, ShortcutDefinition};
use crate::parser;

/// Order two candidates; the smaller one wins
pub fn compare_precedence(a: &ShortcutDefinition, b: &ShortcutDefinition) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| a.context.is_global().cmp(&b.context.is_global()))
        .then_with(|| a.registration_order.cmp(&b.registration_order))
}

/// Detects conflicting shortcuts and picks winners
pub struct ConflictDetector;

impl ConflictDetector {
    /// Detect all conflicts among the enabled definitions.
    ///
    /// Definitions are grouped by normalized keys and context. A group with
    /// two or more members is a conflict, and every context-specific group is
    /// additionally checked against the winning global definition sharing its
    /// keys, so a pair of globals is reported once, in the global entry.
    /// Definitions whose keys fail to parse never conflict.
    pub fn detect<'a, I>(definitions: I, platform: Platform) -> Vec<ShortcutConflict>
    where
        I: IntoIterator<Item = &'a ShortcutDefinition>,
    {
        let mut groups: Vec<((String, ShortcutContext), Vec<&ShortcutDefinition>)> = Vec::new();
        let mut group_index: HashMap<(String, ShortcutContext), usize> = HashMap::new();

        for definition in definitions.into_iter().filter(|d| d.enabled) {
            let keys = match parser::normalize_key_combo_for(&definition.keys, platform) {
                Ok(keys) => keys,
                Err(_) => continue,
            };
            let group_key = (keys, definition.context);
            match group_index.get(&group_key) {
                Some(&idx) => groups[idx].1.push(definition),
                None => {
                    group_index.insert(group_key.clone(), groups.len());
                    groups.push((group_key, vec![definition]));
                }
            }
        }

        let mut conflicts = Vec::new();
        for ((keys, context), members) in &groups {
            let mut sharing: Vec<&ShortcutDefinition> = Vec::new();
            if !context.is_global() {
                if let Some(&idx) = group_index.get(&(keys.clone(), ShortcutContext::Global)) {
                    sharing.extend(
                        groups[idx]
                            .1
                            .iter()
                            .copied()
                            .min_by(|a, b| compare_precedence(a, b)),
                    );
                }
            }
            sharing.extend(members.iter().copied());

            if sharing.len() < 2 {
                continue;
            }

            sharing.sort_by_key(|d| d.registration_order);
            let winner = sharing
                .iter()
                .copied()
                .min_by(|a, b| compare_precedence(a, b));

            if let Some(winner) = winner {
                conflicts.push(ShortcutConflict {
                    keys: keys.clone(),
                    context: *context,
                    shortcut_ids: sharing.iter().map(|d| d.id.clone()).collect(),
                    winner_id: winner.id.clone(),
                });
            }
        }

        conflicts
    }

    /// Whether registering `keys` in `context` would collide with an enabled
    /// definition other than `exclude_id`
    pub fn has_conflict<'a, I>(
        definitions: I,
        keys: &str,
        context: ShortcutContext,
        exclude_id: Option<&str>,
        platform: Platform,
    ) -> bool
    where
        I: IntoIterator<Item = &'a ShortcutDefinition>,
    {
        let normalized = match parser::normalize_key_combo_for(keys, platform) {
            Ok(normalized) => normalized,
            Err(_) => return false,
        };

        definitions.into_iter().any(|d| {
            d.enabled
                && Some(d.id.as_str()) != exclude_id
                && d.context.overlaps(&context)
                && parser::normalize_key_combo_for(&d.keys, platform).as_deref() == Ok(normalized.as_str())
        })
    }

    /// Pick the definition that would handle `keys` in `context`
    pub fn resolve<'a, I>(
        definitions: I,
        keys: &str,
        context: ShortcutContext,
        platform: Platform,
    ) -> Option<&'a ShortcutDefinition>
    where
        I: IntoIterator<Item = &'a ShortcutDefinition>,
    {
        let normalized = parser::normalize_key_combo_for(keys, platform).ok()?;

        definitions
            .into_iter()
            .filter(|d| d.enabled && (d.context == context || d.context.is_global()))
            .filter(|d| {
                parser::normalize_key_combo_for(&d.keys, platform).as_deref() == Ok(normalized.as_str())
            })
            .min_by(|a, b| compare_precedence(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShortcutRegistrationOptions;

    fn definition(id: &str, keys: &str, context: ShortcutContext, priority: i32, order: u64) -> ShortcutDefinition {
        ShortcutDefinition::from_options(
            ShortcutRegistrationOptions::new(id, keys)
                .with_context(context)
                .with_priority(priority),
            order,
        )
    }

    #[test]
    fn test_precedence_priority_first() {
        let low = definition("low", "k", ShortcutContext::Chat, 0, 0);
        let high = definition("high", "k", ShortcutContext::Global, 1, 1);
        assert_eq!(compare_precedence(&high, &low), Ordering::Less);
    }

    #[test]
    fn test_precedence_specific_over_global() {
        let global = definition("global", "k", ShortcutContext::Global, 0, 0);
        let chat = definition("chat", "k", ShortcutContext::Chat, 0, 1);
        assert_eq!(compare_precedence(&chat, &global), Ordering::Less);
    }

    #[test]
    fn test_precedence_registration_order() {
        let first = definition("first", "k", ShortcutContext::Chat, 0, 0);
        let second = definition("second", "k", ShortcutContext::Chat, 0, 1);
        assert_eq!(compare_precedence(&first, &second), Ordering::Less);
    }

    #[test]
    fn test_detect_same_context() {
        let defs = vec![
            definition("a", "ctrl+k", ShortcutContext::Chat, 0, 0),
            definition("b", "K+Ctrl", ShortcutContext::Chat, 1, 1),
        ];
        let conflicts = ConflictDetector::detect(&defs, Platform::Linux);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].shortcut_ids, vec!["a", "b"]);
        assert_eq!(conflicts[0].winner_id, "b");
    }

    #[test]
    fn test_detect_global_against_specific() {
        let defs = vec![
            definition("a", "mod+k", ShortcutContext::Global, 0, 0),
            definition("b", "mod+k", ShortcutContext::Chat, 0, 1),
        ];
        let conflicts = ConflictDetector::detect(&defs, Platform::Linux);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].context, ShortcutContext::Chat);
        assert_eq!(conflicts[0].winner_id, "b");
    }

    #[test]
    fn test_global_pair_reported_once_beside_specific() {
        let defs = vec![
            definition("a", "mod+k", ShortcutContext::Global, 0, 0),
            definition("a2", "mod+k", ShortcutContext::Global, 0, 1),
            definition("b", "mod+k", ShortcutContext::Chat, 0, 2),
        ];
        let conflicts = ConflictDetector::detect(&defs, Platform::Linux);
        assert_eq!(conflicts.len(), 2);
        assert_eq!(conflicts[0].context, ShortcutContext::Global);
        assert_eq!(conflicts[0].shortcut_ids, vec!["a", "a2"]);
        assert_eq!(conflicts[0].winner_id, "a");
        assert_eq!(conflicts[1].context, ShortcutContext::Chat);
        assert_eq!(conflicts[1].shortcut_ids, vec!["a", "b"]);
        assert_eq!(conflicts[1].winner_id, "b");

        let covering_a2 = conflicts
            .iter()
            .filter(|c| c.shortcut_ids.iter().any(|id| id == "a2"))
            .count();
        assert_eq!(covering_a2, 1);
    }

    #[test]
    fn test_detect_ignores_different_contexts() {
        let defs = vec![
            definition("a", "k", ShortcutContext::Chat, 0, 0),
            definition("b", "k", ShortcutContext::Editor, 0, 1),
        ];
        assert!(ConflictDetector::detect(&defs, Platform::Linux).is_empty());
    }

    #[test]
    fn test_detect_skips_malformed_keys() {
        let defs = vec![
            definition("a", "ctrl+", ShortcutContext::Global, 0, 0),
            definition("b", "ctrl+", ShortcutContext::Global, 0, 1),
        ];
        assert!(ConflictDetector::detect(&defs, Platform::Linux).is_empty());
    }

    #[test]
    fn test_mod_conflicts_with_ctrl_off_apple() {
        let defs = vec![
            definition("a", "mod+k", ShortcutContext::Global, 0, 0),
            definition("b", "ctrl+k", ShortcutContext::Global, 0, 1),
        ];
        assert_eq!(ConflictDetector::detect(&defs, Platform::Windows).len(), 1);
        assert!(ConflictDetector::detect(&defs, Platform::MacOs).is_empty());
    }

    #[test]
    fn test_has_conflict_excludes_self() {
        let defs = vec![definition("a", "mod+k", ShortcutContext::Global, 0, 0)];
        assert!(ConflictDetector::has_conflict(&defs, "mod+k", ShortcutContext::Chat, None, Platform::Linux));
        assert!(!ConflictDetector::has_conflict(
            &defs,
            "mod+k",
            ShortcutContext::Chat,
            Some("a"),
            Platform::Linux
        ));
    }

    #[test]
    fn test_resolve_prefers_context() {
        let defs = vec![
            definition("a", "mod+k", ShortcutContext::Global, 0, 0),
            definition("b", "mod+k", ShortcutContext::Chat, 0, 1),
        ];
        let winner = ConflictDetector::resolve(&defs, "mod+k", ShortcutContext::Chat, Platform::Linux);
        assert_eq!(winner.map(|d| d.id.as_str()), Some("b"));

        let winner = ConflictDetector::resolve(&defs, "mod+k", ShortcutContext::Editor, Platform::Linux);
        assert_eq!(winner.map(|d| d.id.as_str()), Some("a"));
    }
}
