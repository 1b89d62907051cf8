//! Property-based tests for parsing, conflict resolution and registration

use proptest::prelude::*;
use keyloom_shortcuts::*;

/// Strategy for generating modifier tokens with random casing
fn modifier_tokens_strategy() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(vec!["ctrl", "shift", "alt", "meta", "mod"], 0..=5)
}

/// Strategy for generating key names
fn key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (b'a'..=b'z').prop_map(|c| (c as char).to_string()),
        (b'0'..=b'9').prop_map(|c| (c as char).to_string()),
        Just("escape".to_string()),
        Just("enter".to_string()),
        Just("arrowdown".to_string()),
        Just("pageup".to_string()),
        (1u8..=12u8).prop_map(|n| format!("f{}", n)),
    ]
}

fn randomize_case(s: &str, mask: &[bool]) -> String {
    s.chars()
        .zip(mask.iter().cycle())
        .map(|(c, upper)| if *upper { c.to_ascii_uppercase() } else { c })
        .collect()
}

fn context_strategy() -> impl Strategy<Value = ShortcutContext> {
    prop::sample::select(ShortcutContext::ALL.to_vec())
}

proptest! {
    /// Normalization ignores modifier order and letter case
    #[test]
    fn prop_normalize_order_and_case_invariant(
        modifiers in modifier_tokens_strategy(),
        key in key_strategy(),
        mask in prop::collection::vec(any::<bool>(), 1..8),
        seed in any::<u64>(),
    ) {
        let mut tokens: Vec<String> = modifiers.iter().map(|m| m.to_string()).collect();
        tokens.push(key.clone());
        let original = tokens.join("+");

        let mut shuffled = tokens.clone();
        let len = shuffled.len();
        shuffled.rotate_left((seed as usize) % len);
        let reordered = randomize_case(&shuffled.join("+"), &mask);

        prop_assert_eq!(
            normalize_key_combo(&original).unwrap(),
            normalize_key_combo(&reordered).unwrap()
        );
    }

    /// Normalizing is idempotent
    #[test]
    fn prop_normalize_idempotent(modifiers in modifier_tokens_strategy(), key in key_strategy()) {
        let mut tokens: Vec<String> = modifiers.iter().map(|m| m.to_string()).collect();
        tokens.push(key);
        let once = normalize_key_combo(&tokens.join("+")).unwrap();
        let twice = normalize_key_combo(&once).unwrap();
        prop_assert_eq!(once, twice);
    }

    /// Two enabled shortcuts on the same keys in overlapping contexts produce
    /// one conflict, and swapping priorities swaps the winner
    #[test]
    fn prop_priority_swap_swaps_winner(
        key in key_strategy(),
        context_a in context_strategy(),
        same_context in any::<bool>(),
        low in -10i32..10,
        delta in 1i32..10,
    ) {
        let context_b = if same_context { context_a } else { ShortcutContext::Global };
        let keys = format!("ctrl+{}", key);
        let high = low + delta;

        let build = |priority_a: i32, priority_b: i32| {
            let mut registry = ShortcutRegistry::with_platform(Platform::Linux);
            let _ = registry
                .register(
                    ShortcutRegistrationOptions::new("a", keys.clone())
                        .with_context(context_a)
                        .with_priority(priority_a),
                )
                .unwrap();
            let _ = registry
                .register(
                    ShortcutRegistrationOptions::new("b", keys.clone())
                        .with_context(context_b)
                        .with_priority(priority_b),
                )
                .unwrap();
            registry.detect_conflicts()
        };

        let first = build(high, low);
        prop_assert_eq!(first.len(), 1);
        prop_assert_eq!(&first[0].shortcut_ids, &vec!["a".to_string(), "b".to_string()]);
        prop_assert_eq!(first[0].winner_id.as_str(), "a");

        let swapped = build(low, high);
        prop_assert_eq!(swapped.len(), 1);
        prop_assert_eq!(swapped[0].winner_id.as_str(), "b");
    }

    /// Calling a registration handle twice has the effect of calling it once
    #[test]
    fn prop_unregister_idempotent(count in 1usize..8, extra in 0usize..4) {
        let mut registry = ShortcutRegistry::with_platform(Platform::Linux);
        let handle = registry
            .register_many((0..count).map(|i| ShortcutRegistrationOptions::new(format!("s{}", i), "x")))
            .unwrap();
        for i in 0..extra {
            let _ = registry
                .register(ShortcutRegistrationOptions::new(format!("other{}", i), "y"))
                .unwrap();
        }

        prop_assert_eq!(handle.unregister(&mut registry), count);
        let after_first = registry.len();
        prop_assert_eq!(handle.unregister(&mut registry), 0);
        prop_assert_eq!(registry.len(), after_first);
        prop_assert_eq!(after_first, extra);
    }

    /// Registering a preset yields ids of the form `<preset>:<entry>` tagged with the preset
    #[test]
    fn prop_preset_round_trip(
        name in "[a-z]{1,8}",
        entries in prop::collection::btree_set("[a-z][a-z-]{0,10}", 0..10),
    ) {
        let preset = Preset::new(
            name.clone(),
            "",
            "",
            entries
                .iter()
                .map(|id| PresetShortcut::new(id.clone(), "x", Category::Custom, ""))
                .collect(),
        );

        let mut registry = ShortcutRegistry::with_platform(Platform::Linux);
        let _ = registry.register_many(preset_to_registration_options(&preset)).unwrap();

        prop_assert_eq!(registry.len(), entries.len());
        for (definition, entry) in registry.get_all().iter().zip(entries.iter()) {
            prop_assert_eq!(&definition.id, &format!("{}:{}", name, entry));
            prop_assert_eq!(definition.preset.as_deref(), Some(name.as_str()));
        }
    }
}
