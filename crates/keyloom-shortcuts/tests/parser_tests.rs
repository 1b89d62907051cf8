use keyloom_shortcuts::*;
use std::str::FromStr;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modifier_synonyms() {
        let parsed = parse_key_combo("Control+Option+Command+K").unwrap();
        assert!(parsed.ctrl);
        assert!(parsed.alt);
        assert!(parsed.meta);
        assert!(!parsed.shift);
        assert_eq!(parsed.key, "k");

        assert!(parse_key_combo("CmdOrCtrl+N").unwrap().mod_key);
        assert!(parse_key_combo("super+l").unwrap().meta);
    }

    #[test]
    fn test_parse_tolerates_whitespace() {
        let spaced = parse_key_combo("  ctrl + shift + k ").unwrap();
        let tight = parse_key_combo("ctrl+shift+k").unwrap();
        assert_eq!(spaced, tight);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_key_combo(""), Err(ParseError::EmptyCombo));
        assert!(matches!(parse_key_combo("ctrl+shift"), Err(ParseError::MissingKey(_))));
        assert!(matches!(parse_key_combo("a+b"), Err(ParseError::MultipleKeys(_))));
        assert!(matches!(
            parse_chord_sequence("g then"),
            Err(ParseError::EmptyStep(_))
        ));
    }

    #[test]
    fn test_chord_steps() {
        let sequence = parse_chord_sequence("G THEN shift+I").unwrap();
        assert!(sequence.is_chord());
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence.steps[0], ParsedKey::new("g"));
        assert!(sequence.steps[1].shift);
        assert_eq!(sequence.steps[1].key, "i");
    }

    #[test]
    fn test_key_sequence_from_str() {
        let sequence = KeySequence::from_str("g then i").unwrap();
        assert_eq!(sequence.to_string(), "g then i");
        assert!(KeySequence::from_str("then").is_err());
    }

    #[test]
    fn test_normalize_is_canonical() {
        assert_eq!(normalize_key_combo("Shift+Mod+K").unwrap(), "mod+shift+k");
        assert_eq!(normalize_key_combo("k+alt+ctrl").unwrap(), "alt+ctrl+k");
        assert_eq!(normalize_key_combo("g Then I").unwrap(), "g then i");
        assert_eq!(normalize_key_combo("esc").unwrap(), "escape");
    }

    #[test]
    fn test_normalize_for_platform() {
        assert_eq!(
            normalize_key_combo_for("mod+k", Platform::Windows).unwrap(),
            "ctrl+k"
        );
        assert_eq!(
            normalize_key_combo_for("mod+k", Platform::Ios).unwrap(),
            "meta+k"
        );
    }

    #[test]
    fn test_modifier_exactness() {
        let parsed = parse_key_combo("ctrl+k").unwrap();
        let exact = KeyEvent::new("k").with_ctrl();
        let extra = KeyEvent::new("k").with_ctrl().with_shift();
        assert!(matches_key_event(&exact, &parsed, Platform::Linux));
        assert!(!matches_key_event(&extra, &parsed, Platform::Linux));
    }

    #[test]
    fn test_mod_resolves_per_platform() {
        let parsed = parse_key_combo("mod+s").unwrap();
        let ctrl = KeyEvent::new("s").with_ctrl();
        let cmd = KeyEvent::new("s").with_meta();

        assert!(matches_key_event(&ctrl, &parsed, Platform::Windows));
        assert!(!matches_key_event(&cmd, &parsed, Platform::Windows));
        assert!(matches_key_event(&cmd, &parsed, Platform::MacOs));
        assert!(!matches_key_event(&ctrl, &parsed, Platform::MacOs));
        assert!(matches_key_event(&ctrl, &parsed, Platform::Unknown));
    }

    #[test]
    fn test_event_key_aliases() {
        let space = parse_key_combo("space").unwrap();
        assert!(matches_key_event(&KeyEvent::new(" "), &space, Platform::Linux));

        let escape = parse_key_combo("esc").unwrap();
        assert!(matches_key_event(&KeyEvent::new("Escape"), &escape, Platform::Linux));

        let backslash = parse_key_combo("mod+backslash").unwrap();
        assert!(matches_key_event(
            &KeyEvent::new("\\").with_ctrl(),
            &backslash,
            Platform::Linux
        ));
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(format_for_display("mod+shift+k", Platform::Linux), "Ctrl+Shift+K");
        assert_eq!(format_for_display("mod+shift+k", Platform::MacOs), "⇧⌘K");
        assert_eq!(format_for_display("ctrl+", Platform::Linux), "ctrl+");
    }

    #[test]
    fn test_platform_hints() {
        assert_eq!(Platform::from_hint("MacIntel"), Platform::MacOs);
        assert_eq!(Platform::from_hint("Win32"), Platform::Windows);
        assert_eq!(Platform::from_hint("Linux x86_64"), Platform::Linux);
        assert_eq!(Platform::from_hint("iPhone"), Platform::Ios);
        assert_eq!(Platform::from_hint("PlayStation"), Platform::Unknown);
        assert!(!Platform::Unknown.is_apple());

        if cfg!(target_os = "linux") {
            assert_eq!(detect_platform(), Platform::Linux);
        }
    }

    #[test]
    fn test_preset_parser_registry_unknown_format() {
        let registry = PresetParserRegistry::new();
        assert!(registry.get_parser("JSON").is_some());
        assert!(matches!(
            registry.parse("{}", "toml"),
            Err(ParseError::UnknownFormat(_))
        ));
    }
}
