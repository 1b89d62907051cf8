//! Key combination parsing, normalization and event matching
//!
//! Combo strings look like `"mod+shift+k"`; chords chain steps with
//! `" then "` (`"g then i"`). The `mod` token is kept as a marker and
//! resolved to Ctrl or Cmd only when matching against a [`Platform`].
//!
//! This module also hosts the preset document parsers (JSON and YAML).

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ParseError;
use crate::event::KeyEvent;
use crate::models::{KeySequence, ParsedKey, Platform};
use crate::preset::Preset;

/// Separator between chord steps, in canonical form
pub const STEP_SEPARATOR: &str = " then ";

const STEP_KEYWORD: &str = "then";

/// Parse a single key combination such as `"mod+shift+k"`.
///
/// Tokens are case-insensitive and may be surrounded by whitespace. Exactly
/// one non-modifier token is required; `"ctrl++"` names the `+` key.
pub fn parse_key_combo(combo: &str) -> Result<ParsedKey, ParseError> {
    let lowered = combo.trim().to_lowercase();
    if lowered.is_empty() {
        return Err(ParseError::EmptyCombo);
    }

    let (rest, plus_key) = if lowered == "+" {
        ("", true)
    } else if let Some(stripped) = lowered.strip_suffix("++") {
        (stripped, true)
    } else {
        (lowered.as_str(), false)
    };

    let mut parsed = ParsedKey::default();
    let mut key: Option<String> = None;

    if !rest.is_empty() {
        for token in rest.split('+').map(str::trim) {
            match token {
                "" => return Err(ParseError::MissingKey(combo.to_string())),
                "ctrl" | "control" => parsed.ctrl = true,
                "shift" => parsed.shift = true,
                "alt" | "option" => parsed.alt = true,
                "meta" | "cmd" | "command" | "super" | "win" => parsed.meta = true,
                "mod" | "cmdorctrl" => parsed.mod_key = true,
                other => {
                    if key.is_some() {
                        return Err(ParseError::MultipleKeys(combo.to_string()));
                    }
                    key = Some(normalize_key_name(other));
                }
            }
        }
    }

    if plus_key {
        if key.is_some() {
            return Err(ParseError::MultipleKeys(combo.to_string()));
        }
        key = Some("+".to_string());
    }

    parsed.key = key.ok_or_else(|| ParseError::MissingKey(combo.to_string()))?;
    Ok(parsed)
}

/// Parse a key combination that may be a chord (`"g then i"`).
///
/// A single step yields a non-chord sequence holding that one key.
pub fn parse_chord_sequence(combo: &str) -> Result<KeySequence, ParseError> {
    let mut groups: Vec<Vec<&str>> = vec![Vec::new()];
    for token in combo.split_whitespace() {
        if token.eq_ignore_ascii_case(STEP_KEYWORD) {
            groups.push(Vec::new());
        } else if let Some(current) = groups.last_mut() {
            current.push(token);
        }
    }

    if groups.len() == 1 {
        return Ok(KeySequence {
            steps: vec![parse_key_combo(combo)?],
        });
    }

    let mut steps = Vec::with_capacity(groups.len());
    for group in groups {
        if group.is_empty() {
            return Err(ParseError::EmptyStep(combo.to_string()));
        }
        steps.push(parse_key_combo(&group.concat())?);
    }

    Ok(KeySequence { steps })
}

/// Canonical string form of a combo or chord.
///
/// Two combos normalize identically exactly when they parse to the same
/// [`KeySequence`]; modifier order and letter case do not matter.
pub fn normalize_key_combo(combo: &str) -> Result<String, ParseError> {
    Ok(parse_chord_sequence(combo)?.to_string())
}

/// Like [`normalize_key_combo`], with `mod` folded into Ctrl or Cmd for `platform`
pub fn normalize_key_combo_for(combo: &str, platform: Platform) -> Result<String, ParseError> {
    Ok(parse_chord_sequence(combo)?.resolve(platform).to_string())
}

/// Lowercase a key name and resolve common aliases
pub fn normalize_key_name(name: &str) -> String {
    if name == " " {
        return "space".to_string();
    }
    let lowered = name.trim().to_lowercase();
    let canonical = match lowered.as_str() {
        "esc" => "escape",
        "return" => "enter",
        "up" => "arrowup",
        "down" => "arrowdown",
        "left" => "arrowleft",
        "right" => "arrowright",
        "spacebar" => "space",
        "del" => "delete",
        "ins" => "insert",
        "pgup" => "pageup",
        "pgdn" => "pagedown",
        "plus" => "+",
        "slash" => "/",
        "backslash" => "\\",
        "comma" => ",",
        "period" => ".",
        _ => return lowered,
    };
    canonical.to_string()
}

/// Whether a key name is a bare modifier press
pub fn is_modifier_key(key: &str) -> bool {
    matches!(
        key.trim().to_lowercase().as_str(),
        "control" | "ctrl" | "shift" | "alt" | "altgraph" | "meta" | "os" | "super" | "hyper"
    )
}

/// Check whether a live key event matches a parsed key.
///
/// The key name must match after alias normalization, and every modifier flag
/// must match exactly: `ctrl+k` does not match an event with Shift also held.
pub fn matches_key_event(event: &KeyEvent, parsed: &ParsedKey, platform: Platform) -> bool {
    normalize_key_name(&event.key) == parsed.key && event.modifiers() == parsed.modifiers(platform)
}

/// Best-effort detection of the platform this binary was built for
pub fn detect_platform() -> Platform {
    if cfg!(target_os = "macos") {
        Platform::MacOs
    } else if cfg!(target_os = "ios") {
        Platform::Ios
    } else if cfg!(target_os = "windows") {
        Platform::Windows
    } else if cfg!(target_os = "android") {
        Platform::Android
    } else if cfg!(target_os = "linux") {
        Platform::Linux
    } else {
        Platform::Unknown
    }
}

/// Human-readable label for a combo, e.g. `⌘⇧K` on Apple platforms and
/// `Ctrl+Shift+K` elsewhere. Unparseable input is returned unchanged.
pub fn format_for_display(combo: &str, platform: Platform) -> String {
    let sequence = match parse_chord_sequence(combo) {
        Ok(sequence) => sequence,
        Err(_) => return combo.to_string(),
    };

    sequence
        .steps
        .iter()
        .map(|step| format_step(&step.resolve(platform), platform))
        .collect::<Vec<_>>()
        .join(STEP_SEPARATOR)
}

fn format_step(step: &ParsedKey, platform: Platform) -> String {
    let key = display_key_name(&step.key);
    if platform.is_apple() {
        let mut label = String::new();
        if step.ctrl {
            label.push('⌃');
        }
        if step.alt {
            label.push('⌥');
        }
        if step.shift {
            label.push('⇧');
        }
        if step.meta {
            label.push('⌘');
        }
        label.push_str(&key);
        label
    } else {
        let mut parts = Vec::new();
        if step.ctrl {
            parts.push("Ctrl".to_string());
        }
        if step.alt {
            parts.push("Alt".to_string());
        }
        if step.shift {
            parts.push("Shift".to_string());
        }
        if step.meta {
            let meta = if platform == Platform::Windows { "Win" } else { "Meta" };
            parts.push(meta.to_string());
        }
        parts.push(key);
        parts.join("+")
    }
}

fn display_key_name(key: &str) -> String {
    match key {
        "arrowup" => "↑".to_string(),
        "arrowdown" => "↓".to_string(),
        "arrowleft" => "←".to_string(),
        "arrowright" => "→".to_string(),
        "escape" => "Esc".to_string(),
        "pageup" => "PageUp".to_string(),
        "pagedown" => "PageDown".to_string(),
        _ => {
            let mut chars = key.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

/// Trait for parsing preset documents
pub trait PresetParser: Send + Sync {
    /// Parse every preset contained in `content`
    fn parse(&self, content: &str) -> Result<Vec<Preset>, ParseError>;
}

/// Registry of preset document parsers keyed by format name
pub struct PresetParserRegistry {
    parsers: HashMap<String, Arc<dyn PresetParser>>,
}

impl PresetParserRegistry {
    /// Create a registry with the JSON and YAML parsers installed
    pub fn new() -> Self {
        let mut parsers = HashMap::new();
        parsers.insert("json".to_string(), Arc::new(JsonPresetParser) as Arc<dyn PresetParser>);
        parsers.insert("yaml".to_string(), Arc::new(YamlPresetParser) as Arc<dyn PresetParser>);
        parsers.insert("yml".to_string(), Arc::new(YamlPresetParser) as Arc<dyn PresetParser>);

        PresetParserRegistry { parsers }
    }

    /// Register a custom parser for a format
    pub fn register(&mut self, format: impl Into<String>, parser: Arc<dyn PresetParser>) {
        self.parsers.insert(format.into(), parser);
    }

    /// Get a parser for a specific format
    pub fn get_parser(&self, format: &str) -> Option<Arc<dyn PresetParser>> {
        self.parsers.get(&format.to_lowercase()).cloned()
    }

    /// Parse content with an explicit format
    pub fn parse(&self, content: &str, format: &str) -> Result<Vec<Preset>, ParseError> {
        let parser = self
            .get_parser(format)
            .ok_or_else(|| ParseError::UnknownFormat(format.to_string()))?;
        parser.parse(content)
    }

    /// Try JSON first, then fall back to YAML
    pub fn parse_auto(&self, content: &str) -> Result<Vec<Preset>, ParseError> {
        if let Ok(presets) = self.parse(content, "json") {
            return Ok(presets);
        }
        self.parse(content, "yaml")
    }
}

impl Default for PresetParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// JSON preset document parser.
///
/// Expects `{"presets": [{"name": ..., "shortcuts": [...]}, ...]}`.
pub struct JsonPresetParser;

impl PresetParser for JsonPresetParser {
    fn parse(&self, content: &str) -> Result<Vec<Preset>, ParseError> {
        let value: serde_json::Value =
            serde_json::from_str(content).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

        let presets = value
            .get("presets")
            .and_then(|v| v.as_array())
            .ok_or_else(|| ParseError::MissingField("presets".to_string()))?;

        let mut parsed = Vec::with_capacity(presets.len());
        for (idx, item) in presets.iter().enumerate() {
            let preset: Preset =
                serde_json::from_value(item.clone()).map_err(|e| ParseError::EntryError {
                    entry: idx + 1,
                    message: e.to_string(),
                })?;
            validate_preset(&preset, idx + 1)?;
            parsed.push(preset);
        }

        Ok(parsed)
    }
}

/// YAML preset document parser, same shape as the JSON document
pub struct YamlPresetParser;

impl PresetParser for YamlPresetParser {
    fn parse(&self, content: &str) -> Result<Vec<Preset>, ParseError> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| ParseError::InvalidYaml(e.to_string()))?;

        let presets = value
            .get("presets")
            .and_then(|v| v.as_sequence())
            .ok_or_else(|| ParseError::MissingField("presets".to_string()))?;

        let mut parsed = Vec::with_capacity(presets.len());
        for (idx, item) in presets.iter().enumerate() {
            let preset: Preset =
                serde_yaml::from_value(item.clone()).map_err(|e| ParseError::EntryError {
                    entry: idx + 1,
                    message: e.to_string(),
                })?;
            validate_preset(&preset, idx + 1)?;
            parsed.push(preset);
        }

        Ok(parsed)
    }
}

fn validate_preset(preset: &Preset, entry: usize) -> Result<(), ParseError> {
    if preset.name.trim().is_empty() {
        return Err(ParseError::EntryError {
            entry,
            message: "Missing preset name".to_string(),
        });
    }
    for shortcut in &preset.shortcuts {
        if shortcut.id.is_empty() {
            return Err(ParseError::EntryError {
                entry,
                message: format!("Shortcut without id in preset {}", preset.name),
            });
        }
        if shortcut.keys.trim().is_empty() {
            return Err(ParseError::EntryError {
                entry,
                message: format!("Missing keys for shortcut {}", shortcut.id),
            });
        }
    }
    Ok(())
}
