//! Shortcut presets and the user override transform
//!
//! A preset is immutable data: a named list of shortcut entries. Turning a
//! preset into registrable options prefixes every id with `"<preset>:"` so ids
//! from different presets never collide. User overrides are applied as a pure
//! filter-then-map over those options.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::PresetError;
use crate::models::{Category, ShortcutContext, ShortcutRegistrationOptions, UserShortcutOverrides};
use crate::parser::PresetParserRegistry;

/// Separator between the preset name and the entry id
pub const PRESET_ID_SEPARATOR: char = ':';

/// A single entry of a preset; unset fields inherit the category defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetShortcut {
    pub id: String,
    pub keys: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_category")]
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ShortcutContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prevent_default: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_in_inputs: Option<bool>,
}

fn default_category() -> Category {
    Category::Custom
}

impl PresetShortcut {
    /// Create an entry that takes every setting from its category defaults
    pub fn new(
        id: impl Into<String>,
        keys: impl Into<String>,
        category: Category,
        description: impl Into<String>,
    ) -> Self {
        PresetShortcut {
            id: id.into(),
            keys: keys.into(),
            description: description.into(),
            category,
            context: None,
            priority: None,
            prevent_default: None,
            enable_in_inputs: None,
        }
    }

    pub fn with_context(mut self, context: ShortcutContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_enable_in_inputs(mut self, enable_in_inputs: bool) -> Self {
        self.enable_in_inputs = Some(enable_in_inputs);
        self
    }
}

/// Per-category fallbacks for preset entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryDefaults {
    pub context: ShortcutContext,
    pub prevent_default: bool,
    pub enable_in_inputs: bool,
}

impl CategoryDefaults {
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Navigation => CategoryDefaults {
                context: ShortcutContext::Global,
                prevent_default: true,
                enable_in_inputs: false,
            },
            Category::Messaging => CategoryDefaults {
                context: ShortcutContext::Chat,
                prevent_default: true,
                enable_in_inputs: false,
            },
            Category::Formatting => CategoryDefaults {
                context: ShortcutContext::Editor,
                prevent_default: true,
                enable_in_inputs: true,
            },
            Category::Media | Category::Calls | Category::Admin | Category::Custom => {
                CategoryDefaults {
                    context: ShortcutContext::Global,
                    prevent_default: true,
                    enable_in_inputs: false,
                }
            }
        }
    }
}

/// A named, read-only collection of shortcut entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub shortcuts: Vec<PresetShortcut>,
}

impl Preset {
    /// Create a new preset
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
        shortcuts: Vec<PresetShortcut>,
    ) -> Self {
        Preset {
            name: name.into(),
            label: label.into(),
            description: description.into(),
            shortcuts,
        }
    }

    /// Full registry id of one of this preset's entries
    pub fn qualified_id(&self, entry_id: &str) -> String {
        format!("{}{}{}", self.name, PRESET_ID_SEPARATOR, entry_id)
    }

    /// Check the preset name and entry ids
    pub fn validate(&self) -> Result<(), PresetError> {
        if self.name.trim().is_empty() || self.name.contains(PRESET_ID_SEPARATOR) {
            return Err(PresetError::InvalidPresetName(self.name.clone()));
        }

        let mut seen = HashSet::new();
        for shortcut in &self.shortcuts {
            if !seen.insert(shortcut.id.as_str()) {
                return Err(PresetError::DuplicateShortcutId {
                    preset: self.name.clone(),
                    id: shortcut.id.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Turn a preset into registration options, prefixing ids with the preset name
pub fn preset_to_registration_options(preset: &Preset) -> Vec<ShortcutRegistrationOptions> {
    preset
        .shortcuts
        .iter()
        .map(|entry| {
            let defaults = CategoryDefaults::for_category(entry.category);
            ShortcutRegistrationOptions::new(preset.qualified_id(&entry.id), entry.keys.clone())
                .with_description(entry.description.clone())
                .with_category(entry.category)
                .with_context(entry.context.unwrap_or(defaults.context))
                .with_priority(entry.priority.unwrap_or(0))
                .with_prevent_default(entry.prevent_default.unwrap_or(defaults.prevent_default))
                .with_enable_in_inputs(entry.enable_in_inputs.unwrap_or(defaults.enable_in_inputs))
                .with_preset(preset.name.clone())
        })
        .collect()
}

/// Drop disabled ids, then substitute overridden keys. Never adds ids.
pub fn apply_user_overrides(
    options: Vec<ShortcutRegistrationOptions>,
    overrides: &UserShortcutOverrides,
) -> Vec<ShortcutRegistrationOptions> {
    options
        .into_iter()
        .filter(|option| !overrides.disabled_ids.contains(&option.id))
        .map(|mut option| {
            if let Some(keys) = overrides.key_overrides.get(&option.id) {
                debug!("Overriding keys for {}: {} -> {}", option.id, option.keys, keys);
                option.keys = keys.clone();
            }
            option
        })
        .collect()
}

/// Named collection of presets
#[derive(Debug, Clone, Default)]
pub struct PresetCatalog {
    presets: BTreeMap<String, Preset>,
}

impl PresetCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog holding the built-in presets
    pub fn with_builtin() -> Self {
        let mut catalog = Self::new();
        for preset in builtin_presets() {
            catalog.presets.insert(preset.name.clone(), preset);
        }
        catalog
    }

    /// Add or replace a preset
    pub fn insert(&mut self, preset: Preset) -> Result<(), PresetError> {
        preset.validate()?;
        debug!("Adding preset {} with {} shortcuts", preset.name, preset.shortcuts.len());
        self.presets.insert(preset.name.clone(), preset);
        Ok(())
    }

    /// Get a preset by name
    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.presets.contains_key(name)
    }

    /// Preset names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.presets.keys().map(String::as_str).collect()
    }

    pub fn presets(&self) -> impl Iterator<Item = &Preset> {
        self.presets.values()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Parse a preset document and add every preset it contains.
    ///
    /// Either every preset in the document is added or, on error, the
    /// catalog is left untouched. Returns the names of the loaded presets.
    pub fn load_from_str(&mut self, content: &str, format: &str) -> Result<Vec<String>, PresetError> {
        let parsers = PresetParserRegistry::new();
        let presets = parsers.parse(content, format)?;

        for preset in &presets {
            preset.validate()?;
        }

        let mut names = Vec::with_capacity(presets.len());
        for preset in presets {
            debug!("Adding preset {} with {} shortcuts", preset.name, preset.shortcuts.len());
            names.push(preset.name.clone());
            self.presets.insert(preset.name.clone(), preset);
        }

        info!("Loaded {} presets from {} document", names.len(), format);
        Ok(names)
    }

    /// Load a preset document from disk; the format follows the file extension
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<Vec<String>, PresetError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("json")
            .to_lowercase();
        self.load_from_str(&content, &format)
    }
}

/// Presets shipped with the engine
pub fn builtin_presets() -> Vec<Preset> {
    vec![default_preset(), vim_preset()]
}

fn default_preset() -> Preset {
    use Category::*;

    Preset::new(
        "default",
        "Default",
        "Standard shortcuts using the platform modifier",
        vec![
            PresetShortcut::new("search", "mod+k", Navigation, "Open quick search"),
            PresetShortcut::new("next-channel", "alt+arrowdown", Navigation, "Next channel"),
            PresetShortcut::new("prev-channel", "alt+arrowup", Navigation, "Previous channel"),
            PresetShortcut::new("command-palette", "mod+shift+p", Navigation, "Open command palette"),
            PresetShortcut::new("close-modal", "escape", Navigation, "Close dialog")
                .with_context(ShortcutContext::Modal)
                .with_enable_in_inputs(true),
            PresetShortcut::new("edit-last", "arrowup", Messaging, "Edit last message"),
            PresetShortcut::new("reply", "r", Messaging, "Reply in thread"),
            PresetShortcut::new("bold", "mod+b", Formatting, "Bold"),
            PresetShortcut::new("italic", "mod+i", Formatting, "Italic"),
            PresetShortcut::new("code", "mod+e", Formatting, "Inline code"),
            PresetShortcut::new("toggle-mute", "mod+shift+m", Calls, "Toggle microphone"),
            PresetShortcut::new("toggle-video", "mod+shift+v", Calls, "Toggle camera"),
            PresetShortcut::new("toggle-sidebar", "mod+backslash", Navigation, "Toggle sidebar"),
        ],
    )
}

fn vim_preset() -> Preset {
    use Category::*;

    Preset::new(
        "vim",
        "Vim",
        "Modal-style navigation with chord sequences",
        vec![
            PresetShortcut::new("search", "/", Navigation, "Open quick search"),
            PresetShortcut::new("next-channel", "j", Navigation, "Next channel")
                .with_context(ShortcutContext::Sidebar),
            PresetShortcut::new("prev-channel", "k", Navigation, "Previous channel")
                .with_context(ShortcutContext::Sidebar),
            PresetShortcut::new("go-inbox", "g then i", Navigation, "Go to inbox"),
            PresetShortcut::new("go-settings", "g then s", Navigation, "Go to settings"),
            PresetShortcut::new("go-top", "g then g", Navigation, "Scroll to top"),
            PresetShortcut::new("reply", "r", Messaging, "Reply in thread"),
            PresetShortcut::new("bold", "mod+b", Formatting, "Bold"),
            PresetShortcut::new("toggle-mute", "mod+shift+m", Calls, "Toggle microphone"),
        ],
    )
}
