//! Core data models for shortcuts

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::event::KeyEvent;
use crate::parser;

/// Modifier flags held during a key press
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
}

impl Modifiers {
    /// No modifiers held
    pub fn none() -> Self {
        Self::default()
    }

    /// Check whether any modifier is held
    pub fn any(&self) -> bool {
        self.ctrl || self.shift || self.alt || self.meta
    }
}

/// Operating system family, used to resolve the cross-platform `mod` token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    MacOs,
    Ios,
    Windows,
    Linux,
    Android,
    #[default]
    Unknown,
}

impl Platform {
    /// Apple platforms map `mod` to the Command (meta) key
    pub fn is_apple(&self) -> bool {
        matches!(self, Platform::MacOs | Platform::Ios)
    }

    /// Best-effort classification of a platform or user-agent string.
    ///
    /// Unrecognised hints map to [`Platform::Unknown`], which uses the
    /// non-Apple modifier mapping.
    pub fn from_hint(hint: &str) -> Self {
        let hint = hint.to_lowercase();
        if hint.contains("iphone") || hint.contains("ipad") || hint.contains("ipod") {
            Platform::Ios
        } else if hint.contains("mac") || hint.contains("darwin") {
            Platform::MacOs
        } else if hint.contains("win") {
            Platform::Windows
        } else if hint.contains("android") {
            Platform::Android
        } else if hint.contains("linux") || hint.contains("x11") || hint.contains("cros") {
            Platform::Linux
        } else {
            Platform::Unknown
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::MacOs => write!(f, "macos"),
            Platform::Ios => write!(f, "ios"),
            Platform::Windows => write!(f, "windows"),
            Platform::Linux => write!(f, "linux"),
            Platform::Android => write!(f, "android"),
            Platform::Unknown => write!(f, "unknown"),
        }
    }
}

/// Normalized representation of a single key press
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedKey {
    /// Canonical key name: lowercased with aliases resolved (e.g. `arrowdown`)
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
    /// Cross-platform `mod` marker, resolved against a [`Platform`] at match time
    #[serde(rename = "mod")]
    pub mod_key: bool,
}

impl ParsedKey {
    /// Create a parsed key with no modifiers
    pub fn new(key: impl Into<String>) -> Self {
        ParsedKey {
            key: key.into(),
            ..Default::default()
        }
    }

    /// Fold the `mod` marker into `ctrl` or `meta` for the given platform
    pub fn resolve(&self, platform: Platform) -> ParsedKey {
        let mut resolved = self.clone();
        if resolved.mod_key {
            resolved.mod_key = false;
            if platform.is_apple() {
                resolved.meta = true;
            } else {
                resolved.ctrl = true;
            }
        }
        resolved
    }

    /// Modifier flags this key requires on the given platform
    pub fn modifiers(&self, platform: Platform) -> Modifiers {
        let resolved = self.resolve(platform);
        Modifiers {
            ctrl: resolved.ctrl,
            shift: resolved.shift,
            alt: resolved.alt,
            meta: resolved.meta,
        }
    }
}

impl fmt::Display for ParsedKey {
    /// Canonical form: modifiers in alphabetical order, then the key
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.alt {
            write!(f, "alt+")?;
        }
        if self.ctrl {
            write!(f, "ctrl+")?;
        }
        if self.meta {
            write!(f, "meta+")?;
        }
        if self.mod_key {
            write!(f, "mod+")?;
        }
        if self.shift {
            write!(f, "shift+")?;
        }
        write!(f, "{}", self.key)
    }
}

impl FromStr for ParsedKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parser::parse_key_combo(s)
    }
}

/// An ordered sequence of key presses; two or more steps make a chord
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeySequence {
    pub steps: Vec<ParsedKey>,
}

impl KeySequence {
    /// Whether this sequence is a multi-step chord
    pub fn is_chord(&self) -> bool {
        self.steps.len() > 1
    }

    /// First step of the sequence
    pub fn first(&self) -> Option<&ParsedKey> {
        self.steps.first()
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the sequence has no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Fold `mod` markers in every step for the given platform
    pub fn resolve(&self, platform: Platform) -> KeySequence {
        KeySequence {
            steps: self.steps.iter().map(|step| step.resolve(platform)).collect(),
        }
    }
}

impl fmt::Display for KeySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", parser::STEP_SEPARATOR)?;
            }
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}

impl FromStr for KeySequence {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parser::parse_chord_sequence(s)
    }
}

/// Display grouping for shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Navigation,
    Messaging,
    Formatting,
    Media,
    Calls,
    Admin,
    Custom,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Navigation,
        Category::Messaging,
        Category::Formatting,
        Category::Media,
        Category::Calls,
        Category::Admin,
        Category::Custom,
    ];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Navigation => write!(f, "navigation"),
            Category::Messaging => write!(f, "messaging"),
            Category::Formatting => write!(f, "formatting"),
            Category::Media => write!(f, "media"),
            Category::Calls => write!(f, "calls"),
            Category::Admin => write!(f, "admin"),
            Category::Custom => write!(f, "custom"),
        }
    }
}

impl FromStr for Category {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "navigation" => Ok(Category::Navigation),
            "messaging" => Ok(Category::Messaging),
            "formatting" => Ok(Category::Formatting),
            "media" => Ok(Category::Media),
            "calls" => Ok(Category::Calls),
            "admin" => Ok(Category::Admin),
            "custom" => Ok(Category::Custom),
            _ => Err(ParseError::UnknownCategory(s.to_string())),
        }
    }
}

/// Activation scope for shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShortcutContext {
    /// Always active
    Global,
    Chat,
    Editor,
    Sidebar,
    Modal,
    CommandPalette,
}

impl ShortcutContext {
    pub const ALL: [ShortcutContext; 6] = [
        ShortcutContext::Global,
        ShortcutContext::Chat,
        ShortcutContext::Editor,
        ShortcutContext::Sidebar,
        ShortcutContext::Modal,
        ShortcutContext::CommandPalette,
    ];

    pub fn is_global(&self) -> bool {
        *self == ShortcutContext::Global
    }

    /// Two scopes overlap when they are equal or either is global
    pub fn overlaps(&self, other: &ShortcutContext) -> bool {
        self == other || self.is_global() || other.is_global()
    }
}

impl fmt::Display for ShortcutContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShortcutContext::Global => write!(f, "global"),
            ShortcutContext::Chat => write!(f, "chat"),
            ShortcutContext::Editor => write!(f, "editor"),
            ShortcutContext::Sidebar => write!(f, "sidebar"),
            ShortcutContext::Modal => write!(f, "modal"),
            ShortcutContext::CommandPalette => write!(f, "command-palette"),
        }
    }
}

impl FromStr for ShortcutContext {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "global" => Ok(ShortcutContext::Global),
            "chat" => Ok(ShortcutContext::Chat),
            "editor" => Ok(ShortcutContext::Editor),
            "sidebar" => Ok(ShortcutContext::Sidebar),
            "modal" => Ok(ShortcutContext::Modal),
            "command-palette" | "command_palette" | "commandpalette" => {
                Ok(ShortcutContext::CommandPalette)
            }
            _ => Err(ParseError::UnknownContext(s.to_string())),
        }
    }
}

/// Outcome reported by a shortcut action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionResult {
    Handled,
    /// The action inspected the event and declined; matching continues
    Declined,
}

impl From<()> for ActionResult {
    fn from(_: ()) -> Self {
        ActionResult::Handled
    }
}

impl From<bool> for ActionResult {
    fn from(handled: bool) -> Self {
        if handled {
            ActionResult::Handled
        } else {
            ActionResult::Declined
        }
    }
}

type ActionFn = dyn Fn(&KeyEvent) -> ActionResult + Send + Sync;

/// Callback invoked when a shortcut matches
#[derive(Clone)]
pub struct ShortcutAction(Arc<ActionFn>);

impl ShortcutAction {
    /// Wrap a closure returning `()`, `bool` or [`ActionResult`]
    pub fn new<F, R>(f: F) -> Self
    where
        F: Fn(&KeyEvent) -> R + Send + Sync + 'static,
        R: Into<ActionResult>,
    {
        ShortcutAction(Arc::new(move |event| f(event).into()))
    }

    /// Invoke the action
    pub fn call(&self, event: &KeyEvent) -> ActionResult {
        (self.0)(event)
    }
}

impl fmt::Debug for ShortcutAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ShortcutAction(..)")
    }
}

fn default_true() -> bool {
    true
}

/// Options accepted when registering a shortcut
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortcutRegistrationOptions {
    pub id: String,
    pub keys: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_category")]
    pub category: Category,
    #[serde(default = "default_context")]
    pub context: ShortcutContext,
    #[serde(skip)]
    pub action: Option<ShortcutAction>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_true")]
    pub prevent_default: bool,
    #[serde(default)]
    pub enable_in_inputs: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub preset: Option<String>,
}

fn default_category() -> Category {
    Category::Custom
}

fn default_context() -> ShortcutContext {
    ShortcutContext::Global
}

impl ShortcutRegistrationOptions {
    /// Create options with defaults: custom category, global context,
    /// priority 0, prevent default, disabled in inputs, enabled
    pub fn new(id: impl Into<String>, keys: impl Into<String>) -> Self {
        ShortcutRegistrationOptions {
            id: id.into(),
            keys: keys.into(),
            description: String::new(),
            category: default_category(),
            context: default_context(),
            action: None,
            priority: 0,
            prevent_default: true,
            enable_in_inputs: false,
            enabled: true,
            preset: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_context(mut self, context: ShortcutContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_prevent_default(mut self, prevent_default: bool) -> Self {
        self.prevent_default = prevent_default;
        self
    }

    pub fn with_enable_in_inputs(mut self, enable_in_inputs: bool) -> Self {
        self.enable_in_inputs = enable_in_inputs;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = Some(preset.into());
        self
    }

    /// Attach an action callback
    pub fn with_action<F, R>(mut self, f: F) -> Self
    where
        F: Fn(&KeyEvent) -> R + Send + Sync + 'static,
        R: Into<ActionResult>,
    {
        self.action = Some(ShortcutAction::new(f));
        self
    }
}

/// A shortcut stored in the registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortcutDefinition {
    pub id: String,
    /// Raw combo or chord string; parsed on demand
    pub keys: String,
    pub description: String,
    pub category: Category,
    pub context: ShortcutContext,
    #[serde(skip)]
    pub action: Option<ShortcutAction>,
    pub priority: i32,
    pub prevent_default: bool,
    pub enable_in_inputs: bool,
    pub enabled: bool,
    pub preset: Option<String>,
    /// Position in registration order, kept across re-registration of the same id
    #[serde(skip)]
    pub(crate) registration_order: u64,
}

impl ShortcutDefinition {
    pub(crate) fn from_options(options: ShortcutRegistrationOptions, registration_order: u64) -> Self {
        ShortcutDefinition {
            id: options.id,
            keys: options.keys,
            description: options.description,
            category: options.category,
            context: options.context,
            action: options.action,
            priority: options.priority,
            prevent_default: options.prevent_default,
            enable_in_inputs: options.enable_in_inputs,
            enabled: options.enabled,
            preset: options.preset,
            registration_order,
        }
    }

    /// Parse the key string into a key sequence
    pub fn parse_keys(&self) -> Result<KeySequence, ParseError> {
        parser::parse_chord_sequence(&self.keys)
    }

    /// Check if this shortcut is active for the given set of contexts
    pub fn applies_to_contexts(&self, active: &HashSet<ShortcutContext>) -> bool {
        self.context.is_global() || active.contains(&self.context)
    }

    /// Position in registration order
    pub fn registration_order(&self) -> u64 {
        self.registration_order
    }
}

/// Several enabled shortcuts sharing a normalized key sequence in overlapping contexts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutConflict {
    /// Normalized key sequence
    pub keys: String,
    pub context: ShortcutContext,
    pub shortcut_ids: Vec<String>,
    pub winner_id: String,
}

/// User customisations applied on top of a preset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserShortcutOverrides {
    /// Shortcut id -> replacement combo string
    #[serde(default)]
    pub key_overrides: HashMap<String, String>,
    /// Shortcut ids excluded from registration
    #[serde(default)]
    pub disabled_ids: HashSet<String>,
}

impl UserShortcutOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the keys of a shortcut
    pub fn with_key_override(mut self, id: impl Into<String>, keys: impl Into<String>) -> Self {
        self.key_overrides.insert(id.into(), keys.into());
        self
    }

    /// Exclude a shortcut
    pub fn with_disabled(mut self, id: impl Into<String>) -> Self {
        self.disabled_ids.insert(id.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.key_overrides.is_empty() && self.disabled_ids.is_empty()
    }
}
