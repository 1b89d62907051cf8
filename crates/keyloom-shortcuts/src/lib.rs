//! Keyboard shortcut engine with chord sequences, presets and conflict detection
//!
//! This crate provides:
//! - Key combination and chord parsing with cross-platform `mod` handling
//! - A shortcut registry with context scoping and priority-based conflict resolution
//! - Preset catalogs with per-user key overrides
//! - A manager that turns key events into shortcut actions, including multi-step chords
//!
//! The engine has no UI runtime dependency. Hosts feed it [`KeyEvent`]s and may
//! inject an [`InputEnvironment`], an [`EventSource`] and a [`Clock`].

pub mod config;
pub mod conflict;
pub mod error;
pub mod event;
pub mod manager;
pub mod models;
pub mod parser;
pub mod preset;
pub mod registry;

// Re-export public types
pub use config::ManagerConfig;
pub use conflict::{compare_precedence, ConflictDetector};
pub use error::{ConfigError, ManagerError, ParseError, PresetError, RegistryError};
pub use event::{
    Clock, EventSource, EventTarget, EventTargetEnvironment, InputEnvironment, KeyEvent, ListenerId,
    ListenerKind, ManualClock, SystemClock,
};
pub use manager::{ChordProgress, ShortcutEventResult, ShortcutManager};
pub use models::{
    ActionResult, Category, KeySequence, Modifiers, ParsedKey, Platform, ShortcutAction,
    ShortcutConflict, ShortcutContext, ShortcutDefinition, ShortcutRegistrationOptions,
    UserShortcutOverrides,
};
pub use parser::{
    detect_platform, format_for_display, matches_key_event, normalize_key_combo,
    normalize_key_combo_for, parse_chord_sequence, parse_key_combo, JsonPresetParser,
    PresetParser, PresetParserRegistry, YamlPresetParser,
};
pub use preset::{
    apply_user_overrides, builtin_presets, preset_to_registration_options, CategoryDefaults, Preset,
    PresetCatalog, PresetShortcut,
};
pub use registry::{RegistrationHandle, ShortcutRegistry};

/// Create a manager owned by the caller.
///
/// There is no process-wide instance; hosts decide how many managers to keep
/// and how long they live.
pub fn create_shortcut_manager(config: ManagerConfig) -> ShortcutManager {
    ShortcutManager::new(config)
}
