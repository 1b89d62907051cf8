//! Shortcut registry keyed by unique id

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::{
    conflict::ConflictDetector,
    error::RegistryError,
    models::{
        Category, Platform, ShortcutAction, ShortcutConflict, ShortcutContext, ShortcutDefinition,
        ShortcutRegistrationOptions,
    },
    parser,
};

/// Handle returned by [`ShortcutRegistry::register`]; removes what it registered
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "dropping the handle leaves the shortcuts registered"]
pub struct RegistrationHandle {
    ids: Vec<String>,
}

impl RegistrationHandle {
    /// Ids covered by this handle
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Unregister every covered id. Calling this again is a no-op.
    ///
    /// Returns how many shortcuts were actually removed.
    pub fn unregister(&self, registry: &mut ShortcutRegistry) -> usize {
        self.ids.iter().filter(|id| registry.unregister(id)).count()
    }
}

/// In-memory table of shortcut definitions, kept in registration order
#[derive(Debug, Default)]
pub struct ShortcutRegistry {
    shortcuts: Vec<ShortcutDefinition>,
    /// Map from id to position in `shortcuts`
    by_id: HashMap<String, usize>,
    next_order: u64,
    /// Platform used to fold `mod` when comparing keys
    platform: Platform,
}

impl ShortcutRegistry {
    /// Create a new empty registry for the detected platform
    pub fn new() -> Self {
        Self::with_platform(parser::detect_platform())
    }

    /// Create a new empty registry for a specific platform
    pub fn with_platform(platform: Platform) -> Self {
        ShortcutRegistry {
            platform,
            ..Default::default()
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn set_platform(&mut self, platform: Platform) {
        self.platform = platform;
    }

    /// Register a shortcut, replacing any definition with the same id
    pub fn register(
        &mut self,
        options: ShortcutRegistrationOptions,
    ) -> Result<RegistrationHandle, RegistryError> {
        let id = options.id.clone();
        self.insert(options)?;
        Ok(RegistrationHandle { ids: vec![id] })
    }

    /// Register several shortcuts; nothing is registered if any id is invalid
    pub fn register_many<I>(&mut self, entries: I) -> Result<RegistrationHandle, RegistryError>
    where
        I: IntoIterator<Item = ShortcutRegistrationOptions>,
    {
        let entries: Vec<ShortcutRegistrationOptions> = entries.into_iter().collect();
        if entries.iter().any(|options| options.id.is_empty()) {
            return Err(RegistryError::EmptyId);
        }

        let mut ids = Vec::with_capacity(entries.len());
        for options in entries {
            ids.push(options.id.clone());
            self.insert(options)?;
        }

        Ok(RegistrationHandle { ids })
    }

    fn insert(&mut self, options: ShortcutRegistrationOptions) -> Result<(), RegistryError> {
        if options.id.is_empty() {
            return Err(RegistryError::EmptyId);
        }

        if let Err(e) = parser::parse_chord_sequence(&options.keys) {
            warn!("Shortcut {} has unparseable keys '{}': {}", options.id, options.keys, e);
        }

        match self.by_id.get(&options.id) {
            Some(&idx) => {
                let order = self.shortcuts[idx].registration_order;
                debug!("Replacing shortcut {} ({})", options.id, options.keys);
                self.shortcuts[idx] = ShortcutDefinition::from_options(options, order);
            }
            None => {
                debug!("Registering shortcut {} ({})", options.id, options.keys);
                let order = self.next_order;
                self.next_order += 1;
                self.by_id.insert(options.id.clone(), self.shortcuts.len());
                self.shortcuts.push(ShortcutDefinition::from_options(options, order));
            }
        }

        Ok(())
    }

    /// Remove a shortcut by id; returns false if it was not registered
    pub fn unregister(&mut self, id: &str) -> bool {
        let Some(idx) = self.by_id.remove(id) else {
            return false;
        };

        self.shortcuts.remove(idx);
        for position in self.by_id.values_mut() {
            if *position > idx {
                *position -= 1;
            }
        }
        debug!("Unregistered shortcut {}", id);
        true
    }

    /// Remove every shortcut
    pub fn clear(&mut self) {
        self.shortcuts.clear();
        self.by_id.clear();
    }

    /// Get number of registered shortcuts
    pub fn len(&self) -> usize {
        self.shortcuts.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.shortcuts.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Whether an enabled shortcut is bound to `keys` in any context.
    ///
    /// Keys are compared after normalization, so `"Shift+Ctrl+K"` finds a
    /// shortcut registered as `"ctrl+shift+k"`.
    pub fn is_registered(&self, keys: &str) -> bool {
        let normalized = match parser::normalize_key_combo_for(keys, self.platform) {
            Ok(normalized) => normalized,
            Err(_) => return false,
        };
        self.shortcuts.iter().any(|s| {
            s.enabled
                && parser::normalize_key_combo_for(&s.keys, self.platform).as_deref()
                    == Ok(normalized.as_str())
        })
    }

    /// Lookup a shortcut by id
    pub fn get(&self, id: &str) -> Option<&ShortcutDefinition> {
        self.by_id.get(id).map(|&idx| &self.shortcuts[idx])
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut ShortcutDefinition> {
        match self.by_id.get(id) {
            Some(&idx) => Some(&mut self.shortcuts[idx]),
            None => None,
        }
    }

    /// All shortcuts in registration order
    pub fn get_all(&self) -> &[ShortcutDefinition] {
        &self.shortcuts
    }

    pub fn get_by_category(&self, category: Category) -> Vec<&ShortcutDefinition> {
        self.shortcuts
            .iter()
            .filter(|s| s.category == category)
            .collect()
    }

    /// Shortcuts active in `context`; global shortcuts are always included
    pub fn get_by_context(&self, context: ShortcutContext) -> Vec<&ShortcutDefinition> {
        self.shortcuts
            .iter()
            .filter(|s| s.context == context || s.context.is_global())
            .collect()
    }

    /// Shortcuts contributed by a preset
    pub fn get_by_preset(&self, preset: &str) -> Vec<&ShortcutDefinition> {
        self.shortcuts
            .iter()
            .filter(|s| s.preset.as_deref() == Some(preset))
            .collect()
    }

    /// Shortcuts grouped by category; every category is present, possibly empty
    pub fn get_grouped_by_category(&self) -> BTreeMap<Category, Vec<&ShortcutDefinition>> {
        let mut grouped: BTreeMap<Category, Vec<&ShortcutDefinition>> =
            Category::ALL.iter().map(|&c| (c, Vec::new())).collect();
        for shortcut in &self.shortcuts {
            grouped.entry(shortcut.category).or_default().push(shortcut);
        }
        grouped
    }

    /// Shortcuts grouped by their own context; every context is present, possibly empty
    pub fn get_grouped_by_context(&self) -> BTreeMap<ShortcutContext, Vec<&ShortcutDefinition>> {
        let mut grouped: BTreeMap<ShortcutContext, Vec<&ShortcutDefinition>> =
            ShortcutContext::ALL.iter().map(|&c| (c, Vec::new())).collect();
        for shortcut in &self.shortcuts {
            grouped.entry(shortcut.context).or_default().push(shortcut);
        }
        grouped
    }

    /// Replace the keys of a shortcut
    pub fn update_keys(&mut self, id: &str, keys: impl Into<String>) -> bool {
        let keys = keys.into();
        match self.get_mut(id) {
            Some(shortcut) => {
                debug!("Updating keys for {}: {} -> {}", id, shortcut.keys, keys);
                shortcut.keys = keys;
                true
            }
            None => false,
        }
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.get_mut(id) {
            Some(shortcut) => {
                shortcut.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn set_action(&mut self, id: &str, action: Option<ShortcutAction>) -> bool {
        match self.get_mut(id) {
            Some(shortcut) => {
                shortcut.action = action;
                true
            }
            None => false,
        }
    }

    pub fn set_priority(&mut self, id: &str, priority: i32) -> bool {
        match self.get_mut(id) {
            Some(shortcut) => {
                shortcut.priority = priority;
                true
            }
            None => false,
        }
    }

    /// Detect conflicts among the enabled shortcuts
    pub fn detect_conflicts(&self) -> Vec<ShortcutConflict> {
        ConflictDetector::detect(&self.shortcuts, self.platform)
    }

    /// Whether `keys` in `context` would collide with another enabled shortcut
    pub fn has_conflict(&self, keys: &str, context: ShortcutContext, exclude_id: Option<&str>) -> bool {
        ConflictDetector::has_conflict(&self.shortcuts, keys, context, exclude_id, self.platform)
    }

    /// The shortcut that wins for `keys` in `context`, if any
    pub fn resolve_conflict(&self, keys: &str, context: ShortcutContext) -> Option<&ShortcutDefinition> {
        ConflictDetector::resolve(&self.shortcuts, keys, context, self.platform)
    }
}
