//! Shortcut manager: dispatches key events and drives chord state
//!
//! The manager is idle until a key matches the first step of one or more
//! chords. It then keeps the set of chords that still agree with every key
//! typed so far, narrowing it step by step until one completes, a key breaks
//! the sequence, or the chord deadline passes.

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::{
    config::ManagerConfig,
    conflict::compare_precedence,
    error::{ManagerError, PresetError, RegistryError},
    event::{
        Clock, EventSource, EventTargetEnvironment, InputEnvironment, KeyEvent, ListenerId,
        ListenerKind, SystemClock,
    },
    models::{
        ActionResult, KeySequence, Modifiers, ParsedKey, Platform, ShortcutAction, ShortcutConflict,
        ShortcutContext, ShortcutDefinition, ShortcutRegistrationOptions, UserShortcutOverrides,
    },
    parser,
    preset::{self, Preset, PresetCatalog},
    registry::{RegistrationHandle, ShortcutRegistry},
};

/// Outcome of dispatching one key event
#[derive(Debug, Clone, Default)]
pub struct ShortcutEventResult {
    /// An action ran and did not decline
    pub handled: bool,
    /// The shortcut that handled the event
    pub shortcut: Option<ShortcutDefinition>,
    /// A chord is waiting for its next step
    pub pending_chord: bool,
}

impl ShortcutEventResult {
    fn unhandled(pending_chord: bool) -> Self {
        ShortcutEventResult {
            pending_chord,
            ..Default::default()
        }
    }

    fn handled(shortcut: &ShortcutDefinition) -> Self {
        ShortcutEventResult {
            handled: true,
            shortcut: Some(shortcut.clone()),
            pending_chord: false,
        }
    }
}

/// Snapshot of a chord in progress, for chord-progress UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordProgress {
    /// Steps typed so far
    pub matched_steps: Vec<ParsedKey>,
    /// Shortcuts that can still complete, best candidate first
    pub candidate_ids: Vec<String>,
}

#[derive(Debug, Clone)]
struct ChordCandidate {
    id: String,
    sequence: KeySequence,
}

#[derive(Debug, Clone)]
struct ChordState {
    matched_steps: usize,
    candidates: Vec<ChordCandidate>,
    deadline: Instant,
}

/// Owns a registry and turns key events into shortcut actions
pub struct ShortcutManager {
    registry: ShortcutRegistry,
    config: ManagerConfig,
    platform: Platform,
    active_contexts: HashSet<ShortcutContext>,
    chord: Option<ChordState>,
    catalog: PresetCatalog,
    current_preset: Option<Preset>,
    user_overrides: UserShortcutOverrides,
    environment: Box<dyn InputEnvironment>,
    clock: Arc<dyn Clock>,
    event_source: Option<Box<dyn EventSource>>,
    listeners: Option<[ListenerId; 3]>,
    input_focused: bool,
}

impl ShortcutManager {
    /// Create a manager with the built-in preset catalog.
    ///
    /// If the configuration names a preset it is loaded immediately; an
    /// unknown name is logged and leaves the registry empty.
    pub fn new(config: ManagerConfig) -> Self {
        let platform = config.platform.unwrap_or_else(parser::detect_platform);
        let mut active_contexts: HashSet<ShortcutContext> = config.contexts.iter().copied().collect();
        active_contexts.insert(ShortcutContext::Global);

        let mut manager = ShortcutManager {
            registry: ShortcutRegistry::with_platform(platform),
            config,
            platform,
            active_contexts,
            chord: None,
            catalog: PresetCatalog::with_builtin(),
            current_preset: None,
            user_overrides: UserShortcutOverrides::default(),
            environment: Box::new(EventTargetEnvironment),
            clock: Arc::new(SystemClock),
            event_source: None,
            listeners: None,
            input_focused: false,
        };
        manager.load_configured_preset();
        manager
    }

    /// Like [`ShortcutManager::new`], but rejects invalid configuration
    pub fn try_new(config: ManagerConfig) -> Result<Self, ManagerError> {
        config.validate()?;
        let preset = config.preset.clone();
        let mut manager = Self::new(ManagerConfig { preset: None, ..config });
        if let Some(name) = preset {
            manager.config.preset = Some(name.clone());
            manager.try_load_preset(&name)?;
        }
        Ok(manager)
    }

    /// Replace the preset catalog, reloading the configured preset from it
    pub fn with_catalog(mut self, catalog: PresetCatalog) -> Self {
        self.catalog = catalog;
        self.load_configured_preset();
        self
    }

    pub fn with_environment(mut self, environment: Box<dyn InputEnvironment>) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the source that [`ShortcutManager::attach`] installs listeners on
    pub fn with_event_source(mut self, source: Box<dyn EventSource>) -> Self {
        self.detach();
        self.event_source = Some(source);
        self
    }

    fn load_configured_preset(&mut self) {
        if let Some(name) = self.config.preset.clone() {
            if !self.load_preset(&name) {
                warn!("Configured preset {} is not available", name);
            }
        }
    }

    // Presets

    /// Load a preset from the catalog. Returns false, leaving the registry
    /// untouched, when the preset does not exist or is invalid.
    pub fn load_preset(&mut self, name: &str) -> bool {
        match self.try_load_preset(name) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to load preset {}: {}", name, e);
                false
            }
        }
    }

    pub fn try_load_preset(&mut self, name: &str) -> Result<(), ManagerError> {
        let preset = self
            .catalog
            .get(name)
            .cloned()
            .ok_or_else(|| PresetError::PresetNotFound(name.to_string()))?;
        self.load_preset_object(preset)
    }

    /// Replace every registered shortcut with the entries of `preset`,
    /// after applying the current user overrides
    pub fn load_preset_object(&mut self, preset: Preset) -> Result<(), ManagerError> {
        preset.validate()?;

        let options = preset::apply_user_overrides(
            preset::preset_to_registration_options(&preset),
            &self.user_overrides,
        );

        self.chord = None;
        self.registry.clear();
        let handle = self.registry.register_many(options)?;
        info!(
            "Loaded preset {} with {} shortcuts",
            preset.name,
            handle.ids().len()
        );

        let conflicts = self.registry.detect_conflicts();
        for conflict in &conflicts {
            debug!(
                "Preset {} binds {} in {} to {:?}; {} wins",
                preset.name, conflict.keys, conflict.context, conflict.shortcut_ids, conflict.winner_id
            );
        }

        self.current_preset = Some(preset);
        Ok(())
    }

    /// Name of the loaded preset
    pub fn current_preset(&self) -> Option<&str> {
        self.current_preset.as_ref().map(|p| p.name.as_str())
    }

    pub fn catalog(&self) -> &PresetCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut PresetCatalog {
        &mut self.catalog
    }

    /// Replace the user overrides and re-apply the loaded preset.
    ///
    /// Actions and enabled flags set on entries that stay registered are
    /// carried over to the re-applied definitions.
    pub fn set_user_overrides(&mut self, overrides: UserShortcutOverrides) {
        self.user_overrides = overrides;
        let Some(preset) = self.current_preset.clone() else {
            return;
        };

        let carried: Vec<(String, Option<ShortcutAction>, bool)> = self
            .registry
            .get_all()
            .iter()
            .map(|s| (s.id.clone(), s.action.clone(), s.enabled))
            .collect();

        if let Err(e) = self.load_preset_object(preset) {
            warn!("Failed to re-apply preset after override change: {}", e);
            return;
        }

        for (id, action, enabled) in carried {
            if self.registry.contains(&id) {
                self.registry.set_action(&id, action);
                self.registry.set_enabled(&id, enabled);
            }
        }
    }

    pub fn user_overrides(&self) -> &UserShortcutOverrides {
        &self.user_overrides
    }

    // Contexts

    pub fn add_context(&mut self, context: ShortcutContext) {
        self.active_contexts.insert(context);
    }

    /// Deactivate a context; global cannot be removed
    pub fn remove_context(&mut self, context: ShortcutContext) {
        if !context.is_global() {
            self.active_contexts.remove(&context);
        }
    }

    /// Replace the active contexts; global stays active
    pub fn set_contexts<I>(&mut self, contexts: I)
    where
        I: IntoIterator<Item = ShortcutContext>,
    {
        self.active_contexts = contexts.into_iter().collect();
        self.active_contexts.insert(ShortcutContext::Global);
    }

    pub fn active_contexts(&self) -> &HashSet<ShortcutContext> {
        &self.active_contexts
    }

    pub fn is_context_active(&self, context: ShortcutContext) -> bool {
        self.active_contexts.contains(&context)
    }

    // Settings

    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Applies to chord steps matched after the call
    pub fn set_chord_timeout(&mut self, timeout: Duration) {
        self.config.chord_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    }

    pub fn chord_timeout(&self) -> Duration {
        self.config.chord_timeout()
    }

    pub fn set_ignore_inputs(&mut self, ignore_inputs: bool) {
        self.config.ignore_inputs = ignore_inputs;
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Modifiers the environment reports as currently held
    pub fn current_modifiers(&self) -> Modifiers {
        self.environment.current_modifiers()
    }

    // Registry access

    pub fn registry(&self) -> &ShortcutRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ShortcutRegistry {
        &mut self.registry
    }

    pub fn register(
        &mut self,
        options: ShortcutRegistrationOptions,
    ) -> Result<RegistrationHandle, RegistryError> {
        self.registry.register(options)
    }

    pub fn register_many<I>(&mut self, entries: I) -> Result<RegistrationHandle, RegistryError>
    where
        I: IntoIterator<Item = ShortcutRegistrationOptions>,
    {
        self.registry.register_many(entries)
    }

    pub fn detect_conflicts(&self) -> Vec<ShortcutConflict> {
        self.registry.detect_conflicts()
    }

    // Focus tracking

    /// Record that focus moved to an element; `editable` marks text inputs
    pub fn handle_focus_in(&mut self, editable: bool) {
        self.input_focused = editable;
    }

    pub fn handle_focus_out(&mut self) {
        self.input_focused = false;
    }

    // Event source

    /// Install keydown, focus-in and focus-out listeners on the event source.
    /// Does nothing when already attached or when no source is set.
    pub fn attach(&mut self) {
        if self.listeners.is_some() {
            return;
        }
        let Some(source) = self.event_source.as_mut() else {
            debug!("No event source; attach skipped");
            return;
        };

        self.listeners = Some([
            source.add_listener(ListenerKind::KeyDown),
            source.add_listener(ListenerKind::FocusIn),
            source.add_listener(ListenerKind::FocusOut),
        ]);
        debug!("Shortcut manager attached");
    }

    /// Remove the listeners installed by [`ShortcutManager::attach`] and drop
    /// any pending chord
    pub fn detach(&mut self) {
        self.chord = None;
        let Some(listeners) = self.listeners.take() else {
            return;
        };
        if let Some(source) = self.event_source.as_mut() {
            for id in listeners {
                source.remove_listener(id);
            }
        }
        debug!("Shortcut manager detached");
    }

    pub fn is_attached(&self) -> bool {
        self.listeners.is_some()
    }

    // Chord state

    /// Progress of the chord being typed
    pub fn pending_chord(&self) -> Option<ChordProgress> {
        let state = self.chord.as_ref()?;
        let matched_steps = state
            .candidates
            .first()
            .map(|c| c.sequence.steps[..state.matched_steps].to_vec())
            .unwrap_or_default();

        Some(ChordProgress {
            matched_steps,
            candidate_ids: state.candidates.iter().map(|c| c.id.clone()).collect(),
        })
    }

    /// When the pending chord expires, if one is pending
    pub fn chord_deadline(&self) -> Option<Instant> {
        self.chord.as_ref().map(|state| state.deadline)
    }

    pub fn cancel_chord(&mut self) {
        if self.chord.take().is_some() {
            debug!("Chord cancelled");
        }
    }

    /// Expire the pending chord if its deadline has passed.
    ///
    /// Hosts call this from a timer scheduled at [`ShortcutManager::chord_deadline`].
    /// Returns true if a chord was dropped.
    pub fn tick(&mut self) -> bool {
        let now = self.clock.now();
        self.expire_chord(now)
    }

    fn expire_chord(&mut self, now: Instant) -> bool {
        match &self.chord {
            Some(state) if now >= state.deadline => {
                debug!("Chord timed out after {} steps", state.matched_steps);
                self.chord = None;
                true
            }
            _ => false,
        }
    }

    // Dispatch

    /// Dispatch a key event.
    ///
    /// Never panics: a panicking action is logged, the chord state is reset
    /// and the event is reported as unhandled.
    pub fn handle_key_event(&mut self, event: &mut KeyEvent) -> ShortcutEventResult {
        let now = self.clock.now();
        self.expire_chord(now);

        if !self.config.enabled || parser::is_modifier_key(&event.key) {
            return ShortcutEventResult::unhandled(self.chord.is_some());
        }

        let in_input = self.config.ignore_inputs
            && self.environment.is_editable_target(event, self.input_focused);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            if self.chord.is_some() {
                self.dispatch_pending(event, in_input, now)
            } else {
                self.dispatch_idle(event, in_input, now)
            }
        }));

        match outcome {
            Ok(result) => result,
            Err(payload) => {
                self.chord = None;
                error!(
                    "Shortcut action panicked on key {}: {}",
                    event.key,
                    panic_message(payload.as_ref())
                );
                ShortcutEventResult::unhandled(false)
            }
        }
    }

    fn is_eligible(&self, shortcut: &ShortcutDefinition, in_input: bool) -> bool {
        shortcut.enabled
            && shortcut.applies_to_contexts(&self.active_contexts)
            && (!in_input || shortcut.enable_in_inputs)
    }

    fn dispatch_idle(&mut self, event: &mut KeyEvent, in_input: bool, now: Instant) -> ShortcutEventResult {
        let mut simple: Vec<&ShortcutDefinition> = Vec::new();
        let mut chords: Vec<(&ShortcutDefinition, KeySequence)> = Vec::new();

        for shortcut in self.registry.get_all() {
            if !self.is_eligible(shortcut, in_input) {
                continue;
            }
            let sequence = match shortcut.parse_keys() {
                Ok(sequence) => sequence,
                Err(e) => {
                    debug!("Skipping shortcut {}: {}", shortcut.id, e);
                    continue;
                }
            };
            let Some(first) = sequence.first() else {
                continue;
            };
            if !parser::matches_key_event(event, first, self.platform) {
                continue;
            }

            if sequence.is_chord() {
                chords.push((shortcut, sequence));
            } else {
                simple.push(shortcut);
            }
        }

        simple.sort_by(|a, b| compare_precedence(a, b));
        for shortcut in simple {
            if run_shortcut(shortcut, event) {
                return ShortcutEventResult::handled(shortcut);
            }
        }

        if chords.is_empty() {
            return ShortcutEventResult::unhandled(false);
        }

        chords.sort_by(|(a, _), (b, _)| compare_precedence(a, b));
        let candidates: Vec<ChordCandidate> = chords
            .into_iter()
            .map(|(shortcut, sequence)| ChordCandidate {
                id: shortcut.id.clone(),
                sequence,
            })
            .collect();

        debug!(
            "Chord started by {} with {} candidates",
            event.key,
            candidates.len()
        );
        event.prevent_default();
        self.chord = Some(ChordState {
            matched_steps: 1,
            candidates,
            deadline: now + self.config.chord_timeout(),
        });
        ShortcutEventResult::unhandled(true)
    }

    fn dispatch_pending(
        &mut self,
        event: &mut KeyEvent,
        in_input: bool,
        now: Instant,
    ) -> ShortcutEventResult {
        let Some(state) = self.chord.take() else {
            return ShortcutEventResult::unhandled(false);
        };
        let step = state.matched_steps;

        let mut advanced: Vec<ChordCandidate> = Vec::new();
        for candidate in state.candidates {
            let Some(shortcut) = self.registry.get(&candidate.id) else {
                continue;
            };
            // A candidate whose keys changed since the chord started is dropped
            if !self.is_eligible(shortcut, in_input)
                || shortcut.parse_keys().as_ref() != Ok(&candidate.sequence)
            {
                continue;
            }
            let matches = candidate
                .sequence
                .steps
                .get(step)
                .is_some_and(|key| parser::matches_key_event(event, key, self.platform));
            if matches {
                advanced.push(candidate);
            }
        }

        if advanced.is_empty() {
            debug!("Chord cancelled by {}", event.key);
            return ShortcutEventResult::unhandled(false);
        }

        let matched_steps = step + 1;
        let (complete, longer): (Vec<ChordCandidate>, Vec<ChordCandidate>) = advanced
            .into_iter()
            .partition(|candidate| candidate.sequence.len() == matched_steps);

        let mut finished: Vec<&ShortcutDefinition> = complete
            .iter()
            .filter_map(|candidate| self.registry.get(&candidate.id))
            .collect();
        finished.sort_by(|a, b| compare_precedence(a, b));
        for shortcut in finished {
            if run_shortcut(shortcut, event) {
                return ShortcutEventResult::handled(shortcut);
            }
        }

        if longer.is_empty() {
            debug!("Every chord candidate declined {}", event.key);
            return ShortcutEventResult::unhandled(false);
        }

        event.prevent_default();
        self.chord = Some(ChordState {
            matched_steps,
            candidates: longer,
            deadline: now + self.config.chord_timeout(),
        });
        ShortcutEventResult::unhandled(true)
    }
}

impl Drop for ShortcutManager {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Run a matched shortcut; false if its action declined
fn run_shortcut(shortcut: &ShortcutDefinition, event: &mut KeyEvent) -> bool {
    let result = shortcut
        .action
        .as_ref()
        .map_or(ActionResult::Handled, |action| action.call(event));

    if result == ActionResult::Declined {
        debug!("Shortcut {} declined {}", shortcut.id, event.key);
        return false;
    }

    if shortcut.prevent_default {
        event.prevent_default();
    }
    debug!("Shortcut {} handled {}", shortcut.id, event.key);
    true
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
