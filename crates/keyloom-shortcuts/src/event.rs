//! Host-facing event types and injected capabilities
//!
//! The shortcut engine never talks to a UI runtime directly. Hosts translate
//! their native keyboard events into [`KeyEvent`] and may provide:
//! - an [`InputEnvironment`] to classify focus targets and report modifier state
//! - an [`EventSource`] the manager attaches its listeners to
//! - a [`Clock`] driving chord expiry

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::models::Modifiers;

/// Classification of the element that had focus when a key was pressed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTarget {
    /// Text input, textarea, contenteditable and similar
    Editable,
    NonEditable,
    /// The host did not classify the target; tracked focus state is used instead
    #[default]
    Unknown,
}

/// A single key press as seen by the shortcut engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
    /// Key identity as reported by the host (e.g. `"k"`, `"ArrowDown"`, `"Escape"`)
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
    pub target: EventTarget,
    default_prevented: bool,
}

impl KeyEvent {
    /// Create a key event with no modifiers held
    pub fn new(key: impl Into<String>) -> Self {
        KeyEvent {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.ctrl = modifiers.ctrl;
        self.shift = modifiers.shift;
        self.alt = modifiers.alt;
        self.meta = modifiers.meta;
        self
    }

    pub fn with_target(mut self, target: EventTarget) -> Self {
        self.target = target;
        self
    }

    /// Modifier flags held during this event
    pub fn modifiers(&self) -> Modifiers {
        Modifiers {
            ctrl: self.ctrl,
            shift: self.shift,
            alt: self.alt,
            meta: self.meta,
        }
    }

    /// Ask the host to suppress the platform default action
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Queries the host answers about its focus and keyboard state
pub trait InputEnvironment: Send + Sync {
    /// Whether the event was dispatched to a text-editable element.
    ///
    /// `focus_in_input` is the focus state tracked from focus-in/focus-out
    /// notifications.
    fn is_editable_target(&self, event: &KeyEvent, focus_in_input: bool) -> bool;

    /// Modifiers currently held, independent of any event
    fn current_modifiers(&self) -> Modifiers;
}

/// Environment that trusts the event's own target classification
#[derive(Debug, Clone, Copy, Default)]
pub struct EventTargetEnvironment;

impl InputEnvironment for EventTargetEnvironment {
    fn is_editable_target(&self, event: &KeyEvent, focus_in_input: bool) -> bool {
        match event.target {
            EventTarget::Editable => true,
            EventTarget::NonEditable => false,
            EventTarget::Unknown => focus_in_input,
        }
    }

    fn current_modifiers(&self) -> Modifiers {
        Modifiers::none()
    }
}

/// Kinds of host listeners the manager installs on attach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    KeyDown,
    FocusIn,
    FocusOut,
}

/// Opaque handle returned by an [`EventSource`] for an installed listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Ambient source of keyboard and focus events
pub trait EventSource: Send {
    /// Install a listener; the host forwards matching events to the manager
    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId;

    /// Remove a previously installed listener
    fn remove_listener(&mut self, id: ListenerId);
}

/// Time source used for chord expiry
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to; used for replay and tests
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed_ms: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock {
            origin: Instant::now(),
            elapsed_ms: AtomicU64::new(0),
        }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        let by_ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        let _ = self
            .elapsed_ms
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |ms| Some(ms.saturating_add(by_ms)));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + Duration::from_millis(self.elapsed_ms.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prevent_default() {
        let mut event = KeyEvent::new("k").with_ctrl();
        assert!(!event.default_prevented());
        event.prevent_default();
        assert!(event.default_prevented());
    }

    #[test]
    fn test_environment_uses_target() {
        let env = EventTargetEnvironment;
        let editable = KeyEvent::new("a").with_target(EventTarget::Editable);
        let plain = KeyEvent::new("a").with_target(EventTarget::NonEditable);
        let unknown = KeyEvent::new("a");

        assert!(env.is_editable_target(&editable, false));
        assert!(!env.is_editable_target(&plain, true));
        assert!(env.is_editable_target(&unknown, true));
        assert!(!env.is_editable_target(&unknown, false));
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new();
        let start = clock.now();
        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now() - start, Duration::from_millis(250));
    }
}
