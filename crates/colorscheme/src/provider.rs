//! Sources of the operating system's color scheme.
//!
//! The controller treats the OS as an external collaborator behind the
//! [`SystemSchemeProvider`] trait: something that can report the current
//! scheme and tell subscribers when it changes.
//!
//! # Detection
//!
//! [`OsSchemeProvider`] asks the OS through the `dark-light` crate. The
//! `COLORSCHEME_SYSTEM` environment variable (`light` or `dark`) overrides
//! detection, which is useful on headless machines where there is no desktop
//! setting to read.
//!
//! OS change events are not portable, so changes are observed by polling:
//! call [`OsSchemeProvider::poll`] from your event loop and subscribers are
//! notified when the detected scheme differs from the last one seen.
//!
//! # Testing
//!
//! [`MockSchemeProvider`] is a cloneable handle: hand one clone to the
//! controller and flip the scheme through the other.
//!
//! ```
//! use colorscheme::{MockSchemeProvider, Scheme, SystemSchemeProvider};
//!
//! let provider = MockSchemeProvider::new(Scheme::Light);
//! let handle = provider.clone();
//! handle.set(Scheme::Dark);
//! assert_eq!(provider.current(), Scheme::Dark);
//! ```

use std::cell::Cell;
use std::rc::Rc;

use dark_light::Mode as OsMode;

use crate::notify::{Listeners, SubscriptionId};
use crate::Scheme;

/// Environment variable that forces the detected system scheme.
pub const SYSTEM_OVERRIDE_ENV: &str = "COLORSCHEME_SYSTEM";

/// Reports the OS-level color scheme and its changes.
pub trait SystemSchemeProvider {
    /// The scheme the OS currently prefers.
    fn current(&self) -> Scheme;

    /// Registers `handler` to be called with the new scheme whenever the OS
    /// scheme changes.
    fn subscribe(&self, handler: Box<dyn Fn(Scheme)>) -> SubscriptionId;

    /// Removes a handler. Returns false if `id` was not registered.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

impl<P: SystemSchemeProvider + ?Sized> SystemSchemeProvider for Rc<P> {
    fn current(&self) -> Scheme {
        (**self).current()
    }

    fn subscribe(&self, handler: Box<dyn Fn(Scheme)>) -> SubscriptionId {
        (**self).subscribe(handler)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        (**self).unsubscribe(id)
    }
}

type SchemeDetector = fn() -> Scheme;

// === Real implementation ===

/// Provider backed by the operating system's appearance setting.
#[derive(Debug)]
pub struct OsSchemeProvider {
    detector: SchemeDetector,
    last_seen: Cell<Scheme>,
    listeners: Listeners<Scheme>,
}

impl OsSchemeProvider {
    /// Create a provider using OS detection.
    pub fn new() -> Self {
        Self::with_detector(detect_os_scheme)
    }

    /// Create a provider using a custom detector, e.g. a fixed scheme in tests.
    pub fn with_detector(detector: SchemeDetector) -> Self {
        Self {
            detector,
            last_seen: Cell::new(detector()),
            listeners: Listeners::default(),
        }
    }

    /// Re-detects the scheme and notifies subscribers if it changed since the
    /// last poll (or since construction).
    ///
    /// Returns true when a change was observed.
    pub fn poll(&self) -> bool {
        let detected = (self.detector)();
        if detected == self.last_seen.get() {
            return false;
        }

        tracing::debug!(from = %self.last_seen.get(), to = %detected, "system color scheme changed");
        self.last_seen.set(detected);
        self.listeners.emit_with(|| detected);
        true
    }
}

impl Default for OsSchemeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemSchemeProvider for OsSchemeProvider {
    fn current(&self) -> Scheme {
        (self.detector)()
    }

    fn subscribe(&self, handler: Box<dyn Fn(Scheme)>) -> SubscriptionId {
        self.listeners.add(Rc::from(handler))
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }
}

/// Detects the OS color scheme.
///
/// Resolution order:
/// 1. `COLORSCHEME_SYSTEM` if set to `light` or `dark`
/// 2. The desktop setting, via `dark-light`
/// 3. [`Scheme::Light`] when the platform reports nothing
pub fn detect_os_scheme() -> Scheme {
    if let Some(forced) = scheme_from_env() {
        return forced;
    }

    match dark_light::detect() {
        Ok(OsMode::Dark) => Scheme::Dark,
        Ok(_) => Scheme::Light,
        Err(err) => {
            tracing::debug!(error = %err, "system color scheme detection failed, assuming light");
            Scheme::Light
        }
    }
}

fn scheme_from_env() -> Option<Scheme> {
    let raw = std::env::var(SYSTEM_OVERRIDE_ENV).ok()?;
    match raw.to_ascii_lowercase().parse() {
        Ok(scheme) => Some(scheme),
        Err(_) => {
            tracing::warn!(value = %raw, "ignoring {SYSTEM_OVERRIDE_ENV}: expected light or dark");
            None
        }
    }
}

// === Mock implementation for testing ===

#[derive(Debug)]
struct MockState {
    scheme: Cell<Scheme>,
    listeners: Listeners<Scheme>,
}

/// Provider whose scheme is set by hand. Clones share state.
#[derive(Debug, Clone)]
pub struct MockSchemeProvider {
    state: Rc<MockState>,
}

impl MockSchemeProvider {
    pub fn new(scheme: Scheme) -> Self {
        Self {
            state: Rc::new(MockState {
                scheme: Cell::new(scheme),
                listeners: Listeners::default(),
            }),
        }
    }

    /// Simulates the OS switching to `scheme`.
    ///
    /// Subscribers are notified only when the scheme actually changes, as the
    /// OS would. Returns true in that case.
    pub fn set(&self, scheme: Scheme) -> bool {
        if self.state.scheme.replace(scheme) == scheme {
            return false;
        }
        self.state.listeners.emit_with(|| scheme);
        true
    }

    /// Simulates the OS switching to the opposite scheme.
    pub fn flip(&self) -> Scheme {
        let next = self.state.scheme.get().toggled();
        self.set(next);
        next
    }

    /// Number of registered handlers.
    pub fn subscriber_count(&self) -> usize {
        self.state.listeners.len()
    }
}

impl Default for MockSchemeProvider {
    fn default() -> Self {
        Self::new(Scheme::Light)
    }
}

impl SystemSchemeProvider for MockSchemeProvider {
    fn current(&self) -> Scheme {
        self.state.scheme.get()
    }

    fn subscribe(&self, handler: Box<dyn Fn(Scheme)>) -> SubscriptionId {
        self.state.listeners.add(Rc::from(handler))
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.state.listeners.remove(id)
    }
}
