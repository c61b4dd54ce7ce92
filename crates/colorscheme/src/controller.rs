//! The preference controller: stored choice, OS reconciliation, notification.
//!
//! ## Model
//!
//! The controller owns exactly one piece of state, the user's [`Mode`]. The
//! displayed [`Scheme`] is never cached: it is derived from the mode and, when
//! the mode is [`Mode::System`], from the provider's answer at query time.
//!
//! ```text
//!            set_user_choice(Light|Dark)
//!   following ──────────────────────────▶ pinned
//!   (System)  ◀────────────────────────── (Light|Dark)
//!            set_user_choice(System)
//! ```
//!
//! Every transition above emits one change signal. While following, an OS
//! change also emits one; while pinned, OS changes are ignored.
//!
//! ## Notification
//!
//! Subscribers registered with [`PreferenceController::on_change`] are called
//! synchronously, in registration order, each with its own freshly computed
//! [`Status`]. A callback may call back into the controller.
//!
//! ## Storage Failures
//!
//! Persistence is best effort. If the stored value cannot be loaded the
//! controller starts in [`Mode::System`] and exposes the cause through
//! [`PreferenceController::load_warning`]. If a write fails the new mode still
//! takes effect in memory and the failure comes back as
//! [`Update::InMemoryOnly`].

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::notify::{Listeners, SubscriptionId};
use crate::provider::SystemSchemeProvider;
use crate::store::{PreferenceStore, STORAGE_KEY};
use crate::{Mode, Scheme, SchemeError, Status};

/// Outcome of [`PreferenceController::set_user_choice`].
#[derive(Debug)]
#[must_use = "a storage failure is reported through the returned Update"]
pub enum Update {
    /// The requested mode was already current. Nothing was written or emitted.
    Unchanged,
    /// The mode changed and was persisted.
    Persisted,
    /// The mode changed in memory but could not be persisted.
    InMemoryOnly(SchemeError),
}

impl Update {
    /// True if the mode changed (and subscribers were notified).
    pub fn changed(&self) -> bool {
        !matches!(self, Update::Unchanged)
    }

    /// The storage failure, if the change could not be persisted.
    pub fn warning(&self) -> Option<&SchemeError> {
        match self {
            Update::InMemoryOnly(err) => Some(err),
            _ => None,
        }
    }
}

struct Inner<S, P> {
    mode: Cell<Mode>,
    store: RefCell<S>,
    provider: P,
    listeners: Listeners<Status>,
}

impl<S, P: SystemSchemeProvider> Inner<S, P> {
    fn effective(&self) -> Scheme {
        match self.mode.get() {
            Mode::Light => Scheme::Light,
            Mode::Dark => Scheme::Dark,
            Mode::System => self.provider.current(),
        }
    }

    fn status(&self) -> Status {
        Status {
            mode: self.mode.get(),
            effective: self.effective(),
        }
    }

    fn signal(&self) -> usize {
        self.listeners.emit_with(|| self.status())
    }

    fn on_system_change(&self, scheme: Scheme) {
        let mode = self.mode.get();
        if mode.is_pinned() {
            tracing::trace!(%mode, system = %scheme, "system scheme change ignored, mode is pinned");
            return;
        }
        let notified = self.signal();
        tracing::debug!(system = %scheme, notified, "following system scheme change");
    }
}

/// Holds the user's color-scheme preference and reconciles it with the OS.
///
/// Construct one per application and pass it by reference to whatever needs
/// the current scheme. Instances are independent: each has its own store,
/// provider and subscriber list.
///
/// # Example
///
/// ```
/// use colorscheme::{MemoryStore, MockSchemeProvider, Mode, PreferenceController, Scheme};
///
/// let os = MockSchemeProvider::new(Scheme::Dark);
/// let prefs = PreferenceController::new(MemoryStore::new(), os.clone());
/// assert_eq!(prefs.user_choice(), Mode::System);
/// assert_eq!(prefs.effective_scheme(), Scheme::Dark);
///
/// let update = prefs.set_user_choice(Mode::Light);
/// assert!(update.changed());
/// assert_eq!(prefs.effective_scheme(), Scheme::Light);
/// ```
pub struct PreferenceController<S, P>
where
    S: PreferenceStore + 'static,
    P: SystemSchemeProvider + 'static,
{
    inner: Rc<Inner<S, P>>,
    provider_subscription: SubscriptionId,
    load_warning: Option<SchemeError>,
}

impl<S, P> PreferenceController<S, P>
where
    S: PreferenceStore + 'static,
    P: SystemSchemeProvider + 'static,
{
    /// Loads the stored mode (defaulting to [`Mode::System`]) and starts
    /// listening to `provider`.
    pub fn new(store: S, provider: P) -> Self {
        let (mode, load_warning) = match load_mode(&store) {
            Ok(mode) => (mode, None),
            Err(err) => {
                tracing::warn!(error = %err, "cannot load color scheme preference, following system");
                (Mode::System, Some(err))
            }
        };
        tracing::debug!(%mode, "color scheme preference loaded");

        let inner = Rc::new(Inner {
            mode: Cell::new(mode),
            store: RefCell::new(store),
            provider,
            listeners: Listeners::default(),
        });

        let weak = Rc::downgrade(&inner);
        let provider_subscription = inner.provider.subscribe(Box::new(move |scheme| {
            if let Some(inner) = weak.upgrade() {
                inner.on_system_change(scheme);
            }
        }));

        Self {
            inner,
            provider_subscription,
            load_warning,
        }
    }

    /// Sets the user's mode.
    ///
    /// Choosing the current mode is a no-op: nothing is written and no signal
    /// is emitted, even if the stored copy has drifted from memory. Otherwise
    /// the mode is persisted, takes effect, and subscribers are notified once.
    pub fn set_user_choice(&self, mode: Mode) -> Update {
        let previous = self.inner.mode.get();
        if mode == previous {
            tracing::trace!(%mode, "color scheme preference unchanged");
            return Update::Unchanged;
        }

        let persisted = self
            .inner
            .store
            .borrow_mut()
            .set(STORAGE_KEY, mode.as_str());
        self.inner.mode.set(mode);
        tracing::debug!(from = %previous, to = %mode, "color scheme preference changed");

        self.inner.signal();

        match persisted {
            Ok(()) => Update::Persisted,
            Err(err) => {
                tracing::warn!(error = %err, %mode, "color scheme preference kept in memory only");
                Update::InMemoryOnly(err)
            }
        }
    }

    /// Parses `raw` as a mode and sets it.
    ///
    /// Unrecognized values are rejected with [`SchemeError::InvalidMode`]
    /// before anything is written.
    pub fn set_user_choice_str(&self, raw: &str) -> Result<Update, SchemeError> {
        let mode = raw.parse()?;
        Ok(self.set_user_choice(mode))
    }

    /// The user's mode.
    pub fn user_choice(&self) -> Mode {
        self.inner.mode.get()
    }

    /// The scheme to display right now.
    pub fn effective_scheme(&self) -> Scheme {
        self.inner.effective()
    }

    /// What the OS prefers, regardless of the user's mode.
    pub fn system_scheme(&self) -> Scheme {
        self.inner.provider.current()
    }

    /// Mode and effective scheme, as delivered to subscribers.
    pub fn status(&self) -> Status {
        self.inner.status()
    }

    /// True when the mode follows the OS.
    pub fn is_following_system(&self) -> bool {
        !self.inner.mode.get().is_pinned()
    }

    /// Registers `callback` to receive a fresh [`Status`] on every change.
    pub fn on_change(&self, callback: impl Fn(Status) + 'static) -> SubscriptionId {
        self.inner.listeners.add(Rc::new(callback))
    }

    /// Removes a callback. Returns false if `id` was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.listeners.remove(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// The error that forced the default mode at construction, if any.
    pub fn load_warning(&self) -> Option<&SchemeError> {
        self.load_warning.as_ref()
    }

    pub fn provider(&self) -> &P {
        &self.inner.provider
    }
}

impl<S, P> Drop for PreferenceController<S, P>
where
    S: PreferenceStore + 'static,
    P: SystemSchemeProvider + 'static,
{
    fn drop(&mut self) {
        self.inner.provider.unsubscribe(self.provider_subscription);
    }
}

impl<S, P> fmt::Debug for PreferenceController<S, P>
where
    S: PreferenceStore + 'static,
    P: SystemSchemeProvider + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreferenceController")
            .field("mode", &self.inner.mode.get())
            .field("subscribers", &self.inner.listeners.len())
            .field("load_warning", &self.load_warning)
            .finish()
    }
}

fn load_mode(store: &impl PreferenceStore) -> Result<Mode, SchemeError> {
    match store.get(STORAGE_KEY)? {
        Some(raw) => raw.parse(),
        None => Ok(Mode::System),
    }
}
