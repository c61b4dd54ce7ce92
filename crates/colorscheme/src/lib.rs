//! Persistent light/dark/system color-scheme preference.
//!
//! `colorscheme` remembers whether the user wants a light UI, a dark UI, or
//! whatever the operating system prefers, and tells you when the scheme you
//! should be displaying changes.
//!
//! # Quick Start
//!
//! ```no_run
//! use colorscheme::{FileStore, Mode, OsSchemeProvider, PreferenceController};
//!
//! let prefs = PreferenceController::new(
//!     FileStore::new("/tmp/prefs.json"),
//!     OsSchemeProvider::new(),
//! );
//!
//! prefs.on_change(|status| {
//!     println!("now showing {} (user chose {})", status.effective, status.mode);
//! });
//!
//! let _ = prefs.set_user_choice(Mode::Dark);
//!
//! // In your event loop, pick up OS appearance changes:
//! prefs.provider().poll();
//! ```
//!
//! # Architecture
//!
//! ```text
//! PreferenceController
//! ├── PreferenceStore        → FileStore | MemoryStore | UnavailableStore
//! ├── SystemSchemeProvider   → OsSchemeProvider | MockSchemeProvider
//! └── subscribers            → Fn(Status), called in registration order
//! ```
//!
//! Everything is single-threaded: the controller and providers use `Rc` and
//! `Cell` internally and are meant to live on the UI thread.
//!
//! # Testing
//!
//! Both collaborators have in-memory stand-ins:
//!
//! ```
//! use colorscheme::{MemoryStore, MockSchemeProvider, PreferenceController, Scheme};
//!
//! let os = MockSchemeProvider::new(Scheme::Light);
//! let prefs = PreferenceController::new(MemoryStore::new(), os.clone());
//! os.set(Scheme::Dark);
//! assert_eq!(prefs.effective_scheme(), Scheme::Dark);
//! ```

mod controller;
mod error;
mod mode;
mod notify;
pub mod provider;
pub mod store;

pub use controller::{PreferenceController, Update};
pub use error::SchemeError;
pub use mode::{Mode, Scheme, Status};
pub use notify::SubscriptionId;

pub use provider::{detect_os_scheme, MockSchemeProvider, OsSchemeProvider, SystemSchemeProvider};
pub use store::{FileStore, MemoryStore, PreferenceStore, UnavailableStore, STORAGE_KEY};
