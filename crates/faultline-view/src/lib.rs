//! Everything between the graph backend and the screen.
//!
//! - [`client`]: fetches snapshots over HTTP.
//! - [`temporal`]: live/paused state machine owning cursor and window.
//! - [`session`]: applies snapshots, discards stale responses, tracks status.
//! - [`selection`]: one node and one edge, revalidated on every snapshot.
//! - [`scheduler`] and [`driver`]: live timers and the event loop.
//! - [`render`]: the surface trait and a plain-text implementation.

pub mod classify;
pub mod client;
pub mod clock;
pub mod command;
pub mod config;
pub mod driver;
pub mod error;
pub mod inspect;
pub mod render;
pub mod scheduler;
pub mod selection;
pub mod session;
pub mod temporal;
pub mod util;

pub use client::{FetchHint, HttpSnapshotClient, SnapshotSource};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ViewConfig;
pub use driver::{Command, ViewLoop};
pub use error::{FetchError, RefreshError};
pub use render::{RenderSurface, TextSurface};
pub use session::{ConnectionStatus, ViewModel, ViewSession};
pub use temporal::{Mode, TemporalController, TemporalState};
