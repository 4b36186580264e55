//! Smart card insertion and removal monitoring
//!
//! This crate watches a fixed set of smart card readers and reports when a
//! card is inserted or ejected. A dedicated thread blocks on the resource
//! manager with a bounded timeout, diffs each reader's new state against the
//! last one it saw, and hands the resulting events to a handler.
//!
//! # Features
//!
//! - `pcsc` (default): [`PcscManager`], backed by the system PC/SC service
//!
//! # Examples
//!
//! ```no_run
//! # #[cfg(feature = "pcsc")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use nexum_cardwatch::{CardMonitor, MonitorConfig, MonitorEvent, PcscManager};
//!
//! let mut monitor = CardMonitor::new(PcscManager::new(), MonitorConfig::default());
//!
//! let readers = monitor.start(|event: MonitorEvent| {
//!     if let MonitorEvent::Transition { reader, kind } = event {
//!         println!("{reader}: card {kind}");
//!     }
//! })?;
//!
//! if readers.is_empty() {
//!     println!("No readers found");
//!     return Ok(());
//! }
//!
//! std::thread::sleep(std::time::Duration::from_secs(30));
//! monitor.stop();
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "pcsc"))]
//! # fn main() {}
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![warn(missing_docs)]

mod config;
mod context;
mod error;
pub mod event;
mod manager;
mod monitor;
#[cfg(feature = "pcsc")]
mod native;
mod poll;
pub mod registry;
mod slot;
mod state;
pub mod status;

pub use config::{DEFAULT_THREAD_NAME, DEFAULT_WAIT_TIMEOUT, MonitorConfig};
pub use context::ResourceContext;
pub use error::MonitorError;
pub use event::{EventHandler, EventReceiver, EventSender, MonitorEvent};
pub use manager::{ResourceManager, Scope};
pub use monitor::{CancelHandle, CardMonitor, MonitorState};
#[cfg(feature = "pcsc")]
pub use native::{PcscHandle, PcscManager};
pub use slot::{MAX_ATR_SIZE, ReaderSlot, TransitionKind, classify_transition};
pub use state::ConditionBits;
pub use status::{Condition, StatusCode, classify};
