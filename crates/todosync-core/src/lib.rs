//! todosync Core Library
//!
//! This crate provides the client-side synchronization logic for todosync,
//! a todo list that mirrors a remote store and shows changes optimistically
//! while requests are in flight.
//!
//! # Architecture
//!
//! - **State**: [`TodoState`] is a synchronous state machine. Each intent is
//!   split into `begin_*` (optimistic change) and `finish_*` (reconcile the
//!   response against the current state).
//! - **Remote**: [`RemoteStore`] is the network boundary, implemented over
//!   HTTP and in memory.
//! - **Drivers**: [`Session`] runs intents one at a time; [`Dispatcher`]
//!   spawns requests and reports [`Completion`]s for interactive views.
//!
//! # Quick Start
//!
//! ```text
//! let store = HttpRemoteStore::from_config(&config)?;
//! let mut session = Session::new(config.owner()?, store);
//!
//! session.load().await?;
//! session.add("Buy milk").await?;
//!
//! let active = session.state().filtered(StatusFilter::Active);
//! ```
//!
//! # Modules
//!
//! - `state`: Synchronization core (main entry point)
//! - `models`: Tasks, identities and the status filter
//! - `remote`: Remote store trait and implementations
//! - `session`: Sequential async driver
//! - `dispatch`: Spawned requests reported over a channel
//! - `notice`: Auto-clearing error message
//! - `clock`: Time sources
//! - `config`: Application configuration
//! - `error`: Error types

pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod notice;
pub mod remote;
pub mod session;
pub mod state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use dispatch::{Completion, Dispatcher};
pub use error::{RemoteError, SyncError, SyncResult};
pub use models::{
    LocalToken, NewTask, OwnerId, PendingTask, ServerId, StatusFilter, Task, TaskId, VisibleTask,
};
pub use notice::{ErrorNotice, NoticeOrigin};
pub use remote::{HttpRemoteStore, MemoryRemoteStore, RemoteStore};
pub use session::Session;
pub use state::{
    AddTicket, Applied, BatchId, ClearBatch, ClearFailure, ClearReport, LoadState, TodoState,
};
