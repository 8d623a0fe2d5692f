//! Remote todo store
//!
//! The synchronization core never talks to the network itself; callers use a
//! [`RemoteStore`] between the `begin_*` and `finish_*` halves of an
//! operation. Implementations keep nothing past a response: every call
//! returns owned data.
//!
//! - [`HttpRemoteStore`]: JSON over HTTP
//! - [`MemoryRemoteStore`]: in-process store with failure injection

mod http;
mod memory;

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::models::{NewTask, OwnerId, ServerId, Task};

pub use http::HttpRemoteStore;
pub use memory::MemoryRemoteStore;

/// Create/read/delete access to a task collection keyed by owner
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// All tasks of `owner`
    async fn list(&self, owner: OwnerId) -> Result<Vec<Task>, RemoteError>;

    /// Create a task; the store assigns its id
    async fn create(&self, task: NewTask) -> Result<Task, RemoteError>;

    /// Delete a task; unknown ids are a failure
    async fn delete(&self, id: ServerId) -> Result<(), RemoteError>;
}

#[async_trait]
impl<T: RemoteStore + ?Sized> RemoteStore for std::sync::Arc<T> {
    async fn list(&self, owner: OwnerId) -> Result<Vec<Task>, RemoteError> {
        (**self).list(owner).await
    }

    async fn create(&self, task: NewTask) -> Result<Task, RemoteError> {
        (**self).create(task).await
    }

    async fn delete(&self, id: ServerId) -> Result<(), RemoteError> {
        (**self).delete(id).await
    }
}
