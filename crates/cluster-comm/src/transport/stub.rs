//! # Connection Stub
//!
//! A handle on one remote cluster member, shared by every task that talks to
//! it. Activation is create-or-attach: the first caller runs the factory that
//! dials the member, concurrent callers wait for it and attach to the same
//! context. A failed factory leaves the stub inactive so a later call retries.

use super::connection::ClusterConnection;
use super::dialer::{DialError, StandardDialer};
use crate::ports::outbound::StreamConnector;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

/// An established connection to a cluster member.
#[derive(Debug)]
pub struct RemoteContext {
    endpoint: String,
    connection: Mutex<ClusterConnection>,
}

impl RemoteContext {
    pub fn new(endpoint: impl Into<String>, connection: ClusterConnection) -> Self {
        Self {
            endpoint: endpoint.into(),
            connection: Mutex::new(connection),
        }
    }

    /// Dials `endpoint` and wraps the connection.
    pub async fn connect<C: StreamConnector>(
        endpoint: &str,
        dialer: &StandardDialer<C>,
    ) -> Result<Self, DialError> {
        let connection = dialer.dial(endpoint).await?;
        Ok(Self::new(endpoint, connection))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Exclusive access to the connection for one exchange.
    pub async fn connection(&self) -> MutexGuard<'_, ClusterConnection> {
        self.connection.lock().await
    }
}

/// Handle on a remote member, activated at most once at a time.
#[derive(Debug)]
pub struct Stub<C = RemoteContext> {
    endpoint: String,
    context: Mutex<Option<Arc<C>>>,
}

impl<C> Stub<C> {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            context: Mutex::new(None),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the active context, running `factory` to create it if there
    /// is none.
    ///
    /// The factory runs under the stub's lock, so concurrent callers never
    /// run it twice and all of them receive the same `Arc`. Its error is
    /// returned to this caller only.
    pub async fn activate<F, Fut, E>(&self, factory: F) -> Result<Arc<C>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<C>, E>>,
    {
        let mut slot = self.context.lock().await;
        if let Some(context) = slot.as_ref() {
            return Ok(Arc::clone(context));
        }

        let context = factory().await?;
        *slot = Some(Arc::clone(&context));
        debug!("[cluster] Stub for {} activated", self.endpoint);
        Ok(context)
    }

    pub async fn is_active(&self) -> bool {
        self.context.lock().await.is_some()
    }

    pub async fn remote_context(&self) -> Option<Arc<C>> {
        self.context.lock().await.clone()
    }

    /// Drops the context; the next [`activate`](Self::activate) creates a new one.
    pub async fn deactivate(&self) {
        if self.context.lock().await.take().is_some() {
            debug!("[cluster] Stub for {} deactivated", self.endpoint);
        }
    }
}

impl Stub<RemoteContext> {
    /// Activates by dialing the stub's endpoint.
    pub async fn activate_with<D: StreamConnector>(
        &self,
        dialer: &StandardDialer<D>,
    ) -> Result<Arc<RemoteContext>, DialError> {
        self.activate(|| async {
            RemoteContext::connect(&self.endpoint, dialer)
                .await
                .map(Arc::new)
        })
        .await
    }
}
