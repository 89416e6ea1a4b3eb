//! Completion-handler front end for hosts that cannot await
//!
//! Each call is scheduled on a tokio runtime and hands its outcome to the
//! caller's continuation exactly once. The calling thread never blocks.

use std::future::Future;
use std::marker::PhantomData;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::warn;

use super::store::CredentialStore;
use super::types::{CredentialKey, CredentialValue};
use crate::error::{CredentialError, Result};

/// Owns a continuation until it has been called
///
/// If the task carrying it is dropped before completing (runtime shut
/// down, backend panicked), the continuation receives `StorageFailure`.
struct Completion<T, F>
where
    F: FnOnce(Result<T>),
{
    callback: Option<F>,
    _outcome: PhantomData<fn(T)>,
}

impl<T, F> Completion<T, F>
where
    F: FnOnce(Result<T>),
{
    fn new(callback: F) -> Self {
        Self {
            callback: Some(callback),
            _outcome: PhantomData,
        }
    }

    fn complete(mut self, outcome: Result<T>) {
        if let Some(callback) = self.callback.take() {
            callback(outcome);
        }
    }
}

impl<T, F> Drop for Completion<T, F>
where
    F: FnOnce(Result<T>),
{
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            warn!("Credential task ended without an outcome");
            callback(Err(CredentialError::StorageFailure));
        }
    }
}

/// Callback adapter over a [`CredentialStore`]
#[derive(Clone)]
pub struct CompletionAdapter {
    store: CredentialStore,
    runtime: Handle,
}

impl CompletionAdapter {
    /// Create an adapter that runs calls on `runtime`
    pub fn new(store: CredentialStore, runtime: Handle) -> Self {
        Self { store, runtime }
    }

    /// Create an adapter on the runtime of the calling context
    ///
    /// Returns `None` outside a tokio runtime.
    pub fn on_current(store: CredentialStore) -> Option<Self> {
        Handle::try_current().ok().map(|runtime| Self::new(store, runtime))
    }

    fn dispatch<T, Fut, F>(&self, call: Fut, completion: F) -> JoinHandle<()>
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        F: FnOnce(Result<T>) + Send + 'static,
    {
        let completion = Completion::new(completion);
        self.runtime.spawn(async move {
            let outcome = call.await;
            completion.complete(outcome);
        })
    }

    pub fn save<F>(&self, key: CredentialKey, value: CredentialValue, completion: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let store = self.store.clone();
        self.dispatch(async move { store.save(&key, value).await }, completion)
    }

    pub fn save_text<F>(&self, key: CredentialKey, text: String, completion: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        self.save(key, CredentialValue::from(text), completion)
    }

    pub fn get<F>(&self, key: CredentialKey, completion: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<CredentialValue>) + Send + 'static,
    {
        let store = self.store.clone();
        self.dispatch(async move { store.get(&key).await }, completion)
    }

    pub fn get_text<F>(&self, key: CredentialKey, completion: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<String>) + Send + 'static,
    {
        let store = self.store.clone();
        self.dispatch(async move { store.get_text(&key).await }, completion)
    }

    pub fn delete<F>(&self, key: CredentialKey, completion: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let store = self.store.clone();
        self.dispatch(async move { store.delete(&key).await }, completion)
    }
}
