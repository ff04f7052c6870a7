//! Modal dialog lifecycle.
//!
//! A dialog opens at once with whatever the caller already holds. A refresh
//! started for that opening may overwrite the form later, but only while the
//! same opening is still showing: every `open` hands out a new [`DialogTicket`]
//! and a stale ticket is ignored.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::views::LoadingFlag;
use crate::{AdminError, Result};

/// Identifies one opening of a dialog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DialogTicket(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogState {
    Closed,
    Open(DialogTicket),
}

struct Inner<F> {
    generation: u64,
    open: bool,
    form: Option<F>,
}

/// Shared handle; clones address the same dialog.
pub struct Dialog<F> {
    inner: Arc<Mutex<Inner<F>>>,
    refreshing: LoadingFlag,
}

impl<F> Clone for Dialog<F> {
    fn clone(&self) -> Self { Self { inner: self.inner.clone(), refreshing: self.refreshing.clone() } }
}

impl<F> Default for Dialog<F> {
    fn default() -> Self {
        Self { inner: Arc::new(Mutex::new(Inner { generation: 0, open: false, form: None })), refreshing: LoadingFlag::default() }
    }
}

impl<F: Clone + Send + 'static> Dialog<F> {
    pub fn new() -> Self { Self::default() }

    pub fn open(&self, initial: F) -> DialogTicket {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.open = true;
        inner.form = Some(initial);
        DialogTicket(inner.generation)
    }

    /// Closes the dialog and hands back the last form values.
    pub fn close(&self) -> Option<F> {
        let mut inner = self.inner.lock();
        inner.open = false;
        inner.form.take()
    }

    pub fn state(&self) -> DialogState {
        let inner = self.inner.lock();
        if inner.open { DialogState::Open(DialogTicket(inner.generation)) } else { DialogState::Closed }
    }

    pub fn is_open(&self) -> bool { self.inner.lock().open }

    pub fn is_refreshing(&self) -> bool { self.refreshing.is_loading() }

    pub fn form(&self) -> Option<F> {
        let inner = self.inner.lock();
        if inner.open { inner.form.clone() } else { None }
    }

    /// Edits the open form in place. `None` when the dialog is closed.
    pub fn edit<R>(&self, f: impl FnOnce(&mut F) -> R) -> Option<R> {
        let mut inner = self.inner.lock();
        if !inner.open { return None; }
        inner.form.as_mut().map(f)
    }

    /// Applies `f` only if `ticket` is still the showing opening.
    pub fn update_if_current(&self, ticket: DialogTicket, f: impl FnOnce(&mut F)) -> bool {
        let mut inner = self.inner.lock();
        if !inner.open || inner.generation != ticket.0 {
            debug!(ticket = ticket.0, current = inner.generation, open = inner.open, "discarding stale dialog refresh");
            return false;
        }
        match inner.form.as_mut() {
            Some(form) => { f(form); true }
            None => false,
        }
    }

    pub fn apply_refresh(&self, ticket: DialogTicket, fresh: F) -> bool {
        self.update_if_current(ticket, move |form| *form = fresh)
    }

    /// Runs `fetch` in the background and merges its result into the form with `merge`
    /// if the dialog opening behind `ticket` is still showing. Resolves to whether the
    /// form was updated. A failed fetch leaves the form as it was and is handed to
    /// `on_error`.
    pub fn spawn_refresh<T, Fut, M, E>(&self, ticket: DialogTicket, fetch: Fut, merge: M, on_error: E) -> JoinHandle<bool>
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        M: FnOnce(&mut F, T) + Send + 'static,
        E: FnOnce(&AdminError) + Send + 'static,
    {
        let dialog = self.clone();
        tokio::spawn(async move {
            let _refreshing = dialog.refreshing.begin();
            match fetch.await {
                Ok(fresh) => dialog.update_if_current(ticket, move |form| merge(form, fresh)),
                Err(error) => {
                    warn!(%error, "dialog refresh failed, keeping in-memory values");
                    on_error(&error);
                    false
                }
            }
        })
    }
}
