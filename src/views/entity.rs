//! Generic add/edit/delete screen for single-record resources.
//!
//! Saving validates locally first and only calls the backend with a valid form.
//! Deletes go through the confirmation prompt.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::api::{Resource, ResourceService};
use crate::domain::PageRequest;
use crate::views::dialog::DialogTicket;
use crate::views::{Confirm, Dialog, ListView, Notifier, Toast};
use crate::{AdminError, Result};

/// List plus add/edit dialog and confirmed delete for one resource.
///
/// Customers, products and categories all use this screen; orders have their
/// own because they carry line items.
pub struct EntityScreen<T: Resource> {
    list: ListView<T>,
    dialog: Dialog<T>,
    notifier: Arc<dyn Notifier>,
    confirm: Arc<dyn Confirm>,
}

impl<T: Resource> EntityScreen<T> {
    pub fn new(service: ResourceService<T>, page_size: u32, notifier: Arc<dyn Notifier>, confirm: Arc<dyn Confirm>) -> Self {
        Self { list: ListView::new(service, page_size), dialog: Dialog::new(), notifier, confirm }
    }

    pub fn list(&self) -> &ListView<T> { &self.list }
    pub fn dialog(&self) -> &Dialog<T> { &self.dialog }
    fn service(&self) -> &ResourceService<T> { self.list.service() }

    pub async fn load(&mut self) -> bool { self.list.refresh(self.notifier.as_ref()).await }

    pub async fn on_page_change(&mut self, page: PageRequest) -> bool {
        match self.list.on_page_change(page).await {
            Ok(()) => true,
            Err(error) => {
                warn!(resource = T::PATH, %error, "page change load failed");
                self.notifier.notify(Toast::error(format!("Failed to load {}", T::PATH)));
                false
            }
        }
    }

    pub fn open_add(&self) -> DialogTicket { self.dialog.open(T::default()) }

    /// Opens with the row as listed and re-reads the record in the background.
    /// If the re-read fails the listed values stay and an error toast is shown.
    pub fn open_edit(&self, entity: &T) -> JoinHandle<bool> {
        let ticket = self.dialog.open(entity.clone());
        let service = self.service().clone();
        let id = entity.id();
        let notifier = self.notifier.clone();
        self.dialog.spawn_refresh(
            ticket,
            async move { service.get(id).await },
            |form, fresh| *form = fresh,
            move |_| notifier.notify(Toast::error(format!("Failed to get latest {} data", T::LABEL.to_lowercase()))),
        )
    }

    pub fn edit_form<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> { self.dialog.edit(f) }

    pub fn close_dialog(&self) { self.dialog.close(); }

    /// Validates and saves the dialog form. Create when the id is `0`, update otherwise.
    ///
    /// On success the dialog closes and the current page is re-fetched. On failure the
    /// dialog stays open with its values and the error is toasted.
    #[instrument(skip(self), fields(resource = T::PATH))]
    pub async fn submit(&mut self) -> Result<T> {
        let form = self
            .dialog
            .form()
            .ok_or_else(|| AdminError::Validation(format!("No {} dialog is open", T::LABEL)))?;
        let is_new = form.id().is_new();
        let verb = if is_new { "add" } else { "update" };

        let outcome = match form.validate() {
            Ok(()) => self.service().save(&form).await,
            Err(errors) => Err(AdminError::from(errors)),
        };
        match outcome {
            Ok(saved) => {
                self.dialog.close();
                info!(id = %saved.id(), "{} saved", T::LABEL);
                self.load().await;
                let done = if is_new { "added" } else { "updated" };
                self.notifier.notify(Toast::success(format!("{} {} successfully", T::LABEL, done)));
                Ok(saved)
            }
            Err(error) => {
                warn!(%error, "{} {} failed", T::LABEL, verb);
                let fallback = format!("Failed to {} {}", verb, T::LABEL.to_lowercase());
                self.notifier.notify(Toast::error(error.user_message(&fallback)));
                Err(error)
            }
        }
    }

    /// Deletes after confirmation. `Ok(false)` when the user declined; no call is made then.
    #[instrument(skip(self, entity), fields(resource = T::PATH, id = %entity.id()))]
    pub async fn delete(&mut self, entity: &T) -> Result<bool> {
        let prompt = format!("Delete {} {}?", T::LABEL.to_lowercase(), entity.id());
        if !self.confirm.confirm(&prompt).await {
            return Ok(false);
        }
        match self.service().delete(entity.id()).await {
            Ok(()) => {
                self.load().await;
                self.notifier.notify(Toast::success(format!("{} deleted successfully", T::LABEL)));
                Ok(true)
            }
            Err(error) => {
                warn!(%error, "{} delete failed", T::LABEL);
                let fallback = format!("Failed to delete {}", T::LABEL.to_lowercase());
                self.notifier.notify(Toast::error(error.user_message(&fallback)));
                Err(error)
            }
        }
    }
}
