//! Paged list state shared by every resource screen.

use tracing::{debug, instrument, warn};

use crate::api::{Resource, ResourceService};
use crate::domain::PageRequest;
use crate::views::{LoadingFlag, Notifier, Toast};
use crate::Result;

/// One server-side page of a resource. Paging never happens client-side: every
/// index or size change re-requests exactly one page.
pub struct ListView<T: Resource> {
    service: ResourceService<T>,
    page: PageRequest,
    items: Vec<T>,
    total_count: u64,
    loading: LoadingFlag,
}

impl<T: Resource> ListView<T> {
    pub fn new(service: ResourceService<T>, page_size: u32) -> Self {
        Self { service, page: PageRequest::new(0, page_size), items: Vec::new(), total_count: 0, loading: LoadingFlag::default() }
    }

    pub fn service(&self) -> &ResourceService<T> { &self.service }
    pub fn items(&self) -> &[T] { &self.items }
    pub fn total_count(&self) -> u64 { self.total_count }
    pub fn page(&self) -> PageRequest { self.page }
    pub fn is_loading(&self) -> bool { self.loading.is_loading() }
    pub fn loading_flag(&self) -> LoadingFlag { self.loading.clone() }

    /// Re-fetches the current page. On failure the previous page stays in place.
    #[instrument(skip(self), fields(resource = T::PATH, page = self.page.page_number(), size = self.page.page_size))]
    pub async fn load(&mut self) -> Result<()> {
        let _loading = self.loading.begin();
        let page = self.service.list_page(self.page).await?;
        debug!(count = page.items.len(), total = page.total_count, "page loaded");
        self.items = page.items;
        self.total_count = page.total_count;
        Ok(())
    }

    /// Applies the paging control's new index and size, then fetches that page.
    pub async fn on_page_change(&mut self, page: PageRequest) -> Result<()> {
        self.page = page;
        self.load().await
    }

    /// [`load`](Self::load), with a failure reported as an error toast instead of returned.
    pub async fn refresh(&mut self, notifier: &dyn Notifier) -> bool {
        match self.load().await {
            Ok(()) => true,
            Err(error) => {
                warn!(resource = T::PATH, %error, "list load failed");
                notifier.notify(Toast::error(format!("Failed to load {}", T::PATH)));
                false
            }
        }
    }

    pub fn page_count(&self) -> u64 {
        let size = u64::from(self.page.page_size.max(1));
        self.total_count.div_ceil(size)
    }
}
