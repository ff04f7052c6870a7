//! Order service.
//!
//! Orders are saved in two phases: the parent record first, then each line item
//! stamped with the parent's id. A failed line item does not roll back the parent.

use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiClient, ResourceService};
use crate::domain::{EntityId, Order, OrderDetail, OrderDraft, PageRequest};
use crate::{AdminError, LookupItem, OrderStatusOption, Page, Result};

/// Orders plus their line items, status list and the pickers the order form needs.
#[derive(Clone)]
pub struct OrderService {
    orders: ResourceService<Order>,
}

/// Result of a two-phase aggregate save. The parent is committed whenever this is returned.
#[derive(Debug)]
pub struct AggregateSave {
    pub order: Order,
    pub saved: Vec<OrderDetail>,
    pub failures: Vec<DetailFailure>,
}

#[derive(Debug)]
pub struct DetailFailure {
    /// Position of the line item in the draft.
    pub index: usize,
    pub error: AdminError,
}

impl AggregateSave {
    pub fn is_complete(&self) -> bool { self.failures.is_empty() }
}

impl OrderService {
    pub fn new(client: ApiClient) -> Self {
        Self { orders: ResourceService::new(client) }
    }

    pub fn orders(&self) -> &ResourceService<Order> { &self.orders }

    fn client(&self) -> &ApiClient { self.orders.client() }

    pub async fn list_page(&self, page: PageRequest) -> Result<Page<Order>> { self.orders.list_page(page).await }

    pub async fn get(&self, id: EntityId) -> Result<Order> { self.orders.get(id).await }

    pub async fn delete(&self, id: EntityId) -> Result<()> { self.orders.delete(id).await }

    #[instrument(skip(self))]
    pub async fn details(&self, order_id: EntityId) -> Result<Vec<OrderDetail>> {
        debug!("Sending request");
        self.client().get(&format!("orders/{order_id}/details"), &[]).await
    }

    #[instrument(skip(self, detail))]
    pub async fn add_detail(&self, order_id: EntityId, detail: &OrderDetail) -> Result<OrderDetail> {
        debug!("Sending request");
        let created: Option<OrderDetail> = self.client().post(&format!("orders/{order_id}/details"), detail).await?;
        Ok(created.unwrap_or_else(|| detail.clone()))
    }

    #[instrument(skip(self, detail), fields(id = %detail.order_detail_id))]
    pub async fn update_detail(&self, detail: &OrderDetail) -> Result<OrderDetail> {
        debug!("Sending request");
        let updated: Option<OrderDetail> = self
            .client()
            .put(&format!("orders/details/{}", detail.order_detail_id), detail)
            .await?;
        Ok(updated.unwrap_or_else(|| detail.clone()))
    }

    /// Create when the detail id is still `0`, update otherwise. `orderID` must already be stamped.
    pub async fn save_detail(&self, detail: &OrderDetail) -> Result<OrderDetail> {
        if detail.order_id.is_new() {
            return Err(AdminError::Validation("Line item is not attached to a saved order".to_string()));
        }
        if detail.order_detail_id.is_new() {
            self.add_detail(detail.order_id, detail).await
        } else {
            self.update_detail(detail).await
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_detail(&self, id: EntityId) -> Result<()> {
        debug!("Sending request");
        self.client().delete(&format!("orders/details/{id}")).await
    }

    pub async fn statuses(&self) -> Result<Vec<OrderStatusOption>> {
        self.client().get("orders/statuses", &[]).await
    }

    pub async fn product_lookup(&self) -> Result<Vec<LookupItem>> {
        self.client().get("products/list", &[]).await
    }

    pub async fn customer_lookup(&self) -> Result<Vec<LookupItem>> {
        self.client().get("customers/list", &[]).await
    }

    /// Persists the parent order, then every line item stamped with the parent id.
    ///
    /// Nothing is sent when the draft fails validation (including an empty item
    /// list). Line items are saved concurrently once the parent call succeeds; their
    /// failures are collected rather than returned, and the parent is never rolled back.
    #[instrument(skip(self, draft), fields(order_id = %draft.order().order_id, items = draft.items().len()))]
    pub async fn save_aggregate(&self, draft: &OrderDraft) -> Result<AggregateSave> {
        draft.validate()?;

        let header = draft.order().header();
        let order = self.orders.save(&header).await?;
        let order_id = if order.order_id.is_new() { header.order_id } else { order.order_id };
        if order_id.is_new() {
            return Err(AdminError::Rejected("The order was not assigned an id".to_string()));
        }

        let items = draft.stamped_items(order_id);
        let outcomes = join_all(items.iter().map(|item| self.save_detail(item))).await;

        let mut saved = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(detail) => saved.push(detail),
                Err(error) => {
                    warn!(index, error = %error, "line item save failed");
                    failures.push(DetailFailure { index, error });
                }
            }
        }

        info!(%order_id, saved = saved.len(), failed = failures.len(), "order aggregate saved");
        Ok(AggregateSave { order: Order { order_id, ..order }, saved, failures })
    }
}
