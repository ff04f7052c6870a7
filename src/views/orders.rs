//! Orders screen.
//!
//! Like the other entity screens, with a line-item grid inside the dialog.
//! Submitting runs the two-phase aggregate save; a partially saved order is
//! still reported as saved, with a warning instead of a success toast.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{instrument, warn};

use crate::api::{AggregateSave, OrderService};
use crate::domain::{EntityId, Order, OrderDetail, OrderDraft, PageRequest};
use crate::views::dialog::DialogTicket;
use crate::views::{Confirm, Dialog, ListView, Notifier, Toast};
use crate::{AdminError, LookupItem, OrderStatusOption, Result};

pub const PARTIAL_SAVE_WARNING: &str = "Order saved, but some details may not have been saved";

pub struct OrdersScreen {
    service: OrderService,
    list: ListView<Order>,
    dialog: Dialog<OrderDraft>,
    details: Vec<OrderDetail>,
    statuses: Vec<OrderStatusOption>,
    products: Vec<LookupItem>,
    customers: Vec<LookupItem>,
    notifier: Arc<dyn Notifier>,
    confirm: Arc<dyn Confirm>,
}

impl OrdersScreen {
    pub fn new(service: OrderService, page_size: u32, notifier: Arc<dyn Notifier>, confirm: Arc<dyn Confirm>) -> Self {
        let list = ListView::new(service.orders().clone(), page_size);
        Self {
            service, list, dialog: Dialog::new(), details: Vec::new(),
            statuses: Vec::new(), products: Vec::new(), customers: Vec::new(),
            notifier, confirm,
        }
    }

    pub fn list(&self) -> &ListView<Order> { &self.list }
    pub fn dialog(&self) -> &Dialog<OrderDraft> { &self.dialog }
    pub fn details(&self) -> &[OrderDetail] { &self.details }
    pub fn statuses(&self) -> &[OrderStatusOption] { &self.statuses }
    pub fn products(&self) -> &[LookupItem] { &self.products }
    pub fn customers(&self) -> &[LookupItem] { &self.customers }

    pub async fn load(&mut self) -> bool { self.list.refresh(self.notifier.as_ref()).await }

    pub async fn on_page_change(&mut self, page: PageRequest) -> bool {
        match self.list.on_page_change(page).await {
            Ok(()) => true,
            Err(error) => {
                warn!(%error, "orders page change failed");
                self.notifier.notify(Toast::error("Failed to load orders"));
                false
            }
        }
    }

    /// Status list and the product/customer pickers, fetched together.
    pub async fn load_lookups(&mut self) -> bool {
        let fetched = futures::try_join!(
            self.service.statuses(),
            self.service.product_lookup(),
            self.service.customer_lookup(),
        );
        match fetched {
            Ok((statuses, products, customers)) => {
                self.statuses = statuses;
                self.products = products;
                self.customers = customers;
                true
            }
            Err(error) => {
                warn!(%error, "order lookups failed");
                self.notifier.notify(Toast::error("Failed to load order lookups"));
                false
            }
        }
    }

    /// Fills the read-only details panel for one order.
    pub async fn show_details(&mut self, order_id: EntityId) -> Result<&[OrderDetail]> {
        match self.service.details(order_id).await {
            Ok(details) => {
                self.details = details;
                Ok(&self.details)
            }
            Err(error) => {
                warn!(%order_id, %error, "order details load failed");
                self.notifier.notify(Toast::error("Failed to load order details"));
                Err(error)
            }
        }
    }

    /// New order with the first known status preselected.
    pub fn open_add(&self) -> DialogTicket {
        let status = self.statuses.first().map(|s| s.name.clone()).unwrap_or_default();
        self.dialog.open(OrderDraft::new(Order::new(EntityId::NEW, status)))
    }

    /// Opens with the listed row, then re-reads the order and its line items so
    /// quantities and prices are not stale.
    pub fn open_edit(&self, order: &Order) -> JoinHandle<bool> {
        let ticket = self.dialog.open(OrderDraft::new(order.clone()));
        let service = self.service.clone();
        let id = order.order_id;
        let fetch = async move { futures::try_join!(service.get(id), service.details(id)) };
        let notifier = self.notifier.clone();
        self.dialog.spawn_refresh(
            ticket,
            fetch,
            |draft, (fresh, details)| {
                draft.replace_order(fresh);
                draft.replace_items(details);
            },
            move |_| notifier.notify(Toast::error("Failed to get latest order data")),
        )
    }

    pub fn edit_order<R>(&self, f: impl FnOnce(&mut Order) -> R) -> Option<R> {
        self.dialog.edit(|draft| f(draft.order_mut()))
    }

    /// Builds a line item from the product picker, priced and labelled from the lookup.
    pub fn line_for_product(&self, product_id: EntityId, quantity: u32) -> Option<OrderDetail> {
        let product = self.products.iter().find(|p| p.id == product_id)?;
        let mut item = OrderDetail::new(product_id, quantity, product.price.unwrap_or_default());
        item.product_name = product.name.clone();
        item.sku = product.sku.clone().unwrap_or_default();
        Some(item)
    }

    pub fn add_item(&self, item: OrderDetail) -> bool {
        self.dialog.edit(|draft| draft.add_item(item)).is_some()
    }

    pub fn update_item(&self, index: usize, item: OrderDetail) -> Result<()> {
        let updated = self.dialog.edit(|draft| draft.update_item(index, item)).ok_or_else(no_dialog)?;
        Ok(updated?)
    }

    /// Removes a line item from the open order. Persisted items are deleted on the
    /// backend after confirmation; unsaved ones are simply dropped.
    #[instrument(skip(self))]
    pub async fn remove_item(&mut self, index: usize) -> Result<bool> {
        let item = self
            .dialog
            .edit(|draft| draft.items().get(index).cloned())
            .ok_or_else(no_dialog)?
            .ok_or(crate::domain::DraftError::NoSuchItem(index))?;

        if !item.order_detail_id.is_new() {
            let prompt = format!("Delete line item {}?", item.product_name);
            if !self.confirm.confirm(&prompt).await {
                return Ok(false);
            }
            if let Err(error) = self.service.delete_detail(item.order_detail_id).await {
                warn!(%error, "order detail delete failed");
                self.notifier.notify(Toast::error(error.user_message("Failed to delete order detail")));
                return Err(error);
            }
            self.notifier.notify(Toast::success("Order detail deleted successfully"));
        }

        let id = item.order_detail_id;
        self.dialog.edit(|draft| {
            let pos = if id.is_new() { Some(index) } else { draft.items().iter().position(|i| i.order_detail_id == id) };
            if let Some(pos) = pos {
                let _ = draft.remove_item(pos);
            }
        });
        Ok(true)
    }

    /// Saves the open order and its line items.
    ///
    /// A draft without line items is rejected before any call. When the parent
    /// save fails the dialog stays open. Once the parent is saved the dialog closes
    /// and the list reloads even if some line items failed.
    #[instrument(skip(self))]
    pub async fn submit(&mut self) -> Result<AggregateSave> {
        let draft = self.dialog.form().ok_or_else(no_dialog)?;
        let verb = if draft.is_new() { "add" } else { "update" };

        match self.service.save_aggregate(&draft).await {
            Ok(outcome) => {
                self.dialog.close();
                self.load().await;
                if outcome.is_complete() {
                    let done = if verb == "add" { "added" } else { "updated" };
                    self.notifier.notify(Toast::success(format!("Order {done} successfully")));
                } else {
                    self.notifier.notify(Toast::warning(PARTIAL_SAVE_WARNING));
                }
                Ok(outcome)
            }
            Err(error) => {
                warn!(%error, "order {} failed", verb);
                self.notifier.notify(Toast::error(error.user_message(&format!("Failed to {verb} order"))));
                Err(error)
            }
        }
    }

    #[instrument(skip(self, order), fields(id = %order.order_id))]
    pub async fn delete(&mut self, order: &Order) -> Result<bool> {
        if !self.confirm.confirm(&format!("Delete order {}?", order.order_id)).await {
            return Ok(false);
        }
        match self.service.delete(order.order_id).await {
            Ok(()) => {
                self.load().await;
                self.notifier.notify(Toast::success("Order deleted successfully"));
                Ok(true)
            }
            Err(error) => {
                warn!(%error, "order delete failed");
                self.notifier.notify(Toast::error(error.user_message("Failed to delete order")));
                Err(error)
            }
        }
    }
}

fn no_dialog() -> AdminError { AdminError::Validation("No order dialog is open".to_string()) }
