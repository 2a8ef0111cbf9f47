//! Order execution: place and track market orders via IB.

use std::sync::Arc;

use anyhow::{Context, Result};
use ibapi::orders::conditions::{PriceCondition as IbPriceCondition, TriggerMethod};
use ibapi::orders::{order_builder, OrderCondition, Action, Order, Orders, PlaceOrder};
use tracing::{debug, info, warn};

use option_writer_core::{OrderHandle, OrderRequest, OrderSide, OrderStatus, PriceCondition};

use crate::client::{IBClient, StatusBook};
use crate::contracts::{bound_contract, instrument_from, to_f64};

fn action(side: OrderSide) -> Action {
    match side {
        OrderSide::Buy => Action::Buy,
        OrderSide::Sell => Action::Sell,
    }
}

fn condition(condition: &PriceCondition) -> Result<OrderCondition> {
    Ok(OrderCondition::Price(IbPriceCondition {
        contract_id: condition.contract_id,
        exchange: condition.exchange.clone(),
        price: to_f64(condition.price)?,
        trigger_method: TriggerMethod::Default,
        is_more: condition.is_more,
        is_conjunction: true,
    }))
}

pub(crate) fn build_order(request: &OrderRequest) -> Result<Order> {
    let mut order = order_builder::market_order(action(request.side), f64::from(request.quantity));
    order.outside_rth = request.outside_rth;
    order.conditions = request
        .conditions
        .iter()
        .map(condition)
        .collect::<Result<Vec<_>>>()?;
    Ok(order)
}

/// IB statuses after which an order sees no further updates.
const FINAL_STATUSES: [&str; 4] = ["Filled", "Cancelled", "ApiCancelled", "Inactive"];

fn is_final(raw: &str) -> bool {
    FINAL_STATUSES.contains(&raw)
}

/// Store the latest status; true once the order is done.
fn record(statuses: &StatusBook, order_id: i32, raw: String) -> bool {
    let done = is_final(&raw);
    statuses.write().insert(order_id, raw);
    done
}

/// Last status for an order. A final status is handed out once and then
/// forgotten, so the book only holds orders still in flight.
fn read_status(statuses: &StatusBook, order_id: i32) -> OrderStatus {
    let mut book = statuses.write();
    let done = book.get(&order_id).is_some_and(|raw| is_final(raw));
    let raw = if done {
        book.remove(&order_id)
    } else {
        book.get(&order_id).cloned()
    };
    match raw {
        Some(raw) => OrderStatus::from_platform(&raw),
        None => OrderStatus::Pending("Unknown".to_string()),
    }
}

/// Drain a placement subscription, recording every status update until the
/// order reaches a final status.
async fn track(
    order_id: i32,
    mut updates: ibapi::subscriptions::Subscription<PlaceOrder>,
    statuses: StatusBook,
) {
    while let Some(update) = updates.next().await {
        match update {
            Ok(PlaceOrder::OrderStatus(status)) => {
                debug!(order_id, status = %status.status, filled = status.filled, "Order status");
                if record(&statuses, order_id, status.status) {
                    break;
                }
            }
            Ok(PlaceOrder::Message(notice)) => {
                warn!(order_id, code = notice.code, message = %notice.message, "Order notice")
            }
            Ok(_) => {}
            Err(e) => warn!(order_id, error = %e, "Order tracking error"),
        }
    }
    debug!(order_id, "Order tracking ended");
}

impl IBClient {
    /// Submit a market order and start tracking its status.
    pub async fn place_order(&self, request: &OrderRequest) -> Result<OrderHandle> {
        let contract = bound_contract(&request.instrument)?;
        let order = build_order(request)?;
        let order_id = self.inner().next_order_id();

        info!(
            order_id,
            contract = %request.instrument.spec.display_name(),
            side = %request.side,
            quantity = request.quantity,
            conditions = request.conditions.len(),
            "Placing order"
        );

        let updates = self
            .inner()
            .place_order(order_id, &contract, &order)
            .await
            .with_context(|| format!("Failed to place order {order_id}"))?;

        let statuses = Arc::clone(self.statuses());
        record(&statuses, order_id, "Submitted".to_string());
        tokio::spawn(track(order_id, updates, statuses));

        Ok(OrderHandle {
            order_id,
            instrument: request.instrument.clone(),
        })
    }

    /// Last status seen for an order placed by this client.
    ///
    /// Once a final status (`Filled`, `Cancelled`) has been returned the
    /// order is dropped from the book and later reads answer `Unknown`.
    pub fn status_of(&self, order_id: i32) -> OrderStatus {
        read_status(self.statuses(), order_id)
    }

    /// Orders working on the account, across all clients.
    pub async fn working_orders(&self) -> Result<Vec<OrderHandle>> {
        let mut orders = self
            .inner()
            .all_open_orders()
            .await
            .context("Failed to request open orders")?;

        let mut open = Vec::new();
        while let Some(item) = orders.next().await {
            match item {
                Ok(Orders::OrderData(data)) => open.push(OrderHandle {
                    order_id: data.order_id,
                    instrument: instrument_from(&data.contract),
                }),
                Ok(_) => {}
                Err(e) => return Err(e).context("Open orders stream failed"),
            }
        }
        Ok(open)
    }
}
