//! Simulated broker.
//!
//! Holds cash and the single open position, accepts at most one pending
//! order at a time and fills it on the following bar. Every order outcome
//! is reported through [`OrderStatus`]; nothing here returns an error.

use crate::fill_model::FillModel;
use crate::position::Position;
use cryptobot_core::{Bar, BrokerConfig, Execution, Order, OrderId, OrderStatus, Side};
use tracing::debug;

/// Id carried by orders rejected at submission. Accepted orders start at 1.
pub const REJECTED_ORDER_ID: OrderId = 0;

/// Simulated broker state for one run.
pub struct Broker {
    cash: f64,
    position: Position,
    fill_model: FillModel,
    pending: Option<Order>,
    next_order_id: OrderId,
}

impl Broker {
    /// Create a broker with the configured starting cash and commission.
    pub fn new(config: &BrokerConfig) -> Self {
        Self::with_fill_model(config.starting_cash, FillModel::from_config(config))
    }

    pub fn with_fill_model(starting_cash: f64, fill_model: FillModel) -> Self {
        Self {
            cash: starting_cash,
            position: Position::default(),
            fill_model,
            pending: None,
            next_order_id: 1,
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn pending(&self) -> Option<&Order> {
        self.pending.as_ref()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn fill_model(&self) -> &FillModel {
        &self.fill_model
    }

    /// Cash plus position marked at `price`.
    pub fn value(&self, price: f64) -> f64 {
        self.cash + self.position.value(price)
    }

    /// Submit an order for execution on the next bar.
    ///
    /// Returns the order as `Accepted`, or as `Rejected` when another order
    /// is pending or the size is not a positive number. A rejection leaves
    /// the broker untouched, order id counter included: rejected orders carry
    /// [`REJECTED_ORDER_ID`].
    pub fn submit(&mut self, side: Side, size: f64, bar_index: usize) -> Order {
        let mut order = Order {
            id: REJECTED_ORDER_ID,
            side,
            size,
            status: OrderStatus::Rejected,
            submitted_bar: bar_index,
            execution: None,
        };

        if let Some(pending) = &self.pending {
            debug!(pending = pending.id, "rejected: order already pending");
            return order;
        }
        if !(size.is_finite() && size > 0.0) {
            debug!(size, "rejected: invalid size");
            return order;
        }

        order.id = self.next_order_id;
        order.status = OrderStatus::Accepted;
        self.next_order_id += 1;
        debug!(order = order.id, side = side.label(), size, bar = bar_index, "order accepted");
        self.pending = Some(order.clone());
        order
    }

    /// Fill the pending order, if any, at the fill model's price for `bar`.
    pub fn execute_pending(&mut self, bar: &Bar) -> Option<Order> {
        let order = self.pending.take()?;
        let price = self.fill_model.fill_price(bar);
        Some(self.execute(order, price))
    }

    /// Execute `order` at `fill_price` and return it with a terminal status.
    ///
    /// The pending slot is cleared whatever the outcome.
    pub fn execute(&mut self, mut order: Order, fill_price: f64) -> Order {
        if self.pending.as_ref().is_some_and(|p| p.id == order.id) {
            self.pending = None;
        }

        let commission = self.fill_model.commission(fill_price, order.size);
        let value = fill_price * order.size;

        match order.side {
            Side::Buy => {
                let required = value + commission;
                if self.cash < required {
                    debug!(order = order.id, cash = self.cash, required, "margin: insufficient cash");
                    order.status = OrderStatus::Margin;
                    return order;
                }
                self.cash -= required;
                self.position.add(fill_price, order.size);
            }
            Side::Sell => {
                if order.size > self.position.size {
                    debug!(
                        order = order.id,
                        size = order.size,
                        held = self.position.size,
                        "rejected: sell exceeds position"
                    );
                    order.status = OrderStatus::Rejected;
                    return order;
                }
                self.cash += value - commission;
                self.position.reduce(order.size);
            }
        }

        order.status = OrderStatus::Completed;
        order.execution = Some(Execution {
            price: fill_price,
            size: order.size,
            value,
            commission,
        });
        order
    }

    /// Cancel the pending order. The strategy never does this on its own.
    pub fn cancel_pending(&mut self) -> Option<Order> {
        let mut order = self.pending.take()?;
        order.status = OrderStatus::Canceled;
        Some(order)
    }
}
