//! Strategy controller.
//!
//! Drives one bar at a time: resolve the pending order, update indicators,
//! evaluate signals, then submit at most one new order. Per-run mutable
//! fields live in [`StrategyState`], which is moved into each step and
//! handed back in the [`BarStep`].

use crate::broker::Broker;
use cryptobot_core::{
    Bar, IndicatorConfig, IndicatorSnapshot, Order, OrderId, OrderStatus, Side, Signal,
    StrategyConfig,
};
use cryptobot_features::{IndicatorEngine, SignalEvaluator};
use serde::Serialize;
use tracing::debug;

/// Where the strategy stands between bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StrategyPhase {
    Flat,
    Long,
    OrderPending,
}

/// Mutable per-run strategy fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StrategyState {
    /// Id of the order waiting for execution.
    pub pending: Option<OrderId>,
    /// Bar index of the most recent completed fill.
    pub last_executed_bar: Option<usize>,
    /// Number of bars processed so far.
    pub bars_processed: usize,
}

impl StrategyState {
    pub fn phase(&self, position_size: f64) -> StrategyPhase {
        if self.pending.is_some() {
            StrategyPhase::OrderPending
        } else if position_size > 0.0 {
            StrategyPhase::Long
        } else {
            StrategyPhase::Flat
        }
    }
}

/// Decision taken on a bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Decision {
    /// Buy this many units.
    Buy(f64),
    /// Sell this many units.
    Sell(f64),
    Hold,
}

/// Everything that happened on one bar.
#[derive(Debug, Clone)]
pub struct BarStep {
    /// State to feed into the next step.
    pub state: StrategyState,
    /// Order that reached a terminal status on this bar.
    pub resolved: Option<Order>,
    pub snapshot: IndicatorSnapshot,
    pub signal: Signal,
    pub decision: Decision,
    /// Order submitted on this bar (accepted or rejected).
    pub submitted: Option<Order>,
}

/// Strategy controller for one run.
pub struct StrategyController {
    indicators: IndicatorEngine,
    evaluator: SignalEvaluator,
    order_size: f64,
}

impl StrategyController {
    pub fn new(indicators: &IndicatorConfig, strategy: &StrategyConfig) -> Self {
        Self {
            indicators: IndicatorEngine::new(indicators),
            evaluator: SignalEvaluator::from_config(strategy),
            order_size: strategy.order_size,
        }
    }

    /// Process bar `index`.
    pub fn step(
        &mut self,
        state: StrategyState,
        index: usize,
        bar: &Bar,
        broker: &mut Broker,
    ) -> BarStep {
        let mut state = state;

        // An order submitted on the previous bar fills here, before any new
        // decision is taken.
        let resolved = broker.execute_pending(bar);
        if let Some(order) = &resolved {
            state = self.notify_order(state, order, index, bar);
        }

        let snapshot = self.indicators.update(bar);
        let signal = self.evaluator.evaluate_snapshot(bar.close, &snapshot);

        let position_size = broker.position().size;
        let decision = self.decide(&state, signal, bar.close, broker.cash(), position_size);
        if decision != Decision::Hold {
            debug!(bar = index, ?decision, buy = signal.buy, sell = signal.sell, "strategy decision");
        }

        let submitted = match decision {
            Decision::Buy(size) => Some(broker.submit(Side::Buy, size, index)),
            Decision::Sell(size) => Some(broker.submit(Side::Sell, size, index)),
            Decision::Hold => None,
        };
        if let Some(order) = &submitted {
            if order.status == OrderStatus::Accepted {
                state.pending = Some(order.id);
            } else {
                state = self.notify_order(state, order, index, bar);
            }
        }

        state.bars_processed += 1;
        BarStep {
            state,
            resolved,
            snapshot,
            signal,
            decision,
            submitted,
        }
    }

    /// Pick the action for this bar.
    ///
    /// The cash check is a coarse pre-filter; the broker does the exact
    /// cost-plus-commission check at fill time.
    pub fn decide(
        &self,
        state: &StrategyState,
        signal: Signal,
        close: f64,
        cash: f64,
        position_size: f64,
    ) -> Decision {
        match state.phase(position_size) {
            StrategyPhase::OrderPending => Decision::Hold,
            StrategyPhase::Long if signal.sell => Decision::Sell(position_size),
            StrategyPhase::Flat if signal.buy && cash > close => Decision::Buy(self.order_size),
            _ => Decision::Hold,
        }
    }

    /// Handle an order that reached a terminal status.
    ///
    /// Journal messages go out at debug level; the run report carries them.
    pub fn notify_order(
        &self,
        mut state: StrategyState,
        order: &Order,
        index: usize,
        bar: &Bar,
    ) -> StrategyState {
        match order.status {
            OrderStatus::Submitted | OrderStatus::Accepted => return state,
            OrderStatus::Completed => {
                let price = order.execution.as_ref().map_or(0.0, |e| e.price);
                debug!(ts = %bar.ts_string(), order = order.id, "{} EXECUTED, {:.2}", order.side.label(), price);
                state.last_executed_bar = Some(index);
            }
            OrderStatus::Canceled | OrderStatus::Rejected => {
                debug!(ts = %bar.ts_string(), order = order.id, "Order Canceled/Rejected");
            }
            OrderStatus::Margin => {
                debug!(ts = %bar.ts_string(), order = order.id, "Order Margin call");
            }
        }

        if state.pending == Some(order.id) {
            state.pending = None;
        }
        debug!(order = order.id, status = ?order.status, "order resolved");
        state
    }

    pub fn indicators(&self) -> &IndicatorEngine {
        &self.indicators
    }
}
