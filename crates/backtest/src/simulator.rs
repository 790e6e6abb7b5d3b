//! Backtest simulator.
//!
//! Replays a bar sequence through the strategy controller and broker and
//! collects the order journal, round trips, equity curve and summary.

use crate::broker::Broker;
use crate::metrics::{BacktestMetrics, MetricsCalculator};
use crate::portfolio::{EquityPoint, PortfolioTracker, ProfitSummary};
use crate::position::{ClosedTrade, TradeLedger};
use crate::strategy::{StrategyController, StrategyState};
use chrono::NaiveDateTime;
use cryptobot_core::{Config, Order, OrderStatus, Result, Side, TIMESTAMP_FORMAT};
use cryptobot_ingestion::BarSequence;
use serde::Serialize;
use tracing::{debug, info, warn};

/// An order outcome reported on a bar.
#[derive(Debug, Clone, Serialize)]
pub struct OrderEvent {
    pub bar_index: usize,
    pub ts: NaiveDateTime,
    pub order: Order,
}

impl OrderEvent {
    /// Journal message, e.g. `BUY EXECUTED, 50.00`.
    pub fn message(&self) -> String {
        match self.order.status {
            OrderStatus::Completed => {
                let price = self.order.execution.as_ref().map_or(0.0, |e| e.price);
                format!("{} EXECUTED, {:.2}", self.order.side.label(), price)
            }
            OrderStatus::Canceled | OrderStatus::Rejected => "Order Canceled/Rejected".to_string(),
            OrderStatus::Margin => "Order Margin call".to_string(),
            OrderStatus::Submitted | OrderStatus::Accepted => {
                format!("{} ORDER PENDING", self.order.side.label())
            }
        }
    }

    /// Full journal line with timestamp.
    pub fn journal_line(&self) -> String {
        format!("{}, {}", self.ts.format(TIMESTAMP_FORMAT), self.message())
    }
}

/// Result of one backtest run.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    /// Terminal order outcomes in bar order.
    pub events: Vec<OrderEvent>,
    /// Completed round trips.
    pub trades: Vec<ClosedTrade>,
    /// Portfolio value after each bar.
    pub equity_curve: Vec<EquityPoint>,
    pub summary: ProfitSummary,
    pub metrics: BacktestMetrics,
    pub final_cash: f64,
    pub final_position: f64,
    /// Order submitted on the last bar that never reached a fill bar.
    pub unfilled_order: Option<Order>,
    /// Bar index of the last completed fill.
    pub last_executed_bar: Option<usize>,
    pub bars_processed: usize,
}

impl BacktestReport {
    /// Pretty-printed JSON rendering of the whole report.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Backtest runner.
pub struct Backtest {
    config: Config,
}

impl Backtest {
    /// Create a runner, rejecting invalid configuration up front.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the strategy over every bar of `bars`.
    ///
    /// Each run starts from fresh indicator and broker state, so repeated
    /// runs over the same sequence produce identical reports.
    pub fn run(&self, bars: &BarSequence) -> BacktestReport {
        let mut broker = Broker::new(&self.config.broker);
        let mut controller = StrategyController::new(&self.config.indicators, &self.config.strategy);
        let mut portfolio = PortfolioTracker::new(self.config.broker.starting_cash);
        let mut ledger = TradeLedger::new();
        let mut events = Vec::new();
        let mut state = StrategyState::default();

        info!(
            bars = bars.len(),
            starting_value = portfolio.start_value(),
            "starting backtest"
        );

        for (index, bar) in bars.iter().enumerate() {
            let step = controller.step(state, index, bar, &mut broker);
            state = step.state;

            if let Some(order) = step.resolved {
                if let Some(exec) = &order.execution {
                    match order.side {
                        Side::Buy => {
                            ledger.record_buy(bar.ts, index, exec.price, exec.size, exec.commission)
                        }
                        Side::Sell => {
                            if let Some(trade) = ledger.record_sell(
                                bar.ts,
                                index,
                                exec.price,
                                exec.size,
                                exec.commission,
                            ) {
                                debug!(pnl = trade.pnl, bars_held = trade.bars_held(), "round trip closed");
                            }
                        }
                    }
                }
                events.push(OrderEvent {
                    bar_index: index,
                    ts: bar.ts,
                    order,
                });
            }

            if let Some(order) = step.submitted {
                if order.status.is_terminal() {
                    events.push(OrderEvent {
                        bar_index: index,
                        ts: bar.ts,
                        order,
                    });
                }
            }

            portfolio.mark(bar.ts, broker.cash(), broker.position().size, bar.close);
        }

        let unfilled_order = broker.pending().cloned();
        if let Some(order) = &unfilled_order {
            warn!(order = order.id, side = order.side.label(), "order still pending at end of data");
        }

        let summary = portfolio.summary();
        let trades = ledger.into_trades();
        let equity_curve = portfolio.into_equity_curve();
        let metrics = MetricsCalculator::new(summary.start_value).calculate(&trades, &equity_curve);

        info!(
            final_value = summary.end_value,
            profit = summary.profit,
            profit_pct = summary.profit_pct,
            trades = trades.len(),
            "backtest finished"
        );

        BacktestReport {
            events,
            trades,
            equity_curve,
            summary,
            metrics,
            final_cash: broker.cash(),
            final_position: broker.position().size,
            unfilled_order,
            last_executed_bar: state.last_executed_bar,
            bars_processed: state.bars_processed,
        }
    }
}
