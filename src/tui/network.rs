// Runs aggregation passes in the background for the TUI.
use crate::aggregator::{Pass, aggregate};
use crate::config::AccountConfig;
use crate::model::time::now_in;
use crate::source::CalendarProvider;
use crate::tui::action::{Action, AppEvent};
use chrono::FixedOffset;
use std::sync::Arc;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinSet;

/// Serves refresh requests until `Quit` or until the UI drops its sender.
/// Each pass runs on its own task. A new request aborts whatever pass is
/// still in flight, so a hung fetch cannot pile up behind repeated ticks.
pub async fn run_network_actor<P: CalendarProvider>(
    provider: Arc<P>,
    accounts: Arc<Vec<AccountConfig>>,
    offset: FixedOffset,
    mut action_rx: Receiver<Action>,
    event_tx: Sender<AppEvent>,
) {
    let mut passes = JoinSet::new();

    while let Some(action) = action_rx.recv().await {
        match action {
            Action::Quit => break,
            Action::Refresh { pass, window } => {
                if !passes.is_empty() {
                    log::debug!("Pass {} supersedes {} running pass(es)", pass, passes.len());
                    passes.abort_all();
                }
                log::debug!("Starting pass {} for {:?}", pass, window);
                let provider = provider.clone();
                let accounts = accounts.clone();
                let event_tx = event_tx.clone();
                passes.spawn(async move {
                    let request = Pass {
                        window,
                        offset,
                        now: now_in(offset),
                    };
                    let result = aggregate(provider, &accounts, &request).await;
                    let _ = event_tx.send(AppEvent::PassCompleted { pass, result }).await;
                });
            }
        }
        while passes.try_join_next().is_some() {}
    }

    passes.abort_all();
    log::debug!("Network actor stopped");
}
