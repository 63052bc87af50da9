// Background timers owned by a TUI session. Both stop as soon as the
// session's cancellation token fires.
use crate::tui::action::AppEvent;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub const SIZE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Sends `AppEvent::Tick` every `period`, starting one period from now.
pub fn spawn_ticker(
    period: Duration,
    token: CancellationToken,
    tx: Sender<AppEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = interval.tick() => {
                    if tx.send(AppEvent::Tick).await.is_err() {
                        break;
                    }
                }
            }
        }
    })
}

/// Polls `read_size` for the terminal size and reports changes as
/// `AppEvent::Resized`. Some terminals never deliver resize events, so the
/// poll backs up crossterm's own notifications.
pub fn spawn_size_watcher<F>(
    period: Duration,
    token: CancellationToken,
    tx: Sender<AppEvent>,
    read_size: F,
) -> JoinHandle<()>
where
    F: Fn() -> Option<(u16, u16)> + Send + 'static,
{
    tokio::spawn(async move {
        let mut last = read_size();
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = interval.tick() => {
                    let current = read_size();
                    if current.is_some() && current != last {
                        last = current;
                        if let Some((w, h)) = current
                            && tx.send(AppEvent::Resized(w, h)).await.is_err()
                        {
                            break;
                        }
                    }
                }
            }
        }
    })
}

/// Size reader backed by the real terminal.
pub fn terminal_size() -> Option<(u16, u16)> {
    crossterm::terminal::size().ok()
}
