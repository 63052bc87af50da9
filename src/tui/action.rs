// Messages between the UI loop, the network actor and the background tickers.
use crate::aggregator::AggregationResult;
use crate::model::Window;

/// Discrete inputs that drive the screen state and the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    ScrollLeft,
    ScrollRight,
    ScrollUp,
    ScrollDown,
    PreviousWindow,
    NextWindow,
    Refresh,
    Quit,
    Tick,
    /// New terminal size: columns, rows.
    Resize(u16, u16),
}

/// Requests sent to the network actor.
#[derive(Debug, Clone)]
pub enum Action {
    Refresh { pass: u64, window: Window },
    Quit,
}

/// Notifications flowing back into the UI loop.
#[derive(Debug)]
pub enum AppEvent {
    PassCompleted { pass: u64, result: AggregationResult },
    Tick,
    Resized(u16, u16),
}
