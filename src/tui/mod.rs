// File: ./src/tui/mod.rs
// Terminal sessions: setup, the UI loops and teardown.
pub mod action;
pub mod handlers;
pub mod network;
pub mod next_meeting;
pub mod state;
pub mod ticker;
pub mod view;

use crate::config::Config;
use crate::grid::GridConfig;
use crate::model::ViewKind;
use crate::model::time::{local_offset, now_in};
use crate::source::CalendarProvider;
use crate::tui::action::{Action, AppEvent, InputEvent};
use crate::tui::next_meeting::NextMeetingState;
use crate::tui::state::AppState;

use anyhow::Result;
use chrono::FixedOffset;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

type Term = Terminal<CrosstermBackend<Stdout>>;

const INPUT_POLL: Duration = Duration::from_millis(50);

/// Background tasks of one session: the network actor plus the tickers.
/// All of them end when the session is shut down.
struct Background {
    token: CancellationToken,
    action_tx: Sender<Action>,
    event_rx: Receiver<AppEvent>,
    handles: Vec<JoinHandle<()>>,
}

impl Background {
    fn start<P: CalendarProvider>(
        provider: Arc<P>,
        cfg: &Config,
        offset: FixedOffset,
        tick_period: Duration,
    ) -> Self {
        let token = CancellationToken::new();
        let (action_tx, action_rx) = mpsc::channel(10);
        let (event_tx, event_rx) = mpsc::channel(10);

        let handles = vec![
            tokio::spawn(network::run_network_actor(
                provider,
                Arc::new(cfg.accounts.clone()),
                offset,
                action_rx,
                event_tx.clone(),
            )),
            ticker::spawn_ticker(tick_period, token.clone(), event_tx.clone()),
            ticker::spawn_size_watcher(
                ticker::SIZE_POLL_INTERVAL,
                token.clone(),
                event_tx,
                ticker::terminal_size,
            ),
        ];

        Self {
            token,
            action_tx,
            event_rx,
            handles,
        }
    }

    async fn send(&self, action: Action) {
        if self.action_tx.send(action).await.is_err() {
            log::warn!("Network actor is gone; request dropped");
        }
    }

    async fn shutdown(self) {
        let Self {
            token,
            action_tx,
            event_rx,
            handles,
        } = self;
        // Closing the receiver unblocks any task parked on a full queue.
        drop(event_rx);
        token.cancel();
        let _ = action_tx.send(Action::Quit).await;
        drop(action_tx);
        for handle in handles {
            if let Err(e) = handle.await {
                log::error!("Background task failed: {}", e);
            }
        }
    }
}

fn setup_terminal() -> Result<Term> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the week or day grid until the user quits.
pub async fn run<P: CalendarProvider>(
    provider: Arc<P>,
    cfg: Config,
    view: ViewKind,
    window_offset: i64,
) -> Result<()> {
    let offset = local_offset(cfg.utc_offset_minutes);
    let mut state = AppState::new(
        view,
        window_offset,
        now_in(offset).date(),
        GridConfig::from(&cfg),
    );
    let tick = Duration::from_secs(cfg.refresh_interval_secs.max(1));
    log::info!(
        "Starting {:?} view (offset {}), refresh every {:?}",
        view,
        window_offset,
        tick
    );

    let mut bg = Background::start(provider, &cfg, offset, tick);
    let mut terminal = setup_terminal()?;
    let result = calendar_loop(&mut terminal, &mut state, &mut bg, offset).await;
    bg.shutdown().await;
    restore_terminal(&mut terminal)?;
    result
}

async fn calendar_loop(
    terminal: &mut Term,
    state: &mut AppState,
    bg: &mut Background,
    offset: FixedOffset,
) -> Result<()> {
    let (w, h) = crossterm::terminal::size()?;
    state.handle_input(InputEvent::Resize(w, h));
    bg.send(state.request_refresh()).await;

    loop {
        let now = now_in(offset);
        terminal.draw(|f| view::draw(f, state, now))?;

        while let Ok(event) = bg.event_rx.try_recv() {
            if let Some(action) = handlers::handle_app_event(state, event, now_in(offset)) {
                bg.send(action).await;
            }
        }

        if event::poll(INPUT_POLL)? {
            let input = match event::read()? {
                Event::Key(key) => handlers::map_key(key),
                Event::Resize(w, h) => Some(InputEvent::Resize(w, h)),
                _ => None,
            };
            match input.and_then(|i| state.handle_input(i)) {
                Some(Action::Quit) => break,
                Some(action) => bg.send(action).await,
                None => {}
            }
        }
    }
    Ok(())
}

/// Runs the next-meeting countdown until the user quits.
pub async fn run_next_meeting<P: CalendarProvider>(provider: Arc<P>, cfg: Config) -> Result<()> {
    let offset = local_offset(cfg.utc_offset_minutes);
    let mut state = NextMeetingState::new(now_in(offset).date());

    let mut bg = Background::start(provider, &cfg, offset, next_meeting::REFRESH_PERIOD);
    let mut terminal = setup_terminal()?;
    let result = next_meeting_loop(&mut terminal, &mut state, &mut bg, offset).await;
    bg.shutdown().await;
    restore_terminal(&mut terminal)?;
    result
}

async fn next_meeting_loop(
    terminal: &mut Term,
    state: &mut NextMeetingState,
    bg: &mut Background,
    offset: FixedOffset,
) -> Result<()> {
    bg.send(state.request_refresh()).await;

    loop {
        let now = now_in(offset);
        terminal.draw(|f| next_meeting::draw(f, state, now))?;

        while let Ok(event) = bg.event_rx.try_recv() {
            match event {
                AppEvent::PassCompleted { pass, result } => {
                    state.complete_pass(pass, result.map_err(|e| e.to_string()));
                }
                AppEvent::Tick => {
                    state.today = now_in(offset).date();
                    bg.send(state.request_refresh()).await;
                }
                AppEvent::Resized(..) => {}
            }
        }

        if event::poll(INPUT_POLL)?
            && let Event::Key(key) = event::read()?
        {
            match handlers::map_key(key) {
                Some(InputEvent::Quit) => break,
                Some(InputEvent::Refresh) => bg.send(state.request_refresh()).await,
                _ => {}
            }
        }
    }
    Ok(())
}
