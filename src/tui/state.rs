// File: ./src/tui/state.rs
// Screen state for the calendar views.
use crate::grid::{Grid, GridConfig};
use crate::model::{CalendarEvent, ViewKind, Window};
use crate::tui::action::{Action, InputEvent};
use crate::viewport::Viewport;
use chrono::{NaiveDate, NaiveDateTime};

/// Loading until the first pass finishes; Ready or Error after each pass;
/// back to Loading whenever a new pass is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Loading,
    Ready,
    Error(String),
}

pub struct AppState {
    pub view: ViewKind,
    pub today: NaiveDate,
    pub window_offset: i64,
    pub grid_config: GridConfig,
    pub viewport: Viewport,
    pub screen: Screen,
    pub last_updated: Option<NaiveDateTime>,

    // Last successful pass and the window it covered.
    events: Vec<CalendarEvent>,
    shown_window: Option<Window>,

    latest_pass: u64,
    pending_window: Window,
}

impl AppState {
    pub fn new(view: ViewKind, window_offset: i64, today: NaiveDate, grid_config: GridConfig) -> Self {
        Self {
            view,
            today,
            window_offset,
            grid_config,
            viewport: Viewport::new(view.columns(), grid_config.column_width, grid_config.rows()),
            screen: Screen::Loading,
            last_updated: None,
            events: Vec::new(),
            shown_window: None,
            latest_pass: 0,
            pending_window: Window::for_view(view, today, window_offset),
        }
    }

    pub fn window(&self) -> Window {
        Window::for_view(self.view, self.today, self.window_offset)
    }

    pub fn latest_pass(&self) -> u64 {
        self.latest_pass
    }

    pub fn shown_window(&self) -> Option<Window> {
        self.shown_window
    }

    /// Starts a new pass for the current window. Any pass still in flight
    /// becomes stale.
    pub fn request_refresh(&mut self) -> Action {
        self.latest_pass += 1;
        self.pending_window = self.window();
        self.screen = Screen::Loading;
        Action::Refresh {
            pass: self.latest_pass,
            window: self.pending_window,
        }
    }

    /// Applies a finished pass. Returns false when the pass was superseded
    /// and its result dropped.
    pub fn complete_pass(
        &mut self,
        pass: u64,
        result: Result<Vec<CalendarEvent>, String>,
        now: NaiveDateTime,
    ) -> bool {
        if pass != self.latest_pass {
            log::debug!("Dropping stale pass {} (latest {})", pass, self.latest_pass);
            return false;
        }
        match result {
            Ok(events) => {
                self.events = events;
                self.shown_window = Some(self.pending_window);
                self.last_updated = Some(now);
                self.screen = Screen::Ready;
            }
            Err(msg) => {
                self.screen = Screen::Error(msg);
            }
        }
        true
    }

    /// Rolls `today` forward when the wall clock crosses midnight.
    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
    }

    pub fn handle_input(&mut self, input: InputEvent) -> Option<Action> {
        match input {
            InputEvent::ScrollLeft => self.viewport.scroll_left(),
            InputEvent::ScrollRight => self.viewport.scroll_right(),
            InputEvent::ScrollUp => self.viewport.scroll_up(),
            InputEvent::ScrollDown => self.viewport.scroll_down(),
            InputEvent::Resize(w, h) => {
                self.viewport.resize(w);
                self.viewport
                    .set_visible_rows(h.saturating_sub(crate::tui::view::CHROME_ROWS) as usize);
            }
            InputEvent::PreviousWindow => {
                self.window_offset -= 1;
                return Some(self.request_refresh());
            }
            InputEvent::NextWindow => {
                self.window_offset += 1;
                return Some(self.request_refresh());
            }
            InputEvent::Refresh | InputEvent::Tick => return Some(self.request_refresh()),
            InputEvent::Quit => return Some(Action::Quit),
        }
        None
    }

    /// Grid of the last good pass, if there has been one.
    pub fn grid(&self, now: NaiveDateTime) -> Option<Grid> {
        self.shown_window
            .map(|w| Grid::build(&self.events, &w, self.grid_config, now))
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }
}
