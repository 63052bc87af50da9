// Countdown screen for the next upcoming event.
use crate::meeting::{format_time_until, next_meeting, urgency_color};
use crate::model::{CalendarEvent, Window};
use crate::tui::action::Action;
use crate::tui::state::Screen;
use crate::tui::view::color_of;
use chrono::{NaiveDate, NaiveDateTime};
use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

/// How far ahead to look for the next event.
pub const LOOKAHEAD_DAYS: u32 = 7;
pub const REFRESH_PERIOD: Duration = Duration::from_secs(60);

pub struct NextMeetingState {
    pub today: NaiveDate,
    pub screen: Screen,
    events: Vec<CalendarEvent>,
    latest_pass: u64,
}

impl NextMeetingState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            screen: Screen::Loading,
            events: Vec::new(),
            latest_pass: 0,
        }
    }

    pub fn window(&self) -> Window {
        Window {
            start: self.today,
            days: LOOKAHEAD_DAYS,
        }
    }

    pub fn request_refresh(&mut self) -> Action {
        self.latest_pass += 1;
        if self.screen != Screen::Ready {
            self.screen = Screen::Loading;
        }
        Action::Refresh {
            pass: self.latest_pass,
            window: self.window(),
        }
    }

    pub fn complete_pass(&mut self, pass: u64, result: Result<Vec<CalendarEvent>, String>) {
        if pass != self.latest_pass {
            return;
        }
        match result {
            Ok(events) => {
                self.events = events;
                self.screen = Screen::Ready;
            }
            Err(msg) => self.screen = Screen::Error(msg),
        }
    }

    pub fn upcoming(&self, now: NaiveDateTime) -> Option<&CalendarEvent> {
        next_meeting(&self.events, now)
    }
}

pub fn draw(f: &mut Frame, state: &NextMeetingState, now: NaiveDateTime) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(f.area());

    let body: Vec<Line> = match (&state.screen, state.upcoming(now)) {
        (Screen::Loading, _) => vec![Line::from(Span::styled(
            "Loading calendars...",
            Style::default().fg(Color::Yellow),
        ))],
        (Screen::Error(msg), _) => vec![Line::from(Span::styled(
            msg.clone(),
            Style::default().fg(Color::Red),
        ))],
        (Screen::Ready, None) => vec![Line::from(format!(
            "No upcoming events in the next {} days",
            LOOKAHEAD_DAYS
        ))],
        (Screen::Ready, Some(ev)) => vec![
            Line::from(Span::styled(
                ev.title.clone(),
                Style::default()
                    .fg(color_of(ev.color))
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!(
                "{} - {}",
                ev.start.format("%a %b %-d, %H:%M"),
                ev.end.format("%H:%M")
            )),
            Line::from(""),
            Line::from(Span::styled(
                format!("Starts in {}", format_time_until(now, ev.start)),
                Style::default()
                    .fg(color_of(urgency_color(now, ev.start)))
                    .add_modifier(Modifier::BOLD),
            )),
        ],
    };

    f.render_widget(
        Paragraph::new(body)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(" Next meeting ")),
        chunks[0],
    );
    f.render_widget(
        Paragraph::new(Span::styled(
            " r:Refresh  q:Quit",
            Style::default().fg(Color::DarkGray),
        ))
        .block(Block::default().borders(Borders::ALL)),
        chunks[1],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EventColor;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn test_window_starts_today() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 11).unwrap();
        let st = NextMeetingState::new(today);
        assert_eq!(st.window().start, today);
        assert_eq!(st.window().days, 7);
    }

    #[test]
    fn test_upcoming_ignores_marker() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 11).unwrap();
        let now = today.and_hms_opt(9, 0, 0).unwrap();
        let mut st = NextMeetingState::new(today);
        let pass = match st.request_refresh() {
            Action::Refresh { pass, .. } => pass,
            Action::Quit => unreachable!(),
        };
        st.complete_pass(
            pass,
            Ok(vec![
                CalendarEvent::new(
                    "Review",
                    now + ChronoDuration::hours(2),
                    now + ChronoDuration::hours(3),
                    EventColor::Blue,
                ),
                CalendarEvent::marker(now + ChronoDuration::minutes(30)),
            ]),
        );
        assert_eq!(st.screen, Screen::Ready);
        assert_eq!(st.upcoming(now).unwrap().title, "Review");
    }

    #[test]
    fn test_refresh_keeps_ready_screen() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 11).unwrap();
        let mut st = NextMeetingState::new(today);
        let pass = match st.request_refresh() {
            Action::Refresh { pass, .. } => pass,
            Action::Quit => unreachable!(),
        };
        st.complete_pass(pass, Ok(vec![]));
        st.request_refresh();
        assert_eq!(st.screen, Screen::Ready);
        // Stale completion is ignored.
        st.complete_pass(pass, Err("late".into()));
        assert_eq!(st.screen, Screen::Ready);
    }
}
