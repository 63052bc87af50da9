// File: src/tui/view.rs
use crate::color_utils;
use crate::grid::{Grid, Slot, pad_to_width};
use crate::model::EventColor;
use crate::tui::state::{AppState, Screen};
use crate::viewport::TIME_GUTTER_WIDTH;
use chrono::NaiveDateTime;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

/// Rows not available to grid slots: the footer plus column borders.
pub const CHROME_ROWS: u16 = FOOTER_HEIGHT + 2;
const FOOTER_HEIGHT: u16 = 3;

pub fn color_of(tag: EventColor) -> Color {
    let (r, g, b) = color_utils::tag_rgb(tag);
    Color::Rgb(r, g, b)
}

/// Background from the event colour, black or white text on top, reversed
/// and bold while the event is happening.
fn cell_style(tag: EventColor, active: bool) -> Style {
    let (r, g, b) = color_utils::tag_rgb(tag);
    let fg = if color_utils::is_dark(r, g, b) {
        Color::White
    } else {
        Color::Black
    };
    let style = Style::default().bg(Color::Rgb(r, g, b)).fg(fg);
    if active {
        style.add_modifier(Modifier::REVERSED | Modifier::BOLD)
    } else {
        style
    }
}

pub fn draw(f: &mut Frame, state: &AppState, now: NaiveDateTime) {
    let v_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(FOOTER_HEIGHT)])
        .split(f.area());

    match state.grid(now) {
        Some(grid) => draw_grid(f, state, &grid, v_chunks[0]),
        None => draw_placeholder(f, state, v_chunks[0]),
    }
    draw_footer(f, state, v_chunks[1]);
}

fn draw_placeholder(f: &mut Frame, state: &AppState, area: Rect) {
    let (text, style) = match &state.screen {
        Screen::Error(msg) => (msg.clone(), Style::default().fg(Color::Red)),
        _ => (
            "Loading calendars...".to_string(),
            Style::default().fg(Color::Yellow),
        ),
    };
    let p = Paragraph::new(text)
        .style(style)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" gcal-tui "));
    f.render_widget(p, area);
}

fn draw_grid(f: &mut Frame, state: &AppState, grid: &Grid, area: Rect) {
    let vp = &state.viewport;
    let col_width = grid.config.column_width;
    let mut constraints = vec![Constraint::Length(TIME_GUTTER_WIDTH)];
    constraints.extend(vp.visible_range().map(|_| Constraint::Length(col_width)));
    constraints.push(Constraint::Min(0));

    let h_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    let scroll = vp.row_offset() as u16;

    let gutter: Vec<Line> = (0..grid.rows())
        .map(|row| Line::from(grid.row_label(row)))
        .collect();
    f.render_widget(
        Paragraph::new(gutter)
            .style(Style::default().fg(Color::DarkGray))
            .scroll((scroll, 0))
            .block(Block::default().borders(Borders::ALL)),
        h_chunks[0],
    );

    let inner = col_width.saturating_sub(2) as usize;
    for (chunk_idx, day) in vp.visible_range().enumerate() {
        let Some(column) = grid.columns.get(day) else {
            continue;
        };
        let lines: Vec<Line> = column
            .slots
            .iter()
            .map(|slot| match slot {
                Slot::Empty => Line::from(""),
                Slot::Start(o) | Slot::Continuation(o) => Line::from(Span::styled(
                    pad_to_width(&format!(" {}", o.text), inner),
                    cell_style(o.color, o.active),
                )),
            })
            .collect();

        let is_today = state.today == column.date;
        let title_style = if is_today {
            Style::default()
                .fg(color_of(EventColor::HIGHLIGHT))
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(format!(" {} ", column.header()), title_style));
        f.render_widget(
            Paragraph::new(lines).scroll((scroll, 0)).block(block),
            h_chunks[chunk_idx + 1],
        );
    }
}

fn draw_footer(f: &mut Frame, state: &AppState, area: Rect) {
    let window = state.shown_window().unwrap_or_else(|| state.window());
    let range = format!(
        "{} - {}",
        window.start.format("%b %-d"),
        (window.end() - chrono::Duration::days(1)).format("%b %-d")
    );

    let status = match &state.screen {
        Screen::Loading => Span::styled("Loading...", Style::default().fg(Color::Yellow)),
        Screen::Ready => Span::styled(
            match state.last_updated {
                Some(t) => format!("Updated {}", t.format("%H:%M")),
                None => "Ready".to_string(),
            },
            Style::default().fg(Color::Green),
        ),
        Screen::Error(msg) => Span::styled(
            format!("Error: {}", msg),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
    };

    let line = Line::from(vec![
        Span::styled(format!(" {} ", range), Style::default().fg(Color::Cyan)),
        Span::raw(" "),
        status,
        Span::styled(
            "   h/l:Days  j/k:Scroll  p/n:Prev/Next  r:Refresh  q:Quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    f.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridConfig;
    use crate::model::{CalendarEvent, ViewKind};
    use crate::tui::action::{Action, InputEvent};
    use chrono::NaiveDate;
    use ratatui::{Terminal, backend::TestBackend};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buf = terminal.backend().buffer();
        let mut s = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                s.push_str(buf[(x, y)].symbol());
            }
            s.push('\n');
        }
        s
    }

    #[test]
    fn test_renders_loading_then_grid() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 26).unwrap();
        let now = today.and_hms_opt(8, 0, 0).unwrap();
        let cfg = GridConfig {
            start_hour: 8,
            end_hour: 12,
            column_width: 20,
        };
        let mut st = AppState::new(ViewKind::Week, 0, today, cfg);
        st.handle_input(InputEvent::Resize(8 + 20 * 2, 20));

        let backend = TestBackend::new(8 + 20 * 2, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(f, &st, now)).unwrap();
        assert!(buffer_text(&terminal).contains("Loading calendars..."));

        let pass = match st.request_refresh() {
            Action::Refresh { pass, .. } => pass,
            Action::Quit => unreachable!(),
        };
        let ev = CalendarEvent::new(
            "Standup",
            today.and_hms_opt(9, 0, 0).unwrap(),
            today.and_hms_opt(9, 30, 0).unwrap(),
            EventColor::Green,
        );
        st.complete_pass(pass, Ok(vec![ev]), now);
        terminal.draw(|f| draw(f, &st, now)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Standup"));
        assert!(text.contains("Monday - Jan 26"));
        assert!(text.contains("09:00"));
    }
}
