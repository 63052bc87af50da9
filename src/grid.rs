//! Half-hour time grid for a window of days.
//!
//! Each cell is classified against the event list in order: a cell whose
//! instant equals an event's start is that event's `Start`, a cell strictly
//! inside an event is a `Continuation`, anything else is `Empty`. The first
//! matching event wins. Overlapping events are not stacked; later ones are
//! simply hidden where an earlier one already claims the cell.

use crate::config::Config;
use crate::model::time::SLOT_MINUTES;
use crate::model::{CalendarEvent, EventColor, Window};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use unicode_width::UnicodeWidthChar;

/// Cells taken by borders and one column of padding on either side.
const CELL_CHROME: u16 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridConfig {
    pub start_hour: u32,
    pub end_hour: u32,
    /// Full column width including borders.
    pub column_width: u16,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            start_hour: 0,
            end_hour: 24,
            column_width: 25,
        }
    }
}

impl From<&Config> for GridConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            start_hour: cfg.start_hour,
            end_hour: cfg.end_hour,
            column_width: cfg.column_width,
        }
    }
}

impl GridConfig {
    /// Width available for title text inside a column.
    pub fn interior_width(&self) -> usize {
        self.column_width.saturating_sub(CELL_CHROME).max(1) as usize
    }

    pub fn rows(&self) -> usize {
        (self.end_hour.saturating_sub(self.start_hour) as usize) * 2
    }

    pub fn slot_start(&self, date: NaiveDate, row: usize) -> NaiveDateTime {
        date.and_time(NaiveTime::MIN)
            + Duration::hours(self.start_hour as i64)
            + Duration::minutes(SLOT_MINUTES * row as i64)
    }
}

/// What an occupied cell shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupied {
    /// Title chunk for this cell; empty once the title has run out.
    pub text: String,
    pub color: EventColor,
    /// The owning event contains the current instant.
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Empty,
    Start(Occupied),
    Continuation(Occupied),
}

impl Slot {
    pub fn occupied(&self) -> Option<&Occupied> {
        match self {
            Slot::Empty => None,
            Slot::Start(o) | Slot::Continuation(o) => Some(o),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayColumn {
    pub date: NaiveDate,
    pub slots: Vec<Slot>,
}

impl DayColumn {
    /// e.g. "Monday - Jan 2"
    pub fn header(&self) -> String {
        self.date.format("%A - %b %-d").to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub config: GridConfig,
    pub columns: Vec<DayColumn>,
}

impl Grid {
    /// Lays `events` out over every day of `window`. `now` decides which
    /// cells get the active style. Deterministic for identical inputs.
    pub fn build(
        events: &[CalendarEvent],
        window: &Window,
        config: GridConfig,
        now: NaiveDateTime,
    ) -> Self {
        let width = config.interior_width();
        let chunks: Vec<Vec<String>> = events
            .iter()
            .map(|e| split_title(&e.title, width))
            .collect();

        let columns = window
            .dates()
            .map(|date| DayColumn {
                date,
                slots: (0..config.rows())
                    .map(|row| classify(events, &chunks, config.slot_start(date, row), now))
                    .collect(),
            })
            .collect();

        Self { config, columns }
    }

    pub fn rows(&self) -> usize {
        self.config.rows()
    }

    pub fn slot(&self, day: usize, row: usize) -> Option<&Slot> {
        self.columns.get(day)?.slots.get(row)
    }

    /// Gutter label: "HH:MM" on the hour, blank on the half hour.
    pub fn row_label(&self, row: usize) -> String {
        if row % 2 == 0 {
            format!("{:02}:00", self.config.start_hour as usize + row / 2)
        } else {
            String::new()
        }
    }
}

fn classify(
    events: &[CalendarEvent],
    chunks: &[Vec<String>],
    at: NaiveDateTime,
    now: NaiveDateTime,
) -> Slot {
    // Half-open intervals: an event with `end <= start` never matches.
    let Some((event, parts)) = events.iter().zip(chunks).find(|(e, _)| e.contains(at)) else {
        return Slot::Empty;
    };
    let k = ((at - event.start).num_minutes() / SLOT_MINUTES) as usize;
    let occupied = Occupied {
        text: parts.get(k).cloned().unwrap_or_default(),
        color: event.color,
        active: event.contains(now),
    };
    if at == event.start {
        Slot::Start(occupied)
    } else {
        Slot::Continuation(occupied)
    }
}

// Pictographic blocks terminals draw two cells wide even where the Unicode
// width tables disagree.
const PICTOGRAPH_RANGES: &[(u32, u32)] = &[
    (0x1F600, 0x1F64F),
    (0x1F300, 0x1F5FF),
    (0x1F680, 0x1F6FF),
    (0x1F1E6, 0x1F1FF),
    (0x2600, 0x26FF),
    (0x2700, 0x27BF),
    (0x1F900, 0x1F9FF),
    (0x1FA00, 0x1FAFF),
    (0x1F004, 0x1F0CF),
    (0x1F170, 0x1F251),
];

pub fn is_pictograph(c: char) -> bool {
    let cp = c as u32;
    PICTOGRAPH_RANGES
        .iter()
        .any(|&(lo, hi)| (lo..=hi).contains(&cp))
}

/// Terminal cells taken by one glyph.
pub fn glyph_width(c: char) -> usize {
    if is_pictograph(c) {
        2
    } else {
        c.width().unwrap_or(0)
    }
}

pub fn display_width(s: &str) -> usize {
    s.chars().map(glyph_width).sum()
}

/// Pads `s` with spaces to exactly `width` cells. Text already wider is
/// returned unchanged.
pub fn pad_to_width(s: &str, width: usize) -> String {
    let used = display_width(s);
    let mut out = s.to_string();
    out.extend(std::iter::repeat_n(' ', width.saturating_sub(used)));
    out
}

/// Splits a title into chunks no wider than `width` cells, breaking at
/// spaces where possible and inside words that cannot fit on their own.
pub fn split_title(title: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let cleaned: String = title
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    let mut chunks = Vec::new();
    let mut line = String::new();
    let mut line_width = 0;

    for word in cleaned.split_whitespace() {
        let word_width = display_width(word);
        let sep = if line.is_empty() { 0 } else { 1 };

        if line_width + sep + word_width <= width {
            if sep == 1 {
                line.push(' ');
            }
            line.push_str(word);
            line_width += sep + word_width;
            continue;
        }

        if !line.is_empty() {
            chunks.push(std::mem::take(&mut line));
            line_width = 0;
        }

        if word_width <= width {
            line.push_str(word);
            line_width = word_width;
            continue;
        }

        for c in word.chars() {
            let w = glyph_width(c);
            // A glyph wider than the column still gets a chunk of its own.
            if line_width + w > width && !line.is_empty() {
                chunks.push(std::mem::take(&mut line));
                line_width = 0;
            }
            line.push(c);
            line_width += w;
        }
    }
    if !line.is_empty() {
        chunks.push(line);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn row_of(cfg: &GridConfig, h: u32, m: u32) -> usize {
        ((h - cfg.start_hour) * 2 + m / 30) as usize
    }

    #[test]
    fn test_split_title_word_boundaries() {
        assert_eq!(
            split_title("Extended Planning Session For Q3", 16),
            vec!["Extended", "Planning Session", "For Q3"]
        );
        assert_eq!(split_title("Standup", 16), vec!["Standup"]);
        assert!(split_title("", 16).is_empty());
        assert!(split_title("   ", 16).is_empty());
    }

    #[test]
    fn test_split_title_breaks_long_words() {
        assert_eq!(
            split_title("Supercalifragilistic", 8),
            vec!["Supercal", "ifragili", "stic"]
        );
        for chunk in split_title("a verylongwordthatneverends here", 5) {
            assert!(display_width(&chunk) <= 5, "{:?}", chunk);
        }
    }

    #[test]
    fn test_pictographs_count_double() {
        assert!(is_pictograph('\u{1F680}'));
        assert!(is_pictograph('\u{2615}'));
        assert!(!is_pictograph('A'));
        assert_eq!(display_width("🚀 Launch"), 9);
        assert_eq!(display_width("☕"), 2);
        assert_eq!(pad_to_width("🚀", 4), "🚀  ");
        for chunk in split_title("🚀🚀🚀 go", 4) {
            assert!(display_width(&chunk) <= 4);
        }
    }

    #[test]
    fn test_interior_width() {
        let cfg = GridConfig {
            column_width: 20,
            ..GridConfig::default()
        };
        assert_eq!(cfg.interior_width(), 16);
        let tiny = GridConfig {
            column_width: 3,
            ..GridConfig::default()
        };
        assert_eq!(tiny.interior_width(), 1);
    }

    #[test]
    fn test_first_matching_event_wins() {
        let cfg = GridConfig::default();
        let window = Window::day(NaiveDate::from_ymd_opt(2026, 1, 26).unwrap(), 0);
        let events = vec![
            CalendarEvent::new("First", at(26, 9, 0), at(26, 10, 0), EventColor::Green),
            CalendarEvent::new("Second", at(26, 9, 0), at(26, 11, 0), EventColor::Aqua),
        ];
        let grid = Grid::build(&events, &window, cfg, at(26, 7, 0));

        match grid.slot(0, row_of(&cfg, 9, 0)).unwrap() {
            Slot::Start(o) => assert_eq!(o.text, "First"),
            other => panic!("unexpected {:?}", other),
        }
        // Past the first event, the second one shows through.
        let later = grid.slot(0, row_of(&cfg, 10, 0)).unwrap();
        assert_eq!(later.occupied().unwrap().color, EventColor::Aqua);
        assert!(matches!(later, Slot::Continuation(_)));
    }

    #[test]
    fn test_empty_interval_occupies_nothing() {
        let cfg = GridConfig::default();
        let window = Window::day(NaiveDate::from_ymd_opt(2026, 1, 26).unwrap(), 0);
        let events = vec![
            CalendarEvent::new("Reminder", at(26, 9, 0), at(26, 9, 0), EventColor::Green),
            CalendarEvent::new("Inverted", at(26, 11, 0), at(26, 10, 0), EventColor::Red),
        ];
        let grid = Grid::build(&events, &window, cfg, at(26, 9, 0));
        assert!(grid.columns[0].slots.iter().all(Slot::is_empty));
    }

    #[test]
    fn test_active_cells() {
        let cfg = GridConfig::default();
        let window = Window::day(NaiveDate::from_ymd_opt(2026, 1, 26).unwrap(), 0);
        let events = vec![
            CalendarEvent::new("Now", at(26, 9, 0), at(26, 10, 0), EventColor::Green),
            CalendarEvent::new("Later", at(26, 11, 0), at(26, 12, 0), EventColor::Teal),
        ];
        let grid = Grid::build(&events, &window, cfg, at(26, 9, 40));
        for row in [row_of(&cfg, 9, 0), row_of(&cfg, 9, 30)] {
            assert!(grid.slot(0, row).unwrap().occupied().unwrap().active);
        }
        assert!(!grid.slot(0, row_of(&cfg, 11, 0)).unwrap().occupied().unwrap().active);
    }

    #[test]
    fn test_unaligned_event_only_continues() {
        let cfg = GridConfig::default();
        let window = Window::day(NaiveDate::from_ymd_opt(2026, 1, 26).unwrap(), 0);
        let events = vec![CalendarEvent::new(
            "Offbeat",
            at(26, 9, 10),
            at(26, 10, 10),
            EventColor::Purple,
        )];
        let grid = Grid::build(&events, &window, cfg, at(26, 0, 0));
        assert!(grid.slot(0, row_of(&cfg, 9, 0)).unwrap().is_empty());
        match grid.slot(0, row_of(&cfg, 9, 30)).unwrap() {
            Slot::Continuation(o) => assert_eq!(o.text, "Offbeat"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            grid.slot(0, row_of(&cfg, 10, 0)).unwrap(),
            Slot::Continuation(_)
        ));
        assert!(grid.slot(0, row_of(&cfg, 10, 30)).unwrap().is_empty());
    }

    #[test]
    fn test_row_labels_and_headers() {
        let cfg = GridConfig {
            start_hour: 8,
            end_hour: 23,
            column_width: 25,
        };
        let window = Window::day(NaiveDate::from_ymd_opt(2026, 1, 26).unwrap(), 0);
        let grid = Grid::build(&[], &window, cfg, at(26, 0, 0));
        assert_eq!(grid.rows(), 30);
        assert_eq!(grid.row_label(0), "08:00");
        assert_eq!(grid.row_label(1), "");
        assert_eq!(grid.row_label(29), "");
        assert_eq!(grid.row_label(28), "22:00");
        assert_eq!(grid.columns[0].header(), "Monday - Jan 26");
    }
}
