//! Which day columns and which grid rows fit on screen.
//!
//! Pure state: everything is derived from the terminal size handed in, so
//! it can be exercised without a terminal.

use std::ops::Range;

/// Width of the time gutter left of the day columns.
pub const TIME_GUTTER_WIDTH: u16 = 8;

/// Rows moved per vertical scroll step.
pub const ROW_SCROLL_STEP: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    total_columns: usize,
    column_width: u16,
    gutter_width: u16,
    offset: usize,
    visible: usize,
    total_rows: usize,
    visible_rows: usize,
    row_offset: usize,
}

/// `floor((width - gutter) / column_width)` clamped to `[1, total]`.
pub fn visible_for_width(width: u16, gutter: u16, column_width: u16, total: usize) -> usize {
    let usable = width.saturating_sub(gutter) as usize;
    let fit = usable / column_width.max(1) as usize;
    fit.clamp(1, total.max(1))
}

impl Viewport {
    pub fn new(total_columns: usize, column_width: u16, total_rows: usize) -> Self {
        let mut vp = Self {
            total_columns: total_columns.max(1),
            column_width: column_width.max(1),
            gutter_width: TIME_GUTTER_WIDTH,
            offset: 0,
            visible: 1,
            total_rows,
            visible_rows: total_rows,
            row_offset: 0,
        };
        vp.clamp();
        vp
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn visible_count(&self) -> usize {
        self.visible
    }

    pub fn total_columns(&self) -> usize {
        self.total_columns
    }

    /// Indices of the day columns currently on screen.
    pub fn visible_range(&self) -> Range<usize> {
        self.offset..self.offset + self.visible
    }

    pub fn row_offset(&self) -> usize {
        self.row_offset
    }

    pub fn scroll_left(&mut self) {
        self.offset = self.offset.saturating_sub(1);
    }

    pub fn scroll_right(&mut self) {
        if self.offset + self.visible < self.total_columns {
            self.offset += 1;
        }
    }

    /// Recomputes how many columns fit in `width` and re-clamps the offset.
    pub fn resize(&mut self, width: u16) {
        self.visible = visible_for_width(
            width,
            self.gutter_width,
            self.column_width,
            self.total_columns,
        );
        self.clamp();
    }

    /// Number of grid rows the body area can show at once.
    pub fn set_visible_rows(&mut self, rows: usize) {
        self.visible_rows = rows.max(1);
        self.clamp();
    }

    pub fn scroll_up(&mut self) {
        self.row_offset = self.row_offset.saturating_sub(ROW_SCROLL_STEP);
    }

    pub fn scroll_down(&mut self) {
        self.row_offset += ROW_SCROLL_STEP;
        self.clamp();
    }

    /// Switching between day and week changes how many columns exist.
    pub fn set_total_columns(&mut self, total: usize) {
        self.total_columns = total.max(1);
        self.clamp();
    }

    fn clamp(&mut self) {
        self.visible = self.visible.clamp(1, self.total_columns);
        self.offset = self.offset.min(self.total_columns - self.visible);
        let max_row = self.total_rows.saturating_sub(self.visible_rows);
        self.row_offset = self.row_offset.min(max_row);
    }
}
