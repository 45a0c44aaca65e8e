//! Selection and viewport over a row list that contains group headers.
//!
//! Every movement lands on a plugin row. Headers are stepped over, and a move
//! with no plugin row in its direction leaves the selection where it is.

use crate::plugin::merge::DisplayRow;
use std::ops::Range;

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationController {
    selected: usize,
    offset: usize,
    page_size: usize,
}

impl Default for NavigationController {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl NavigationController {
    pub fn new(page_size: usize) -> Self {
        Self {
            selected: 0,
            offset: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Rows currently inside the viewport.
    pub fn visible_range(&self, row_count: usize) -> Range<usize> {
        let start = self.offset.min(row_count);
        start..(start + self.page_size).min(row_count)
    }

    pub fn set_page_size(&mut self, page_size: usize, row_count: usize) {
        self.page_size = page_size.max(1);
        self.ensure_visible(row_count);
    }

    pub fn move_up(&mut self, rows: &[DisplayRow]) -> bool {
        let upper = self.selected.min(rows.len());
        match (0..upper).rev().find(|&i| !rows[i].is_header()) {
            Some(index) => {
                self.selected = index;
                self.ensure_visible(rows.len());
                true
            }
            None => false,
        }
    }

    pub fn move_down(&mut self, rows: &[DisplayRow]) -> bool {
        match ((self.selected + 1)..rows.len()).find(|&i| !rows[i].is_header()) {
            Some(index) => {
                self.selected = index;
                self.ensure_visible(rows.len());
                true
            }
            None => false,
        }
    }

    pub fn page_up(&mut self, rows: &[DisplayRow]) {
        for _ in 0..self.page_size {
            if !self.move_up(rows) {
                break;
            }
        }
    }

    pub fn page_down(&mut self, rows: &[DisplayRow]) {
        for _ in 0..self.page_size {
            if !self.move_down(rows) {
                break;
            }
        }
    }

    pub fn move_to_start(&mut self, rows: &[DisplayRow]) {
        self.offset = 0;
        if let Some(index) = rows.iter().position(|row| !row.is_header()) {
            self.selected = index;
        } else {
            self.selected = 0;
        }
        self.ensure_visible(rows.len());
    }

    pub fn move_to_end(&mut self, rows: &[DisplayRow]) {
        if let Some(index) = rows.iter().rposition(|row| !row.is_header()) {
            self.selected = index;
            self.ensure_visible(rows.len());
        }
    }

    /// Select `index` if it is a plugin row.
    pub fn select(&mut self, index: usize, rows: &[DisplayRow]) -> bool {
        match rows.get(index) {
            Some(row) if !row.is_header() => {
                self.selected = index;
                self.ensure_visible(rows.len());
                true
            }
            _ => false,
        }
    }

    /// Pull the selection back onto a plugin row after the list changed.
    /// Prefers the nearest plugin row at or below the old index.
    pub fn reclamp(&mut self, rows: &[DisplayRow]) {
        if rows.is_empty() {
            self.selected = 0;
            self.offset = 0;
            return;
        }

        self.selected = self.selected.min(rows.len() - 1);
        if rows[self.selected].is_header() {
            let below = (self.selected..rows.len()).find(|&i| !rows[i].is_header());
            let above = (0..self.selected).rev().find(|&i| !rows[i].is_header());
            if let Some(index) = below.or(above) {
                self.selected = index;
            }
        }
        self.ensure_visible(rows.len());
    }

    pub fn ensure_visible(&mut self, row_count: usize) {
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + self.page_size {
            self.offset = self.selected + 1 - self.page_size;
        }
        let max_offset = row_count.saturating_sub(self.page_size);
        self.offset = self.offset.min(max_offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::merge::{merge, tests::available};
    use pretty_assertions::assert_eq;

    // 0: [a]  1: a1  2: a2  3: [b]  4: b1  5: [c]  6: c1  7: c2  8: c3
    fn sample_rows() -> Vec<DisplayRow> {
        merge(
            &[],
            &[
                available("a1@a", "a1", "a"),
                available("a2@a", "a2", "a"),
                available("b1@b", "b1", "b"),
                available("c1@c", "c1", "c"),
                available("c2@c", "c2", "c"),
                available("c3@c", "c3", "c"),
            ],
        )
    }

    fn at(index: usize, page_size: usize) -> NavigationController {
        NavigationController {
            selected: index,
            offset: 0,
            page_size,
        }
    }

    #[test]
    fn test_move_down_skips_headers() {
        let rows = sample_rows();
        let mut nav = at(2, 20);
        assert!(nav.move_down(&rows));
        assert_eq!(nav.selected(), 4);
        assert!(nav.move_down(&rows));
        assert_eq!(nav.selected(), 6);
    }

    #[test]
    fn test_move_up_skips_headers() {
        let rows = sample_rows();
        let mut nav = at(6, 20);
        assert!(nav.move_up(&rows));
        assert_eq!(nav.selected(), 4);
        assert!(nav.move_up(&rows));
        assert_eq!(nav.selected(), 2);
    }

    #[test]
    fn test_move_stops_at_edges() {
        let rows = sample_rows();
        let mut nav = at(1, 20);
        assert!(!nav.move_up(&rows));
        assert_eq!(nav.selected(), 1);

        let mut nav = at(8, 20);
        assert!(!nav.move_down(&rows));
        assert_eq!(nav.selected(), 8);
    }

    #[test]
    fn test_move_down_never_lands_on_header() {
        let rows = sample_rows();
        for start in 0..rows.len() {
            let mut nav = at(start, 3);
            for _ in 0..rows.len() * 2 {
                if nav.move_down(&rows) {
                    assert!(
                        !rows[nav.selected()].is_header(),
                        "landed on header from start {start}"
                    );
                }
            }
            if start < 8 {
                assert_eq!(nav.selected(), 8);
            }
        }
    }

    #[test]
    fn test_empty_rows_are_harmless() {
        let mut nav = NavigationController::new(5);
        assert!(!nav.move_down(&[]));
        assert!(!nav.move_up(&[]));
        nav.page_down(&[]);
        nav.page_up(&[]);
        nav.move_to_start(&[]);
        nav.move_to_end(&[]);
        nav.reclamp(&[]);
        assert_eq!((nav.selected(), nav.offset()), (0, 0));
    }

    #[test]
    fn test_page_down_counts_plugin_rows() {
        let rows = sample_rows();
        let mut nav = at(1, 3);
        nav.page_down(&rows);
        // a2, b1, c1
        assert_eq!(nav.selected(), 6);
        nav.page_down(&rows);
        assert_eq!(nav.selected(), 8);
        nav.page_up(&rows);
        assert_eq!(nav.selected(), 4);
    }

    #[test]
    fn test_move_to_start_and_end() {
        let rows = sample_rows();
        let mut nav = at(4, 3);
        nav.move_to_end(&rows);
        assert_eq!(nav.selected(), 8);
        assert_eq!(nav.offset(), 6);

        nav.move_to_start(&rows);
        assert_eq!(nav.selected(), 1);
        assert_eq!(nav.offset(), 0);
    }

    #[test]
    fn test_viewport_follows_selection() {
        let rows = sample_rows();
        let mut nav = at(1, 3);
        nav.move_down(&rows);
        assert_eq!(nav.offset(), 0);
        nav.move_down(&rows);
        // selected 4 -> window [2, 5)
        assert_eq!(nav.offset(), 2);
        nav.move_up(&rows);
        nav.move_up(&rows);
        assert_eq!(nav.offset(), 1);
        assert_eq!(nav.visible_range(rows.len()), 1..4);
    }

    #[test]
    fn test_offset_clamped_to_row_count() {
        let rows = sample_rows();
        let mut nav = NavigationController {
            selected: 8,
            offset: 8,
            page_size: 4,
        };
        nav.ensure_visible(rows.len());
        assert_eq!(nav.offset(), 5);

        nav.set_page_size(50, rows.len());
        assert_eq!(nav.offset(), 0);
    }

    #[test]
    fn test_reclamp_after_shrink() {
        let rows = sample_rows();
        let mut nav = at(8, 3);
        nav.ensure_visible(rows.len());

        let shorter = merge(&[], &[available("a1@a", "a1", "a")]);
        nav.reclamp(&shorter);
        assert_eq!(nav.selected(), 1);
        assert_eq!(nav.offset(), 0);
    }

    #[test]
    fn test_reclamp_moves_off_header() {
        let rows = sample_rows();
        let mut nav = at(3, 20);
        nav.reclamp(&rows);
        assert_eq!(nav.selected(), 4);

        let trailing_header = vec![
            DisplayRow::Header {
                marketplace: "a".to_string(),
            },
            rows[1].clone(),
            DisplayRow::Header {
                marketplace: "z".to_string(),
            },
        ];
        let mut nav = at(2, 20);
        nav.reclamp(&trailing_header);
        assert_eq!(nav.selected(), 1);
    }

    #[test]
    fn test_select_rejects_headers() {
        let rows = sample_rows();
        let mut nav = at(1, 20);
        assert!(!nav.select(3, &rows));
        assert!(!nav.select(99, &rows));
        assert!(nav.select(7, &rows));
        assert_eq!(nav.selected(), 7);
    }
}
