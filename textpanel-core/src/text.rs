//! Text buffer and the application-facing panel handle
//!
//! [`Panel`] is the only state shared between application code and the
//! interrupt-driven engine. Writes happen inside a critical section so the
//! engine's once-per-payload snapshot never sees half a string.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::sync::RefreshCounter;

/// Number of text rows
pub const ROWS: usize = 2;

/// Number of columns per row
pub const COLUMNS: usize = 16;

/// 2x16 character grid plus backlight state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TextBuffer {
    /// Character codes, row-major
    pub rows: [[u8; COLUMNS]; ROWS],
    /// Backlight (HD44780) or display power (SSD1306)
    pub backlight: bool,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBuffer {
    /// Blank buffer with the backlight off
    pub const fn new() -> Self {
        Self {
            rows: [[b' '; COLUMNS]; ROWS],
            backlight: false,
        }
    }

    /// Copy `text` into `row` starting at `col`, then pad with spaces until
    /// `min_width` characters have been placed
    ///
    /// Output is clipped at the end of the row. Out-of-range `row` or `col`
    /// is a no-op.
    pub fn write(&mut self, col: usize, row: usize, min_width: usize, text: &[u8]) {
        let Some(line) = self.rows.get_mut(row) else {
            return;
        };
        if col >= COLUMNS {
            return;
        }

        let mut remaining = min_width;
        let mut cells = line[col..].iter_mut();

        // Pull the character first so an exhausted string leaves the
        // next cell for padding
        for (&c, cell) in text.iter().zip(cells.by_ref()) {
            *cell = c;
            remaining = remaining.saturating_sub(1);
        }
        for cell in cells.take(remaining) {
            *cell = b' ';
        }
    }

    /// Blank both rows
    pub fn clear(&mut self) {
        self.rows = [[b' '; COLUMNS]; ROWS];
    }
}

/// Shared handle to the text buffer and refresh counter
///
/// Lives in a `static` on target; tests build independent instances.
#[derive(Debug)]
pub struct Panel {
    text: Mutex<RefCell<TextBuffer>>,
    refresh: RefreshCounter,
}

impl Default for Panel {
    fn default() -> Self {
        Self::new()
    }
}

impl Panel {
    /// Create a blank panel
    pub const fn new() -> Self {
        Self::with_refresh_count(0)
    }

    /// Create a blank panel whose refresh counter starts at `count`
    pub const fn with_refresh_count(count: u8) -> Self {
        Self {
            text: Mutex::new(RefCell::new(TextBuffer::new())),
            refresh: RefreshCounter::new(count),
        }
    }

    /// Write text at (`col`, `row`); see [`TextBuffer::write`]
    pub fn write(&self, col: usize, row: usize, min_width: usize, text: &str) {
        self.modify(|buf| buf.write(col, row, min_width, text.as_bytes()));
    }

    /// Blank both rows
    pub fn clear(&self) {
        self.modify(TextBuffer::clear);
    }

    /// Switch the backlight; picked up by the next snapshot
    pub fn set_backlight(&self, on: bool) {
        self.modify(|buf| buf.backlight = on);
    }

    /// Consistent copy of the current text and backlight
    pub fn snapshot(&self) -> TextBuffer {
        critical_section::with(|cs| *self.text.borrow_ref(cs))
    }

    /// Number of completed content sweeps, modulo 256
    pub fn refresh_count(&self) -> u8 {
        self.refresh.get()
    }

    /// Check whether at least `sweeps` sweeps completed since the count
    /// was `start`
    pub fn swept_since(&self, start: u8, sweeps: u8) -> bool {
        self.refresh.elapsed_since(start) >= sweeps
    }

    /// Block until everything written before the call is on the display
    ///
    /// Waits for two sweeps: the one in flight at entry may have
    /// snapshotted the buffer before the last write. There is no timeout.
    pub fn sync(&self) {
        self.sync_with(core::hint::spin_loop);
    }

    /// [`sync`](Self::sync) with a caller-supplied loop body
    pub fn sync_with(&self, mut relax: impl FnMut()) {
        let start = self.refresh.get();
        while !self.swept_since(start, 2) {
            relax();
        }
    }

    pub(crate) fn refresh(&self) -> &RefreshCounter {
        &self.refresh
    }

    fn modify(&self, f: impl FnOnce(&mut TextBuffer)) {
        critical_section::with(|cs| f(&mut self.text.borrow_ref_mut(cs)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn row_str(panel: &Panel, row: usize) -> [u8; COLUMNS] {
        panel.snapshot().rows[row]
    }

    #[test]
    fn test_pads_to_min_width() {
        let panel = Panel::new();
        panel.write(0, 0, 0, "XXXXXXXXXXXXXXXX");
        panel.write(0, 0, 16, "Hi");
        assert_eq!(&row_str(&panel, 0), b"Hi              ");
    }

    #[test]
    fn test_clips_at_row_end() {
        let panel = Panel::new();
        panel.write(0, 0, 0, "0123456789abcdef");
        panel.write(10, 0, 0, "ABCDEFGH");
        assert_eq!(&row_str(&panel, 0), b"0123456789ABCDEF");
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let panel = Panel::new();
        panel.write(0, 1, 0, "keep");
        let before = panel.snapshot();
        panel.write(16, 0, 16, "nope");
        panel.write(0, 2, 16, "nope");
        assert_eq!(panel.snapshot(), before);
    }

    #[test]
    fn test_clear_blanks_both_rows() {
        let panel = Panel::new();
        panel.write(0, 0, 0, "Hello");
        panel.write(3, 1, 0, "World");
        panel.clear();
        let snap = panel.snapshot();
        assert_eq!(&snap.rows[0], b"                ");
        assert_eq!(&snap.rows[1], b"                ");
    }

    #[test]
    fn test_backlight_flag() {
        let panel = Panel::new();
        assert!(!panel.snapshot().backlight);
        panel.set_backlight(true);
        assert!(panel.snapshot().backlight);
    }

    #[test]
    fn test_sync_waits_two_sweeps_across_wrap() {
        let panel = Panel::with_refresh_count(254);
        let mut spins = 0;
        panel.sync_with(|| {
            spins += 1;
            panel.refresh().advance();
        });
        assert_eq!(spins, 2);
        assert_eq!(panel.refresh_count(), 0);
    }

    #[test]
    fn test_swept_since() {
        let panel = Panel::with_refresh_count(255);
        assert!(!panel.swept_since(255, 1));
        panel.refresh().advance();
        assert!(panel.swept_since(255, 1));
        assert!(!panel.swept_since(255, 2));
    }

    proptest! {
        #[test]
        fn write_matches_reference(
            initial in proptest::collection::vec(0x20u8..0x7f, COLUMNS),
            col in 0usize..20,
            row in 0usize..3,
            min_width in 0usize..24,
            text in "[ -~]{0,24}",
        ) {
            let mut buf = TextBuffer::new();
            for line in buf.rows.iter_mut() {
                line.copy_from_slice(&initial);
            }
            let before = buf;
            buf.write(col, row, min_width, text.as_bytes());

            if row >= ROWS || col >= COLUMNS {
                prop_assert_eq!(buf, before);
            } else {
                let bytes = text.as_bytes();
                let copied = bytes.len().min(COLUMNS - col);
                let padded = min_width
                    .saturating_sub(bytes.len())
                    .min(COLUMNS - col - copied);
                for c in 0..COLUMNS {
                    let expected = if c < col {
                        before.rows[row][c]
                    } else if c < col + copied {
                        bytes[c - col]
                    } else if c < col + copied + padded {
                        b' '
                    } else {
                        before.rows[row][c]
                    };
                    prop_assert_eq!(buf.rows[row][c], expected);
                }
                prop_assert_eq!(buf.rows[1 - row], before.rows[1 - row]);
            }
        }
    }
}
