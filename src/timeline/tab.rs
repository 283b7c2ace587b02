//! Tab grid notation
//!
//! One line per string, highest string first, one character per time slot:
//!
//! ```text
//! |0---------------|
//! |--1-----1-------|
//! |----0-------0---|
//! |------2-------2-|
//! |3---------------|
//! |----------------|
//! ```
//!
//! `-` holds whatever is sounding, a digit strikes (fret on melodic
//! instruments, intensity on percussion) and `x` mutes a melodic string.
//! Bars (`|`) are optional but every bar on every line must be the same
//! width.

use crate::error::StrumError;

use super::config::Voicing;
use super::engine::Instrument;

/// Velocity of a melodic tab strike before volume scaling.
pub const MELODIC_TAB_VELOCITY: i32 = 90;

/// Velocity of a percussion tab strike at intensity 9.
pub const PERCUSSION_TAB_VELOCITY: i32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Hold,
    Strike(u8),
    Mute,
}

/// A validated tab system: `lines[i]` is the i-th line of text, so line 0
/// belongs to the highest string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabGrid {
    pub lines: Vec<Vec<Cell>>,
    /// Ticks per column.
    pub step: u64,
}

impl TabGrid {
    /// Parse and validate a grid for an instrument with `strings` strings
    /// and `ticks_per_measure` ticks to the measure.
    pub fn parse<S: AsRef<str>>(
        lines: &[S],
        strings: usize,
        measures_per_line: u32,
        ticks_per_measure: u64,
    ) -> Result<Self, StrumError> {
        if measures_per_line == 0 {
            return Err(StrumError::ConfigError(
                "measures per line must be at least 1".to_string(),
            ));
        }

        let lines: Vec<&str> = lines
            .iter()
            .flat_map(|l| l.as_ref().lines())
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        if lines.len() != strings {
            return Err(StrumError::ConfigError(format!(
                "tab has {} line(s) but the instrument has {} string(s)",
                lines.len(),
                strings
            )));
        }

        let mut segment_width: Option<usize> = None;
        let mut cells = Vec::with_capacity(lines.len());
        for line in &lines {
            for segment in line.split('|').filter(|s| !s.is_empty()) {
                let width = segment.chars().count();
                match segment_width {
                    None => segment_width = Some(width),
                    Some(expected) if expected != width => {
                        return Err(StrumError::FormatError {
                            width,
                            message: format!(
                                "bar in '{}' is {} wide, expected {}",
                                line, width, expected
                            ),
                        });
                    }
                    Some(_) => {}
                }
            }
            cells.push(parse_line(line)?);
        }

        let width = cells.first().map(Vec::len).unwrap_or(0);
        if let Some(line) = cells.iter().position(|c| c.len() != width) {
            return Err(StrumError::FormatError {
                width: cells[line].len(),
                message: format!("line {} is not {} columns wide", line + 1, width),
            });
        }
        if width == 0 {
            return Err(StrumError::FormatError {
                width,
                message: "tab has no columns".to_string(),
            });
        }
        if width % measures_per_line as usize != 0 {
            return Err(StrumError::FormatError {
                width,
                message: format!(
                    "{} columns cannot be split into {} measure(s)",
                    width, measures_per_line
                ),
            });
        }
        let chars_per_measure = (width / measures_per_line as usize) as u64;
        if ticks_per_measure % chars_per_measure != 0 {
            return Err(StrumError::FormatError {
                width: chars_per_measure as usize,
                message: format!(
                    "{} ticks per measure do not divide into {} columns",
                    ticks_per_measure, chars_per_measure
                ),
            });
        }

        Ok(TabGrid {
            lines: cells,
            step: ticks_per_measure / chars_per_measure,
        })
    }

    pub fn width(&self) -> usize {
        self.lines.first().map(Vec::len).unwrap_or(0)
    }

    /// Cells of column `col`, with each line's string index.
    fn column(&self, col: usize) -> impl Iterator<Item = (usize, Cell)> + '_ {
        let count = self.lines.len();
        self.lines
            .iter()
            .enumerate()
            .map(move |(line, cells)| (count - 1 - line, cells[col]))
    }
}

fn parse_line(line: &str) -> Result<Vec<Cell>, StrumError> {
    line.chars()
        .filter(|&c| c != '|')
        .map(|c| match c {
            '-' => Ok(Cell::Hold),
            'x' | 'X' => Ok(Cell::Mute),
            _ => c.to_digit(10).map(|d| Cell::Strike(d as u8)).ok_or_else(|| {
                StrumError::parse(line, format!("unexpected character '{}' in tab", c))
            }),
        })
        .collect()
}

impl Instrument {
    /// Play one tab system given as multi-line text.
    pub fn tab(&mut self, measures_per_line: u32, text: &str) -> Result<(), StrumError> {
        self.tab_lines(measures_per_line, &[text])
    }

    /// Play one tab system given line by line.
    pub fn tab_lines<S: AsRef<str>>(
        &mut self,
        measures_per_line: u32,
        lines: &[S],
    ) -> Result<(), StrumError> {
        self.ensure_open()?;
        let grid = TabGrid::parse(
            lines,
            self.string_count(),
            measures_per_line,
            self.ticks_per_measure(),
        )?;
        if self.voicing() == Voicing::Melodic {
            self.check_tab_frets(&grid)?;
        }

        log::debug!(
            target: "timeline",
            "'{}' tab: {} column(s), {} tick(s) each, from tick {}",
            self.name(), grid.width(), grid.step, self.clock
        );

        let start = self.clock;
        for col in 0..grid.width() {
            let base = (start + col as u64 * grid.step) as i64;
            let tick = self.strike_tick(base);
            let dv = self.velocity_jitter();
            for (index, cell) in grid.column(col) {
                match self.voicing() {
                    Voicing::Melodic => self.melodic_cell(index, cell, dv, tick),
                    Voicing::Percussion => self.percussion_cell(index, cell, dv, tick),
                }
            }
        }
        self.advance(grid.width() as u64 * grid.step);
        self.trailing_rest = 0;
        Ok(())
    }

    fn check_tab_frets(&self, grid: &TabGrid) -> Result<(), StrumError> {
        for (line, cells) in grid.lines.iter().enumerate() {
            let index = grid.lines.len() - 1 - line;
            for cell in cells {
                if let Cell::Strike(fret) = cell {
                    self.strings.pitch(index, *fret as i32)?;
                }
            }
        }
        Ok(())
    }

    /// Melodic strategy: a digit replaces the sounding note, `x` stops it.
    fn melodic_cell(&mut self, index: usize, cell: Cell, dv: i32, tick: u64) {
        match cell {
            Cell::Hold => {}
            Cell::Mute => self.sound_string(index, 0, 0, 0, tick),
            Cell::Strike(fret) => {
                if let Ok(note) = self.strings.pitch(index, fret as i32) {
                    self.sound_string(index, note, MELODIC_TAB_VELOCITY, dv, tick);
                }
            }
        }
    }

    /// Percussion strategy: a digit is a hit whose velocity scales with it.
    /// Hits are instantaneous and never released.
    fn percussion_cell(&mut self, index: usize, cell: Cell, dv: i32, tick: u64) {
        let Cell::Strike(digit) = cell else {
            return;
        };
        if digit == 0 {
            return;
        }
        let velocity = PERCUSSION_TAB_VELOCITY * digit as i32 / 9;
        let voice = self.strings.roots()[index];
        self.hit(voice, velocity, dv, tick);
    }
}
