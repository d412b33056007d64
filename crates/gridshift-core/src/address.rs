//! Cell address and range types
//!
//! Addresses use the conventional A1 notation: column letters in bijective
//! base-26 (A=1, Z=26, AA=27, ...) followed by a 1-based row number. Both
//! coordinates are stored 1-based.

use crate::error::{Error, Result};
use crate::{MAX_COLUMNS, MAX_ROWS};
use serde::de::{self, Deserialize, Deserializer};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A single cell coordinate (e.g. "A1", "XFD1048576")
///
/// Absolute (`$`) markers are accepted when parsing and discarded; they only
/// carry meaning inside formula text, which the reference rewriter handles
/// separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellAddress {
    /// Column index, 1-based (A=1, ..., XFD=16384)
    pub column: u32,
    /// Row index, 1-based
    pub row: u32,
}

impl CellAddress {
    /// Create an address from 1-based coordinates without bounds checking.
    ///
    /// Callers constructing addresses from arithmetic should prefer
    /// [`CellAddress::checked`] or [`CellAddress::offset`].
    pub fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Create an address, verifying both coordinates are within sheet limits.
    pub fn checked(column: u32, row: u32) -> Result<Self> {
        if column == 0 || column > MAX_COLUMNS {
            return Err(Error::ColumnOutOfBounds(column as i64, MAX_COLUMNS));
        }
        if row == 0 || row > MAX_ROWS {
            return Err(Error::RowOutOfBounds(row as i64, MAX_ROWS));
        }
        Ok(Self { column, row })
    }

    /// Parse an address from A1-style notation.
    ///
    /// Letters are case-insensitive; a leading `$` on either part is
    /// tolerated. Fails with [`Error::MalformedReference`] when letters or
    /// digits are missing or out of order, and with the out-of-bounds
    /// variants when a coordinate exceeds sheet limits.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::MalformedReference("empty address".into()));
        }

        let bytes = s.as_bytes();
        let mut pos = 0;

        if bytes.get(pos) == Some(&b'$') {
            pos += 1;
        }

        let col_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }
        if pos == col_start {
            return Err(Error::MalformedReference(format!(
                "no column letters in '{}'",
                s
            )));
        }
        let column = Self::letters_to_column(&s[col_start..pos])?;

        if bytes.get(pos) == Some(&b'$') {
            pos += 1;
        }

        let row_str = &s[pos..];
        if row_str.is_empty() {
            return Err(Error::MalformedReference(format!("no row number in '{}'", s)));
        }
        if !row_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::MalformedReference(format!(
                "unexpected characters after column letters in '{}'",
                s
            )));
        }

        let row: u64 = row_str
            .parse()
            .map_err(|_| Error::MalformedReference(format!("invalid row number in '{}'", s)))?;
        if row == 0 || row > MAX_ROWS as u64 {
            return Err(Error::RowOutOfBounds(row as i64, MAX_ROWS));
        }

        Ok(Self {
            column,
            row: row as u32,
        })
    }

    /// Convert a 1-based column index to letters (1 = A, 26 = Z, 27 = AA).
    pub fn column_to_letters(column: u32) -> String {
        let mut result = String::new();
        let mut n = column;

        while n > 0 {
            n -= 1;
            let c = ((n % 26) as u8 + b'A') as char;
            result.insert(0, c);
            n /= 26;
        }

        result
    }

    /// Convert column letters to a 1-based index (A = 1, Z = 26, AA = 27).
    pub fn letters_to_column(letters: &str) -> Result<u32> {
        if letters.is_empty() {
            return Err(Error::MalformedReference("empty column letters".into()));
        }

        let mut col: u64 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return Err(Error::MalformedReference(format!(
                    "invalid column letter '{}'",
                    c
                )));
            }
            col = col * 26 + (c.to_ascii_uppercase() as u64 - 'A' as u64 + 1);
            if col > MAX_COLUMNS as u64 {
                return Err(Error::ColumnOutOfBounds(col as i64, MAX_COLUMNS));
            }
        }

        Ok(col as u32)
    }

    /// Format as a canonical A1-style string (uppercase letters, 1-based row).
    pub fn to_a1_string(&self) -> String {
        format!("{}{}", Self::column_to_letters(self.column), self.row)
    }

    /// Produce the address displaced by the given deltas.
    ///
    /// Fails with an out-of-bounds error if the result would fall below 1 or
    /// beyond the sheet limits on either axis; never clamps.
    pub fn offset(&self, col_delta: i64, row_delta: i64) -> Result<Self> {
        let column = self.column as i64 + col_delta;
        let row = self.row as i64 + row_delta;
        if column < 1 || column > MAX_COLUMNS as i64 {
            return Err(Error::ColumnOutOfBounds(column, MAX_COLUMNS));
        }
        if row < 1 || row > MAX_ROWS as i64 {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS));
        }
        Ok(Self {
            column: column as u32,
            row: row as u32,
        })
    }

    /// Create a range from this address to another.
    pub fn to(&self, other: CellAddress) -> CellRange {
        CellRange::new(*self, other)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for CellAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// An axis-aligned rectangle of cells (e.g. "A1:B10"), inclusive of both
/// corners. Always normalized so `start` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    /// Top-left corner
    pub start: CellAddress,
    /// Bottom-right corner
    pub end: CellAddress,
}

impl CellRange {
    /// Create a range from two corners, normalizing their order.
    pub fn new(a: CellAddress, b: CellAddress) -> Self {
        Self {
            start: CellAddress::new(a.column.min(b.column), a.row.min(b.row)),
            end: CellAddress::new(a.column.max(b.column), a.row.max(b.row)),
        }
    }

    /// Create a single-cell range.
    pub fn single(addr: CellAddress) -> Self {
        Self {
            start: addr,
            end: addr,
        }
    }

    /// Parse `"A1"` (single cell) or `"A1:C5"` notation. Corner order in the
    /// text does not matter; the result is normalized.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if let Some(colon_pos) = s.find(':') {
            let start = CellAddress::parse(&s[..colon_pos])?;
            let end = CellAddress::parse(&s[colon_pos + 1..])?;
            Ok(Self::new(start, end))
        } else {
            Ok(Self::single(CellAddress::parse(s)?))
        }
    }

    /// Parse range text, expanding a lone start cell to `default_end` when
    /// the caller supplied one (used when callers omit the end cell and ask
    /// for expansion to the sheet's populated extent).
    pub fn parse_with_default_end(s: &str, default_end: Option<CellAddress>) -> Result<Self> {
        let s = s.trim();
        if s.contains(':') {
            return Self::parse(s);
        }
        let start = CellAddress::parse(s)?;
        match default_end {
            Some(end) => Ok(Self::new(start, end)),
            None => Ok(Self::single(start)),
        }
    }

    /// Check whether an address lies within this range.
    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.column >= self.start.column
            && addr.column <= self.end.column
            && addr.row >= self.start.row
            && addr.row <= self.end.row
    }

    /// Check whether another range shares at least one cell with this one.
    pub fn intersects(&self, other: &CellRange) -> bool {
        self.start.column <= other.end.column
            && self.end.column >= other.start.column
            && self.start.row <= other.end.row
            && self.end.row >= other.start.row
    }

    /// Get the overlap of two ranges, if any.
    pub fn intersect(&self, other: &CellRange) -> Option<CellRange> {
        if !self.intersects(other) {
            return None;
        }
        Some(CellRange {
            start: CellAddress::new(
                self.start.column.max(other.start.column),
                self.start.row.max(other.start.row),
            ),
            end: CellAddress::new(
                self.end.column.min(other.end.column),
                self.end.row.min(other.end.row),
            ),
        })
    }

    /// Check whether another range lies entirely within this one.
    pub fn contains_range(&self, other: &CellRange) -> bool {
        self.contains(&other.start) && self.contains(&other.end)
    }

    /// Number of columns spanned (≥ 1).
    pub fn width(&self) -> u32 {
        self.end.column - self.start.column + 1
    }

    /// Number of rows spanned (≥ 1).
    pub fn height(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Iterate over all addresses in row-major order (left-to-right within
    /// each row, rows top-to-bottom). Re-invocable on the same range value.
    pub fn iter(&self) -> CellRangeIter {
        CellRangeIter {
            range: *self,
            next_column: self.start.column,
            next_row: self.start.row,
            done: false,
        }
    }

    /// Format as canonical A1 or A1:B10 text.
    pub fn to_a1_string(&self) -> String {
        if self.start == self.end {
            self.start.to_a1_string()
        } else {
            format!("{}:{}", self.start.to_a1_string(), self.end.to_a1_string())
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for CellRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Row-major iterator over the addresses in a range
pub struct CellRangeIter {
    range: CellRange,
    next_column: u32,
    next_row: u32,
    done: bool,
}

impl Iterator for CellRangeIter {
    type Item = CellAddress;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let addr = CellAddress::new(self.next_column, self.next_row);

        if self.next_column < self.range.end.column {
            self.next_column += 1;
        } else if self.next_row < self.range.end.row {
            self.next_column = self.range.start.column;
            self.next_row += 1;
        } else {
            self.done = true;
        }

        Some(addr)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let full_rows = (self.range.end.row - self.next_row) as u64 * self.range.width() as u64;
        let this_row = (self.range.end.column - self.next_column + 1) as u64;
        let remaining = (full_rows + this_row) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CellRangeIter {}
