//! Formula reference rewriting
//!
//! Locates every cell/range reference inside a formula string and rewrites
//! it under one of two policies:
//!
//! - **Structural shift**: rows or columns were inserted or deleted on the
//!   sheet the formula lives on. References at or beyond the affected
//!   position move with the cells they name; references into a deleted band
//!   mark the whole formula broken.
//! - **Copy translate**: the formula was duplicated to a new location.
//!   Relative axes move by the copy delta, `$`-anchored axes stay put.
//!
//! The scanner works on the raw formula text: references inside string
//! literals are never touched, sheet-qualified references are rewritten only
//! when the qualifier names the sheet being mutated, and identifiers or
//! function names that merely look like addresses (`LOG10(...)`) are left
//! alone.

use gridshift_core::error::{Error, Result};
use gridshift_core::{Axis, ShiftOp, MAX_COLUMNS, MAX_ROWS};

use gridshift_core::CellAddress;

/// How references are transformed
#[derive(Debug, Clone, Copy)]
pub enum RewritePolicy<'a> {
    /// Rows/columns inserted or deleted on `sheet`. With `shift_absolute`
    /// set (the default behavior), `$`-anchored axes move too: insertion
    /// physically relocates the cell an absolute reference names.
    StructuralShift {
        op: &'a ShiftOp,
        sheet: &'a str,
        shift_absolute: bool,
    },
    /// Formula copied by `(col_delta, row_delta)` onto `sheet`.
    CopyTranslate {
        col_delta: i64,
        row_delta: i64,
        sheet: &'a str,
    },
}

/// Result of rewriting one formula
#[derive(Debug, Clone, PartialEq)]
pub enum RewriteOutcome {
    /// No reference was affected
    Unchanged,
    /// At least one reference moved
    Rewritten(String),
    /// A reference points at cells that no longer exist
    Broken { reason: String },
}

/// One axis of a parsed reference: coordinate plus absolute flag
#[derive(Debug, Clone, Copy, PartialEq)]
struct RefAxis {
    coord: u32,
    absolute: bool,
}

/// One corner of a reference (`$B$2` style)
#[derive(Debug, Clone, Copy, PartialEq)]
struct RefPart {
    col: RefAxis,
    row: RefAxis,
}

impl RefPart {
    fn axis(&self, axis: Axis) -> RefAxis {
        match axis {
            Axis::Row => self.row,
            Axis::Column => self.col,
        }
    }

    fn set_axis(&mut self, axis: Axis, value: RefAxis) {
        match axis {
            Axis::Row => self.row = value,
            Axis::Column => self.col = value,
        }
    }

    fn emit(&self, out: &mut String) {
        if self.col.absolute {
            out.push('$');
        }
        out.push_str(&CellAddress::column_to_letters(self.col.coord));
        if self.row.absolute {
            out.push('$');
        }
        out.push_str(&self.row.coord.to_string());
    }
}

/// A reference token found in formula text
#[derive(Debug, Clone, PartialEq)]
struct FormulaReference {
    /// Qualifier text exactly as written, including quotes and `!`
    qualifier: Option<String>,
    /// Bare sheet name from the qualifier (quotes stripped)
    sheet: Option<String>,
    start: RefPart,
    end: Option<RefPart>,
}

impl FormulaReference {
    /// Whether the policy's sheet owns this reference.
    fn targets_sheet(&self, sheet: &str) -> bool {
        match &self.sheet {
            None => true,
            Some(name) => name.eq_ignore_ascii_case(sheet),
        }
    }

    fn emit(&self, out: &mut String) {
        if let Some(q) = &self.qualifier {
            out.push_str(q);
        }
        match self.end {
            None => self.start.emit(out),
            Some(end) => {
                // Re-normalize per axis; independent corner shifts may have
                // inverted the written order.
                let (mut a, mut b) = (self.start, end);
                if a.col.coord > b.col.coord {
                    std::mem::swap(&mut a.col, &mut b.col);
                }
                if a.row.coord > b.row.coord {
                    std::mem::swap(&mut a.row, &mut b.row);
                }
                a.emit(out);
                out.push(':');
                b.emit(out);
            }
        }
    }
}

/// Rewrite every reference in `formula` under `policy`.
pub fn rewrite_formula(formula: &str, policy: &RewritePolicy) -> RewriteOutcome {
    let mut scanner = Scanner::new(formula);
    let mut out = String::with_capacity(formula.len());

    while let Some(event) = scanner.next_event() {
        match event {
            ScanEvent::Verbatim(text) => out.push_str(text),
            ScanEvent::Reference { text, reference } => {
                match rewrite_reference(&reference, text, policy) {
                    RefResult::Kept => out.push_str(text),
                    RefResult::Moved(rendered) => out.push_str(&rendered),
                    RefResult::Broken(reason) => return RewriteOutcome::Broken { reason },
                }
            }
        }
    }

    if out == formula {
        RewriteOutcome::Unchanged
    } else {
        RewriteOutcome::Rewritten(out)
    }
}

/// Check formula text for structural problems without rewriting anything:
/// presence of the `=` prefix, balanced parentheses and braces, terminated
/// string literals, and a non-empty body.
pub fn check_formula(formula: &str) -> Result<()> {
    let trimmed = formula.trim();
    let body = trimmed
        .strip_prefix('=')
        .ok_or_else(|| Error::MalformedReference("formula must start with '='".into()))?;
    if body.trim().is_empty() {
        return Err(Error::MalformedReference("formula has no expression".into()));
    }

    let bytes = body.as_bytes();
    let mut depth: i32 = 0;
    let mut braces: i32 = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                // Skip the string literal, honoring "" escapes
                i += 1;
                loop {
                    match bytes.get(i) {
                        None => {
                            return Err(Error::MalformedReference(
                                "unterminated string literal".into(),
                            ))
                        }
                        Some(b'"') if bytes.get(i + 1) == Some(&b'"') => i += 2,
                        Some(b'"') => {
                            i += 1;
                            break;
                        }
                        Some(_) => i += 1,
                    }
                }
                continue;
            }
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(Error::MalformedReference(
                        "unbalanced closing parenthesis".into(),
                    ));
                }
            }
            b'{' => braces += 1,
            b'}' => {
                braces -= 1;
                if braces < 0 {
                    return Err(Error::MalformedReference("unbalanced closing brace".into()));
                }
            }
            _ => {}
        }
        i += 1;
    }
    if depth != 0 {
        return Err(Error::MalformedReference("unbalanced parentheses".into()));
    }
    if braces != 0 {
        return Err(Error::MalformedReference("unbalanced braces".into()));
    }
    Ok(())
}

enum RefResult {
    Kept,
    Moved(String),
    Broken(String),
}

fn rewrite_reference(
    reference: &FormulaReference,
    original: &str,
    policy: &RewritePolicy,
) -> RefResult {
    let sheet = match policy {
        RewritePolicy::StructuralShift { sheet, .. } => sheet,
        RewritePolicy::CopyTranslate { sheet, .. } => sheet,
    };
    if !reference.targets_sheet(sheet) {
        return RefResult::Kept;
    }

    let mut updated = reference.clone();
    let result = match policy {
        RewritePolicy::StructuralShift {
            op,
            shift_absolute,
            ..
        } => apply_structural_shift(&mut updated, op, *shift_absolute, original),
        RewritePolicy::CopyTranslate {
            col_delta,
            row_delta,
            ..
        } => apply_translate(&mut updated, *col_delta, *row_delta, original),
    };

    match result {
        Err(reason) => RefResult::Broken(reason),
        Ok(()) => {
            let mut rendered = String::new();
            updated.emit(&mut rendered);
            if rendered == original {
                RefResult::Kept
            } else {
                RefResult::Moved(rendered)
            }
        }
    }
}

fn axis_max(axis: Axis) -> u32 {
    match axis {
        Axis::Row => MAX_ROWS,
        Axis::Column => MAX_COLUMNS,
    }
}

fn apply_structural_shift(
    reference: &mut FormulaReference,
    op: &ShiftOp,
    shift_absolute: bool,
    original: &str,
) -> std::result::Result<(), String> {
    let axis = op.axis();

    match (*op, reference.end) {
        (ShiftOp::Insert { at, count, .. }, _) => {
            for part in parts_mut(reference) {
                let mut a = part.axis(axis);
                if a.coord >= at && (shift_absolute || !a.absolute) {
                    a.coord += count;
                    if a.coord > axis_max(axis) {
                        return Err(format!(
                            "reference {} was pushed beyond the sheet edge",
                            original
                        ));
                    }
                    part.set_axis(axis, a);
                }
            }
            Ok(())
        }
        (ShiftOp::Delete { start, count, .. }, None) => {
            let band_end = start + count;
            let mut a = reference.start.axis(axis);
            if a.coord >= start && a.coord < band_end {
                return Err(format!("reference {} points at deleted cells", original));
            }
            if a.coord >= band_end && (shift_absolute || !a.absolute) {
                a.coord -= count;
                reference.start.set_axis(axis, a);
            }
            Ok(())
        }
        (ShiftOp::Delete { start, count, .. }, Some(end)) => {
            let band_end = start + count;

            // Order the corners along the affected axis, keeping each
            // coordinate paired with its own absolute flag.
            let (mut lo, mut hi) = {
                let a = reference.start.axis(axis);
                let b = end.axis(axis);
                if a.coord <= b.coord {
                    (a, b)
                } else {
                    (b, a)
                }
            };

            if lo.coord >= start && hi.coord < band_end {
                return Err(format!("range {} lies wholly in deleted cells", original));
            }

            // Clip the extent against the band; corners outside it shift.
            if lo.coord >= band_end {
                if shift_absolute || !lo.absolute {
                    lo.coord -= count;
                }
            } else if lo.coord >= start {
                lo.coord = start;
            }
            if hi.coord >= band_end {
                if shift_absolute || !hi.absolute {
                    hi.coord -= count;
                }
            } else if hi.coord >= start {
                hi.coord = start - 1;
            }
            if hi.coord < lo.coord || hi.coord == 0 {
                return Err(format!("range {} lies wholly in deleted cells", original));
            }

            // Write the clipped pair back in the corners' original order.
            let start_first = reference.start.axis(axis).coord <= end.axis(axis).coord;
            let mut new_end = end;
            if start_first {
                reference.start.set_axis(axis, lo);
                new_end.set_axis(axis, hi);
            } else {
                reference.start.set_axis(axis, hi);
                new_end.set_axis(axis, lo);
            }
            reference.end = Some(new_end);
            Ok(())
        }
    }
}

fn apply_translate(
    reference: &mut FormulaReference,
    col_delta: i64,
    row_delta: i64,
    original: &str,
) -> std::result::Result<(), String> {
    for part in parts_mut(reference) {
        if !part.col.absolute {
            let col = part.col.coord as i64 + col_delta;
            if col < 1 || col > MAX_COLUMNS as i64 {
                return Err(format!(
                    "reference {} escapes the sheet when translated",
                    original
                ));
            }
            part.col.coord = col as u32;
        }
        if !part.row.absolute {
            let row = part.row.coord as i64 + row_delta;
            if row < 1 || row > MAX_ROWS as i64 {
                return Err(format!(
                    "reference {} escapes the sheet when translated",
                    original
                ));
            }
            part.row.coord = row as u32;
        }
    }
    Ok(())
}

fn parts_mut(reference: &mut FormulaReference) -> impl Iterator<Item = &mut RefPart> {
    std::iter::once(&mut reference.start).chain(reference.end.as_mut())
}

// === Scanner ===

enum ScanEvent<'a> {
    /// Text copied through untouched (operators, literals, identifiers)
    Verbatim(&'a str),
    /// A reference token and its parsed form
    Reference {
        text: &'a str,
        reference: FormulaReference,
    },
}

struct Scanner<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn next_event(&mut self) -> Option<ScanEvent<'a>> {
        if self.pos >= self.bytes.len() {
            return None;
        }
        let start = self.pos;
        let b = self.bytes[self.pos];

        // String literal: copied verbatim, never scanned for references
        if b == b'"' {
            self.pos += 1;
            loop {
                match self.bytes.get(self.pos) {
                    None => break,
                    Some(b'"') if self.bytes.get(self.pos + 1) == Some(&b'"') => self.pos += 2,
                    Some(b'"') => {
                        self.pos += 1;
                        break;
                    }
                    Some(_) => self.pos += 1,
                }
            }
            return Some(ScanEvent::Verbatim(&self.input[start..self.pos]));
        }

        // Quoted sheet qualifier: 'My Sheet'!A1
        if b == b'\'' {
            if let Some(event) = self.try_quoted_reference(start) {
                return Some(event);
            }
            // Not a qualifier after all; emit the quote and move on
            self.pos = start + 1;
            return Some(ScanEvent::Verbatim(&self.input[start..self.pos]));
        }

        // Error literals (#REF!, #DIV/0!) start with '#'; consume the marker
        // and the identifier run after it as plain text.
        if b == b'#' {
            self.pos += 1;
            while self
                .bytes
                .get(self.pos)
                .is_some_and(|&c| c.is_ascii_alphanumeric() || matches!(c, b'/' | b'!' | b'?'))
            {
                self.pos += 1;
            }
            return Some(ScanEvent::Verbatim(&self.input[start..self.pos]));
        }

        // Numeric literal, consumed whole so the exponent of 1E5 or 2e10 is
        // never mistaken for a cell reference.
        if b.is_ascii_digit()
            || (b == b'.' && self.bytes.get(self.pos + 1).is_some_and(|c| c.is_ascii_digit()))
        {
            self.pos = self.number_end(start);
            return Some(ScanEvent::Verbatim(&self.input[start..self.pos]));
        }

        if b.is_ascii_alphabetic() || b == b'$' || b == b'_' {
            return Some(self.scan_word(start));
        }

        // Anything else passes through one char at a time
        self.pos += next_char_len(self.input, self.pos);
        Some(ScanEvent::Verbatim(&self.input[start..self.pos]))
    }

    /// Scan from an alphabetic/`$`/`_` start: a reference, a sheet-qualified
    /// reference, a function name, or a plain identifier.
    fn scan_word(&mut self, start: usize) -> ScanEvent<'a> {
        // Bare sheet qualifier: identifier run directly followed by '!'
        let ident_end = self.identifier_end(start);
        if self.bytes.get(ident_end) == Some(&b'!') {
            let sheet = &self.input[start..ident_end];
            if let Some((reference, end_pos)) =
                self.try_reference_parts(ident_end + 1, Some((sheet, start, ident_end + 1)))
            {
                self.pos = end_pos;
                return ScanEvent::Reference {
                    text: &self.input[start..end_pos],
                    reference,
                };
            }
            // '!' without a parseable reference behind it: pass through
            self.pos = ident_end + 1;
            return ScanEvent::Verbatim(&self.input[start..self.pos]);
        }

        // Unqualified reference?
        if let Some((reference, end_pos)) = self.try_reference_parts(start, None) {
            self.pos = end_pos;
            return ScanEvent::Reference {
                text: &self.input[start..end_pos],
                reference,
            };
        }

        // Identifier / function name / TRUE / named range
        self.pos = if ident_end > start {
            ident_end
        } else {
            start + 1 // lone '$'
        };
        ScanEvent::Verbatim(&self.input[start..self.pos])
    }

    /// 'Quoted Sheet'!A1 — returns None when this is not a qualifier.
    fn try_quoted_reference(&mut self, start: usize) -> Option<ScanEvent<'a>> {
        let mut i = start + 1;
        let mut name = String::new();
        loop {
            match self.bytes.get(i) {
                None => return None,
                Some(b'\'') if self.bytes.get(i + 1) == Some(&b'\'') => {
                    name.push('\'');
                    i += 2;
                }
                Some(b'\'') => {
                    i += 1;
                    break;
                }
                Some(_) => {
                    let len = next_char_len(self.input, i);
                    name.push_str(&self.input[i..i + len]);
                    i += len;
                }
            }
        }
        if self.bytes.get(i) != Some(&b'!') {
            return None;
        }
        let (mut reference, end_pos) = self.try_reference_parts(i + 1, None)?;
        reference.qualifier = Some(self.input[start..i + 1].to_string());
        reference.sheet = Some(name);
        self.pos = end_pos;
        Some(ScanEvent::Reference {
            text: &self.input[start..end_pos],
            reference,
        })
    }

    /// Parse `part(:part)?` at `from`. The optional qualifier triple is
    /// (sheet name, token start, part start) for bare qualifiers.
    fn try_reference_parts(
        &self,
        from: usize,
        qualifier: Option<(&str, usize, usize)>,
    ) -> Option<(FormulaReference, usize)> {
        let (start_part, mut end_pos) = self.try_part(from)?;

        let mut end_part = None;
        if self.bytes.get(end_pos) == Some(&b':') {
            if let Some((part, after)) = self.try_part(end_pos + 1) {
                end_part = Some(part);
                end_pos = after;
            }
        }

        // A trailing '(' means this was a function name (LOG10, ATAN2, ...)
        if end_part.is_none() && self.bytes.get(end_pos) == Some(&b'(') {
            return None;
        }

        let (qualifier_text, sheet) = match qualifier {
            Some((name, tok_start, part_start)) => (
                Some(self.input[tok_start..part_start].to_string()),
                Some(name.to_string()),
            ),
            None => (None, None),
        };

        Some((
            FormulaReference {
                qualifier: qualifier_text,
                sheet,
                start: start_part,
                end: end_part,
            },
            end_pos,
        ))
    }

    /// Parse a single `$?letters$?digits` part at `from`. Rejects candidates
    /// that continue into a longer identifier or exceed sheet bounds.
    fn try_part(&self, from: usize) -> Option<(RefPart, usize)> {
        let mut i = from;

        let col_absolute = self.bytes.get(i) == Some(&b'$');
        if col_absolute {
            i += 1;
        }

        let letters_start = i;
        while self.bytes.get(i).is_some_and(|b| b.is_ascii_alphabetic()) {
            i += 1;
        }
        if i == letters_start || i - letters_start > 3 {
            return None;
        }
        let letters = &self.input[letters_start..i];

        let row_absolute = self.bytes.get(i) == Some(&b'$');
        if row_absolute {
            i += 1;
        }

        let digits_start = i;
        while self.bytes.get(i).is_some_and(|b| b.is_ascii_digit()) {
            i += 1;
        }
        if i == digits_start {
            return None;
        }

        // Must not be the prefix of a longer identifier (A1B, TAB1_x)
        if self
            .bytes
            .get(i)
            .is_some_and(|&b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'!'))
        {
            return None;
        }

        let column = gridshift_core::CellAddress::letters_to_column(letters).ok()?;
        let row: u32 = self.input[digits_start..i].parse().ok()?;
        if row == 0 || row > MAX_ROWS {
            return None;
        }

        Some((
            RefPart {
                col: RefAxis {
                    coord: column,
                    absolute: col_absolute,
                },
                row: RefAxis {
                    coord: row,
                    absolute: row_absolute,
                },
            },
            i,
        ))
    }

    /// End of a numeric literal at `start`: digits, optional fraction,
    /// optional `e`/`E` exponent with sign. The exponent is only taken when
    /// digits follow it.
    fn number_end(&self, start: usize) -> usize {
        let mut i = start;
        while self.bytes.get(i).copied().is_some_and(|b| b.is_ascii_digit()) {
            i += 1;
        }
        if self.bytes.get(i) == Some(&b'.') {
            i += 1;
            while self.bytes.get(i).copied().is_some_and(|b| b.is_ascii_digit()) {
                i += 1;
            }
        }
        if matches!(self.bytes.get(i).copied(), Some(b'e') | Some(b'E')) {
            let mut j = i + 1;
            if matches!(self.bytes.get(j).copied(), Some(b'+') | Some(b'-')) {
                j += 1;
            }
            let exp_digits = j;
            while self.bytes.get(j).copied().is_some_and(|b| b.is_ascii_digit()) {
                j += 1;
            }
            if j > exp_digits {
                i = j;
            }
        }
        i
    }

    fn identifier_end(&self, start: usize) -> usize {
        let mut i = start;
        while self
            .bytes
            .get(i)
            .is_some_and(|&b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'.'))
        {
            i += 1;
        }
        i
    }
}

fn next_char_len(s: &str, pos: usize) -> usize {
    s[pos..].chars().next().map(char::len_utf8).unwrap_or(1)
}
