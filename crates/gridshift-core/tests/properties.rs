//! Property tests for the address codec and range model

use gridshift_core::{CellAddress, CellRange, MAX_COLUMNS, MAX_ROWS};
use proptest::prelude::*;

proptest! {
    /// parse(encode(address)) == address over the full coordinate domain
    #[test]
    fn address_encode_parse_roundtrip(
        column in 1u32..=MAX_COLUMNS,
        row in 1u32..=MAX_ROWS,
    ) {
        let addr = CellAddress::new(column, row);
        let text = addr.to_a1_string();
        let parsed = CellAddress::parse(&text).unwrap();
        prop_assert_eq!(parsed, addr);
    }

    /// encode(parse(text)) yields the canonical form of the input
    #[test]
    fn address_parse_canonicalizes(
        column in 1u32..=MAX_COLUMNS,
        row in 1u32..=MAX_ROWS,
        lower in any::<bool>(),
    ) {
        let canonical = CellAddress::new(column, row).to_a1_string();
        let text = if lower { canonical.to_lowercase() } else { canonical.clone() };
        let parsed = CellAddress::parse(&text).unwrap();
        prop_assert_eq!(parsed.to_a1_string(), canonical);
    }

    /// Parsed ranges are always normalized: start <= end on both axes
    #[test]
    fn range_parse_normalizes(
        c1 in 1u32..=MAX_COLUMNS,
        r1 in 1u32..=MAX_ROWS,
        c2 in 1u32..=MAX_COLUMNS,
        r2 in 1u32..=MAX_ROWS,
    ) {
        let text = format!(
            "{}:{}",
            CellAddress::new(c1, r1).to_a1_string(),
            CellAddress::new(c2, r2).to_a1_string(),
        );
        let range = CellRange::parse(&text).unwrap();
        prop_assert!(range.start.column <= range.end.column);
        prop_assert!(range.start.row <= range.end.row);
        prop_assert_eq!(range.width(), c1.abs_diff(c2) + 1);
        prop_assert_eq!(range.height(), r1.abs_diff(r2) + 1);
    }

    /// Range text round-trips through its canonical form
    #[test]
    fn range_roundtrip(
        c1 in 1u32..=MAX_COLUMNS,
        r1 in 1u32..=MAX_ROWS,
        c2 in 1u32..=MAX_COLUMNS,
        r2 in 1u32..=MAX_ROWS,
    ) {
        let range = CellRange::new(CellAddress::new(c1, r1), CellAddress::new(c2, r2));
        let parsed = CellRange::parse(&range.to_a1_string()).unwrap();
        prop_assert_eq!(parsed, range);
    }
}
