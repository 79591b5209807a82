//! Integration tests for the color/protocol assignment list.
//!
//! These tests drive the list through the public API only: decode a stored
//! vector, edit it the way the preferences dialog does, encode it again, and
//! check the invariants hold at every step.

use netdiag_core::{ColorAssignment, ColorAssignmentList, Rgb24, DEFAULT_COLOR_VECTOR};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Encodes `list`, decodes it again and checks the encoding is stable.
fn roundtrip(list: &ColorAssignmentList) -> ColorAssignmentList {
    let encoded = list.to_persisted_vector();
    let decoded = ColorAssignmentList::from_persisted_vector(encoded.clone());
    assert_eq!(decoded.to_persisted_vector(), encoded, "encoding must be stable");
    decoded
}

#[test]
fn test_roundtrip_builtin_list() {
    let original = ColorAssignmentList::default();
    assert_eq!(roundtrip(&original), original);
}

#[test]
fn test_roundtrip_single_catch_all() {
    let original = ColorAssignmentList::new(vec![ColorAssignment::catch_all(Rgb24::new(1, 2, 3))]);
    assert_eq!(roundtrip(&original), original);
}

fn named(r: u8, g: u8, b: u8, protocol: &str) -> ColorAssignment {
    ColorAssignment::new(Rgb24::new(r, g, b), Some(protocol))
}

#[test]
fn test_roundtrip_table_of_lists() {
    let cases: Vec<(&str, Vec<ColorAssignment>)> = vec![
        ("single named", vec![named(0x12, 0x34, 0x56, "ARP")]),
        (
            "named then catch-all",
            vec![named(0xff, 0, 0, "WWW"), ColorAssignment::catch_all(Rgb24::new(0, 0xff, 0))],
        ),
        (
            "catch-all between named",
            vec![
                named(1, 1, 1, "DNS"),
                ColorAssignment::catch_all(Rgb24::new(2, 2, 2)),
                named(3, 3, 3, "SMTP"),
            ],
        ),
        ("semicolon in protocol", vec![named(0x12, 0x34, 0x56, "A;B")]),
        (
            "trailing semicolon in protocol",
            vec![named(0, 0, 0, "X;"), ColorAssignment::catch_all(Rgb24::new(9, 9, 9))],
        ),
        (
            "lowercase protocol kept as given",
            vec![named(0xaa, 0xbb, 0xcc, "ip/tcp"), named(0xaa, 0xbb, 0xcc, "ip/tcp")],
        ),
    ];

    for (name, entries) in cases {
        let original = ColorAssignmentList::new(entries);
        assert_eq!(roundtrip(&original), original, "case {name}");
    }
}

#[test]
fn test_roundtrip_generated_lists_of_every_length() {
    for len in 1..=24u8 {
        // Arrange: every third entry is a catch-all, every fifth name holds a ';'
        let entries = (0..len)
            .map(|i| {
                let color = Rgb24::new(i, i.wrapping_mul(7), 255 - i);
                match i % 3 {
                    0 => ColorAssignment::catch_all(color),
                    _ if i % 5 == 0 => ColorAssignment::new(color, Some(&format!("P{i};X"))),
                    _ => ColorAssignment::new(color, Some(&format!("P{i}"))),
                }
            })
            .collect();
        let original = ColorAssignmentList::new(entries);

        // Act
        let decoded = ColorAssignmentList::from_persisted_vector(original.to_persisted_vector());

        // Assert
        assert_eq!(decoded, original, "length {len}");
        assert_eq!(decoded.len(), usize::from(len));
    }
}

#[test]
fn test_roundtrip_after_dialog_style_edits() {
    // Arrange: start from stored data
    let mut list = ColorAssignmentList::from_persisted_vector(strings(&[
        "#ff0000;WWW",
        "#0000ff;DOMAIN",
        "#00ff00",
    ]));

    // Act: pick a colour before the selection, name it, drop an old entry
    let picked = Rgb24::from_rgb16(0x1234, 0xabcd, 0xffff);
    list.insert(Some(1), ColorAssignment::catch_all(picked));
    list.set_protocol(1, "smtp").expect("row 1 exists");
    list.remove(3).expect("row 3 exists");

    // Assert
    assert_eq!(
        list.to_persisted_vector(),
        strings(&["#ff0000;WWW", "#12abff;SMTP", "#0000ff;DOMAIN"])
    );
    assert_eq!(roundtrip(&list), list);
}

#[test]
fn test_emptied_list_persists_as_fallback_and_decodes_back() {
    // Arrange
    let mut list = ColorAssignmentList::new(vec![ColorAssignment::catch_all(Rgb24::new(9, 9, 9))]);
    list.remove(0).expect("row 0 exists");

    // Act
    let encoded = list.to_persisted_vector();
    let decoded = ColorAssignmentList::from_persisted_vector(encoded);

    // Assert
    assert_eq!(decoded.entries(), &[ColorAssignment::fallback()]);
}

#[test]
fn test_empty_inputs_yield_single_gray_entry() {
    for raw in [Vec::new(), strings(&[""])] {
        let list = ColorAssignmentList::from_persisted_vector(raw);
        assert_eq!(list.to_persisted_vector(), strings(&["#7f7f7f"]));
    }
}

#[test]
fn test_builtin_vector_names_www_and_domain_first() {
    assert!(DEFAULT_COLOR_VECTOR[0].ends_with(";WWW"));
    assert!(DEFAULT_COLOR_VECTOR[1].ends_with(";DOMAIN"));
    assert!(DEFAULT_COLOR_VECTOR[2..].iter().all(|entry| !entry.contains(';')));
}
