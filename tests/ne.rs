//! NE executables: entry table, name tables and imports.

mod common;

use std::io::Cursor;

use common::{NeSpec, Reloc, ne_exe};

use romkit::Error;
use romkit::fields::FieldValue;
use romkit::formats::ne::{ImportTarget, Ne, NeTable, target_os};

/// Two fixed entries, a skip of three ordinals, then one movable entry.
fn entry_table() -> Vec<u8> {
    vec![
        2, 0x01, // two fixed entries in segment 1
        0x01, 0x10, 0x00, //
        0x03, 0x20, 0x00, //
        3, 0x00, // skip ordinals 3..=5
        1, 0xFF, // one movable entry
        0x01, 0xCD, 0x3F, 0x02, 0x30, 0x00, //
        0,
    ]
}

fn open(spec: &NeSpec<'_>) -> Ne<Cursor<Vec<u8>>> {
    Ne::open(Cursor::new(ne_exe(spec))).unwrap()
}

#[test]
fn ordinals_increase_with_gaps_from_skips() {
    let mut ne = open(&NeSpec {
        entry_table: entry_table(),
        module_name: "TESTMOD",
        ..Default::default()
    });
    let entries = ne.entries().unwrap();
    let ordinals: Vec<u16> = entries.iter().map(|e| e.ordinal).collect();
    assert_eq!(ordinals, [1, 2, 6]);
    assert!(ordinals.windows(2).all(|w| w[0] < w[1]));

    assert_eq!(entries[0].address(), "01:0010 (Fixed)");
    assert_eq!(entries[2].address(), "02:0030 (Movable)");
    assert!(entries[2].movable);
}

#[test]
fn names_attach_to_entries() {
    let mut ne = open(&NeSpec {
        entry_table: entry_table(),
        module_name: "TESTMOD",
        description: "Test module",
        resident_names: &[("FIRST", 1), ("SIXTH", 6)],
        non_resident_names: &[("SECOND", 2)],
        ..Default::default()
    });
    let entries = ne.entries().unwrap();
    let named: Vec<(u16, Option<&str>, bool)> = entries
        .iter()
        .map(|e| (e.ordinal, e.name.as_deref(), e.resident))
        .collect();
    assert_eq!(
        named,
        [
            (1, Some("FIRST"), true),
            (2, Some("SECOND"), false),
            (6, Some("SIXTH"), true),
        ]
    );
    assert!(entries[0].flag_string().contains("RESIDENTNAME"));
    assert!(!entries[1].flag_string().contains("RESIDENTNAME"));
}

#[test]
fn second_name_for_an_ordinal_adds_an_entry() {
    let mut ne = open(&NeSpec {
        entry_table: entry_table(),
        module_name: "TESTMOD",
        description: "Test module",
        resident_names: &[("FIRST", 1)],
        non_resident_names: &[("ALIAS", 1)],
        ..Default::default()
    });
    let entries = ne.entries().unwrap();
    assert_eq!(entries.len(), 4);
    let first: Vec<&str> = entries
        .iter()
        .filter(|e| e.ordinal == 1)
        .filter_map(|e| e.name.as_deref())
        .collect();
    assert_eq!(first, ["FIRST", "ALIAS"]);
    assert!(entries.windows(2).all(|w| w[0].ordinal <= w[1].ordinal));
}

#[test]
fn name_for_skipped_ordinal_is_invalid() {
    let mut ne = open(&NeSpec {
        entry_table: entry_table(),
        module_name: "TESTMOD",
        resident_names: &[("GHOST", 4)],
        ..Default::default()
    });
    assert!(matches!(ne.entries(), Err(Error::InvalidOrdinal(4))));
}

#[test]
fn imports_are_deduplicated_and_sorted() {
    let mut ne = open(&NeSpec {
        entry_table: entry_table(),
        module_name: "TESTMOD",
        modules: &["USER", "KERNEL", "gdi"],
        imported_functions: &["MessageBox"],
        relocations: vec![
            Reloc::Ordinal {
                module: 2,
                ordinal: 5,
            },
            Reloc::Name { module: 1, name: 0 },
            Reloc::Ordinal {
                module: 3,
                ordinal: 1,
            },
            Reloc::Ordinal {
                module: 2,
                ordinal: 5,
            },
        ],
        target_os: target_os::WINDOWS,
        ..Default::default()
    });

    assert_eq!(ne.module_names().unwrap(), ["USER", "KERNEL", "gdi"]);
    let imports: Vec<(String, String)> = ne
        .imports()
        .unwrap()
        .into_iter()
        .map(|i| (i.module, i.target.to_string()))
        .collect();
    assert_eq!(
        imports,
        [
            ("gdi".to_string(), "Ordinal #1".to_string()),
            ("KERNEL".to_string(), "Ordinal #5".to_string()),
            ("USER".to_string(), "MessageBox".to_string()),
        ]
    );
}

#[test]
fn imports_need_module_references() {
    let mut ne = open(&NeSpec {
        entry_table: entry_table(),
        module_name: "TESTMOD",
        ..Default::default()
    });
    assert!(matches!(ne.imports(), Err(Error::MissingResource(_))));
}

#[test]
fn tied_table_offsets_leave_earlier_table_empty() {
    let mut ne = open(&NeSpec {
        entry_table: entry_table(),
        module_name: "TESTMOD",
        ..Default::default()
    });
    // The builder places the resource table at the resident-name offset.
    assert!(ne.table(NeTable::Resource).unwrap().is_empty());
    assert_eq!(ne.table(NeTable::ResidentNames).unwrap()[0], 7);
}

#[test]
fn fields_describe_the_module() {
    let mut ne = open(&NeSpec {
        entry_table: entry_table(),
        module_name: "TESTMOD",
        description: "Test module",
        modules: &["KERNEL"],
        relocations: vec![Reloc::Ordinal {
            module: 1,
            ordinal: 3,
        }],
        target_os: target_os::WINDOWS,
        ..Default::default()
    });
    let fields = ne.fields();
    assert_eq!(fields.get("Target OS").unwrap().to_string(), "Windows");
    assert_eq!(fields.get("Module Name").unwrap().to_string(), "TESTMOD");
    assert_eq!(
        fields.get("Module Description").unwrap().to_string(),
        "Test module"
    );
    assert_eq!(fields.get("Windows Version").unwrap().to_string(), "3.0");
    match fields.get("Imports") {
        Some(FieldValue::ListData { rows, .. }) => {
            assert_eq!(rows, &[vec!["Ordinal #3".to_string(), "KERNEL".to_string()]]);
        }
        other => panic!("unexpected imports field: {other:?}"),
    }
    match fields.get("Entries") {
        Some(FieldValue::ListData { rows, .. }) => assert_eq!(rows.len(), 3),
        other => panic!("unexpected entries field: {other:?}"),
    }
}

#[test]
fn movable_entry_without_int3f_is_rejected() {
    let mut table = entry_table();
    table[13] = 0x00;
    let mut ne = open(&NeSpec {
        entry_table: table,
        module_name: "TESTMOD",
        ..Default::default()
    });
    assert!(matches!(ne.entries(), Err(Error::UnsupportedVariant(_))));
}

#[test]
fn imports_survive_a_missing_entry_table_terminator() {
    let mut table = entry_table();
    table.pop();
    let mut ne = open(&NeSpec {
        entry_table: table,
        module_name: "TESTMOD",
        modules: &["KERNEL"],
        relocations: vec![Reloc::Ordinal {
            module: 1,
            ordinal: 3,
        }],
        ..Default::default()
    });
    assert!(matches!(ne.entries(), Err(Error::OutOfRange)));
    assert_eq!(ne.imports().unwrap().len(), 1);
}
