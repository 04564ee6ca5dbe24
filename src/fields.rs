//! Displayable field lists.
//!
//! Every container exposes `fields()`, which returns a [`Fields`] list for a
//! property page to render. Values are typed so the consumer can choose how
//! to lay them out (a bitfield as checkboxes, list data as a table, ...).

use std::fmt;

/// Numeric display base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base {
    Dec,
    Hex,
}

/// A date and time without timezone information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    String(String),
    Number {
        value: u64,
        base: Base,
        /// Minimum digit count for hexadecimal output.
        digits: u8,
    },
    /// Named bits; `names[i]` labels bit `i`, `None` entries are unnamed.
    Bitfield {
        names: &'static [Option<&'static str>],
        per_row: u8,
        value: u32,
    },
    /// A table with column headers.
    ListData {
        headers: &'static [&'static str],
        rows: Vec<Vec<String>>,
    },
    DateTime(DateTime),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub value: FieldValue,
}

/// Ordered list of fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    fields: Vec<Field>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// First field named `name`.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    pub fn push(&mut self, name: &'static str, value: FieldValue) {
        self.fields.push(Field { name, value });
    }

    pub fn add_string(&mut self, name: &'static str, value: impl Into<String>) {
        self.push(name, FieldValue::String(value.into()));
    }

    pub fn add_dec(&mut self, name: &'static str, value: u64) {
        self.push(
            name,
            FieldValue::Number {
                value,
                base: Base::Dec,
                digits: 0,
            },
        );
    }

    pub fn add_hex(&mut self, name: &'static str, value: u64, digits: u8) {
        self.push(
            name,
            FieldValue::Number {
                value,
                base: Base::Hex,
                digits,
            },
        );
    }

    pub fn add_bitfield(
        &mut self,
        name: &'static str,
        names: &'static [Option<&'static str>],
        per_row: u8,
        value: u32,
    ) {
        self.push(
            name,
            FieldValue::Bitfield {
                names,
                per_row,
                value,
            },
        );
    }

    pub fn add_list(
        &mut self,
        name: &'static str,
        headers: &'static [&'static str],
        rows: Vec<Vec<String>>,
    ) {
        self.push(name, FieldValue::ListData { headers, rows });
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl FieldValue {
    /// Names of the set bits of a bitfield, in bit order.
    pub fn set_bits(&self) -> Vec<&'static str> {
        match self {
            FieldValue::Bitfield { names, value, .. } => names
                .iter()
                .enumerate()
                .filter(|(i, _)| *i < 32 && value & (1 << i) != 0)
                .filter_map(|(_, n)| *n)
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => f.write_str(s),
            FieldValue::Number {
                value,
                base: Base::Dec,
                ..
            } => write!(f, "{value}"),
            FieldValue::Number {
                value,
                base: Base::Hex,
                digits,
            } => write!(f, "0x{value:0width$X}", width = *digits as usize),
            FieldValue::Bitfield { .. } => f.write_str(&self.set_bits().join(", ")),
            FieldValue::ListData { headers, rows } => {
                write!(f, "[{}]", headers.join(" | "))?;
                for row in rows {
                    write!(f, "\n  {}", row.join(" | "))?;
                }
                Ok(())
            }
            FieldValue::DateTime(d) => write!(
                f,
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                d.year, d.month, d.day, d.hour, d.minute, d.second
            ),
        }
    }
}
