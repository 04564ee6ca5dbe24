//! NE (New Executable) - 16-bit Windows and OS/2 executables.
//!
//! ## Layout
//! ```text
//! [0x00]       MZ stub header; e_lfanew (u32 LE) at 0x3C
//! [e_lfanew]   NE header (0x40 bytes)
//! [e_lfanew+x] resident tables, offsets relative to the NE header:
//!                segment, resource, resident names, module references,
//!                imported names, entry table
//! [...]        segment data, each optionally followed by relocations
//! [OffStartNonResTab]
//!              non-resident names (absolute file offset)
//! ```
//!
//! ## NE Header (0x40 bytes)
//! ```text
//! [0x00] Magic "NE"                     [0x20] NoResNamesTabSiz   (u16)
//! [0x02] Linker version (u8 major/minor)[0x22] SegTableOffset     (u16)
//! [0x04] EntryTableOffset     (u16)     [0x24] ResTableOffset     (u16)
//! [0x06] EntryTableLength     (u16)     [0x26] ResidNamTable      (u16)
//! [0x08] FileLoadCRC          (u32)     [0x28] ModRefTable        (u16)
//! [0x0C] ProgFlags            (u8)      [0x2A] ImportNameTable    (u16)
//! [0x0D] ApplFlags            (u8)      [0x2C] OffStartNonResTab  (u32)
//! [0x0E] AutoDataSegIndex     (u16)     [0x30] MovEntryCount      (u16)
//! [0x10] InitHeapSize         (u16)     [0x32] FileAlnSzShftCnt   (u16)
//! [0x12] InitStackSize        (u16)     [0x34] nResTabEntries     (u16)
//! [0x14] EntryPoint CS:IP     (u32)     [0x36] targOS             (u8)
//! [0x18] InitStack SS:SP      (u32)     [0x37] OS2EXEFlags        (u8)
//! [0x1C] SegCount             (u16)     [0x38..0x3E] thunks, mincodeswap
//! [0x1E] ModRefs              (u16)     [0x3E] expctwinver (minor, major)
//! ```
//!
//! The order of the resident tables is not fixed by the format, so each
//! table's extent is computed by sorting the declared offsets: a table ends
//! where the next one starts, and the last ends with the entry table.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::io::{Read, Seek};
use std::ops::Range;

use tracing::debug;

use super::DetectionInfo;
use crate::fields::{DateTime, FieldValue, Fields};
use crate::utils::{Span, bytesa, le_u16, read_at};
use crate::{Error, Result};

/// Size of the fixed NE header.
pub const NE_HEADER_SIZE: usize = 0x40;

const E_LFANEW: usize = 0x3C;
const MZ_HEADER_SIZE: usize = 0x40;

const SEG_RELOCINFO: u16 = 0x0100;
const REL_TARGET_MASK: u8 = 3;
const REL_IMPORT_ORDINAL: u8 = 1;
const REL_IMPORT_NAME: u8 = 2;

/// Target OS values with special handling.
pub mod target_os {
    pub const UNKNOWN: u8 = 0;
    pub const OS2: u8 = 1;
    pub const WINDOWS: u8 = 2;
    pub const WIN386: u8 = 4;
    pub const PHARLAP_286_OS2: u8 = 0x81;
    pub const PHARLAP_286_WIN: u8 = 0x82;
}

/// The DOS stub header, reduced to the fields the NE parser needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MzHeader {
    pub bytes_last_page: u16,
    pub pages: u16,
    pub relocations: u16,
    pub header_paragraphs: u16,
    /// File offset of the NE header.
    pub e_lfanew: u32,
}

impl MzHeader {
    pub fn parse(s: Span<'_>) -> Result<Self> {
        s.magic(0, b"MZ")?;
        Ok(Self {
            bytes_last_page: s.le_u16(0x02)?,
            pages: s.le_u16(0x04)?,
            relocations: s.le_u16(0x06)?,
            header_paragraphs: s.le_u16(0x08)?,
            e_lfanew: s.le_u32(E_LFANEW)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeHeader {
    pub linker_version: (u8, u8),
    pub entry_table_offset: u16,
    pub entry_table_length: u16,
    pub file_load_crc: u32,
    pub prog_flags: u8,
    pub appl_flags: u8,
    pub auto_data_seg_index: u16,
    pub init_heap_size: u16,
    pub init_stack_size: u16,
    pub entry_point: u32,
    pub init_stack: u32,
    pub seg_count: u16,
    pub mod_refs: u16,
    pub non_resident_names_size: u16,
    pub seg_table_offset: u16,
    pub res_table_offset: u16,
    pub resident_names_offset: u16,
    pub mod_ref_table_offset: u16,
    pub import_name_table_offset: u16,
    pub non_resident_names_offset: u32,
    pub movable_entry_count: u16,
    pub alignment_shift: u16,
    pub resource_entries: u16,
    pub target_os: u8,
    pub os2_exe_flags: u8,
    /// Expected Windows version as (major, minor).
    pub expected_win_version: (u8, u8),
}

impl NeHeader {
    pub fn parse(s: Span<'_>) -> Result<Self> {
        s.magic(0, b"NE")?;
        Ok(Self {
            linker_version: (s.u8(0x02)?, s.u8(0x03)?),
            entry_table_offset: s.le_u16(0x04)?,
            entry_table_length: s.le_u16(0x06)?,
            file_load_crc: s.le_u32(0x08)?,
            prog_flags: s.u8(0x0C)?,
            appl_flags: s.u8(0x0D)?,
            auto_data_seg_index: s.le_u16(0x0E)?,
            init_heap_size: s.le_u16(0x10)?,
            init_stack_size: s.le_u16(0x12)?,
            entry_point: s.le_u32(0x14)?,
            init_stack: s.le_u32(0x18)?,
            seg_count: s.le_u16(0x1C)?,
            mod_refs: s.le_u16(0x1E)?,
            non_resident_names_size: s.le_u16(0x20)?,
            seg_table_offset: s.le_u16(0x22)?,
            res_table_offset: s.le_u16(0x24)?,
            resident_names_offset: s.le_u16(0x26)?,
            mod_ref_table_offset: s.le_u16(0x28)?,
            import_name_table_offset: s.le_u16(0x2A)?,
            non_resident_names_offset: s.le_u32(0x2C)?,
            movable_entry_count: s.le_u16(0x30)?,
            alignment_shift: s.le_u16(0x32)?,
            resource_entries: s.le_u16(0x34)?,
            target_os: s.u8(0x36)?,
            os2_exe_flags: s.u8(0x37)?,
            expected_win_version: (s.u8(0x3F)?, s.u8(0x3E)?),
        })
    }

    /// Length of the resident section (NE header through the entry table).
    pub fn resident_len(&self) -> usize {
        self.entry_table_offset as usize + self.entry_table_length as usize
    }
}

/// The six tables of the resident section, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NeTable {
    Segment,
    Resource,
    ResidentNames,
    ModuleRefs,
    ImportedNames,
    Entry,
}

impl NeTable {
    pub const ALL: [NeTable; 6] = [
        NeTable::Segment,
        NeTable::Resource,
        NeTable::ResidentNames,
        NeTable::ModuleRefs,
        NeTable::ImportedNames,
        NeTable::Entry,
    ];

    fn start(self, h: &NeHeader) -> usize {
        (match self {
            NeTable::Segment => h.seg_table_offset,
            NeTable::Resource => h.res_table_offset,
            NeTable::ResidentNames => h.resident_names_offset,
            NeTable::ModuleRefs => h.mod_ref_table_offset,
            NeTable::ImportedNames => h.import_name_table_offset,
            NeTable::Entry => h.entry_table_offset,
        }) as usize
    }
}

/// Compute the extent of each resident table.
///
/// `starts` are indexed like [`NeTable::ALL`]. Tables starting inside the
/// NE header or past `end` get `None`; tables with equal offsets are
/// ordered canonically, so all but the last of them are empty.
pub fn slice_tables(starts: [usize; 6], end: usize) -> [Option<Range<usize>>; 6] {
    let mut order: Vec<usize> = (0..6)
        .filter(|&i| starts[i] >= NE_HEADER_SIZE && starts[i] <= end)
        .collect();
    order.sort_by_key(|&i| (starts[i], i));

    let mut out: [Option<Range<usize>>; 6] = Default::default();
    for (k, &i) in order.iter().enumerate() {
        let stop = order.get(k + 1).map_or(end, |&j| starts[j]);
        out[i] = Some(starts[i]..stop);
    }
    out
}

/// The resident section, read in one piece.
#[derive(Debug)]
struct Resident {
    data: Vec<u8>,
    tables: [Option<Range<usize>>; 6],
}

impl Resident {
    fn table(&self, t: NeTable) -> Result<&[u8]> {
        let range = self.tables[t as usize].clone().ok_or(Error::OutOfRange)?;
        self.data.get(range).ok_or(Error::OutOfRange)
    }
}

/// One entry-table record, optionally named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeEntry {
    pub ordinal: u16,
    pub flags: u8,
    pub segment: u8,
    pub offset: u16,
    pub movable: bool,
    pub name: Option<String>,
    /// Whether the name came from the resident name table.
    pub resident: bool,
}

impl NeEntry {
    pub fn address(&self) -> String {
        if self.movable {
            format!("{:02X}:{:04X} (Movable)", self.segment, self.offset)
        } else if self.segment == 0xFE {
            format!("{:04X} (Constant)", self.offset)
        } else {
            format!("{:02X}:{:04X} (Fixed)", self.segment, self.offset)
        }
    }

    /// Flag keywords in DEF-file style.
    pub fn flag_string(&self) -> String {
        let mut words = Vec::new();
        if self.flags & 1 != 0 {
            words.push("EXPORT".to_string());
        }
        if self.flags & 2 == 0 {
            words.push("NODATA".to_string());
        }
        if self.flags & 4 != 0 {
            words.push("(bit 2)".to_string());
        }
        if self.flags & 0xF8 != 0 {
            words.push(format!("PARAMS={}", self.flags >> 3));
        }
        if self.name.is_some() && self.resident {
            words.push("RESIDENTNAME".to_string());
        }
        words.join(" ")
    }
}

/// Walk the entry table bundles.
pub fn walk_entries(table: &[u8]) -> Result<Vec<NeEntry>> {
    let mut entries = Vec::new();
    let mut ordinal: u32 = 1;
    let mut p = 0usize;
    loop {
        let count = *table.get(p).ok_or(Error::OutOfRange)? as usize;
        if count == 0 {
            break;
        }
        let segment = *table.get(p + 1).ok_or(Error::OutOfRange)?;
        p += 2;
        match segment {
            0 => ordinal += count as u32,
            0xFF => {
                let records = table.get(p..p + count * 6).ok_or(Error::OutOfRange)?;
                for r in records.chunks_exact(6) {
                    if r[1] != 0xCD || r[2] != 0x3F {
                        return Err(Error::UnsupportedVariant("movable entry without INT 3Fh"));
                    }
                    entries.push(NeEntry {
                        ordinal: u16::try_from(ordinal).map_err(|_| Error::OutOfRange)?,
                        flags: r[0],
                        segment: r[3],
                        offset: u16::from_le_bytes([r[4], r[5]]),
                        movable: true,
                        name: None,
                        resident: false,
                    });
                    ordinal += 1;
                }
                p += count * 6;
            }
            _ => {
                let records = table.get(p..p + count * 3).ok_or(Error::OutOfRange)?;
                for r in records.chunks_exact(3) {
                    entries.push(NeEntry {
                        ordinal: u16::try_from(ordinal).map_err(|_| Error::OutOfRange)?,
                        flags: r[0],
                        segment,
                        offset: u16::from_le_bytes([r[1], r[2]]),
                        movable: false,
                        name: None,
                        resident: false,
                    });
                    ordinal += 1;
                }
                p += count * 3;
            }
        }
    }
    Ok(entries)
}

/// Attach the names of a resident or non-resident name table.
///
/// `base` is the number of entries produced by [`walk_entries`]; only those
/// are searched. A second name for an ordinal appends a copy of the entry.
pub fn attach_names(entries: &mut Vec<NeEntry>, base: usize, table: &[u8], resident: bool) -> Result<()> {
    let Some(&first) = table.first() else {
        return Ok(());
    };
    // The first string is the module name or description.
    let mut p = first as usize + 3;
    loop {
        let len = *table.get(p).ok_or(Error::OutOfRange)? as usize;
        if len == 0 {
            break;
        }
        let name = table.get(p + 1..p + 1 + len).ok_or(Error::OutOfRange)?;
        let ord = table
            .get(p + 1 + len..p + 3 + len)
            .ok_or(Error::OutOfRange)?;
        let ordinal = u16::from_le_bytes([ord[0], ord[1]]);
        let name = String::from_utf8_lossy(name).into_owned();

        let idx = entries[..base]
            .binary_search_by_key(&ordinal, |e| e.ordinal)
            .map_err(|_| Error::InvalidOrdinal(ordinal))?;
        if entries[idx].name.is_some() {
            let mut dup = entries[idx].clone();
            dup.name = Some(name);
            dup.resident = resident;
            entries.push(dup);
        } else {
            entries[idx].name = Some(name);
            entries[idx].resident = resident;
        }
        p += len + 3;
    }
    Ok(())
}

/// What an import refers to inside its module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportTarget {
    Ordinal(u16),
    Name(String),
}

impl std::fmt::Display for ImportTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportTarget::Ordinal(o) => write!(f, "Ordinal #{o}"),
            ImportTarget::Name(n) => f.write_str(n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeImport {
    pub module: String,
    pub target: ImportTarget,
}

fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
}

/// Pascal string at `off` in the imported-names table.
fn imported_name(names: &[u8], off: usize) -> Option<String> {
    Span::new(names).pascal_string(off).ok().map(|(s, _)| s)
}

/// Parsed NE executable.
///
/// Header fields are decoded at open time. The resident section, the
/// non-resident names and the relocation data are read on first use.
#[derive(Debug)]
pub struct Ne<R> {
    inner: Option<R>,
    pub mz: MzHeader,
    pub header: NeHeader,
    resident: Option<Resident>,
    non_resident: Option<Vec<u8>>,
    entries: Option<Vec<NeEntry>>,
}

impl<R: Read + Seek> Ne<R> {
    pub fn is_supported(info: &DetectionInfo<'_>) -> bool {
        let s = Span::new(info.header);
        if s.magic(0, b"MZ").is_err() {
            return false;
        }
        s.le_u32(E_LFANEW)
            .is_ok_and(|off| s.magic(off as usize, b"NE").is_ok())
    }

    pub fn open(mut inner: R) -> Result<Self> {
        let mz_buf = read_at(&mut inner, 0, MZ_HEADER_SIZE)?;
        let mz = MzHeader::parse(Span::new(&mz_buf))?;
        let ne_buf = read_at(&mut inner, mz.e_lfanew as u64, NE_HEADER_SIZE)?;
        let header = NeHeader::parse(Span::new(&ne_buf))?;
        debug!(
            e_lfanew = mz.e_lfanew,
            target_os = header.target_os,
            "opened NE executable"
        );
        Ok(Self {
            inner: Some(inner),
            mz,
            header,
            resident: None,
            non_resident: None,
            entries: None,
        })
    }

    /// Release the file handle.
    pub fn close(&mut self) {
        self.inner = None;
    }

    fn file(&mut self) -> Result<&mut R> {
        self.inner.as_mut().ok_or(Error::Closed)
    }

    fn load_resident(&mut self) -> Result<&Resident> {
        if self.resident.is_none() {
            let len = self.header.resident_len();
            let off = self.mz.e_lfanew as u64;
            let data = read_at(self.file()?, off, len)?;
            let starts = NeTable::ALL.map(|t| t.start(&self.header));
            let tables = slice_tables(starts, len);
            for (t, r) in NeTable::ALL.iter().zip(&tables) {
                if r.is_none() {
                    debug!(table = ?t, start = t.start(&self.header), "NE table out of range");
                }
            }
            self.resident = Some(Resident { data, tables });
        }
        self.resident.as_ref().ok_or(Error::OutOfRange)
    }

    /// Bytes of one resident table.
    pub fn table(&mut self, t: NeTable) -> Result<&[u8]> {
        self.load_resident()?.table(t)
    }

    /// Bytes of the non-resident name table.
    pub fn non_resident_names(&mut self) -> Result<&[u8]> {
        if self.non_resident.is_none() {
            let off = self.header.non_resident_names_offset as u64;
            let len = self.header.non_resident_names_size as usize;
            let data = read_at(self.file()?, off, len)?;
            self.non_resident = Some(data);
        }
        self.non_resident.as_deref().ok_or(Error::OutOfRange)
    }

    /// Entry table with names attached, sorted by ordinal.
    pub fn entries(&mut self) -> Result<&[NeEntry]> {
        if self.entries.is_none() {
            let mut entries = walk_entries(self.table(NeTable::Entry)?)?;
            let base = entries.len();
            let resident_names = self.table(NeTable::ResidentNames)?.to_vec();
            attach_names(&mut entries, base, &resident_names, true)?;
            let non_resident = self.non_resident_names()?.to_vec();
            attach_names(&mut entries, base, &non_resident, false)?;
            entries.sort_by_key(|e| e.ordinal);
            self.entries = Some(entries);
        }
        self.entries.as_deref().ok_or(Error::OutOfRange)
    }

    /// Module names from the module-reference table.
    pub fn module_names(&mut self) -> Result<Vec<String>> {
        let count = self.header.mod_refs as usize;
        let resident = self.load_resident()?;
        let modrefs = resident.table(NeTable::ModuleRefs)?;
        let names = resident.table(NeTable::ImportedNames)?;
        if count * 2 > modrefs.len() {
            return Err(Error::OutOfRange);
        }
        Ok(modrefs[..count * 2]
            .chunks_exact(2)
            .filter_map(|c| imported_name(names, u16::from_le_bytes([c[0], c[1]]) as usize))
            .collect())
    }

    /// Imports gathered from segment relocation records.
    ///
    /// Sorted case-insensitively by module, then by imported name.
    pub fn imports(&mut self) -> Result<Vec<NeImport>> {
        let count = self.header.mod_refs as usize;
        if count == 0 {
            return Err(Error::MissingResource("module references"));
        }
        let shift = self.header.alignment_shift as u32;
        let seg_count = self.header.seg_count as usize;

        let resident = self.load_resident()?;
        let modrefs = resident.table(NeTable::ModuleRefs)?;
        if count * 2 > modrefs.len() {
            return Err(Error::OutOfRange);
        }
        let modrefs = modrefs[..count * 2].to_vec();
        let names = resident.table(NeTable::ImportedNames)?.to_vec();
        let segments: Vec<[u16; 4]> = resident
            .table(NeTable::Segment)?
            .chunks_exact(8)
            .take(seg_count)
            .map(|s| {
                let w = |i: usize| u16::from_le_bytes([s[i], s[i + 1]]);
                [w(0), w(2), w(4), w(6)]
            })
            .collect();

        let mut by_ordinal = BTreeSet::new();
        let mut by_name = BTreeSet::new();
        let file = self.file()?;
        for [offset, filesz, flags, memsz] in segments {
            if offset == 0 || flags & SEG_RELOCINFO == 0 {
                continue;
            }
            let seg_offset = (offset as u64)
                .checked_shl(shift)
                .ok_or(Error::OutOfRange)?;
            let seg_size = match (filesz, memsz) {
                (0, 0) => 0x10000,
                (0, m) => m as u64,
                (f, _) => f as u64,
            };
            file.seek(std::io::SeekFrom::Start(seg_offset + seg_size))?;
            let rel_count = le_u16(file)? as usize;
            for _ in 0..rel_count {
                let r = bytesa::<8>(file)?;
                let target1 = u16::from_le_bytes([r[4], r[5]]);
                let target2 = u16::from_le_bytes([r[6], r[7]]);
                match r[1] & REL_TARGET_MASK {
                    REL_IMPORT_ORDINAL => {
                        by_ordinal.insert((target1, target2));
                    }
                    REL_IMPORT_NAME => {
                        by_name.insert((target1, target2));
                    }
                    _ => {}
                }
            }
        }

        // Relocation module indexes are 1-based.
        let module = |idx: u16| -> Option<String> {
            let i = (idx as usize).checked_sub(1)?;
            let c = modrefs.get(i * 2..i * 2 + 2)?;
            imported_name(&names, u16::from_le_bytes([c[0], c[1]]) as usize)
        };

        let mut imports: Vec<NeImport> = by_ordinal
            .into_iter()
            .filter_map(|(m, ord)| {
                Some(NeImport {
                    module: module(m)?,
                    target: ImportTarget::Ordinal(ord),
                })
            })
            .chain(by_name.into_iter().filter_map(|(m, off)| {
                Some(NeImport {
                    module: module(m)?,
                    target: ImportTarget::Name(imported_name(&names, off as usize)?),
                })
            }))
            .collect();
        imports.sort_by(|a, b| {
            cmp_ignore_case(&a.module, &b.module)
                .then_with(|| cmp_ignore_case(&a.target.to_string(), &b.target.to_string()))
        });
        Ok(imports)
    }

    /// Displayable fields. Tables that fail to load are left out.
    pub fn fields(&mut self) -> Fields {
        let mut f = Fields::new();
        let h = self.header;

        let modules = self.module_names().unwrap_or_default();
        let has_kernel = modules.is_empty()
            || modules.iter().any(|m| m.eq_ignore_ascii_case("KERNEL"));
        f.add_string("Target OS", target_os_name(h.target_os, has_kernel));
        f.add_string("DGroup Type", DGROUP_TYPES[(h.prog_flags & 3) as usize]);
        f.add_bitfield("Program Flags", PROG_FLAGS, 2, h.prog_flags as u32);
        let appl_types = if h.target_os == target_os::OS2 {
            &APPL_TYPES_OS2
        } else {
            &APPL_TYPES_WIN
        };
        f.add_string("Application Type", appl_types[(h.appl_flags & 3) as usize]);
        f.add_bitfield("Application Flags", APPL_FLAGS, 2, h.appl_flags as u32);
        f.add_bitfield("Other Flags", OTHER_FLAGS, 2, h.os2_exe_flags as u32);
        if let Some(ts) = dos_timestamp(h.file_load_crc) {
            f.push("Timestamp", FieldValue::DateTime(ts));
        }
        if h.target_os == target_os::WINDOWS || h.target_os == target_os::WIN386 {
            let (major, minor) = h.expected_win_version;
            f.add_string("Windows Version", format!("{major}.{minor}"));
        }
        if h.target_os == target_os::WINDOWS
            && let Some(rt) = runtime_dll(&modules)
        {
            f.add_string("Runtime DLL", rt);
        }
        if let Ok(t) = self.table(NeTable::ResidentNames)
            && let Some(name) = first_string(t)
        {
            f.add_string("Module Name", name);
        }
        if let Ok(t) = self.non_resident_names()
            && let Some(desc) = first_string(t)
        {
            f.add_string("Module Description", desc);
        }

        match self.entries() {
            Ok(entries) if !entries.is_empty() => {
                let rows = entries
                    .iter()
                    .map(|e| {
                        vec![
                            e.ordinal.to_string(),
                            e.name.clone().unwrap_or_else(|| "(No name)".into()),
                            e.address(),
                            e.flag_string(),
                        ]
                    })
                    .collect();
                f.add_list("Entries", &["Ordinal", "Name", "Address", "Flags"], rows);
            }
            Ok(_) => {}
            Err(e) => debug!(error = %e, "NE entry table unavailable"),
        }
        match self.imports() {
            Ok(imports) => {
                let rows = imports
                    .into_iter()
                    .map(|i| vec![i.target.to_string(), i.module])
                    .collect();
                f.add_list("Imports", &["Name", "Module"], rows);
            }
            Err(e) => debug!(error = %e, "NE imports unavailable"),
        }
        f
    }
}

const DGROUP_TYPES: [&str; 4] = ["None", "Single Shared", "Multiple", "(null)"];

const PROG_FLAGS: &[Option<&str>] = &[
    None,
    None,
    Some("Global Init"),
    Some("Protected Mode Only"),
    Some("8086 insns"),
    Some("80286 insns"),
    Some("80386 insns"),
    Some("FPU insns"),
];

const APPL_TYPES_OS2: [&str; 4] = [
    "None",
    "Full Screen (not aware of Presentation Manager)",
    "Presentation Manager compatible",
    "Presentation Manager application",
];

const APPL_TYPES_WIN: [&str; 4] = [
    "None",
    "Full Screen (not aware of Windows)",
    "Windows compatible",
    "Windows application",
];

const APPL_FLAGS: &[Option<&str>] = &[
    None,
    None,
    None,
    Some("OS/2 Application"),
    None,
    Some("Image Error"),
    Some("Non-Conforming"),
    Some("DLL"),
];

const OTHER_FLAGS: &[Option<&str>] = &[
    Some("Long File Names"),
    Some("Protected Mode"),
    Some("Proportional Fonts"),
    Some("Gangload Area"),
];

const TARGET_OSES: [Option<&str>; 6] = [
    None,
    Some("OS/2"),
    Some("Windows"),
    Some("European MS-DOS 4.x"),
    Some("Windows/386"),
    Some("BOSS"),
];

/// Display name of the target OS. OS 0 is told apart by whether KERNEL
/// is imported.
pub fn target_os_name(os: u8, has_kernel: bool) -> String {
    let name = match os {
        target_os::UNKNOWN if has_kernel => Some("Windows 1.x/2.x"),
        target_os::UNKNOWN => Some("Old OS/2"),
        target_os::PHARLAP_286_OS2 => Some("OS/2"),
        target_os::PHARLAP_286_WIN => Some("Windows"),
        _ => TARGET_OSES.get(os as usize).copied().flatten(),
    };
    name.map_or_else(|| format!("Unknown (0x{os:02X})"), str::to_string)
}

/// Visual Basic runtime named by the module references, if any.
fn runtime_dll(modules: &[String]) -> Option<String> {
    const VB: [(&str, u8); 5] = [
        ("VBRUN400", 4),
        ("VBRUN416", 4),
        ("VBRUN300", 3),
        ("VBRUN200", 2),
        ("VBRUN100", 1),
    ];
    modules.iter().find_map(|m| {
        VB.iter()
            .find(|(dll, _)| m.eq_ignore_ascii_case(dll))
            .map(|(_, major)| format!("Microsoft Visual Basic {major}.0 Runtime"))
    })
}

fn first_string(table: &[u8]) -> Option<String> {
    match Span::new(table).pascal_string(0) {
        Ok((s, _)) if !s.is_empty() => Some(s),
        _ => None,
    }
}

/// Early NE files (1983-1985) keep a DOS timestamp where later ones have
/// the load CRC.
fn dos_timestamp(v: u32) -> Option<DateTime> {
    let year = ((v >> 25) & 0x7F) as u16 + 1980;
    if !(1983..=1985).contains(&year) {
        return None;
    }
    let month = ((v >> 21) & 0x0F) as u8;
    let day = ((v >> 16) & 0x1F) as u8;
    let hour = ((v >> 11) & 0x1F) as u8;
    let minute = ((v >> 5) & 0x3F) as u8;
    let second = ((v & 0x1F) * 2) as u8;
    if !(1..=12).contains(&month) || day > 31 || hour > 23 || minute > 59 || second > 59 {
        return None;
    }
    Some(DateTime {
        year,
        month,
        day,
        hour,
        minute,
        second,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slicing_ignores_declaration_order() {
        // entry, then segment, then resident names, out of canonical order.
        let starts = [0x60, 0x60, 0x48, 0x70, 0x70, 0x40];
        let t = slice_tables(starts, 0x80);
        assert_eq!(t[NeTable::Entry as usize], Some(0x40..0x48));
        assert_eq!(t[NeTable::ResidentNames as usize], Some(0x48..0x60));
        assert_eq!(t[NeTable::Segment as usize], Some(0x60..0x60));
        assert_eq!(t[NeTable::Resource as usize], Some(0x60..0x70));
        assert_eq!(t[NeTable::ModuleRefs as usize], Some(0x70..0x70));
        assert_eq!(t[NeTable::ImportedNames as usize], Some(0x70..0x80));
    }

    #[test]
    fn slicing_rejects_tables_inside_header_or_past_end() {
        let t = slice_tables([0x10, 0x40, 0x50, 0x50, 0x50, 0x200], 0x60);
        assert_eq!(t[NeTable::Segment as usize], None);
        assert_eq!(t[NeTable::Entry as usize], None);
        assert_eq!(t[NeTable::ImportedNames as usize], Some(0x50..0x60));
    }

    #[test]
    fn entries_skip_bundles_leave_gaps() {
        let table = [
            2, 1, 0x03, 0x10, 0x00, 0x03, 0x20, 0x00, // fixed seg 1
            3, 0, // skip ordinals 3..=5
            1, 0xFF, 0x01, 0xCD, 0x3F, 0x02, 0x34, 0x12, // movable
            0,
        ];
        let e = walk_entries(&table).unwrap();
        let ords: Vec<u16> = e.iter().map(|e| e.ordinal).collect();
        assert_eq!(ords, [1, 2, 6]);
        assert_eq!(e[2].address(), "02:1234 (Movable)");
        assert_eq!(e[0].flag_string(), "EXPORT");
    }

    #[test]
    fn movable_entry_requires_int3f() {
        let table = [1, 0xFF, 0x01, 0xCD, 0x00, 0x02, 0x00, 0x00, 0];
        assert!(walk_entries(&table).is_err());
    }

    #[test]
    fn unterminated_entry_table() {
        assert!(matches!(walk_entries(&[1, 1, 0, 0]), Err(Error::OutOfRange)));
    }

    #[test]
    fn dos_timestamp_range() {
        // 1984-03-05 12:34:56
        let v = (4 << 25) | (3 << 21) | (5 << 16) | (12 << 11) | (34 << 5) | 28;
        let ts = dos_timestamp(v).unwrap();
        assert_eq!((ts.year, ts.month, ts.day), (1984, 3, 5));
        assert_eq!((ts.hour, ts.minute, ts.second), (12, 34, 56));
        assert!(dos_timestamp(0).is_none());
    }
}
