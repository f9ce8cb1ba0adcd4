use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::Sector;

use super::sheet::Sheet;

// Canonical field vocabulary. Everything downstream addresses columns through
// these names.
pub const LAST_NAME: &str = "LAST NAME";
pub const FIRST_NAME: &str = "FIRST NAME";
pub const MIDDLE_NAME: &str = "MIDDLE NAME";
pub const EXT_NAME: &str = "EXT NAME";
pub const BARANGAY: &str = "BARANGAY";
pub const PUROK: &str = "PUROK";
pub const HOUSE_NO: &str = "HOUSE NO";
pub const SEX: &str = "SEX";
pub const BIRTHDATE: &str = "BIRTHDATE";
pub const AGE: &str = "AGE";
pub const CIVIL_STATUS: &str = "CIVIL STATUS";
pub const RELIGION: &str = "RELIGION";
pub const OCCUPATION: &str = "OCCUPATION";
pub const CONTACT_NO: &str = "CONTACT NO";
pub const PRECINCT_NO: &str = "PRECINCT NO";
pub const RELATIONSHIP: &str = "RELATIONSHIP";
/// Combined single-column spouse layout ("DELA CRUZ, MARIA S.").
pub const SPOUSE: &str = "SPOUSE";

/// Rows scanned when looking for the header marker pair.
pub const HEADER_SCAN_ROWS: usize = 20;

/// Variant spellings observed across source encodings, folded into the
/// canonical vocabulary. The PRECINT entry is a source typo we tolerate.
static SYNONYMS: &[(&str, &str)] = &[
    ("SURNAME", LAST_NAME),
    ("FAMILY NAME", LAST_NAME),
    ("LASTNAME", LAST_NAME),
    ("GIVEN NAME", FIRST_NAME),
    ("FIRSTNAME", FIRST_NAME),
    ("MIDDLENAME", MIDDLE_NAME),
    ("MIDDLE INITIAL", MIDDLE_NAME),
    ("MI", MIDDLE_NAME),
    ("EXTENSION NAME", EXT_NAME),
    ("EXTENSION", EXT_NAME),
    ("EXT", EXT_NAME),
    ("NAME EXTENSION", EXT_NAME),
    ("SUFFIX", EXT_NAME),
    ("BRGY", BARANGAY),
    ("PUROK/SITIO", PUROK),
    ("SITIO", PUROK),
    ("HOUSE #", HOUSE_NO),
    ("HOUSE NUMBER", HOUSE_NO),
    ("HSE NO", HOUSE_NO),
    ("GENDER", SEX),
    ("BIRTH DATE", BIRTHDATE),
    ("DATE OF BIRTH", BIRTHDATE),
    ("BDAY", BIRTHDATE),
    ("STATUS", CIVIL_STATUS),
    ("CONTACT", CONTACT_NO),
    ("CONTACT NUMBER", CONTACT_NO),
    ("PHONE NUMBER", CONTACT_NO),
    ("CELLPHONE NO", CONTACT_NO),
    ("CP NO", CONTACT_NO),
    ("PRECINCT", PRECINCT_NO),
    ("PRECINCT NUMBER", PRECINCT_NO),
    ("PRECINT NO", PRECINCT_NO),
    ("RELATION", RELATIONSHIP),
    ("SPOUSE NAME", SPOUSE),
];

/// `"<ordinal>. <FIELD>"` dependent columns, e.g. `1. LAST NAME`.
static ORDINAL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\.\s*(.+)$").expect("ordinal header pattern to compile"));

/// Normalize one raw header cell: presentational annotations (anything from
/// the first newline or parenthesis on) are cut, whitespace collapsed, the
/// rest uppercased.
pub fn normalize_label(raw: &str) -> String {
    let cut = match raw.find(['\n', '(']) {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    let collapsed = cut.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .to_uppercase()
        .trim_end_matches([':', '.'])
        .trim()
        .to_string()
}

fn fold_synonym(label: &str) -> String {
    for (variant, canonical) in SYNONYMS {
        if label == *variant {
            return (*canonical).to_string();
        }
    }
    label.to_string()
}

/// Full canonicalization: normalize, then fold synonyms. Ordinal-prefixed
/// dependent headers keep their prefix with the field part folded, so
/// `1. EXTENSION NAME` becomes `1. EXT NAME`.
pub fn canonical_label(raw: &str) -> String {
    let normalized = normalize_label(raw);
    if let Some(caps) = ORDINAL_PATTERN.captures(&normalized) {
        let ordinal = &caps[1];
        let field = fold_synonym(caps[2].trim());
        return format!("{ordinal}. {field}");
    }
    fold_synonym(&normalized)
}

/// Column indices for one dependent ordinal group.
#[derive(Debug, Clone, Default)]
pub struct DependentColumns {
    pub last_name: Option<usize>,
    pub first_name: Option<usize>,
    pub middle_name: Option<usize>,
    pub ext_name: Option<usize>,
    pub relationship: Option<usize>,
    pub birthdate: Option<usize>,
    pub occupation: Option<usize>,
}

/// Header-row discovery result: canonical labels per column, with repeats
/// numbered `.1`, `.2`, … in order of appearance (the second LAST
/// NAME/FIRST NAME/MIDDLE NAME group is the spouse block).
#[derive(Debug)]
pub struct HeaderMap {
    /// 0-based sheet row the header was found on.
    pub header_row: usize,
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl HeaderMap {
    /// Scan the first [`HEADER_SCAN_ROWS`] rows for a row carrying both
    /// marker columns. `None` means the file has no usable header.
    pub fn locate(sheet: &Sheet) -> Option<HeaderMap> {
        let limit = sheet.row_count().min(HEADER_SCAN_ROWS);
        for row_idx in 0..limit {
            let cells = sheet.row(row_idx);
            if cells.is_empty() {
                continue;
            }
            let canonical: Vec<String> = cells
                .iter()
                .map(|c| canonical_label(&c.render()))
                .collect();
            let has_last = canonical.iter().any(|l| l == LAST_NAME);
            let has_first = canonical.iter().any(|l| l == FIRST_NAME);
            if has_last && has_first {
                return Some(HeaderMap::build(row_idx, canonical));
            }
        }
        None
    }

    fn build(header_row: usize, canonical: Vec<String>) -> HeaderMap {
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut labels = Vec::with_capacity(canonical.len());
        let mut index = HashMap::new();

        for label in canonical {
            if label.is_empty() {
                labels.push(String::new());
                continue;
            }
            let seen = counts.entry(label.clone()).or_insert(0);
            let numbered = if *seen == 0 {
                label.clone()
            } else {
                format!("{label}.{seen}")
            };
            *seen += 1;

            index.entry(numbered.clone()).or_insert(labels.len());
            labels.push(numbered);
        }

        HeaderMap {
            header_row,
            labels,
            index,
        }
    }

    /// First sheet row holding data.
    pub fn first_data_row(&self) -> usize {
        self.header_row + 1
    }

    pub fn column(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Dependent ordinal groups discovered from the header, keyed and
    /// ordered by ordinal. However many the form carries is how many we
    /// reconcile; nothing is hardcoded to five.
    pub fn dependent_groups(&self) -> BTreeMap<u32, DependentColumns> {
        let mut groups: BTreeMap<u32, DependentColumns> = BTreeMap::new();
        for (col, label) in self.labels.iter().enumerate() {
            let Some(caps) = ORDINAL_PATTERN.captures(label) else {
                continue;
            };
            let Ok(ordinal) = caps[1].parse::<u32>() else {
                continue;
            };
            let group = groups.entry(ordinal).or_default();
            let slot = match caps[2].trim() {
                LAST_NAME => &mut group.last_name,
                FIRST_NAME => &mut group.first_name,
                MIDDLE_NAME => &mut group.middle_name,
                EXT_NAME => &mut group.ext_name,
                RELATIONSHIP => &mut group.relationship,
                BIRTHDATE => &mut group.birthdate,
                OCCUPATION => &mut group.occupation,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(col);
            }
        }
        groups.retain(|_, g| {
            g.last_name.is_some() || g.first_name.is_some() || g.relationship.is_some()
        });
        groups
    }

    /// Columns matching the fixed sector vocabulary, in column order.
    pub fn sector_columns(&self) -> Vec<(Sector, usize)> {
        self.labels
            .iter()
            .enumerate()
            .filter_map(|(col, label)| Sector::from_header(label).map(|s| (s, col)))
            .collect()
    }
}
