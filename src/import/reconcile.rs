use thiserror::Error;
use tracing::warn;

use crate::model::{
    HouseholdDraft, MemberDraft, Sector, SpouseName, RELATIONSHIP_KEYWORDS, SPOUSE_RELATIONSHIP,
};

use super::fields;
use super::headers::{self, HeaderMap};
use super::sheet::Sheet;

/// Why a single row could not become a household. Collected per row by the
/// orchestrator; never aborts the loop.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// Assemble one candidate household from a data row.
///
/// `Ok(None)` is the silent skip for non-resident rows (blank trailing rows,
/// spacer rows): both name markers empty.
pub fn reconcile_row(
    headers: &HeaderMap,
    sheet: &Sheet,
    row_idx: usize,
) -> Result<Option<HouseholdDraft>, RowError> {
    let row_number = row_idx + 1;
    let text = |label: &str| -> String {
        headers
            .column(label)
            .map(|col| fields::clean(sheet.cell(row_idx, col)))
            .unwrap_or_default()
    };
    let text_opt = |label: &str| -> Option<String> {
        headers
            .column(label)
            .and_then(|col| fields::opt(sheet.cell(row_idx, col)))
    };

    let last_name = text(headers::LAST_NAME);
    let first_name = text(headers::FIRST_NAME);
    if last_name.is_empty() && first_name.is_empty() {
        return Ok(None);
    }

    let barangay = text(headers::BARANGAY);
    if barangay.is_empty() {
        return Err(RowError::MissingField("barangay"));
    }

    let birthdate = headers
        .column(headers::BIRTHDATE)
        .and_then(|col| fields::parse_date(sheet.cell(row_idx, col)))
        .or_else(|| {
            headers
                .column(headers::AGE)
                .and_then(|col| fields::estimate_birthdate_from_age(&fields::clean(sheet.cell(row_idx, col))))
        });

    let mut spouse = extract_spouse(headers, sheet, row_idx);
    let mut members = extract_members(headers, sheet, row_idx, row_number, &last_name);

    // Some layouts carry the spouse as a dependent row instead of a second
    // name block; promote the first such entry when the spouse slot is open.
    if spouse.is_none() {
        if let Some(pos) = members
            .iter()
            .position(|m| m.relationship.to_uppercase() == SPOUSE_RELATIONSHIP)
        {
            let promoted = members.remove(pos);
            warn!(
                target = "balangay",
                event = "spouse_promoted_from_member",
                row = row_number
            );
            spouse = Some(SpouseName {
                last_name: promoted.last_name,
                first_name: promoted.first_name,
                middle_name: promoted.middle_name,
                ext_name: promoted.ext_name,
            });
        }
    }

    let (sectors, other_sector_details) = extract_sectors(headers, sheet, row_idx);

    Ok(Some(HouseholdDraft {
        source_row: row_number,
        last_name: last_name.to_uppercase(),
        first_name: first_name.to_uppercase(),
        middle_name: text(headers::MIDDLE_NAME).to_uppercase(),
        ext_name: text_opt(headers::EXT_NAME).map(|v| v.to_uppercase()),
        house_no: text_opt(headers::HOUSE_NO),
        purok: text_opt(headers::PUROK),
        barangay,
        sex: text_opt(headers::SEX),
        birthdate,
        civil_status: text_opt(headers::CIVIL_STATUS),
        religion: text_opt(headers::RELIGION),
        occupation: text_opt(headers::OCCUPATION),
        contact_no: text_opt(headers::CONTACT_NO),
        precinct_no: text_opt(headers::PRECINCT_NO),
        spouse,
        members,
        sectors,
        other_sector_details,
    }))
}

/// Spouse name block: the `.1` duplicate group when present, else a combined
/// single-column `SPOUSE` cell split into name parts.
fn extract_spouse(headers: &HeaderMap, sheet: &Sheet, row_idx: usize) -> Option<SpouseName> {
    let numbered = |field: &str| -> String {
        headers
            .column(&format!("{field}.1"))
            .map(|col| fields::clean(sheet.cell(row_idx, col)))
            .unwrap_or_default()
    };

    let last = numbered(headers::LAST_NAME);
    let first = numbered(headers::FIRST_NAME);
    let middle = numbered(headers::MIDDLE_NAME);
    if !(last.is_empty() && first.is_empty() && middle.is_empty()) {
        let ext = numbered(headers::EXT_NAME);
        return Some(SpouseName {
            last_name: last.to_uppercase(),
            first_name: first.to_uppercase(),
            middle_name: middle.to_uppercase(),
            ext_name: if ext.is_empty() {
                None
            } else {
                Some(ext.to_uppercase())
            },
        });
    }

    let combined = headers
        .column(headers::SPOUSE)
        .map(|col| fields::clean(sheet.cell(row_idx, col)))?;
    let (last, first, middle, ext) = fields::split_full_name(&combined);
    if last.is_empty() && first.is_empty() {
        return None;
    }
    Some(SpouseName {
        last_name: last.to_uppercase(),
        first_name: first.to_uppercase(),
        middle_name: middle.to_uppercase(),
        ext_name: ext,
    })
}

/// Dependents, one per populated ordinal group. A group is populated when it
/// has a first name or a relationship; a blank surname inherits the
/// household's.
fn extract_members(
    headers: &HeaderMap,
    sheet: &Sheet,
    row_idx: usize,
    row_number: usize,
    household_last: &str,
) -> Vec<MemberDraft> {
    let mut members = Vec::new();

    for (ordinal, cols) in headers.dependent_groups() {
        let take = |col: Option<usize>| -> String {
            col.map(|c| fields::clean(sheet.cell(row_idx, c)))
                .unwrap_or_default()
        };

        let mut last = take(cols.last_name);
        let mut relationship = take(cols.relationship);

        // Column-shift recovery: a relationship keyword sitting in the
        // last-name cell with the relationship cell empty means the row is
        // misaligned one column. Best-effort; always logged.
        if relationship.is_empty()
            && !last.is_empty()
            && RELATIONSHIP_KEYWORDS.contains(&last.to_uppercase().as_str())
        {
            warn!(
                target = "balangay",
                event = "member_column_shift",
                row = row_number,
                ordinal,
                keyword = %last
            );
            relationship = last;
            last = String::new();
        }

        let first = take(cols.first_name);
        if first.is_empty() && relationship.is_empty() {
            continue;
        }

        if last.is_empty() {
            last = household_last.to_string();
        }

        let ext = take(cols.ext_name);
        let occupation = take(cols.occupation);
        members.push(MemberDraft {
            last_name: last.to_uppercase(),
            first_name: first.to_uppercase(),
            middle_name: take(cols.middle_name).to_uppercase(),
            ext_name: if ext.is_empty() {
                None
            } else {
                Some(ext.to_uppercase())
            },
            relationship,
            birthdate: cols
                .birthdate
                .and_then(|c| fields::parse_date(sheet.cell(row_idx, c))),
            occupation: if occupation.is_empty() {
                None
            } else {
                Some(occupation)
            },
        });
    }

    members
}

/// Sweep the sector vocabulary columns; any mark counts. Free text on a
/// checked "Others" column (beyond a lone glyph) becomes the detail.
fn extract_sectors(
    headers: &HeaderMap,
    sheet: &Sheet,
    row_idx: usize,
) -> (Vec<Sector>, Option<String>) {
    let mut sectors = Vec::new();
    let mut detail = None;

    for (sector, col) in headers.sector_columns() {
        let cell = sheet.cell(row_idx, col);
        if !fields::is_checked(cell) {
            continue;
        }
        if !sectors.contains(&sector) {
            sectors.push(sector);
        }
        if sector == Sector::Others && detail.is_none() {
            let text = fields::clean(cell);
            if text.chars().count() > 1 {
                detail = Some(text);
            }
        }
    }

    (sectors, detail)
}
