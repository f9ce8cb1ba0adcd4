use std::collections::HashSet;

use sqlx::{Row, SqliteConnection, SqlitePool};
use thiserror::Error;
use tracing::debug;

use crate::model::{resident_code, sector_summary, HouseholdDraft, IdentityKey};
use crate::time::now_ms;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Identity keys of every active household, for the pre-commit duplicate
/// check. The partial unique index remains the source of truth; this set is
/// an optimization so a large import does not probe row by row.
pub async fn existing_identity_keys(pool: &SqlitePool) -> Result<HashSet<IdentityKey>, StoreError> {
    let rows = sqlx::query(
        "SELECT last_name, first_name, middle_name, barangay \
         FROM resident_profiles WHERE deleted_at IS NULL",
    )
    .fetch_all(pool)
    .await?;

    let mut keys = HashSet::with_capacity(rows.len());
    for row in rows {
        let last: String = row.get("last_name");
        let first: String = row.get("first_name");
        let middle: String = row.get("middle_name");
        let barangay: String = row.get("barangay");
        keys.insert(IdentityKey::new(&last, &first, &middle, &barangay));
    }
    Ok(keys)
}

/// Insert one household with its spouse columns, sector rows, and dependents.
///
/// Returns the new profile id, or `None` when the identity index already
/// holds an active row for this key (insert-or-ignore semantics; a concurrent
/// writer winning the race lands here too). Dependents are written only after
/// the profile id is known.
pub async fn insert_household(
    conn: &mut SqliteConnection,
    draft: &HouseholdDraft,
) -> Result<Option<i64>, StoreError> {
    let now = now_ms();
    let spouse = draft.spouse.as_ref();

    let inserted = sqlx::query(
        "INSERT OR IGNORE INTO resident_profiles (\
           last_name, first_name, middle_name, ext_name, \
           spouse_last_name, spouse_first_name, spouse_middle_name, spouse_ext_name, \
           house_no, purok, barangay, \
           sex, birthdate, civil_status, religion, occupation, contact_no, precinct_no, \
           sector_summary, other_sector_details, created_at, updated_at\
         ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         RETURNING id",
    )
    .bind(&draft.last_name)
    .bind(&draft.first_name)
    .bind(&draft.middle_name)
    .bind(&draft.ext_name)
    .bind(spouse.map(|s| s.last_name.as_str()))
    .bind(spouse.map(|s| s.first_name.as_str()))
    .bind(spouse.map(|s| s.middle_name.as_str()))
    .bind(spouse.and_then(|s| s.ext_name.as_deref()))
    .bind(&draft.house_no)
    .bind(&draft.purok)
    .bind(&draft.barangay)
    .bind(&draft.sex)
    .bind(draft.birthdate.map(|d| d.to_string()))
    .bind(&draft.civil_status)
    .bind(&draft.religion)
    .bind(&draft.occupation)
    .bind(&draft.contact_no)
    .bind(&draft.precinct_no)
    .bind(sector_summary(&draft.sectors))
    .bind(&draft.other_sector_details)
    .bind(now)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    let id: i64 = match inserted {
        Some(row) => row.get("id"),
        None => return Ok(None),
    };

    sqlx::query("UPDATE resident_profiles SET resident_code = ? WHERE id = ?")
        .bind(resident_code(id))
        .bind(id)
        .execute(&mut *conn)
        .await?;

    for sector in &draft.sectors {
        sqlx::query("INSERT OR IGNORE INTO resident_sectors (profile_id, sector) VALUES (?, ?)")
            .bind(id)
            .bind(sector.as_str())
            .execute(&mut *conn)
            .await?;
    }

    for (position, member) in draft.members.iter().enumerate() {
        sqlx::query(
            "INSERT INTO family_members (\
               profile_id, last_name, first_name, middle_name, ext_name, \
               relationship, birthdate, occupation, position, created_at, updated_at\
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(&member.last_name)
        .bind(&member.first_name)
        .bind(&member.middle_name)
        .bind(&member.ext_name)
        .bind(&member.relationship)
        .bind(member.birthdate.map(|d| d.to_string()))
        .bind(&member.occupation)
        .bind(position as i64)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    }

    debug!(
        target = "balangay",
        event = "household_inserted",
        id,
        members = draft.members.len(),
        sectors = draft.sectors.len()
    );

    Ok(Some(id))
}
