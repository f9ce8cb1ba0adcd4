use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use balangay::migrate;
use balangay::model::{HouseholdDraft, IdentityKey, MemberDraft, Sector};
use balangay::repo;

async fn setup() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    sqlx::query("PRAGMA foreign_keys=ON;")
        .execute(&pool)
        .await?;
    migrate::apply_migrations(&pool).await?;
    Ok(pool)
}

fn draft(last: &str, first: &str, barangay: &str) -> HouseholdDraft {
    HouseholdDraft {
        last_name: last.to_string(),
        first_name: first.to_string(),
        barangay: barangay.to_string(),
        ..Default::default()
    }
}

async fn insert(pool: &SqlitePool, draft: &HouseholdDraft) -> Result<Option<i64>> {
    let mut conn = pool.acquire().await?;
    Ok(repo::insert_household(&mut *conn, draft).await?)
}

#[tokio::test]
async fn insert_stamps_resident_code() -> Result<()> {
    let pool = setup().await?;
    let id = insert(&pool, &draft("CRUZ", "JUAN", "Maloma"))
        .await?
        .expect("fresh insert");

    let code: Option<String> =
        sqlx::query_scalar("SELECT resident_code FROM resident_profiles WHERE id = ?")
            .bind(id)
            .fetch_one(&pool)
            .await?;
    assert_eq!(code, Some(format!("SF-{id:06}")));
    Ok(())
}

#[tokio::test]
async fn identity_index_downgrades_duplicates_to_none() -> Result<()> {
    let pool = setup().await?;
    assert!(insert(&pool, &draft("CRUZ", "JUAN", "Maloma")).await?.is_some());

    // Same key straight at the store, bypassing the in-memory deduper: the
    // partial unique index is the arbiter.
    assert!(insert(&pool, &draft("CRUZ", "JUAN", "Maloma")).await?.is_none());
    // Barangay casing does not create a second identity.
    assert!(insert(&pool, &draft("CRUZ", "JUAN", "MALOMA")).await?.is_none());

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM resident_profiles")
        .fetch_one(&pool)
        .await?;
    assert_eq!(total, 1);
    Ok(())
}

#[tokio::test]
async fn soft_deleted_rows_release_their_identity() -> Result<()> {
    let pool = setup().await?;
    let id = insert(&pool, &draft("CRUZ", "JUAN", "Maloma"))
        .await?
        .expect("fresh insert");

    sqlx::query("UPDATE resident_profiles SET deleted_at = 123 WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?;

    // The tombstoned row no longer occupies the identity...
    assert!(insert(&pool, &draft("CRUZ", "JUAN", "Maloma")).await?.is_some());
    // ...and no longer appears in the active-key prefetch.
    let keys = repo::existing_identity_keys(&pool).await?;
    assert_eq!(keys.len(), 1);
    assert!(keys.contains(&IdentityKey::new("CRUZ", "JUAN", "", "Maloma")));
    Ok(())
}

#[tokio::test]
async fn members_and_sectors_written_with_the_profile() -> Result<()> {
    let pool = setup().await?;
    let mut household = draft("CRUZ", "JUAN", "Sindol");
    household.sectors = vec![Sector::SeniorCitizen, Sector::Pwd];
    household.members = vec![
        MemberDraft {
            last_name: "CRUZ".into(),
            first_name: "MIGUEL".into(),
            relationship: "SON".into(),
            ..Default::default()
        },
        MemberDraft {
            last_name: "CRUZ".into(),
            first_name: "LORNA".into(),
            relationship: "DAUGHTER".into(),
            ..Default::default()
        },
    ];

    let id = insert(&pool, &household).await?.expect("fresh insert");

    let summary: String =
        sqlx::query_scalar("SELECT sector_summary FROM resident_profiles WHERE id = ?")
            .bind(id)
            .fetch_one(&pool)
            .await?;
    assert_eq!(summary, "Senior Citizen, PWD");

    let members: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM family_members WHERE profile_id = ?")
        .bind(id)
        .fetch_one(&pool)
        .await?;
    assert_eq!(members, 2);

    // Dependents are cascade-owned: deleting the household removes them.
    sqlx::query("DELETE FROM resident_profiles WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?;
    let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM family_members")
        .fetch_one(&pool)
        .await?;
    assert_eq!(orphans, 0);
    Ok(())
}
