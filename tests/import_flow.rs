use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use balangay::{import_file, migrate, ImportOutcome};

async fn setup() -> Result<SqlitePool> {
    // One connection keeps the in-memory database alive across the test.
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

async fn run(pool: &SqlitePool, csv: &str) -> Result<ImportOutcome> {
    Ok(import_file(pool, csv.as_bytes(), "upload.csv").await?)
}

/// Six data rows: three valid households, one duplicate of the first, one
/// blank spacer, one missing its barangay.
const MASTERLIST: &str = "\
LAST NAME,FIRST NAME,MIDDLE NAME,BARANGAY,BIRTHDATE,CONTACT NO
DELA CRUZ,JUAN,SANTOS,Maloma,09/17/1981,09171234567
REYES,ANA,LIM,Sindol,1990-06-02,
SANTOS,PEDRO,,Feria,,09998887777
DELA CRUZ,JUAN,SANTOS,Maloma,09/17/1981,09171234567
,,,,,
GARCIA,LORNA,CRUZ,,01/05/1975,
";

#[tokio::test]
async fn first_import_adds_and_reruns_skip() -> Result<()> {
    let pool = setup().await?;

    let first = run(&pool, MASTERLIST).await?;
    assert_eq!(first.added, 3);
    assert_eq!(first.skipped_duplicates, 1);
    assert_eq!(first.errors.len(), 1);
    assert!(first.errors[0].starts_with("Row 7:"), "{:?}", first.errors);

    // Re-running the same file is idempotent: everything valid is now a
    // persisted duplicate.
    let second = run(&pool, MASTERLIST).await?;
    assert_eq!(second.added, 0);
    assert_eq!(second.skipped_duplicates, 4);
    assert_eq!(second.errors.len(), 1);

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM resident_profiles")
        .fetch_one(&pool)
        .await?;
    assert_eq!(total, 3);
    Ok(())
}

#[tokio::test]
async fn row_counts_are_conserved() -> Result<()> {
    let pool = setup().await?;
    let outcome = run(&pool, MASTERLIST).await?;

    let data_rows = 6u64;
    let skipped_empty = 1u64;
    assert_eq!(
        outcome.added + outcome.skipped_duplicates + skipped_empty + outcome.errors.len() as u64,
        data_rows
    );
    Ok(())
}

#[tokio::test]
async fn contact_header_synonyms_produce_identical_records() -> Result<()> {
    let with_contact = "\
LAST NAME,FIRST NAME,MIDDLE NAME,BARANGAY,CONTACT
CRUZ,JUAN,S,Maloma,09170001111
";
    let with_phone = with_contact.replace("CONTACT", "PHONE NUMBER");

    let pool_a = setup().await?;
    let pool_b = setup().await?;
    assert_eq!(run(&pool_a, with_contact).await?.added, 1);
    assert_eq!(run(&pool_b, &with_phone).await?.added, 1);

    let fetch = |pool: SqlitePool| async move {
        let row = sqlx::query(
            "SELECT last_name, first_name, middle_name, barangay, contact_no \
             FROM resident_profiles",
        )
        .fetch_one(&pool)
        .await?;
        Ok::<_, anyhow::Error>((
            row.get::<String, _>("last_name"),
            row.get::<String, _>("first_name"),
            row.get::<String, _>("middle_name"),
            row.get::<String, _>("barangay"),
            row.get::<Option<String>, _>("contact_no"),
        ))
    };
    assert_eq!(fetch(pool_a).await?, fetch(pool_b).await?);
    Ok(())
}

#[tokio::test]
async fn duplicate_identity_is_case_insensitive_across_runs() -> Result<()> {
    let pool = setup().await?;
    let upper = "\
LAST NAME,FIRST NAME,MIDDLE NAME,BARANGAY
DELA CRUZ,JUAN,SANTOS,MALOMA
";
    let mixed = "\
LAST NAME,FIRST NAME,MIDDLE NAME,BARANGAY
Dela Cruz,Juan,Santos,maloma
";
    assert_eq!(run(&pool, upper).await?.added, 1);

    let outcome = run(&pool, mixed).await?;
    assert_eq!(outcome.added, 0);
    assert_eq!(outcome.skipped_duplicates, 1);
    Ok(())
}

#[tokio::test]
async fn spouse_dependent_is_promoted_not_persisted_as_member() -> Result<()> {
    let pool = setup().await?;
    let csv = "\
LAST NAME,FIRST NAME,MIDDLE NAME,BARANGAY,BIRTHDATE,1. LAST NAME,1. FIRST NAME,1. RELATIONSHIP
DELACRUZ,JUAN,SANTOS,FARANAL,01/01/1980,DELACRUZ,MARIA,SPOUSE
";
    let outcome = run(&pool, csv).await?;
    assert_eq!(outcome.added, 1);
    assert!(outcome.errors.is_empty());

    let row = sqlx::query(
        "SELECT spouse_last_name, spouse_first_name, birthdate FROM resident_profiles",
    )
    .fetch_one(&pool)
    .await?;
    assert_eq!(row.get::<Option<String>, _>("spouse_last_name").as_deref(), Some("DELACRUZ"));
    assert_eq!(row.get::<Option<String>, _>("spouse_first_name").as_deref(), Some("MARIA"));
    assert_eq!(row.get::<Option<String>, _>("birthdate").as_deref(), Some("1980-01-01"));

    let members: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM family_members")
        .fetch_one(&pool)
        .await?;
    assert_eq!(members, 0);
    Ok(())
}

#[tokio::test]
async fn dependents_and_sectors_are_persisted() -> Result<()> {
    let pool = setup().await?;
    let csv = "\
LAST NAME,FIRST NAME,BARANGAY,SENIOR CITIZEN,OTHERS,1. FIRST NAME,1. RELATIONSHIP,2. FIRST NAME,2. RELATIONSHIP
CRUZ,JUAN,Sindol,/,Tricycle driver,MIGUEL,SON,LORNA,DAUGHTER
";
    let outcome = run(&pool, csv).await?;
    assert_eq!(outcome.added, 1);

    let profile = sqlx::query(
        "SELECT id, resident_code, sector_summary, other_sector_details FROM resident_profiles",
    )
    .fetch_one(&pool)
    .await?;
    let profile_id: i64 = profile.get("id");
    assert_eq!(
        profile.get::<Option<String>, _>("resident_code"),
        Some(format!("SF-{profile_id:06}"))
    );
    assert_eq!(
        profile.get::<String, _>("sector_summary"),
        "Senior Citizen, Others"
    );
    assert_eq!(
        profile.get::<Option<String>, _>("other_sector_details").as_deref(),
        Some("Tricycle driver")
    );

    let members = sqlx::query(
        "SELECT last_name, first_name, relationship, position \
         FROM family_members WHERE profile_id = ? ORDER BY position",
    )
    .bind(profile_id)
    .fetch_all(&pool)
    .await?;
    assert_eq!(members.len(), 2);
    assert_eq!(members[0].get::<String, _>("first_name"), "MIGUEL");
    assert_eq!(members[0].get::<String, _>("last_name"), "CRUZ");
    assert_eq!(members[1].get::<String, _>("relationship"), "DAUGHTER");

    let sectors: Vec<String> =
        sqlx::query_scalar("SELECT sector FROM resident_sectors WHERE profile_id = ? ORDER BY sector")
            .bind(profile_id)
            .fetch_all(&pool)
            .await?;
    assert_eq!(sectors, vec!["Others".to_string(), "Senior Citizen".to_string()]);
    Ok(())
}

#[tokio::test]
async fn header_only_file_yields_empty_outcome() -> Result<()> {
    let pool = setup().await?;
    let outcome = run(&pool, "LAST NAME,FIRST NAME,BARANGAY\n").await?;
    assert_eq!(
        outcome,
        ImportOutcome {
            added: 0,
            skipped_duplicates: 0,
            errors: vec![]
        }
    );
    Ok(())
}

#[tokio::test]
async fn file_without_marker_columns_fails_fast() -> Result<()> {
    let pool = setup().await?;
    let err = import_file(&pool, b"NAME,ADDRESS\nJUAN,SOMEWHERE\n", "upload.csv")
        .await
        .expect_err("no header markers");
    assert!(err.to_string().contains("header"), "{err}");

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM resident_profiles")
        .fetch_one(&pool)
        .await?;
    assert_eq!(total, 0);
    Ok(())
}
