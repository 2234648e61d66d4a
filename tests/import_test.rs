//! Legacy import against Postgres
//!
//! Run with `TEST_DATABASE_URL=postgresql://... cargo test -- --test-threads=1`.

mod helpers;

use helpers::*;
use serial_test::serial;
use skiclub::database::DatabaseService;
use skiclub::models::{ImportStatus, ImportSummary};
use skiclub::services::{Importer, PgImportStore};

async fn stage_child(db: &TestDatabase, email: &str, first_name: &str, birth_date: &str, group: Option<&str>) {
    sqlx::query(
        r#"
        INSERT INTO import_children
            (parent_email, parent_first_name, parent_last_name, child_first_name, child_last_name, child_birth_date, group_name)
        VALUES ($1, 'Ewa', 'Nowak', $2, 'Nowak', $3, $4)
        "#,
    )
    .bind(email)
    .bind(first_name)
    .bind(birth_date)
    .bind(group)
    .execute(&db.pool)
    .await
    .expect("Failed to stage child row");
}

async fn stage_trip(db: &TestDatabase, title: &str, return_time: Option<&str>, groups: &str) {
    sqlx::query(
        r#"
        INSERT INTO import_trips
            (title, departure_date, departure_time, departure_location, return_date, return_time, return_location, group_names)
        VALUES ($1, '14.02.2027', '07:30', 'Kraków', '14.02.2027', $2, 'Kraków', $3)
        "#,
    )
    .bind(title)
    .bind(return_time)
    .bind(groups)
    .execute(&db.pool)
    .await
    .expect("Failed to stage trip row");
}

async fn child_row_statuses(test_db: &TestDatabase) -> Vec<(ImportStatus, Option<String>)> {
    let db = DatabaseService::new(test_db.pool.clone());
    db.imports
        .child_rows()
        .await
        .unwrap()
        .into_iter()
        .map(|row| (row.status, row.error_message))
        .collect()
}

fn importer(test_db: &TestDatabase) -> Importer<PgImportStore> {
    let tz = test_settings().timezone().expect("Invalid test timezone");
    Importer::new(PgImportStore::new(DatabaseService::new(test_db.pool.clone())), tz)
}

#[tokio::test]
#[serial]
async fn test_children_import_lands_once() {
    let Some(test_db) = TestDatabase::from_env().await else { return };
    stage_child(&test_db, "Ewa@Example.pl", "Jan", "2014-05-03", Some("Juniorzy")).await;
    stage_child(&test_db, "ewa@example.pl", "Ola", "03.05.2016", Some("Mini")).await;
    stage_child(&test_db, "not-an-email", "Kuba", "2015-01-01", None).await;
    let importer = importer(&test_db);

    let first = importer.run_children_import().await.unwrap();
    assert_eq!(first, ImportSummary { processed: 3, imported: 2, failed: 1, skipped: 0 });
    assert_eq!(test_db.count_records("profiles").await, 1);
    assert_eq!(test_db.count_records("participants").await, 2);
    assert_eq!(test_db.count_records("groups").await, 2);
    assert_eq!(test_db.count_records("participant_groups").await, 2);

    let rows = child_row_statuses(&test_db).await;
    assert_eq!(rows.iter().filter(|(status, _)| *status == ImportStatus::Imported).count(), 2);
    assert!(rows.iter().any(|(status, error)| *status == ImportStatus::Error
        && error.as_deref() == Some("invalid parent email: not-an-email")));

    sqlx::query("DELETE FROM import_children WHERE status = 'blad'")
        .execute(&test_db.pool)
        .await
        .unwrap();

    let second = importer.run_children_import().await.unwrap();
    assert_eq!(second.imported, 0);
    assert_eq!(second.failed, 0);
    assert_eq!(second.skipped, 2);
    assert_eq!(test_db.count_records("participants").await, 2);

    test_db.cleanup().await;
}

#[tokio::test]
#[serial]
async fn test_trips_import_uses_club_time_and_is_repeatable() {
    let Some(test_db) = TestDatabase::from_env().await else { return };
    stage_child(&test_db, "ewa@example.pl", "Jan", "2014-05-03", Some("Juniorzy")).await;
    stage_trip(&test_db, "Kluszkowce", None, "Juniorzy").await;
    stage_trip(&test_db, "Szczyrk", Some("19:00"), "Nieznana").await;
    let importer = importer(&test_db);
    importer.run_children_import().await.unwrap();

    let first = importer.run_trips_import().await.unwrap();
    assert_eq!(first, ImportSummary { processed: 2, imported: 1, failed: 1, skipped: 0 });

    let db = DatabaseService::new(test_db.pool.clone());
    let trips = db.trips.list().await.unwrap();
    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0].departure_datetime.to_rfc3339(), "2027-02-14T06:30:00+00:00");
    assert_eq!(trips[0].return_datetime.to_rfc3339(), "2027-02-14T22:59:00+00:00");
    assert_eq!(db.trips.group_ids(trips[0].id).await.unwrap().len(), 1);

    sqlx::query("DELETE FROM import_trips WHERE status = 'blad'")
        .execute(&test_db.pool)
        .await
        .unwrap();

    let second = importer.run_trips_import().await.unwrap();
    assert_eq!(second, ImportSummary { processed: 0, imported: 0, failed: 0, skipped: 1 });
    assert_eq!(db.trips.list().await.unwrap().len(), 1);

    test_db.cleanup().await;
}
