//! Integration tests for the sqlforge-sqlite crate.

use std::path::Path;

use rusqlite::Connection;
use rusqlite::types::Value;
use sqlforge_core::{
    CheckConstraint, ColumnGroup, ColumnValue, ForeignKey, PrimaryKey, SqlType, TableDeclaration,
    Verb, compile_table, select_columns,
};
use sqlforge_db::{ArtifactStore, DeclarationCatalog, MANIFEST_FILE};
use sqlforge_sqlite::{
    BackupCoordinator, BackupOperation, Connector, Migration, SqliteError, StatementRunner,
    backup_log_declaration, table_exists,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn widget() -> TableDeclaration {
    TableDeclaration::new("WIDGET")
        .column("id", "")
        .column("label", "")
        .column("active", true)
        .primary_key(PrimaryKey::new("id"))
}

fn ship() -> TableDeclaration {
    TableDeclaration::new("SHIP")
        .column("id", "")
        .column("kind", "scout")
        .column("pos", "")
        .column("hull", 1.0)
        .primary_key(PrimaryKey::new("id"))
        .check(CheckConstraint::new("kind", ["scout", "hauler"]))
        .group(ColumnGroup::new("pos").field("x", 0.0).field("y", 0.0))
        .order_by("id")
}

fn cargo() -> TableDeclaration {
    TableDeclaration::new("CARGO")
        .column("id", "")
        .column("ship", "")
        .column("mass", 0)
        .primary_key(PrimaryKey::new("id"))
        .foreign_key(ForeignKey::new("ship", "SHIP", "id"))
}

fn setup(dir: &Path, tables: Vec<TableDeclaration>) -> Migration {
    let catalog = DeclarationCatalog::from_declarations(tables).unwrap();
    let runner = StatementRunner::new(
        Connector::new(dir.join("store.db")),
        ArtifactStore::new(dir.join("artifacts/ddl"), dir.join("artifacts/dml")),
    );
    let migration = Migration::new(catalog, runner, dir.join("artifacts").join(MANIFEST_FILE));
    migration.compile().unwrap();
    migration.up().unwrap();
    migration
}

fn tables_in(path: &Path) -> Vec<String> {
    let conn = Connection::open(path).unwrap();
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Compilation properties
// ---------------------------------------------------------------------------

#[test]
fn test_widget_create_statement() {
    let compiled = compile_table(&widget()).unwrap();
    assert_eq!(
        compiled.artifact(Verb::Create).unwrap().sql,
        "CREATE TABLE IF NOT EXISTS WIDGET (id TEXT DEFAULT '', label TEXT DEFAULT '', \
         active BOOLEAN DEFAULT 1, PRIMARY KEY (id));"
    );
}

#[test]
fn test_column_order_agrees_across_artifacts() {
    for table in [widget(), ship(), cargo(), backup_log_declaration("BACKUP_LOG")] {
        let compiled = compile_table(&table).unwrap();
        let order = &compiled.columns;

        let insert = &compiled.artifact(Verb::Insert).unwrap().sql;
        assert!(insert.contains(&format!("({})", order.join(", "))), "{insert}");

        for verb in [Verb::SelectAll, Verb::SelectByPk] {
            let sql = &compiled.artifact(verb).unwrap().sql;
            assert_eq!(&select_columns(sql).unwrap(), order);
        }

        let key = compiled.primary_key.as_deref().unwrap();
        let set: Vec<String> = order
            .iter()
            .filter(|c| c.as_str() != key)
            .map(|c| format!("{c}=?"))
            .collect();
        let update = &compiled.artifact(Verb::Update).unwrap().sql;
        assert!(update.contains(&format!("SET {} WHERE", set.join(", "))), "{update}");
    }
}

// ---------------------------------------------------------------------------
// Statement runner
// ---------------------------------------------------------------------------

#[test]
fn test_widget_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let migration = setup(dir.path(), vec![widget()]);
    let runner = migration.runner();

    runner
        .run_insert("WIDGET", &["w1".into(), "Button".into(), false.into()])
        .unwrap();
    let result = runner
        .run_select_by_key("WIDGET", &ColumnValue::text("w1"))
        .unwrap();

    assert_eq!(result.column_names().collect::<Vec<_>>(), vec!["id", "label", "active"]);
    assert_eq!(result.get("id").unwrap(), &[Value::Text("w1".into())]);
    assert_eq!(result.get("label").unwrap(), &[Value::Text("Button".into())]);
    assert_eq!(result.get("active").unwrap(), &[Value::Integer(0)]);
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        serde_json::json!({"id": ["w1"], "label": ["Button"], "active": [0]})
    );
}

#[test]
fn test_grouped_columns_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let migration = setup(dir.path(), vec![ship()]);
    let runner = migration.runner();

    for (id, x) in [("s2", 3.5), ("s1", -1.5)] {
        runner
            .run_insert(
                "SHIP",
                &[id.into(), "hauler".into(), x.into(), 2.5.into(), 0.75.into()],
            )
            .unwrap();
    }

    let all = runner.run_select_all("SHIP").unwrap();
    assert_eq!(
        all.column_names().collect::<Vec<_>>(),
        vec!["id", "kind", "pos_x", "pos_y", "hull"]
    );
    assert_eq!(
        all.get("id").unwrap(),
        &[Value::Text("s1".into()), Value::Text("s2".into())]
    );
    assert_eq!(all.get("pos_x").unwrap(), &[Value::Real(-1.5), Value::Real(3.5)]);
}

#[test]
fn test_empty_select_keeps_every_column() {
    let dir = tempfile::tempdir().unwrap();
    let migration = setup(dir.path(), vec![ship()]);

    let all = migration.runner().run_select_all("SHIP").unwrap();
    assert_eq!(all.column_count(), 5);
    assert!(all.iter().all(|(_, values)| values.is_empty()));

    let none = migration
        .runner()
        .run_select_by_key("SHIP", &ColumnValue::text("missing"))
        .unwrap();
    assert_eq!(
        none.column_names().collect::<Vec<_>>(),
        vec!["id", "kind", "pos_x", "pos_y", "hull"]
    );
    assert_eq!(none.row_count(), 0);
}

#[test]
fn test_update_passes_key_last() {
    let dir = tempfile::tempdir().unwrap();
    let migration = setup(dir.path(), vec![widget()]);
    let runner = migration.runner();
    let key = ColumnValue::text("w1");

    runner
        .run_insert("WIDGET", &["w1".into(), "Button".into(), false.into()])
        .unwrap();
    runner
        .run_update("WIDGET", &key, &["Slider".into(), true.into()])
        .unwrap();

    let result = runner.run_select_by_key("WIDGET", &key).unwrap();
    assert_eq!(result.get("label").unwrap(), &[Value::Text("Slider".into())]);
    assert_eq!(result.get("active").unwrap(), &[Value::Integer(1)]);
}

#[test]
fn test_foreign_key_violation_and_cascade() {
    let dir = tempfile::tempdir().unwrap();
    let migration = setup(dir.path(), vec![ship(), cargo()]);
    let runner = migration.runner();

    let err = runner
        .run_insert("CARGO", &["c1".into(), "nowhere".into(), 5.into()])
        .unwrap_err();
    assert!(matches!(err, SqliteError::ConstraintViolation { ref table, .. } if table == "CARGO"));

    runner
        .run_insert(
            "SHIP",
            &["s1".into(), "scout".into(), 0.0.into(), 0.0.into(), 1.0.into()],
        )
        .unwrap();
    runner
        .run_insert("CARGO", &["c1".into(), "s1".into(), 5.into()])
        .unwrap();
    runner.run_delete("SHIP", &ColumnValue::text("s1")).unwrap();
    assert!(runner.run_select_all("CARGO").unwrap().is_empty());
}

#[test]
fn test_check_violation() {
    let dir = tempfile::tempdir().unwrap();
    let migration = setup(dir.path(), vec![ship()]);
    let err = migration
        .runner()
        .run_insert(
            "SHIP",
            &["s1".into(), "cruiser".into(), 0.0.into(), 0.0.into(), 1.0.into()],
        )
        .unwrap_err();
    assert!(matches!(err, SqliteError::ConstraintViolation { .. }));
}

#[test]
fn test_keyless_table_has_no_keyed_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let log = TableDeclaration::new("EVENTS").column("at", "").column("message", "");
    let migration = setup(dir.path(), vec![log]);
    let runner = migration.runner();

    runner
        .run_insert("EVENTS", &["t0".into(), "boot".into()])
        .unwrap();
    assert_eq!(runner.run_select_all("EVENTS").unwrap().row_count(), 1);

    let err = runner
        .run_delete("EVENTS", &ColumnValue::text("t0"))
        .unwrap_err();
    assert!(matches!(err, SqliteError::EmptyArtifact(name) if name == "DELETE_EVENTS"));
}

#[test]
fn test_hinted_key_with_text_default_creates_and_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let item = TableDeclaration::new("ITEM")
        .column("id", "")
        .column("label", "it's new")
        .primary_key(PrimaryKey::new("id").with_type(SqlType::Integer));
    let migration = setup(dir.path(), vec![item]);
    assert!(tables_in(&dir.path().join("store.db")).contains(&"ITEM".to_string()));

    let runner = migration.runner();
    runner.run_insert("ITEM", &[7.into(), "crate".into()]).unwrap();
    let result = runner
        .run_select_by_key("ITEM", &ColumnValue::Integer(7))
        .unwrap();
    assert_eq!(result.get("id").unwrap(), &[Value::Integer(7)]);
    assert_eq!(result.get("label").unwrap(), &[Value::Text("crate".into())]);
}

// ---------------------------------------------------------------------------
// DDL batches
// ---------------------------------------------------------------------------

#[test]
fn test_failed_batch_leaves_no_effects() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path().join("ddl"), dir.path().join("dml"));
    for table in [
        TableDeclaration::new("FIRST").column("id", ""),
        TableDeclaration::new("THIRD").column("id", ""),
    ] {
        store.persist_table(&compile_table(&table).unwrap()).unwrap();
    }
    std::fs::write(
        store.path_for(Verb::Create, "SECOND"),
        "CREATE TABLE IF NOT EXISTS SECOND (id TEXT DEFAULT '',;",
    )
    .unwrap();

    let db = dir.path().join("store.db");
    let runner = StatementRunner::new(Connector::new(&db), store);
    let err = runner
        .run_ddl_batch(&["CREATE_FIRST", "CREATE_SECOND", "CREATE_THIRD"], false)
        .unwrap_err();

    assert!(
        matches!(err, SqliteError::TransactionFailure { ref statement, .. } if statement == "CREATE_SECOND")
    );
    assert!(tables_in(&db).is_empty());

    let report = runner
        .run_ddl_batch(&["CREATE_FIRST", "CREATE_THIRD"], false)
        .unwrap();
    assert_eq!(report.len(), 2);
    assert_eq!(tables_in(&db), vec!["FIRST", "THIRD"]);
}

// ---------------------------------------------------------------------------
// Backup, archive and restore
// ---------------------------------------------------------------------------

#[test]
fn test_backup_without_log_table_still_copies() {
    let dir = tempfile::tempdir().unwrap();
    let migration = setup(dir.path(), vec![widget()]);
    migration
        .runner()
        .run_insert("WIDGET", &["w1".into(), "Button".into(), false.into()])
        .unwrap();

    let src = dir.path().join("store.db");
    let dst = dir.path().join("store.db.bak");
    let outcome = BackupCoordinator::new("BACKUP_LOG", "test")
        .backup(&src, &dst)
        .unwrap();

    assert!(!outcome.logged);
    assert_eq!(outcome.record.operation, BackupOperation::Backup);
    assert_eq!(std::fs::read(&src).unwrap(), std::fs::read(&dst).unwrap());
    assert_eq!(outcome.bytes_copied, std::fs::metadata(&dst).unwrap().len());
}

#[test]
fn test_backup_with_log_table_records_row() {
    let dir = tempfile::tempdir().unwrap();
    setup(dir.path(), vec![widget(), backup_log_declaration("BACKUP_LOG")]);

    let src = dir.path().join("store.db");
    let dst = dir.path().join("backups/store.db.bak");
    let backups = BackupCoordinator::new("BACKUP_LOG", "nightly");
    let outcome = backups.backup(&src, &dst).unwrap();

    assert!(outcome.logged);
    assert_eq!(std::fs::read(&src).unwrap(), std::fs::read(&dst).unwrap());

    let history = backups.history(&src).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0], outcome.record);
    assert_eq!(history[0].label, "nightly");
    assert_eq!(history[0].operation, BackupOperation::Backup);

    // The copy was taken after logging, so the backup carries the row too.
    assert_eq!(backups.history(&dst).unwrap().len(), 1);
}

#[test]
fn test_archives_are_distinct() {
    let dir = tempfile::tempdir().unwrap();
    setup(dir.path(), vec![backup_log_declaration("BACKUP_LOG")]);

    let src = dir.path().join("store.db");
    let backups =
        BackupCoordinator::new("BACKUP_LOG", "test").with_archive_dir(dir.path().join("archive"));
    let first = backups.archive(&src).unwrap();
    let second = backups.archive(&src).unwrap();

    assert_ne!(first.record.destination, second.record.destination);
    assert!(Path::new(&first.record.destination).is_file());
    assert!(Path::new(&second.record.destination).is_file());
    assert_eq!(backups.history(&src).unwrap().len(), 2);
}

#[test]
fn test_restore_replaces_main_and_logs_into_it() {
    let dir = tempfile::tempdir().unwrap();
    let migration = setup(dir.path(), vec![widget(), backup_log_declaration("BACKUP_LOG")]);
    let runner = migration.runner();
    let main = dir.path().join("store.db");
    let bak = dir.path().join("store.db.bak");
    let backups = BackupCoordinator::new("BACKUP_LOG", "test");

    runner
        .run_insert("WIDGET", &["w1".into(), "Button".into(), false.into()])
        .unwrap();
    backups.backup(&main, &bak).unwrap();
    runner.run_delete("WIDGET", &ColumnValue::text("w1")).unwrap();
    assert!(runner.run_select_all("WIDGET").unwrap().is_empty());

    let outcome = backups.restore(&bak, &main).unwrap();
    assert!(outcome.logged);
    assert_eq!(runner.run_select_all("WIDGET").unwrap().row_count(), 1);

    let operations: Vec<_> = backups
        .history(&main)
        .unwrap()
        .into_iter()
        .map(|r| r.operation)
        .collect();
    assert_eq!(operations, vec![BackupOperation::Backup, BackupOperation::Restore]);
}

#[test]
fn test_restore_from_missing_backup_leaves_main() {
    let dir = tempfile::tempdir().unwrap();
    setup(dir.path(), vec![widget()]);
    let main = dir.path().join("store.db");
    let before = std::fs::read(&main).unwrap();

    let err = BackupCoordinator::new("BACKUP_LOG", "test")
        .restore(dir.path().join("absent.bak"), &main)
        .unwrap_err();
    assert!(matches!(err, SqliteError::CopyFailure { .. }));
    assert_eq!(std::fs::read(&main).unwrap(), before);

    let conn = Connection::open(&main).unwrap();
    assert!(table_exists(&conn, "WIDGET").unwrap());
}
