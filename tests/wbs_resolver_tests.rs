#![cfg(feature = "sqlite")]

use rusqlite::Connection;
use schedule_import::{
    AuditStamp, IdAllocator, ImportBatch, ImportConfig, ImportError, ProjectContext,
    ProjectStore, SqliteProjectStore, WbsOutcome, WbsResolver, WbsRow, import_batch,
};

fn fixture() -> (Connection, ProjectContext) {
    let conn = Connection::open_in_memory().unwrap();
    SqliteProjectStore::initialize_schema(&conn).unwrap();
    let project = SqliteProjectStore::create_project(
        &conn,
        "PRJ",
        "Project Root",
        Some(1),
        &AuditStamp::now("tester"),
    )
    .unwrap();
    (conn, project)
}

fn wbs_rows(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM PROJWBS", [], |row| row.get(0))
        .unwrap()
}

fn parent_of(conn: &Connection, short_name: &str) -> Option<i64> {
    conn.query_row(
        "SELECT parent_wbs_id FROM PROJWBS WHERE wbs_short_name = ?1",
        [short_name],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn resolving_the_same_row_twice_creates_one_node() {
    let (conn, project) = fixture();
    let store = SqliteProjectStore::new(&conn);
    let mut ids = IdAllocator::seed(&store).unwrap();
    let audit = AuditStamp::now("tester");
    let mut resolver = WbsResolver::new(&project);
    let row = WbsRow::new("ENG", "Engineering", "");

    let first = resolver
        .resolve_or_create(&store, &mut ids, &audit, &row)
        .unwrap()
        .unwrap();
    let second = resolver
        .resolve_or_create(&store, &mut ids, &audit, &row)
        .unwrap()
        .unwrap();

    assert!(matches!(first, WbsOutcome::Created(_)));
    assert_eq!(second, WbsOutcome::Cached(first.id()));
    assert_eq!(wbs_rows(&conn), 2);
    assert_eq!(parent_of(&conn, "ENG"), Some(project.root_wbs_id));
}

#[test]
fn a_fresh_resolver_reuses_persisted_nodes_by_full_name() {
    let (conn, project) = fixture();
    let store = SqliteProjectStore::new(&conn);
    let mut ids = IdAllocator::seed(&store).unwrap();
    let audit = AuditStamp::now("tester");
    let row = WbsRow::new("ENG", "Engineering", "");

    let created = WbsResolver::new(&project)
        .resolve_or_create(&store, &mut ids, &audit, &row)
        .unwrap()
        .unwrap();
    let resumed = WbsResolver::new(&project)
        .resolve_or_create(&store, &mut ids, &audit, &row)
        .unwrap()
        .unwrap();

    assert_eq!(resumed, WbsOutcome::Existing(created.id()));
    assert_eq!(wbs_rows(&conn), 2);
}

#[test]
fn empty_short_name_means_no_node() {
    let (conn, project) = fixture();
    let store = SqliteProjectStore::new(&conn);
    let mut ids = IdAllocator::seed(&store).unwrap();
    let mut resolver = WbsResolver::new(&project);

    let outcome = resolver
        .resolve_or_create(
            &store,
            &mut ids,
            &AuditStamp::now("tester"),
            &WbsRow::new("  ", "Nameless", ""),
        )
        .unwrap();
    assert_eq!(outcome, None);
    assert_eq!(wbs_rows(&conn), 1);
}

#[test]
fn short_names_without_full_names_never_share_a_node() {
    let (conn, project) = fixture();
    let store = SqliteProjectStore::new(&conn);
    let mut ids = IdAllocator::seed(&store).unwrap();
    let mut resolver = WbsResolver::new(&project);
    let audit = AuditStamp::now("tester");

    for short_name in ["X", "Y"] {
        let err = resolver
            .resolve_or_create(&store, &mut ids, &audit, &WbsRow::new(short_name, " ", ""))
            .unwrap_err();
        assert!(matches!(err, ImportError::UnnamedWbs(ref name) if name == short_name));
    }
    assert_eq!(wbs_rows(&conn), 1);
}

#[test]
fn the_root_short_name_resolves_to_the_project_node() {
    let (conn, project) = fixture();
    let store = SqliteProjectStore::new(&conn);
    let mut ids = IdAllocator::seed(&store).unwrap();
    let mut resolver = WbsResolver::new(&project);

    let outcome = resolver
        .resolve_or_create(
            &store,
            &mut ids,
            &AuditStamp::now("tester"),
            &WbsRow::new("PRJ", "Project Root", ""),
        )
        .unwrap();
    assert_eq!(outcome, Some(WbsOutcome::Cached(project.root_wbs_id)));
}

#[test]
fn the_project_node_has_no_parent() {
    let (conn, project) = fixture();
    assert_eq!(parent_of(&conn, &project.root_short_name), None);
}

#[test]
fn children_are_wired_to_parents_listed_earlier() {
    let (mut conn, project) = fixture();
    let batch = ImportBatch::wbs(vec![
        WbsRow::new("ENG", "Engineering", ""),
        WbsRow::new("ENG.1", "Design", "Engineering"),
        WbsRow::new("ENG.1.1", "Detailed Design", "Design"),
        WbsRow::new("PM", "Management", "Project Root"),
    ]);

    let report = import_batch(&mut conn, &ImportConfig::for_project("PRJ"), &batch).unwrap();
    assert_eq!(report.wbs_created, 4);

    let store = SqliteProjectStore::new(&conn);
    let eng = store
        .find_wbs_by_name(project.proj_id, "Engineering")
        .unwrap()
        .unwrap();
    let design = store
        .find_wbs_by_name(project.proj_id, "Design")
        .unwrap()
        .unwrap();
    assert_eq!(parent_of(&conn, "ENG.1"), Some(eng));
    assert_eq!(parent_of(&conn, "ENG.1.1"), Some(design));
    assert_eq!(parent_of(&conn, "PM"), Some(project.root_wbs_id));

    let (flags, status): (String, String) = conn
        .query_row(
            "SELECT proj_node_flag || sum_data_flag, status_code FROM PROJWBS WHERE wbs_short_name = 'ENG'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(flags, "NY");
    assert_eq!(status, "WS_Active");
}

#[test]
fn a_child_before_its_parent_aborts_the_whole_run() {
    let (mut conn, _) = fixture();
    let batch = ImportBatch::wbs(vec![
        WbsRow::new("ENG", "Engineering", ""),
        WbsRow::new("MECH.1", "Mechanical Design", "Mechanical"),
        WbsRow::new("MECH", "Mechanical", ""),
    ]);

    let err = import_batch(&mut conn, &ImportConfig::for_project("PRJ"), &batch).unwrap_err();
    match err {
        ImportError::MissingParentWbs { parent, child } => {
            assert_eq!(parent, "Mechanical");
            assert_eq!(child, "MECH.1");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(wbs_rows(&conn), 1, "only the project node may remain");
}

#[test]
fn rerunning_a_hierarchy_import_creates_nothing_new() {
    let (mut conn, _) = fixture();
    let config = ImportConfig::for_project("PRJ");
    let batch = ImportBatch::wbs(vec![
        WbsRow::new("ENG", "Engineering", ""),
        WbsRow::new("ENG.1", "Design", "Engineering"),
    ]);

    import_batch(&mut conn, &config, &batch).unwrap();
    let again = import_batch(&mut conn, &config, &batch).unwrap();

    assert_eq!(again.wbs_created, 0);
    assert_eq!(again.wbs_reused, 2);
    assert_eq!(wbs_rows(&conn), 3);
}
