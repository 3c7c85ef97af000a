use sqlrepo_core::open_db;

#[test]
fn open_db_enables_foreign_keys_and_persists_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        let enforced: i64 = conn
            .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enforced, 1);
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY); INSERT INTO t DEFAULT VALUES;")
            .unwrap();
    }

    let reopened = open_db(&path).unwrap();
    let count: i64 = reopened
        .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}
