use rusqlite::Connection;
use std::path::Path;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("substitut.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS teachers(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT,
            name_key TEXT NOT NULL,
            email_key TEXT,
            sort_order INTEGER NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_teachers_sort ON teachers(sort_order)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS classes(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            name_key TEXT NOT NULL UNIQUE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS timetable_slots(
            id TEXT PRIMARY KEY,
            weekday INTEGER NOT NULL,
            period INTEGER NOT NULL,
            class_name TEXT NOT NULL,
            subject TEXT NOT NULL,
            teacher_name TEXT,
            teacher_email TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_timetable_slots_weekday ON timetable_slots(weekday)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_timetable_slots_weekday_period ON timetable_slots(weekday, period)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS absences(
            date TEXT NOT NULL,
            teacher_name TEXT,
            teacher_email TEXT,
            teacher_key TEXT NOT NULL,
            PRIMARY KEY(date, teacher_key)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_absences_date ON absences(date)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS substitutions(
            id TEXT PRIMARY KEY,
            date TEXT NOT NULL,
            period INTEGER NOT NULL,
            class_name TEXT NOT NULL,
            class_key TEXT NOT NULL,
            regular_subject TEXT NOT NULL,
            absent_name TEXT,
            absent_email TEXT,
            substitute_name TEXT,
            substitute_email TEXT,
            substitute_key TEXT NOT NULL,
            substitute_subject TEXT NOT NULL,
            updated_at TEXT,
            UNIQUE(date, period, class_key)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_substitutions_date ON substitutions(date)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_substitutions_date_period ON substitutions(date, period)",
        [],
    )?;

    // Early workspaces predate the updated_at column. Add if needed.
    ensure_substitutions_updated_at(&conn)?;

    Ok(conn)
}

fn ensure_substitutions_updated_at(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "substitutions", "updated_at")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE substitutions ADD COLUMN updated_at TEXT", [])?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
