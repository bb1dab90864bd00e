use rusqlite::Connection;

pub(crate) fn init(conn: &Connection) -> rusqlite::Result<()> {
    // Needed for ON DELETE CASCADE; SQLite leaves it off per connection.
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS files (
          id TEXT PRIMARY KEY,
          owner_id TEXT NOT NULL,
          original_file_name TEXT NOT NULL,
          content_md5 TEXT NOT NULL,
          version INTEGER NOT NULL DEFAULT 1,
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_files_owner_created ON files(owner_id, created_at);

        CREATE TABLE IF NOT EXISTS sheets (
          file_id TEXT NOT NULL REFERENCES files(id) ON DELETE CASCADE,
          position INTEGER NOT NULL,
          name TEXT NOT NULL,
          column_headers TEXT NOT NULL,
          rows_json TEXT NOT NULL,
          PRIMARY KEY (file_id, name)
        );

        CREATE INDEX IF NOT EXISTS idx_sheets_file_position ON sheets(file_id, position);

        CREATE TABLE IF NOT EXISTS api_tokens (
          token TEXT PRIMARY KEY,
          owner_id TEXT NOT NULL,
          expires_at TEXT
        );
        "#,
    )
}
