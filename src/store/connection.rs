use std::path::Path;

use super::Messages;

pub struct Connection {
    pub(in crate::store) conn: rusqlite::Connection,
}

impl Connection {
    const SCHEMA: &str = "
        create table if not exists messages(
            id          integer primary key autoincrement,
            class_id    integer not null,
            user_id     integer not null,
            user_name   text not null,
            user_avatar text,
            user_role   text not null,
            body        text not null,
            created_at  integer not null
        );
        create index if not exists messages_by_class
            on messages(class_id, created_at);
    ";

    pub fn open(path: impl AsRef<Path>) -> rusqlite::Result<Self> {
        Self::create(rusqlite::Connection::open(path)?)
    }

    pub fn in_memory() -> rusqlite::Result<Self> {
        Self::create(rusqlite::Connection::open_in_memory()?)
    }

    fn create(conn: rusqlite::Connection) -> rusqlite::Result<Self> {
        let this = Self { conn };
        this.ensure_table()?;
        Ok(this)
    }

    fn ensure_table(&self) -> rusqlite::Result<()> {
        let Self { conn, .. } = self;
        conn.execute_batch(Self::SCHEMA)
    }

    pub const fn messages(&self) -> Messages<'_> {
        Messages::new(self)
    }
}
