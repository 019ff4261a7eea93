use time::OffsetDateTime;

use crate::message::{ChannelId, NewMessage, RemoteMessage, Role, Sender, ServerId, UserId};

use super::Connection;

pub struct Messages<'a> {
    conn: &'a Connection,
}

impl<'a> Messages<'a> {
    pub(in crate::store) const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Stores `msg` with the given creation time.
    ///
    /// Timestamps are kept with millisecond precision, the returned record
    /// carries the truncated value so it matches later reads.
    pub fn insert(
        &self,
        msg: &NewMessage,
        created_at: OffsetDateTime,
    ) -> rusqlite::Result<RemoteMessage> {
        let Connection { conn, .. } = self.conn;

        let mut stmt = conn.prepare(
            r#"
                insert into messages(
                    class_id, user_id, user_name, user_avatar, user_role, body, created_at
                ) values (
                    :class_id, :user_id, :user_name, :user_avatar, :user_role, :body, :created_at
                );
            "#,
        )?;

        let created_at = to_millis(created_at);
        stmt.execute(rusqlite::named_params! {
            ":class_id": msg.channel.0 as i64,
            ":user_id": msg.sender.id.0 as i64,
            ":user_name": msg.sender.name,
            ":user_avatar": msg.sender.avatar,
            ":user_role": msg.sender.role.as_str(),
            ":body": msg.body,
            ":created_at": created_at,
        })?;

        Ok(RemoteMessage {
            id: ServerId(conn.last_insert_rowid() as u64),
            channel: msg.channel,
            user: msg.sender.clone(),
            body: msg.body.clone(),
            created_at: from_millis(created_at)
                .map_err(|err| conversion_failure(7, err))?,
        })
    }

    pub fn get(&self, id: ServerId) -> rusqlite::Result<Option<RemoteMessage>> {
        let Connection { conn, .. } = self.conn;

        let mut stmt = conn.prepare("select * from messages where id = :id;")?;
        let mut rows = stmt.query_map(
            rusqlite::named_params! {":id": id.0 as i64},
            Self::message_from_row,
        )?;
        rows.next().transpose()
    }

    /// The most recent `limit` messages of `channel`, oldest first.
    pub fn list_recent(
        &self,
        channel: ChannelId,
        limit: usize,
    ) -> rusqlite::Result<Vec<RemoteMessage>> {
        self.get_many(
            "select * from(
                    select * from messages
                    where class_id = :class_id
                    order by created_at desc, id desc
                    limit :limit
                ) order by created_at asc, id asc;",
            rusqlite::named_params! {
                ":class_id": channel.0 as i64,
                ":limit": limit.min(i64::MAX as usize) as i64,
            },
        )
    }

    /// Messages of `channel` created strictly after `since`, oldest first.
    ///
    /// Rows are stored at millisecond resolution, so a `since` inside a
    /// millisecond also matches the rows stored at that millisecond.
    pub fn list_since(
        &self,
        channel: ChannelId,
        since: OffsetDateTime,
    ) -> rusqlite::Result<Vec<RemoteMessage>> {
        self.get_many(
            "select * from messages
                where class_id = :class_id and created_at > :since
                order by created_at asc, id asc;",
            rusqlite::named_params! {
                ":class_id": channel.0 as i64,
                ":since": exclusive_bound(since),
            },
        )
    }

    pub fn update_body(&self, id: ServerId, body: &str) -> rusqlite::Result<bool> {
        let Connection { conn, .. } = self.conn;

        let mut stmt = conn.prepare("update messages set body = :body where id = :id;")?;
        stmt.execute(rusqlite::named_params! {":id": id.0 as i64, ":body": body})
            .map(|changed| changed == 1)
    }

    pub fn delete(&self, id: ServerId) -> rusqlite::Result<bool> {
        let Connection { conn, .. } = self.conn;

        let mut stmt = conn.prepare("delete from messages where id = :id;")?;
        stmt.execute(rusqlite::named_params! {":id": id.0 as i64})
            .map(|changed| changed == 1)
    }

    fn get_many(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> rusqlite::Result<Vec<RemoteMessage>> {
        let Connection { conn, .. } = self.conn;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, Self::message_from_row)?;
        rows.collect()
    }

    fn message_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RemoteMessage> {
        let created_at: i64 = row.get("created_at")?;
        let role: String = row.get("user_role")?;

        Ok(RemoteMessage {
            id: ServerId(row.get::<_, i64>("id")? as u64),
            channel: ChannelId(row.get::<_, i64>("class_id")? as u64),
            user: Sender {
                id: UserId(row.get::<_, i64>("user_id")? as u64),
                name: row.get("user_name")?,
                avatar: row.get("user_avatar")?,
                role: role.parse().unwrap_or(Role::Unknown),
            },
            body: row.get("body")?,
            created_at: from_millis(created_at).map_err(|err| conversion_failure(7, err))?,
        })
    }
}

fn to_millis(ts: OffsetDateTime) -> i64 {
    (ts.unix_timestamp_nanos() / 1_000_000) as i64
}

fn exclusive_bound(since: OffsetDateTime) -> i64 {
    match since.unix_timestamp_nanos() % 1_000_000 {
        0 => to_millis(since),
        _ => to_millis(since) - 1,
    }
}

fn from_millis(ms: i64) -> Result<OffsetDateTime, time::error::ComponentRange> {
    OffsetDateTime::from_unix_timestamp_nanos(ms as i128 * 1_000_000)
}

fn conversion_failure(column: usize, err: time::error::ComponentRange) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Integer, Box::new(err))
}
