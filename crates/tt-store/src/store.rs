use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use tt_types::time::{format_timestamp, parse_timestamp};
use tt_types::{AssignmentSource, Event, EventKind, ImportedEvent, RawEvent};
use uuid::Uuid;

use crate::records::{SourceStatus, StreamRecord};
use crate::{Error, Result, schema};

/// Chunk size for `IN (...)` and batched updates, kept well under SQLite's
/// host parameter limit.
const BATCH_SIZE: usize = 500;

/// Canonical event order: `(timestamp, tiebreak, id)`. `user_message` sorts
/// after every other type at an equal timestamp; the id keeps replays
/// bitwise reproducible.
const CANONICAL_ORDER: &str =
    "timestamp ASC, CASE WHEN type = 'user_message' THEN 1 ELSE 0 END ASC, id ASC";

/// SQLite-backed event store.
///
/// Not thread-safe. Each thread should open its own `EventStore`.
pub struct EventStore {
    conn: Connection,
}

impl EventStore {
    /// Open or create a database at the given path.
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        let store = Self { conn };
        schema::init(&store.conn)?;
        Ok(store)
    }

    /// Create an in-memory database for testing.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        schema::init(&store.conn)?;
        Ok(store)
    }

    /// Run `f` inside a single transaction; rolled back if it errors.
    pub fn with_transaction<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        let out = f(self)?;
        tx.commit()?;
        Ok(out)
    }

    // --- events ---

    /// Insert a locally ingested event. Returns its content-derived ID.
    /// Inserting the same event twice is a no-op.
    pub fn insert_event(
        &self,
        event: &RawEvent,
        stream_id: Option<&str>,
        assignment_source: AssignmentSource,
    ) -> Result<String> {
        let event_id = event.compute_id();
        let timestamp = normalize_timestamp(&event.timestamp)?;
        let data = serde_json::to_string(&event.data)
            .map_err(|e| Error::Query(format!("unserializable event data: {e}")))?;

        self.conn.execute(
            r#"
            INSERT OR IGNORE INTO events
            (id, timestamp, type, source, schema_version, data, cwd, session_id, stream_id, assignment_source)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                &event_id,
                &timestamp,
                &event.kind,
                &event.source,
                event.schema_version,
                &data,
                &event.cwd,
                &event.session_id,
                &stream_id,
                assignment_source.as_str(),
            ],
        )?;

        Ok(event_id)
    }

    /// Insert an event from a peer collector's export, trusting its ID.
    /// Returns true if the event was new, false if it already existed.
    pub fn insert_imported(&self, event: &ImportedEvent) -> Result<bool> {
        let timestamp = normalize_timestamp(&event.timestamp)?;
        let data = serde_json::to_string(&event.data)
            .map_err(|e| Error::Query(format!("unserializable event data: {e}")))?;

        let inserted = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO events
            (id, timestamp, type, source, schema_version, data, cwd, session_id, stream_id, assignment_source)
            VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6, ?7, NULL, 'imported')
            "#,
            params![
                &event.id,
                &timestamp,
                &event.kind,
                &event.source,
                &data,
                &event.cwd,
                &event.session_id,
            ],
        )?;

        Ok(inserted > 0)
    }

    /// Events with `start <= ts < end`, in canonical order. Either bound may
    /// be absent; `kind` filters by type tag.
    pub fn events_in_range(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        kind: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Event>> {
        let mut sql = String::from("SELECT id, timestamp, type, source, data, cwd, session_id, stream_id, assignment_source FROM events WHERE 1=1");
        let mut query_params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(start) = start {
            sql.push_str(" AND timestamp >= ?");
            query_params.push(Box::new(format_timestamp(start)));
        }
        if let Some(end) = end {
            sql.push_str(" AND timestamp < ?");
            query_params.push(Box::new(format_timestamp(end)));
        }
        if let Some(kind) = kind {
            sql.push_str(" AND type = ?");
            query_params.push(Box::new(kind.to_string()));
        }

        sql.push_str(&format!(" ORDER BY {CANONICAL_ORDER}"));

        if let Some(limit) = limit {
            sql.push_str(" LIMIT ?");
            query_params.push(Box::new(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = query_params.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(param_refs.as_slice(), read_event_row)?;

        rows.collect::<rusqlite::Result<Vec<_>>>()?
            .into_iter()
            .map(decode_event)
            .collect()
    }

    /// Events with no stream that are eligible for inference (user-pinned
    /// events are never revisited).
    pub fn unassigned_events(&self) -> Result<Vec<Event>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT id, timestamp, type, source, data, cwd, session_id, stream_id, assignment_source
            FROM events
            WHERE stream_id IS NULL AND assignment_source != 'user'
            ORDER BY {CANONICAL_ORDER}
            "#
        ))?;

        let rows = stmt.query_map([], read_event_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()?
            .into_iter()
            .map(decode_event)
            .collect()
    }

    /// Assign events to a stream with `assignment_source = inferred`.
    /// Batched; a no-op for empty input. Returns rows updated.
    pub fn assign_events(&self, event_ids: &[String], stream_id: &str) -> Result<usize> {
        self.update_assignment(event_ids, stream_id, AssignmentSource::Inferred)
    }

    /// Pin events to a stream on the user's behalf. Pinned assignments are
    /// never overwritten by inference.
    pub fn pin_events(&self, event_ids: &[String], stream_id: &str) -> Result<usize> {
        self.update_assignment(event_ids, stream_id, AssignmentSource::User)
    }

    fn update_assignment(
        &self,
        event_ids: &[String],
        stream_id: &str,
        source: AssignmentSource,
    ) -> Result<usize> {
        let mut updated = 0;
        for chunk in event_ids.chunks(BATCH_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "UPDATE events SET stream_id = ?, assignment_source = ? WHERE id IN ({placeholders})"
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let params_iter = std::iter::once(stream_id.to_string())
                .chain(std::iter::once(source.as_str().to_string()))
                .chain(chunk.iter().cloned());
            updated += stmt.execute(rusqlite::params_from_iter(params_iter))?;
        }
        Ok(updated)
    }

    /// For each session id that ever appears alongside a stream, the stream
    /// of its earliest such event. Ties at the earliest timestamp resolve to
    /// an arbitrary one of the tied events.
    pub fn session_stream_map(&self) -> Result<HashMap<String, String>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT session_id, stream_id
            FROM events
            WHERE session_id IS NOT NULL AND stream_id IS NOT NULL
            ORDER BY timestamp ASC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut map = HashMap::new();
        for row in rows {
            let (session_id, stream_id) = row?;
            map.entry(session_id).or_insert(stream_id);
        }
        Ok(map)
    }

    /// Total number of stored events.
    pub fn event_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Last event per source, most recent first.
    pub fn last_event_per_source(&self) -> Result<Vec<SourceStatus>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT source, MAX(timestamp) AS last_timestamp, COUNT(*) AS event_count
            FROM events
            GROUP BY source
            ORDER BY last_timestamp DESC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(SourceStatus {
                source: row.get(0)?,
                last_timestamp: row.get(1)?,
                event_count: row.get(2)?,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // --- streams ---

    /// Create a new stream and return its ID.
    pub fn create_stream(&self, name: Option<&str>) -> Result<String> {
        let stream_id = Uuid::new_v4().to_string();
        let now = format_timestamp(Utc::now());
        self.conn.execute(
            "INSERT INTO streams (id, created_at, updated_at, name) VALUES (?1, ?2, ?3, ?4)",
            params![&stream_id, &now, &now, &name],
        )?;
        Ok(stream_id)
    }

    /// All streams, most recently updated first.
    pub fn streams(&self) -> Result<Vec<StreamRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, created_at, updated_at, name FROM streams ORDER BY updated_at DESC, id ASC",
        )?;
        let rows = stmt.query_map([], read_stream_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Find a stream by id prefix. `None` when nothing matches; a distinct
    /// error listing candidates when the prefix is ambiguous.
    pub fn stream_by_prefix(&self, prefix: &str) -> Result<Option<StreamRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, created_at, updated_at, name FROM streams WHERE id LIKE ?1 ORDER BY id LIMIT 3",
        )?;
        let pattern = format!("{prefix}%");
        let mut matches: Vec<StreamRecord> = stmt
            .query_map([&pattern], read_stream_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        match matches.len() {
            0 => Ok(None),
            1 => Ok(Some(matches.remove(0))),
            _ => Err(Error::AmbiguousPrefix {
                prefix: prefix.to_string(),
                candidates: matches.into_iter().map(|s| s.id).collect(),
            }),
        }
    }

    /// Delete a stream. Its events drop back to unassigned (stream_id set
    /// to NULL by the foreign key) and its tag rows are removed.
    pub fn delete_stream(&self, stream_id: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM streams WHERE id = ?1", [stream_id])?;
        Ok(deleted > 0)
    }

    // --- tags ---

    /// Tag a stream. Returns false if the stream already carried the tag.
    pub fn add_tag(&self, stream_id: &str, tag: &str) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO stream_tags (stream_id, tag) VALUES (?1, ?2)",
            params![stream_id, tag],
        )?;
        Ok(inserted > 0)
    }

    /// Remove a tag from a stream. Returns false if it wasn't there.
    pub fn remove_tag(&self, stream_id: &str, tag: &str) -> Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM stream_tags WHERE stream_id = ?1 AND tag = ?2",
            params![stream_id, tag],
        )?;
        Ok(removed > 0)
    }

    /// Tags per stream, for the given streams or for all of them.
    pub fn stream_tags(&self, stream_ids: Option<&[String]>) -> Result<HashMap<String, Vec<String>>> {
        let mut tags: HashMap<String, Vec<String>> = HashMap::new();

        let mut collect = |sql: &str, chunk: &[String]| -> Result<()> {
            let mut stmt = self.conn.prepare(sql)?;
            let rows = stmt.query_map(
                rusqlite::params_from_iter(chunk.iter()),
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )?;
            for row in rows {
                let (stream_id, tag) = row?;
                tags.entry(stream_id).or_default().push(tag);
            }
            Ok(())
        };

        match stream_ids {
            None => collect(
                "SELECT stream_id, tag FROM stream_tags ORDER BY stream_id, tag",
                &[],
            )?,
            Some(ids) => {
                for chunk in ids.chunks(BATCH_SIZE) {
                    let placeholders = vec!["?"; chunk.len()].join(", ");
                    let sql = format!(
                        "SELECT stream_id, tag FROM stream_tags WHERE stream_id IN ({placeholders}) ORDER BY stream_id, tag"
                    );
                    collect(&sql, chunk)?;
                }
            }
        }

        Ok(tags)
    }

    /// Most-used tags with their stream counts.
    pub fn top_tags(&self, limit: usize) -> Result<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT tag, COUNT(*) AS stream_count
            FROM stream_tags
            GROUP BY tag
            ORDER BY stream_count DESC, tag ASC
            LIMIT ?1
            "#,
        )?;
        let rows = stmt.query_map([limit as i64], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Streams that carry no tags at all.
    pub fn untagged_streams(&self) -> Result<Vec<StreamRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT s.id, s.created_at, s.updated_at, s.name
            FROM streams s
            LEFT JOIN stream_tags t ON s.id = t.stream_id
            WHERE t.stream_id IS NULL
            ORDER BY s.updated_at DESC, s.id ASC
            "#,
        )?;
        let rows = stmt.query_map([], read_stream_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn normalize_timestamp(value: &str) -> Result<String> {
    parse_timestamp(value)
        .map(format_timestamp)
        .ok_or_else(|| Error::Query(format!("invalid timestamp: {value}")))
}

/// Raw row image; decoding into domain types happens outside the rusqlite
/// closure so parse failures surface as store errors, not row errors.
struct EventRow {
    id: String,
    timestamp: String,
    kind: String,
    source: String,
    data: String,
    cwd: Option<String>,
    session_id: Option<String>,
    stream_id: Option<String>,
    assignment_source: String,
}

fn read_event_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        kind: row.get(2)?,
        source: row.get(3)?,
        data: row.get(4)?,
        cwd: row.get(5)?,
        session_id: row.get(6)?,
        stream_id: row.get(7)?,
        assignment_source: row.get(8)?,
    })
}

fn decode_event(row: EventRow) -> Result<Event> {
    let timestamp = parse_timestamp(&row.timestamp)
        .ok_or_else(|| Error::Query(format!("corrupt timestamp for event {}", row.id)))?;
    let data = serde_json::from_str(&row.data)
        .map_err(|e| Error::Query(format!("corrupt data for event {}: {e}", row.id)))?;
    let assignment_source = AssignmentSource::parse(&row.assignment_source)
        .ok_or_else(|| Error::Query(format!("corrupt assignment source for event {}", row.id)))?;

    Ok(Event {
        id: row.id,
        timestamp,
        kind: EventKind::parse(&row.kind),
        source: row.source,
        data,
        cwd: row.cwd,
        session_id: row.session_id,
        stream_id: row.stream_id,
        assignment_source,
    })
}

fn read_stream_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StreamRecord> {
    Ok(StreamRecord {
        id: row.get(0)?,
        created_at: row.get(1)?,
        updated_at: row.get(2)?,
        name: row.get(3)?,
    })
}
