//! [`SqliteStore`]: the SQLite implementation of [`ModerationStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use vigil_core::{
  chat::{ChatId, UserId},
  policy::{Category, GroupPolicy, PolicyChange},
  profanity::normalize,
  store::{GroupRecord, ModerationStore, UserRecord},
};

use crate::{
  encode::{encode_category, encode_dt, RawGroup, RawPolicy, RawUser},
  schema::SCHEMA,
  Error, Result,
};

// ─── Row helpers (run on the connection thread) ──────────────────────────────

fn read_policy(conn: &rusqlite::Connection, group: i64) -> rusqlite::Result<Option<RawPolicy>> {
  let row = conn
    .query_row(
      "SELECT delete_profane, delete_edited, delete_links, delete_biolink,
              profane_threshold, profane_punishment,
              biolink_threshold, biolink_punishment
       FROM group_policies WHERE group_id = ?1",
      rusqlite::params![group],
      |row| {
        Ok(RawPolicy {
          delete_profane:     row.get(0)?,
          delete_edited:      row.get(1)?,
          delete_links:       row.get(2)?,
          delete_biolink:     row.get(3)?,
          profane_threshold:  row.get(4)?,
          profane_punishment: row.get(5)?,
          biolink_threshold:  row.get(6)?,
          biolink_punishment: row.get(7)?,
          ttl_minutes:        None,
        })
      },
    )
    .optional()?;

  let ttl: Option<u16> = conn
    .query_row(
      "SELECT minutes FROM notification_ttls WHERE group_id = ?1",
      rusqlite::params![group],
      |row| row.get(0),
    )
    .optional()?;

  Ok(match (row, ttl) {
    (None, None) => None,
    (Some(mut raw), ttl) => {
      raw.ttl_minutes = ttl;
      Some(raw)
    }
    (None, ttl) => Some(RawPolicy {
      delete_profane:     None,
      delete_edited:      None,
      delete_links:       None,
      delete_biolink:     None,
      profane_threshold:  None,
      profane_punishment: None,
      biolink_threshold:  None,
      biolink_punishment: None,
      ttl_minutes:        ttl,
    }),
  })
}

fn write_policy(conn: &rusqlite::Connection, group: i64, raw: &RawPolicy) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO group_policies (
       group_id, delete_profane, delete_edited, delete_links, delete_biolink,
       profane_threshold, profane_punishment, biolink_threshold, biolink_punishment
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
     ON CONFLICT(group_id) DO UPDATE SET
       delete_profane     = excluded.delete_profane,
       delete_edited      = excluded.delete_edited,
       delete_links       = excluded.delete_links,
       delete_biolink     = excluded.delete_biolink,
       profane_threshold  = excluded.profane_threshold,
       profane_punishment = excluded.profane_punishment,
       biolink_threshold  = excluded.biolink_threshold,
       biolink_punishment = excluded.biolink_punishment",
    rusqlite::params![
      group,
      raw.delete_profane,
      raw.delete_edited,
      raw.delete_links,
      raw.delete_biolink,
      raw.profane_threshold,
      raw.profane_punishment,
      raw.biolink_threshold,
      raw.biolink_punishment,
    ],
  )?;
  conn.execute(
    "INSERT INTO notification_ttls (group_id, minutes) VALUES (?1, ?2)
     ON CONFLICT(group_id) DO UPDATE SET minutes = excluded.minutes",
    rusqlite::params![group, raw.ttl_minutes.unwrap_or(0)],
  )?;
  Ok(())
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    user_id:    row.get(0)?,
    username:   row.get(1)?,
    first_name: row.get(2)?,
    last_seen:  row.get(3)?,
  })
}

/// Carry a domain error out of a connection closure.
fn boxed(e: Error) -> tokio_rusqlite::Error { tokio_rusqlite::Error::Other(Box::new(e)) }

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Vigil moderation store backed by a single SQLite file.
///
/// Clones share one reference-counted connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a fresh in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ModerationStore impl ────────────────────────────────────────────────────

impl ModerationStore for SqliteStore {
  type Error = Error;

  // ── Policies ──────────────────────────────────────────────────────────────

  async fn get_policy(&self, group: ChatId) -> Result<Option<GroupPolicy>> {
    let raw = self
      .conn
      .call(move |conn| Ok(read_policy(conn, group.0)?))
      .await?;
    raw.map(RawPolicy::into_policy).transpose()
  }

  async fn update_policy(&self, group: ChatId, change: PolicyChange) -> Result<GroupPolicy> {
    let policy = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut policy = match read_policy(&tx, group.0)? {
          Some(raw) => raw.into_policy().map_err(boxed)?,
          None => GroupPolicy::default(),
        };
        policy.apply(change);
        write_policy(&tx, group.0, &RawPolicy::from_policy(&policy))?;
        tx.commit()?;
        Ok(policy)
      })
      .await?;
    Ok(policy)
  }

  // ── Warning ledger ────────────────────────────────────────────────────────

  async fn increment_warning(&self, group: ChatId, user: UserId, category: Category) -> Result<u32> {
    let category = encode_category(category);

    let count = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "INSERT INTO warnings (group_id, user_id, category, count)
           VALUES (?1, ?2, ?3, 1)
           ON CONFLICT(group_id, user_id, category) DO UPDATE SET count = count + 1
           RETURNING count",
          rusqlite::params![group.0, user.0, category],
          |row| row.get(0),
        )?)
      })
      .await?;
    Ok(count)
  }

  async fn warning_count(&self, group: ChatId, user: UserId, category: Category) -> Result<u32> {
    let category = encode_category(category);

    let count: Option<u32> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT count FROM warnings
             WHERE group_id = ?1 AND user_id = ?2 AND category = ?3",
            rusqlite::params![group.0, user.0, category],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;
    Ok(count.unwrap_or(0))
  }

  async fn reset_warnings(&self, group: ChatId, user: UserId) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE warnings SET count = 0 WHERE group_id = ?1 AND user_id = ?2",
          rusqlite::params![group.0, user.0],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Whitelist ─────────────────────────────────────────────────────────────

  async fn add_whitelist(&self, group: ChatId, user: UserId) -> Result<bool> {
    let at_str = encode_dt(Utc::now());

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO whitelist (group_id, user_id, added_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![group.0, user.0, at_str],
        )?)
      })
      .await?;
    Ok(inserted > 0)
  }

  async fn remove_whitelist(&self, group: ChatId, user: UserId) -> Result<bool> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM whitelist WHERE group_id = ?1 AND user_id = ?2",
          rusqlite::params![group.0, user.0],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  async fn is_whitelisted(&self, group: ChatId, user: UserId) -> Result<bool> {
    let found = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT 1 FROM whitelist WHERE group_id = ?1 AND user_id = ?2",
            rusqlite::params![group.0, user.0],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false))
      })
      .await?;
    Ok(found)
  }

  async fn list_whitelist(&self, group: ChatId) -> Result<Vec<UserId>> {
    let ids: Vec<u64> = self
      .conn
      .call(move |conn| {
        let mut stmt =
          conn.prepare("SELECT user_id FROM whitelist WHERE group_id = ?1 ORDER BY rowid")?;
        let rows = stmt
          .query_map(rusqlite::params![group.0], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(ids.into_iter().map(UserId).collect())
  }

  // ── Registries ────────────────────────────────────────────────────────────

  async fn upsert_user(&self, user: UserRecord) -> Result<()> {
    let seen_str = encode_dt(user.last_seen);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, username, first_name, last_seen)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT(user_id) DO UPDATE SET
             username   = excluded.username,
             first_name = excluded.first_name,
             last_seen  = excluded.last_seen",
          rusqlite::params![user.user_id.0, user.username, user.first_name, seen_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_user(&self, user: UserId) -> Result<Option<UserRecord>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, username, first_name, last_seen FROM users WHERE user_id = ?1",
            rusqlite::params![user.0],
            user_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_record).transpose()
  }

  async fn find_user_by_username(&self, username: String) -> Result<Option<UserRecord>> {
    let handle = username.trim_start_matches('@').to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        // A handle may have changed owners; the most recent sighting wins.
        Ok(conn
          .query_row(
            "SELECT user_id, username, first_name, last_seen FROM users
             WHERE username = ?1 COLLATE NOCASE
             ORDER BY last_seen DESC LIMIT 1",
            rusqlite::params![handle],
            user_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_record).transpose()
  }

  async fn upsert_group(&self, group: GroupRecord) -> Result<()> {
    let seen_str = encode_dt(group.last_seen);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO groups (group_id, title, active, last_seen)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT(group_id) DO UPDATE SET
             title     = excluded.title,
             active    = excluded.active,
             last_seen = excluded.last_seen",
          rusqlite::params![group.group_id.0, group.title, group.active, seen_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn deactivate_group(&self, group: ChatId) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE groups SET active = 0 WHERE group_id = ?1",
          rusqlite::params![group.0],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_group(&self, group: ChatId) -> Result<Option<GroupRecord>> {
    let raw: Option<RawGroup> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT group_id, title, active, last_seen FROM groups WHERE group_id = ?1",
            rusqlite::params![group.0],
            |row| {
              Ok(RawGroup {
                group_id:  row.get(0)?,
                title:     row.get(1)?,
                active:    row.get(2)?,
                last_seen: row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawGroup::into_record).transpose()
  }

  // ── Vocabulary ────────────────────────────────────────────────────────────

  async fn vocabulary(&self) -> Result<Vec<String>> {
    let tokens = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT token FROM profanity_vocabulary ORDER BY token")?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(tokens)
  }

  async fn add_vocabulary(&self, tokens: Vec<String>) -> Result<usize> {
    let normalized: Vec<String> = tokens
      .iter()
      .map(|t| normalize(t))
      .filter(|t| !t.is_empty())
      .collect();

    let added = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut added = 0;
        {
          let mut stmt = tx.prepare("INSERT OR IGNORE INTO profanity_vocabulary (token) VALUES (?1)")?;
          for token in &normalized {
            added += stmt.execute(rusqlite::params![token])?;
          }
        }
        tx.commit()?;
        Ok(added)
      })
      .await?;
    Ok(added)
  }
}
