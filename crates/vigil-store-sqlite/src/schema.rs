//! SQL schema for the Vigil SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per configured group. NULL columns read as policy defaults.
CREATE TABLE IF NOT EXISTS group_policies (
    group_id            INTEGER PRIMARY KEY,
    delete_profane      INTEGER,
    delete_edited       INTEGER,
    delete_links        INTEGER,
    delete_biolink      INTEGER,
    profane_threshold   INTEGER,
    profane_punishment  TEXT,     -- 'mute' | 'ban'
    biolink_threshold   INTEGER,
    biolink_punishment  TEXT
);

CREATE TABLE IF NOT EXISTS notification_ttls (
    group_id  INTEGER PRIMARY KEY,
    minutes   INTEGER NOT NULL DEFAULT 0
);

-- Warning counters; only ever incremented by one or reset to zero.
CREATE TABLE IF NOT EXISTS warnings (
    group_id  INTEGER NOT NULL,
    user_id   INTEGER NOT NULL,
    category  TEXT    NOT NULL,  -- 'profane' | 'biolink'
    count     INTEGER NOT NULL DEFAULT 0 CHECK (count >= 0),
    PRIMARY KEY (group_id, user_id, category)
);

CREATE TABLE IF NOT EXISTS whitelist (
    group_id  INTEGER NOT NULL,
    user_id   INTEGER NOT NULL,
    added_at  TEXT    NOT NULL,
    PRIMARY KEY (group_id, user_id)
);

CREATE TABLE IF NOT EXISTS users (
    user_id     INTEGER PRIMARY KEY,
    username    TEXT,
    first_name  TEXT NOT NULL,
    last_seen   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS groups (
    group_id   INTEGER PRIMARY KEY,
    title      TEXT,
    active     INTEGER NOT NULL DEFAULT 1,
    last_seen  TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS profanity_vocabulary (
    token  TEXT PRIMARY KEY
);

CREATE INDEX IF NOT EXISTS users_username_idx ON users(username COLLATE NOCASE);

PRAGMA user_version = 1;
";
