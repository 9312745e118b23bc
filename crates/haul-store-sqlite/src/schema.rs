//! SQL schema for the haul SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! layout so later migrations can be gated on it.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id          TEXT PRIMARY KEY,          -- identity provider subject
    name        TEXT NOT NULL DEFAULT '',
    surname     TEXT NOT NULL DEFAULT '',
    role        TEXT NOT NULL DEFAULT 'client'
                CHECK (role IN ('client', 'carrier', 'admin')),
    avatar_ref  TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS client_profiles (
    profile_id  TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    national_id TEXT NOT NULL UNIQUE,
    phone       TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS addresses (
    address_id  TEXT PRIMARY KEY,
    profile_id  TEXT NOT NULL REFERENCES client_profiles(profile_id) ON DELETE CASCADE,
    street      TEXT NOT NULL,
    city        TEXT NOT NULL,
    notes       TEXT NOT NULL DEFAULT '',
    country     TEXT NOT NULL DEFAULT 'Ecuador',
    latitude    REAL NOT NULL CHECK (latitude  BETWEEN  -90 AND  90),
    longitude   REAL NOT NULL CHECK (longitude BETWEEN -180 AND 180),
    is_default  INTEGER NOT NULL DEFAULT 0 CHECK (is_default IN (0, 1)),
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

-- At most one default address per profile.
CREATE UNIQUE INDEX IF NOT EXISTS addresses_one_default_idx
    ON addresses(profile_id) WHERE is_default = 1;
CREATE INDEX IF NOT EXISTS addresses_profile_idx ON addresses(profile_id);

CREATE TABLE IF NOT EXISTS zones (
    zone_id     TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    city        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS carriers (
    carrier_id       TEXT PRIMARY KEY,
    user_id          TEXT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    vehicle_type     TEXT NOT NULL,
    plate            TEXT NOT NULL UNIQUE,
    cargo_capacity   REAL NOT NULL CHECK (cargo_capacity > 0),
    status           TEXT NOT NULL DEFAULT 'pending'
                     CHECK (status IN ('pending', 'active', 'inactive', 'suspended')),
    assigned_zone_id TEXT REFERENCES zones(zone_id),
    average_rating   REAL NOT NULL DEFAULT 0 CHECK (average_rating >= 0),
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS carriers_status_idx  ON carriers(status);
CREATE INDEX IF NOT EXISTS carriers_zone_idx    ON carriers(assigned_zone_id);
CREATE INDEX IF NOT EXISTS carriers_created_idx ON carriers(created_at);

PRAGMA user_version = 1;
";
