//! SQL schema for the gym SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
///
/// Timestamps are fixed-width RFC 3339 UTC strings and dates are
/// `YYYY-MM-DD`, so plain string comparison orders them chronologically.
/// Prices are decimal strings.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS accounts (
    account_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    code            TEXT NOT NULL UNIQUE,     -- U###
    first_name      TEXT NOT NULL,
    last_name       TEXT NOT NULL,
    email           TEXT NOT NULL UNIQUE,
    phone           TEXT,
    address         TEXT,
    gender          TEXT,                     -- 'M' | 'F' | 'O'
    document_type   TEXT,                     -- 'CC' | 'CE' | 'TI' | 'PP' | 'DIE'
    document_number TEXT NOT NULL UNIQUE,
    birth_date      TEXT NOT NULL,
    role            TEXT NOT NULL,            -- 'admin' | 'trainer' | 'client'
    password_hash   TEXT NOT NULL,
    active          INTEGER NOT NULL DEFAULT 1,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS clients (
    client_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    code          TEXT NOT NULL UNIQUE,       -- P###
    account_id    INTEGER UNIQUE REFERENCES accounts(account_id),
    holder_id     INTEGER REFERENCES clients(client_id),
    relationship  TEXT,
    active        INTEGER NOT NULL DEFAULT 1,
    registered_at TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    CHECK (holder_id IS NULL OR holder_id != client_id)
);

CREATE TABLE IF NOT EXISTS emergency_contacts (
    contact_id          INTEGER PRIMARY KEY AUTOINCREMENT,
    client_id           INTEGER NOT NULL REFERENCES clients(client_id) ON DELETE CASCADE,
    name                TEXT NOT NULL,
    phone               TEXT NOT NULL,
    relationship        TEXT,
    same_as_beneficiary INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS memberships (
    membership_id INTEGER PRIMARY KEY AUTOINCREMENT,
    code          TEXT NOT NULL UNIQUE,       -- M###
    name          TEXT NOT NULL UNIQUE,
    description   TEXT,
    access_days   INTEGER NOT NULL CHECK (access_days >= 1),
    validity_days INTEGER NOT NULL CHECK (validity_days >= 1),
    price         TEXT NOT NULL,
    active        INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS contracts (
    contract_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    code          TEXT NOT NULL UNIQUE,       -- C####
    client_id     INTEGER NOT NULL REFERENCES clients(client_id),
    membership_id INTEGER NOT NULL REFERENCES memberships(membership_id),
    start_date    TEXT NOT NULL,
    end_date      TEXT NOT NULL,
    price         TEXT NOT NULL,
    status        TEXT NOT NULL,
    renewed_from  INTEGER REFERENCES contracts(contract_id),
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    created_by    INTEGER REFERENCES accounts(account_id),
    updated_by    INTEGER REFERENCES accounts(account_id),
    CHECK (end_date > start_date)
);

-- Contract history is strictly append-only; the triggers below reject any
-- UPDATE or DELETE against it.
CREATE TABLE IF NOT EXISTS contract_history (
    history_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    contract_id     INTEGER NOT NULL REFERENCES contracts(contract_id),
    previous_status TEXT,                     -- NULL for the creation entry
    new_status      TEXT NOT NULL,
    changed_at      TEXT NOT NULL,
    actor_id        INTEGER REFERENCES accounts(account_id),
    reason          TEXT NOT NULL
);

CREATE TRIGGER IF NOT EXISTS contract_history_no_update
BEFORE UPDATE ON contract_history
BEGIN
    SELECT RAISE(ABORT, 'contract history is append-only');
END;

CREATE TRIGGER IF NOT EXISTS contract_history_no_delete
BEFORE DELETE ON contract_history
BEGIN
    SELECT RAISE(ABORT, 'contract history is append-only');
END;

CREATE TABLE IF NOT EXISTS training_sessions (
    session_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL,
    description TEXT,
    start_at    TEXT NOT NULL,
    end_at      TEXT NOT NULL,
    trainer_id  INTEGER NOT NULL REFERENCES accounts(account_id),
    client_id   INTEGER NOT NULL REFERENCES clients(client_id),
    status      TEXT NOT NULL DEFAULT 'scheduled',
    notes       TEXT,
    created_at  TEXT NOT NULL,
    CHECK (end_at > start_at)
);

CREATE INDEX IF NOT EXISTS clients_holder_idx      ON clients(holder_id);
CREATE INDEX IF NOT EXISTS contacts_client_idx     ON emergency_contacts(client_id);
CREATE INDEX IF NOT EXISTS contracts_client_idx    ON contracts(client_id);
CREATE INDEX IF NOT EXISTS history_contract_idx    ON contract_history(contract_id);
CREATE INDEX IF NOT EXISTS sessions_trainer_idx    ON training_sessions(trainer_id, start_at);
CREATE INDEX IF NOT EXISTS sessions_client_idx     ON training_sessions(client_id, start_at);

PRAGMA user_version = 1;
";
