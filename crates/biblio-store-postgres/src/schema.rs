//! SQL schema for the Biblio Postgres store.
//!
//! Executed as one idempotent batch at startup. The unique indexes on
//! `active_key` and `dedupe_key` columns are contractual: nullable uniques
//! rely on the SQL convention that NULLs never collide, which is what lets a
//! terminal row release its logical slot by nulling the key.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS` / `ON CONFLICT`.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS books (
    id               UUID PRIMARY KEY,
    isbn             TEXT NOT NULL UNIQUE,
    title            TEXT NOT NULL,
    author           TEXT NOT NULL,
    genre            TEXT NOT NULL,
    sell_cents       BIGINT NOT NULL CHECK (sell_cents > 0),
    borrow_cents     BIGINT NOT NULL CHECK (borrow_cents > 0),
    stock_cents      BIGINT NOT NULL CHECK (stock_cents > 0),
    available_copies INTEGER NOT NULL CHECK (available_copies >= 0),
    seeded_copies    INTEGER NOT NULL,
    created_at       TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id         UUID PRIMARY KEY,
    email      TEXT NOT NULL UNIQUE,
    created_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS borrows (
    id          UUID PRIMARY KEY,
    user_id     UUID NOT NULL REFERENCES users(id),
    book_id     UUID NOT NULL REFERENCES books(id),
    borrowed_at TIMESTAMPTZ NOT NULL,
    due_at      TIMESTAMPTZ NOT NULL,
    returned_at TIMESTAMPTZ,
    status      TEXT NOT NULL,        -- 'ACTIVE' | 'RETURNED'
    active_key  TEXT UNIQUE           -- '{user_id}:{book_id}' iff ACTIVE
);
CREATE INDEX IF NOT EXISTS borrows_user_idx      ON borrows(user_id);
CREATE INDEX IF NOT EXISTS borrows_user_book_idx ON borrows(user_id, book_id);

CREATE TABLE IF NOT EXISTS purchases (
    id           UUID PRIMARY KEY,
    user_id      UUID NOT NULL REFERENCES users(id),
    book_id      UUID NOT NULL REFERENCES books(id),
    price_cents  BIGINT NOT NULL,
    purchased_at TIMESTAMPTZ NOT NULL,
    canceled_at  TIMESTAMPTZ,
    status       TEXT NOT NULL        -- 'ACTIVE' | 'CANCELED'
);
CREATE INDEX IF NOT EXISTS purchases_user_idx      ON purchases(user_id);
CREATE INDEX IF NOT EXISTS purchases_user_book_idx ON purchases(user_id, book_id);

CREATE TABLE IF NOT EXISTS wallets (
    id                TEXT PRIMARY KEY,
    milestone_reached BOOLEAN NOT NULL DEFAULT FALSE
);
INSERT INTO wallets (id) VALUES ('library-wallet') ON CONFLICT (id) DO NOTHING;

-- Strictly append-only; no UPDATE or DELETE is ever issued.
CREATE TABLE IF NOT EXISTS wallet_movements (
    id             UUID PRIMARY KEY,
    wallet_id      TEXT NOT NULL REFERENCES wallets(id),
    amount_cents   BIGINT NOT NULL,
    movement_type  TEXT NOT NULL,
    reason         TEXT NOT NULL,
    related_entity TEXT,
    dedupe_key     TEXT UNIQUE,
    created_at     TIMESTAMPTZ NOT NULL
);
CREATE INDEX IF NOT EXISTS wallet_movements_created_idx
    ON wallet_movements(wallet_id, created_at);

CREATE TABLE IF NOT EXISTS jobs (
    id           UUID PRIMARY KEY,
    job_type     TEXT NOT NULL,       -- 'RESTOCK' | 'REMINDER'
    status       TEXT NOT NULL,
    payload      JSONB NOT NULL,
    run_at       TIMESTAMPTZ NOT NULL,
    attempts     INTEGER NOT NULL DEFAULT 0,
    max_attempts INTEGER NOT NULL,
    locked_at    TIMESTAMPTZ,
    last_error   TEXT,
    completed_at TIMESTAMPTZ,
    active_key   TEXT UNIQUE,         -- set iff PENDING or PROCESSING
    book_id      UUID REFERENCES books(id) ON DELETE SET NULL,
    borrow_id    UUID UNIQUE REFERENCES borrows(id) ON DELETE SET NULL,
    created_at   TIMESTAMPTZ NOT NULL
);
CREATE INDEX IF NOT EXISTS jobs_due_idx
    ON jobs(run_at) WHERE active_key IS NOT NULL;

CREATE TABLE IF NOT EXISTS events (
    id          UUID PRIMARY KEY,
    event_type  TEXT NOT NULL,
    user_id     UUID REFERENCES users(id)     ON DELETE SET NULL,
    book_id     UUID REFERENCES books(id)     ON DELETE SET NULL,
    borrow_id   UUID REFERENCES borrows(id)   ON DELETE SET NULL,
    purchase_id UUID REFERENCES purchases(id) ON DELETE SET NULL,
    job_id      UUID REFERENCES jobs(id)      ON DELETE SET NULL,
    metadata    JSONB NOT NULL DEFAULT 'null',
    dedupe_key  TEXT UNIQUE,
    created_at  TIMESTAMPTZ NOT NULL
);
CREATE INDEX IF NOT EXISTS events_created_idx ON events(created_at);

CREATE TABLE IF NOT EXISTS simulated_emails (
    id         UUID PRIMARY KEY,
    recipient  TEXT NOT NULL,
    subject    TEXT NOT NULL,
    body       TEXT NOT NULL,
    email_type TEXT NOT NULL,         -- 'LOW_STOCK' | 'REMINDER' | 'MILESTONE'
    dedupe_key TEXT NOT NULL UNIQUE,
    created_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS idempotency_keys (
    key         TEXT NOT NULL,
    user_id     UUID NOT NULL REFERENCES users(id),
    endpoint    TEXT NOT NULL,
    response    JSONB NOT NULL,
    status_code INTEGER NOT NULL,
    expires_at  TIMESTAMPTZ NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (key, user_id, endpoint)
);
";
