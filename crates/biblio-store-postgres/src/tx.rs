//! [`Tx`] — a serializable transaction plus every typed query in the system.
//!
//! Higher layers never see SQL; they compose these methods between
//! [`Tx::begin`] and [`Tx::commit`]. All timestamps are supplied by the
//! caller so a whole operation shares one clock reading.

use biblio_core::{
  book::{Book, BookQuery, NewBook},
  circulation::{self, Borrow},
  email::{NewEmail, SimulatedEmail},
  event::{Event, NewEvent},
  idempotency::IdempotencyRecord,
  job::{
    self, Job, JobStatus, JobType, DEFAULT_MAX_ATTEMPTS, HANDLER_TIMEOUT_SECS,
  },
  keys,
  page::{PageRequest, Paginated},
  purchase::Purchase,
  user::User,
  wallet::{
    MovementDirection, MovementQuery, NewMovement, Wallet, WalletMovement,
    WALLET_ID,
  },
};
use chrono::{DateTime, Duration, Utc};
use tokio_postgres::{Client, IsolationLevel, Transaction};
use uuid::Uuid;

use crate::{
  row::{
    self, BOOK_COLUMNS, BORROW_COLUMNS, EMAIL_COLUMNS, EVENT_COLUMNS,
    JOB_COLUMNS, MOVEMENT_COLUMNS, PURCHASE_COLUMNS,
  },
  Error, Result,
};

// ─── Transaction wrapper ─────────────────────────────────────────────────────

/// One serializable transaction. Rolls back on drop unless committed.
pub struct Tx<'a> {
  inner: Transaction<'a>,
}

impl<'a> Tx<'a> {
  pub async fn begin(client: &'a mut Client) -> Result<Tx<'a>> {
    let inner = client
      .build_transaction()
      .isolation_level(IsolationLevel::Serializable)
      .start()
      .await?;
    // Bound the whole transaction server-side; the runner additionally
    // enforces the handler timeout client-side.
    inner
      .batch_execute(&format!(
        "SET LOCAL statement_timeout = '{HANDLER_TIMEOUT_SECS}s'; \
         SET LOCAL idle_in_transaction_session_timeout = \
         '{HANDLER_TIMEOUT_SECS}s'"
      ))
      .await?;
    Ok(Self { inner })
  }

  pub async fn commit(self) -> Result<()> {
    self.inner.commit().await?;
    Ok(())
  }

  /// Serialize all state-changing operations of one user for the duration
  /// of this transaction.
  pub async fn lock_user(&self, email: &str) -> Result<()> {
    let key = keys::user_lock_key(email);
    self
      .inner
      .execute("SELECT pg_advisory_xact_lock($1)", &[&key])
      .await?;
    Ok(())
  }

  // ─── Books ─────────────────────────────────────────────────────────────────

  pub async fn book_by_isbn(&self, isbn: &str) -> Result<Option<Book>> {
    let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE isbn = $1");
    let opt = self.inner.query_opt(sql.as_str(), &[&isbn]).await?;
    opt.as_ref().map(row::book).transpose()
  }

  pub async fn book_by_id(&self, id: Uuid) -> Result<Option<Book>> {
    let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = $1");
    let opt = self.inner.query_opt(sql.as_str(), &[&id]).await?;
    opt.as_ref().map(row::book).transpose()
  }

  /// Conditionally take one copy off the shelf. Returns the post-decrement
  /// copy count, or `None` when no copy was available (zero rows affected).
  pub async fn take_copy(&self, isbn: &str) -> Result<Option<i32>> {
    let opt = self
      .inner
      .query_opt(
        "UPDATE books SET available_copies = available_copies - 1 \
         WHERE isbn = $1 AND available_copies >= 1 \
         RETURNING available_copies",
        &[&isbn],
      )
      .await?;
    Ok(opt.map(|r| r.get(0)))
  }

  /// Put one copy back. Unconditional; returns may exceed `seeded_copies`.
  pub async fn release_copy(&self, book_id: Uuid) -> Result<i32> {
    let row = self
      .inner
      .query_one(
        "UPDATE books SET available_copies = available_copies + 1 \
         WHERE id = $1 RETURNING available_copies",
        &[&book_id],
      )
      .await?;
    Ok(row.get(0))
  }

  /// Add `count` copies during restock delivery.
  pub async fn add_copies(&self, book_id: Uuid, count: i32) -> Result<i32> {
    let row = self
      .inner
      .query_one(
        "UPDATE books SET available_copies = available_copies + $2 \
         WHERE id = $1 RETURNING available_copies",
        &[&book_id, &count],
      )
      .await?;
    Ok(row.get(0))
  }

  /// Seed-path insert; a book that already exists is left untouched.
  pub async fn insert_book_if_absent(
    &self,
    new: &NewBook,
    now: DateTime<Utc>,
  ) -> Result<Option<Book>> {
    let sql = format!(
      "INSERT INTO books ({BOOK_COLUMNS}) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
       ON CONFLICT (isbn) DO NOTHING \
       RETURNING {BOOK_COLUMNS}"
    );
    let opt = self
      .inner
      .query_opt(sql.as_str(), &[
        &Uuid::new_v4(),
        &new.isbn,
        &new.title,
        &new.author,
        &new.genre,
        &new.sell_cents,
        &new.borrow_cents,
        &new.stock_cents,
        &new.copies,
        &new.copies,
        &now,
      ])
      .await?;
    opt.as_ref().map(row::book).transpose()
  }

  pub async fn list_books(
    &self,
    query: &BookQuery,
    page: PageRequest,
  ) -> Result<Paginated<Book>> {
    let title = query.title.as_deref().map(|t| format!("%{t}%"));
    let author = query.author.as_deref().map(|a| format!("%{a}%"));
    let genre = query.genre.as_deref().map(|g| format!("%{g}%"));
    let filter = "WHERE ($1::TEXT IS NULL OR title ILIKE $1) \
                  AND ($2::TEXT IS NULL OR author ILIKE $2) \
                  AND ($3::TEXT IS NULL OR genre ILIKE $3)";

    let count_sql = format!("SELECT COUNT(*) FROM books {filter}");
    let total: i64 = self
      .inner
      .query_one(count_sql.as_str(), &[&title, &author, &genre])
      .await?
      .get(0);

    let page_sql = format!(
      "SELECT {BOOK_COLUMNS} FROM books {filter} \
       ORDER BY title ASC, id ASC LIMIT $4 OFFSET $5"
    );
    let rows = self
      .inner
      .query(page_sql.as_str(), &[
        &title,
        &author,
        &genre,
        &page.limit(),
        &page.offset(),
      ])
      .await?;
    let data = rows.iter().map(row::book).collect::<Result<Vec<_>>>()?;
    Ok(Paginated::new(data, page, total))
  }

  // ─── Users ─────────────────────────────────────────────────────────────────

  /// Fetch-or-create by email. Creation is racy across transactions; the
  /// unique index plus the caller's advisory lock make it safe.
  pub async fn upsert_user(
    &self,
    email: &str,
    now: DateTime<Utc>,
  ) -> Result<User> {
    let opt = self
      .inner
      .query_opt(
        "INSERT INTO users (id, email, created_at) VALUES ($1, $2, $3) \
         ON CONFLICT (email) DO NOTHING \
         RETURNING id, email, created_at",
        &[&Uuid::new_v4(), &email, &now],
      )
      .await?;
    match opt {
      Some(r) => row::user(&r),
      None => {
        let r = self
          .inner
          .query_one(
            "SELECT id, email, created_at FROM users WHERE email = $1",
            &[&email],
          )
          .await?;
        row::user(&r)
      }
    }
  }

  pub async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
    let opt = self
      .inner
      .query_opt(
        "SELECT id, email, created_at FROM users WHERE email = $1",
        &[&email],
      )
      .await?;
    opt.as_ref().map(row::user).transpose()
  }

  // ─── Borrows ───────────────────────────────────────────────────────────────

  pub async fn active_borrow(
    &self,
    user_id: Uuid,
    book_id: Uuid,
  ) -> Result<Option<Borrow>> {
    let sql = format!(
      "SELECT {BORROW_COLUMNS} FROM borrows WHERE active_key = $1"
    );
    let opt = self
      .inner
      .query_opt(sql.as_str(), &[&keys::borrow_active(user_id, book_id)])
      .await?;
    opt.as_ref().map(row::borrow).transpose()
  }

  pub async fn latest_returned_borrow(
    &self,
    user_id: Uuid,
    book_id: Uuid,
  ) -> Result<Option<Borrow>> {
    let sql = format!(
      "SELECT {BORROW_COLUMNS} FROM borrows \
       WHERE user_id = $1 AND book_id = $2 AND status = 'RETURNED' \
       ORDER BY returned_at DESC LIMIT 1"
    );
    let opt = self.inner.query_opt(sql.as_str(), &[&user_id, &book_id]).await?;
    opt.as_ref().map(row::borrow).transpose()
  }

  pub async fn count_active_borrows(&self, user_id: Uuid) -> Result<i64> {
    let row = self
      .inner
      .query_one(
        "SELECT COUNT(*) FROM borrows \
         WHERE user_id = $1 AND status = 'ACTIVE'",
        &[&user_id],
      )
      .await?;
    Ok(row.get(0))
  }

  pub async fn insert_borrow(
    &self,
    user_id: Uuid,
    book_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<Borrow> {
    let sql = format!(
      "INSERT INTO borrows ({BORROW_COLUMNS}) \
       VALUES ($1, $2, $3, $4, $5, NULL, 'ACTIVE', $6) \
       RETURNING {BORROW_COLUMNS}"
    );
    let r = self
      .inner
      .query_one(sql.as_str(), &[
        &Uuid::new_v4(),
        &user_id,
        &book_id,
        &now,
        &circulation::due_at(now),
        &keys::borrow_active(user_id, book_id),
      ])
      .await?;
    row::borrow(&r)
  }

  /// `ACTIVE → RETURNED`; clears the active key so the slot frees up.
  pub async fn mark_returned(
    &self,
    borrow_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<Borrow> {
    let sql = format!(
      "UPDATE borrows \
       SET status = 'RETURNED', returned_at = $2, active_key = NULL \
       WHERE id = $1 RETURNING {BORROW_COLUMNS}"
    );
    let r = self.inner.query_one(sql.as_str(), &[&borrow_id, &now]).await?;
    row::borrow(&r)
  }

  pub async fn borrow_by_id(&self, id: Uuid) -> Result<Option<Borrow>> {
    let sql = format!("SELECT {BORROW_COLUMNS} FROM borrows WHERE id = $1");
    let opt = self.inner.query_opt(sql.as_str(), &[&id]).await?;
    opt.as_ref().map(row::borrow).transpose()
  }

  // ─── Purchases ─────────────────────────────────────────────────────────────

  pub async fn count_active_purchases_for_book(
    &self,
    user_id: Uuid,
    book_id: Uuid,
  ) -> Result<i64> {
    let row = self
      .inner
      .query_one(
        "SELECT COUNT(*) FROM purchases \
         WHERE user_id = $1 AND book_id = $2 AND status = 'ACTIVE'",
        &[&user_id, &book_id],
      )
      .await?;
    Ok(row.get(0))
  }

  pub async fn count_active_purchases(&self, user_id: Uuid) -> Result<i64> {
    let row = self
      .inner
      .query_one(
        "SELECT COUNT(*) FROM purchases \
         WHERE user_id = $1 AND status = 'ACTIVE'",
        &[&user_id],
      )
      .await?;
    Ok(row.get(0))
  }

  pub async fn insert_purchase(
    &self,
    user_id: Uuid,
    book_id: Uuid,
    price_cents: i64,
    now: DateTime<Utc>,
  ) -> Result<Purchase> {
    let sql = format!(
      "INSERT INTO purchases ({PURCHASE_COLUMNS}) \
       VALUES ($1, $2, $3, $4, $5, NULL, 'ACTIVE') \
       RETURNING {PURCHASE_COLUMNS}"
    );
    let r = self
      .inner
      .query_one(sql.as_str(), &[
        &Uuid::new_v4(),
        &user_id,
        &book_id,
        &price_cents,
        &now,
      ])
      .await?;
    row::purchase(&r)
  }

  /// Row-lock a purchase for the cancel path.
  pub async fn purchase_for_update(
    &self,
    id: Uuid,
    user_id: Uuid,
  ) -> Result<Option<Purchase>> {
    let sql = format!(
      "SELECT {PURCHASE_COLUMNS} FROM purchases \
       WHERE id = $1 AND user_id = $2 FOR UPDATE"
    );
    let opt = self.inner.query_opt(sql.as_str(), &[&id, &user_id]).await?;
    opt.as_ref().map(row::purchase).transpose()
  }

  /// `ACTIVE → CANCELED`. Terminal.
  pub async fn mark_canceled(
    &self,
    purchase_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<Purchase> {
    let sql = format!(
      "UPDATE purchases SET status = 'CANCELED', canceled_at = $2 \
       WHERE id = $1 RETURNING {PURCHASE_COLUMNS}"
    );
    let r = self.inner.query_one(sql.as_str(), &[&purchase_id, &now]).await?;
    row::purchase(&r)
  }

  // ─── Wallet ────────────────────────────────────────────────────────────────

  pub async fn wallet(&self) -> Result<Wallet> {
    let opt = self
      .inner
      .query_opt(
        "SELECT id, milestone_reached FROM wallets WHERE id = $1",
        &[&WALLET_ID],
      )
      .await?;
    match opt {
      Some(r) => row::wallet(&r),
      None => Err(Error::WalletMissing),
    }
  }

  /// The derived balance: always the sum over the movement rows, never a
  /// stored counter.
  pub async fn balance(&self) -> Result<i64> {
    let row = self
      .inner
      .query_one(
        "SELECT COALESCE(SUM(amount_cents), 0)::BIGINT \
         FROM wallet_movements WHERE wallet_id = $1",
        &[&WALLET_ID],
      )
      .await?;
    Ok(row.get(0))
  }

  /// Append a movement. A dedupe-key conflict returns the pre-existing row;
  /// callers treat both outcomes as success.
  pub async fn append_movement(
    &self,
    new: &NewMovement,
    now: DateTime<Utc>,
  ) -> Result<WalletMovement> {
    let sql = format!(
      "INSERT INTO wallet_movements ({MOVEMENT_COLUMNS}) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
       ON CONFLICT (dedupe_key) DO NOTHING \
       RETURNING {MOVEMENT_COLUMNS}"
    );
    let opt = self
      .inner
      .query_opt(sql.as_str(), &[
        &Uuid::new_v4(),
        &WALLET_ID,
        &new.amount_cents,
        &new.movement_type.as_str(),
        &new.reason,
        &new.related_entity,
        &new.dedupe_key,
        &now,
      ])
      .await?;
    if let Some(r) = opt {
      return row::movement(&r);
    }
    // The insert was skipped, which can only happen on a dedupe conflict.
    let key = new.dedupe_key.as_deref().ok_or_else(|| {
      Error::Decode("movement insert skipped without dedupe key".into())
    })?;
    let select =
      format!("SELECT {MOVEMENT_COLUMNS} FROM wallet_movements WHERE dedupe_key = $1");
    let r = self.inner.query_one(select.as_str(), &[&key]).await?;
    row::movement(&r)
  }

  pub async fn set_milestone_reached(&self) -> Result<()> {
    self
      .inner
      .execute(
        "UPDATE wallets SET milestone_reached = TRUE WHERE id = $1",
        &[&WALLET_ID],
      )
      .await?;
    Ok(())
  }

  pub async fn list_movements(
    &self,
    query: &MovementQuery,
    page: PageRequest,
  ) -> Result<Paginated<WalletMovement>> {
    let direction = query.direction.map(|d| match d {
      MovementDirection::Credit => "credit",
      MovementDirection::Debit => "debit",
    });
    let filter = "WHERE wallet_id = $1 \
                  AND ($2::TEXT IS NULL \
                       OR ($2 = 'credit' AND amount_cents > 0) \
                       OR ($2 = 'debit'  AND amount_cents < 0)) \
                  AND ($3::TIMESTAMPTZ IS NULL OR created_at >= $3) \
                  AND ($4::TIMESTAMPTZ IS NULL OR created_at <= $4)";

    let count_sql = format!("SELECT COUNT(*) FROM wallet_movements {filter}");
    let total: i64 = self
      .inner
      .query_one(count_sql.as_str(), &[
        &WALLET_ID,
        &direction,
        &query.from,
        &query.to,
      ])
      .await?
      .get(0);

    let page_sql = format!(
      "SELECT {MOVEMENT_COLUMNS} FROM wallet_movements {filter} \
       ORDER BY created_at DESC, id DESC LIMIT $5 OFFSET $6"
    );
    let rows = self
      .inner
      .query(page_sql.as_str(), &[
        &WALLET_ID,
        &direction,
        &query.from,
        &query.to,
        &page.limit(),
        &page.offset(),
      ])
      .await?;
    let data = rows.iter().map(row::movement).collect::<Result<Vec<_>>>()?;
    Ok(Paginated::new(data, page, total))
  }

  // ─── Jobs ──────────────────────────────────────────────────────────────────

  /// Insert a schedulable job. Returns `None` when a unique constraint
  /// (active key or borrow id) says an equivalent job already exists.
  #[allow(clippy::too_many_arguments)]
  pub async fn insert_job(
    &self,
    job_type: JobType,
    active_key: &str,
    run_at: DateTime<Utc>,
    payload: &serde_json::Value,
    book_id: Option<Uuid>,
    borrow_id: Option<Uuid>,
    now: DateTime<Utc>,
  ) -> Result<Option<Job>> {
    let sql = format!(
      "INSERT INTO jobs (id, job_type, status, payload, run_at, attempts, \
                         max_attempts, active_key, book_id, borrow_id, \
                         created_at) \
       VALUES ($1, $2, 'PENDING', $3, $4, 0, $5, $6, $7, $8, $9) \
       ON CONFLICT DO NOTHING \
       RETURNING {JOB_COLUMNS}"
    );
    let opt = self
      .inner
      .query_opt(sql.as_str(), &[
        &Uuid::new_v4(),
        &job_type.as_str(),
        &payload,
        &run_at,
        &DEFAULT_MAX_ATTEMPTS,
        &active_key,
        &book_id,
        &borrow_id,
        &now,
      ])
      .await?;
    opt.as_ref().map(row::job).transpose()
  }

  pub async fn job_by_id(&self, id: Uuid) -> Result<Option<Job>> {
    let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1");
    let opt = self.inner.query_opt(sql.as_str(), &[&id]).await?;
    opt.as_ref().map(row::job).transpose()
  }

  /// The live restock job for a book, if one is scheduled or running.
  pub async fn live_restock_job(&self, book_id: Uuid) -> Result<Option<Job>> {
    let sql = format!(
      "SELECT {JOB_COLUMNS} FROM jobs \
       WHERE book_id = $1 AND job_type = 'RESTOCK' \
         AND active_key IS NOT NULL"
    );
    let opt = self.inner.query_opt(sql.as_str(), &[&book_id]).await?;
    opt.as_ref().map(row::job).transpose()
  }

  /// Cancel the live reminder for a returned borrow. Terminal; clears the
  /// active key so the slot is released.
  pub async fn cancel_reminder_jobs(&self, borrow_id: Uuid) -> Result<u64> {
    Ok(
      self
        .inner
        .execute(
          "UPDATE jobs SET status = 'CANCELED', active_key = NULL \
           WHERE borrow_id = $1 AND job_type = 'REMINDER' \
             AND active_key IS NOT NULL",
          &[&borrow_id],
        )
        .await?,
    )
  }

  /// The claim scan: due PENDING rows plus PROCESSING rows whose lease
  /// expired, oldest first. Rows out of attempts are skipped.
  pub async fn due_jobs(
    &self,
    now: DateTime<Utc>,
    limit: i64,
  ) -> Result<Vec<Job>> {
    let lease_expiry = now - Duration::seconds(job::LEASE_SECS);
    let sql = format!(
      "SELECT {JOB_COLUMNS} FROM jobs \
       WHERE active_key IS NOT NULL \
         AND attempts < max_attempts \
         AND ((status = 'PENDING' AND run_at <= $1) \
           OR (status = 'PROCESSING' AND locked_at < $2)) \
       ORDER BY run_at ASC \
       LIMIT $3"
    );
    let rows = self
      .inner
      .query(sql.as_str(), &[&now, &lease_expiry, &limit])
      .await?;
    rows.iter().map(row::job).collect()
  }

  /// Atomically claim one job. Zero rows affected means another worker won.
  pub async fn claim_job(&self, id: Uuid, now: DateTime<Utc>) -> Result<bool> {
    let lease_expiry = now - Duration::seconds(job::LEASE_SECS);
    let affected = self
      .inner
      .execute(
        "UPDATE jobs \
         SET status = 'PROCESSING', locked_at = $2, attempts = attempts + 1 \
         WHERE id = $1 AND active_key IS NOT NULL \
           AND (status = 'PENDING' \
             OR (status = 'PROCESSING' AND locked_at < $3))",
        &[&id, &now, &lease_expiry],
      )
      .await?;
    Ok(affected == 1)
  }

  pub async fn complete_job(
    &self,
    id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<()> {
    self
      .inner
      .execute(
        "UPDATE jobs \
         SET status = 'COMPLETED', active_key = NULL, locked_at = NULL, \
             last_error = NULL, completed_at = $2 \
         WHERE id = $1",
        &[&id, &now],
      )
      .await?;
    Ok(())
  }

  pub async fn fail_job(
    &self,
    id: Uuid,
    now: DateTime<Utc>,
    error: &str,
  ) -> Result<()> {
    self
      .inner
      .execute(
        "UPDATE jobs \
         SET status = 'FAILED', active_key = NULL, locked_at = NULL, \
             last_error = $3, completed_at = $2 \
         WHERE id = $1",
        &[&id, &now, &error],
      )
      .await?;
    Ok(())
  }

  /// Push a failed attempt back to PENDING with the backoff delay applied.
  /// The active key is preserved; the job keeps its logical slot.
  pub async fn reschedule_job(
    &self,
    id: Uuid,
    run_at: DateTime<Utc>,
    error: &str,
  ) -> Result<()> {
    self
      .inner
      .execute(
        "UPDATE jobs \
         SET status = 'PENDING', locked_at = NULL, run_at = $2, \
             last_error = $3 \
         WHERE id = $1",
        &[&id, &run_at, &error],
      )
      .await?;
    Ok(())
  }

  pub async fn list_jobs(
    &self,
    status: Option<JobStatus>,
    page: PageRequest,
  ) -> Result<Paginated<Job>> {
    let status = status.map(|s| s.as_str());
    let filter = "WHERE ($1::TEXT IS NULL OR status = $1)";

    let count_sql = format!("SELECT COUNT(*) FROM jobs {filter}");
    let total: i64 =
      self.inner.query_one(count_sql.as_str(), &[&status]).await?.get(0);

    let page_sql = format!(
      "SELECT {JOB_COLUMNS} FROM jobs {filter} \
       ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
    );
    let rows = self
      .inner
      .query(page_sql.as_str(), &[&status, &page.limit(), &page.offset()])
      .await?;
    let data = rows.iter().map(row::job).collect::<Result<Vec<_>>>()?;
    Ok(Paginated::new(data, page, total))
  }

  // ─── Events ────────────────────────────────────────────────────────────────

  /// Append an audit event. Returns `None` on a dedupe conflict, which
  /// callers treat as success.
  pub async fn append_event(
    &self,
    new: &NewEvent,
    now: DateTime<Utc>,
  ) -> Result<Option<Event>> {
    let sql = format!(
      "INSERT INTO events ({EVENT_COLUMNS}) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
       ON CONFLICT (dedupe_key) DO NOTHING \
       RETURNING {EVENT_COLUMNS}"
    );
    let opt = self
      .inner
      .query_opt(sql.as_str(), &[
        &Uuid::new_v4(),
        &new.event_type.as_str(),
        &new.user_id,
        &new.book_id,
        &new.borrow_id,
        &new.purchase_id,
        &new.job_id,
        &new.metadata,
        &new.dedupe_key,
        &now,
      ])
      .await?;
    opt.as_ref().map(row::event).transpose()
  }

  pub async fn list_events(
    &self,
    page: PageRequest,
  ) -> Result<Paginated<Event>> {
    let total: i64 = self
      .inner
      .query_one("SELECT COUNT(*) FROM events", &[])
      .await?
      .get(0);
    let sql = format!(
      "SELECT {EVENT_COLUMNS} FROM events \
       ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
    );
    let rows = self
      .inner
      .query(sql.as_str(), &[&page.limit(), &page.offset()])
      .await?;
    let data = rows.iter().map(row::event).collect::<Result<Vec<_>>>()?;
    Ok(Paginated::new(data, page, total))
  }

  // ─── Simulated emails ──────────────────────────────────────────────────────

  pub async fn email_by_dedupe_key(
    &self,
    key: &str,
  ) -> Result<Option<SimulatedEmail>> {
    let sql = format!(
      "SELECT {EMAIL_COLUMNS} FROM simulated_emails WHERE dedupe_key = $1"
    );
    let opt = self.inner.query_opt(sql.as_str(), &[&key]).await?;
    opt.as_ref().map(row::email).transpose()
  }

  /// Append an outbound email. Returns `None` on a dedupe conflict, which
  /// callers treat as success (the message was already sent).
  pub async fn append_email(
    &self,
    new: &NewEmail,
    now: DateTime<Utc>,
  ) -> Result<Option<SimulatedEmail>> {
    let sql = format!(
      "INSERT INTO simulated_emails ({EMAIL_COLUMNS}) \
       VALUES ($1, $2, $3, $4, $5, $6, $7) \
       ON CONFLICT (dedupe_key) DO NOTHING \
       RETURNING {EMAIL_COLUMNS}"
    );
    let opt = self
      .inner
      .query_opt(sql.as_str(), &[
        &Uuid::new_v4(),
        &new.recipient,
        &new.subject,
        &new.body,
        &new.email_type.as_str(),
        &new.dedupe_key,
        &now,
      ])
      .await?;
    opt.as_ref().map(row::email).transpose()
  }

  pub async fn list_emails(
    &self,
    page: PageRequest,
  ) -> Result<Paginated<SimulatedEmail>> {
    let total: i64 = self
      .inner
      .query_one("SELECT COUNT(*) FROM simulated_emails", &[])
      .await?
      .get(0);
    let sql = format!(
      "SELECT {EMAIL_COLUMNS} FROM simulated_emails \
       ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
    );
    let rows = self
      .inner
      .query(sql.as_str(), &[&page.limit(), &page.offset()])
      .await?;
    let data = rows.iter().map(row::email).collect::<Result<Vec<_>>>()?;
    Ok(Paginated::new(data, page, total))
  }

  // ─── Idempotency cache ─────────────────────────────────────────────────────

  pub async fn idempotency_get(
    &self,
    key: &str,
    user_id: Uuid,
    endpoint: &str,
  ) -> Result<Option<IdempotencyRecord>> {
    let opt = self
      .inner
      .query_opt(
        "SELECT key, user_id, endpoint, response, status_code, expires_at \
         FROM idempotency_keys \
         WHERE key = $1 AND user_id = $2 AND endpoint = $3",
        &[&key, &user_id, &endpoint],
      )
      .await?;
    opt.as_ref().map(row::idempotency).transpose()
  }

  pub async fn idempotency_delete(
    &self,
    key: &str,
    user_id: Uuid,
    endpoint: &str,
  ) -> Result<()> {
    self
      .inner
      .execute(
        "DELETE FROM idempotency_keys \
         WHERE key = $1 AND user_id = $2 AND endpoint = $3",
        &[&key, &user_id, &endpoint],
      )
      .await?;
    Ok(())
  }

  /// Store a response snapshot. A concurrent writer of the same cell wins
  /// silently; replay semantics do not care which copy survives.
  pub async fn idempotency_put(
    &self,
    record: &IdempotencyRecord,
    now: DateTime<Utc>,
  ) -> Result<()> {
    self
      .inner
      .execute(
        "INSERT INTO idempotency_keys \
           (key, user_id, endpoint, response, status_code, expires_at, \
            created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (key, user_id, endpoint) DO NOTHING",
        &[
          &record.key,
          &record.user_id,
          &record.endpoint,
          &record.response,
          &record.status_code,
          &record.expires_at,
          &now,
        ],
      )
      .await?;
    Ok(())
  }
}
