//! Row-to-domain decoding.
//!
//! Every SELECT in `tx.rs` names its columns explicitly in the order the
//! decoders here expect. Status/type strings are parsed strictly; an unknown
//! discriminant is a [`Error::Decode`], never a silent default.

use biblio_core::{
  book::Book,
  circulation::{Borrow, BorrowStatus},
  email::{EmailType, SimulatedEmail},
  event::{Event, EventType},
  idempotency::IdempotencyRecord,
  job::{Job, JobStatus, JobType},
  purchase::{Purchase, PurchaseStatus},
  user::User,
  wallet::{MovementType, Wallet, WalletMovement},
};
use tokio_postgres::Row;

use crate::{Error, Result};

// ─── Discriminant parsing ────────────────────────────────────────────────────

fn parse_borrow_status(s: &str) -> Result<BorrowStatus> {
  match s {
    "ACTIVE" => Ok(BorrowStatus::Active),
    "RETURNED" => Ok(BorrowStatus::Returned),
    other => Err(Error::Decode(format!("unknown borrow status {other:?}"))),
  }
}

fn parse_purchase_status(s: &str) -> Result<PurchaseStatus> {
  match s {
    "ACTIVE" => Ok(PurchaseStatus::Active),
    "CANCELED" => Ok(PurchaseStatus::Canceled),
    other => Err(Error::Decode(format!("unknown purchase status {other:?}"))),
  }
}

fn parse_movement_type(s: &str) -> Result<MovementType> {
  match s {
    "BORROW_INCOME" => Ok(MovementType::BorrowIncome),
    "BUY_INCOME" => Ok(MovementType::BuyIncome),
    "CANCEL_REFUND" => Ok(MovementType::CancelRefund),
    "RESTOCK_EXPENSE" => Ok(MovementType::RestockExpense),
    "INITIAL_BALANCE" => Ok(MovementType::InitialBalance),
    other => Err(Error::Decode(format!("unknown movement type {other:?}"))),
  }
}

fn parse_job_type(s: &str) -> Result<JobType> {
  match s {
    "RESTOCK" => Ok(JobType::Restock),
    "REMINDER" => Ok(JobType::Reminder),
    other => Err(Error::Decode(format!("unknown job type {other:?}"))),
  }
}

fn parse_job_status(s: &str) -> Result<JobStatus> {
  match s {
    "PENDING" => Ok(JobStatus::Pending),
    "PROCESSING" => Ok(JobStatus::Processing),
    "COMPLETED" => Ok(JobStatus::Completed),
    "FAILED" => Ok(JobStatus::Failed),
    "CANCELED" => Ok(JobStatus::Canceled),
    other => Err(Error::Decode(format!("unknown job status {other:?}"))),
  }
}

fn parse_event_type(s: &str) -> Result<EventType> {
  match s {
    "BORROW" => Ok(EventType::Borrow),
    "RETURN" => Ok(EventType::Return),
    "BUY" => Ok(EventType::Buy),
    "CANCEL_BUY" => Ok(EventType::CancelBuy),
    "LOW_STOCK_EMAIL" => Ok(EventType::LowStockEmail),
    "RESTOCK_SCHEDULED" => Ok(EventType::RestockScheduled),
    "RESTOCK_DELIVERED" => Ok(EventType::RestockDelivered),
    "REMINDER_SENT" => Ok(EventType::ReminderSent),
    "MILESTONE_EMAIL" => Ok(EventType::MilestoneEmail),
    other => Err(Error::Decode(format!("unknown event type {other:?}"))),
  }
}

fn parse_email_type(s: &str) -> Result<EmailType> {
  match s {
    "LOW_STOCK" => Ok(EmailType::LowStock),
    "REMINDER" => Ok(EmailType::Reminder),
    "MILESTONE" => Ok(EmailType::Milestone),
    other => Err(Error::Decode(format!("unknown email type {other:?}"))),
  }
}

// ─── Column lists (kept adjacent to their decoders) ──────────────────────────

pub const BOOK_COLUMNS: &str = "id, isbn, title, author, genre, sell_cents, \
                                borrow_cents, stock_cents, available_copies, \
                                seeded_copies, created_at";

pub const BORROW_COLUMNS: &str = "id, user_id, book_id, borrowed_at, due_at, \
                                  returned_at, status, active_key";

pub const PURCHASE_COLUMNS: &str = "id, user_id, book_id, price_cents, \
                                    purchased_at, canceled_at, status";

pub const MOVEMENT_COLUMNS: &str = "id, wallet_id, amount_cents, \
                                    movement_type, reason, related_entity, \
                                    dedupe_key, created_at";

pub const JOB_COLUMNS: &str = "id, job_type, status, payload, run_at, \
                               attempts, max_attempts, locked_at, last_error, \
                               completed_at, active_key, book_id, borrow_id, \
                               created_at";

pub const EVENT_COLUMNS: &str = "id, event_type, user_id, book_id, borrow_id, \
                                 purchase_id, job_id, metadata, dedupe_key, \
                                 created_at";

pub const EMAIL_COLUMNS: &str =
  "id, recipient, subject, body, email_type, dedupe_key, created_at";

// ─── Decoders ────────────────────────────────────────────────────────────────

pub fn book(row: &Row) -> Result<Book> {
  Ok(Book {
    id:               row.get(0),
    isbn:             row.get(1),
    title:            row.get(2),
    author:           row.get(3),
    genre:            row.get(4),
    sell_cents:       row.get(5),
    borrow_cents:     row.get(6),
    stock_cents:      row.get(7),
    available_copies: row.get(8),
    seeded_copies:    row.get(9),
    created_at:       row.get(10),
  })
}

pub fn user(row: &Row) -> Result<User> {
  Ok(User { id: row.get(0), email: row.get(1), created_at: row.get(2) })
}

pub fn borrow(row: &Row) -> Result<Borrow> {
  Ok(Borrow {
    id:          row.get(0),
    user_id:     row.get(1),
    book_id:     row.get(2),
    borrowed_at: row.get(3),
    due_at:      row.get(4),
    returned_at: row.get(5),
    status:      parse_borrow_status(row.get(6))?,
    active_key:  row.get(7),
  })
}

pub fn purchase(row: &Row) -> Result<Purchase> {
  Ok(Purchase {
    id:           row.get(0),
    user_id:      row.get(1),
    book_id:      row.get(2),
    price_cents:  row.get(3),
    purchased_at: row.get(4),
    canceled_at:  row.get(5),
    status:       parse_purchase_status(row.get(6))?,
  })
}

pub fn wallet(row: &Row) -> Result<Wallet> {
  Ok(Wallet { id: row.get(0), milestone_reached: row.get(1) })
}

pub fn movement(row: &Row) -> Result<WalletMovement> {
  Ok(WalletMovement {
    id:             row.get(0),
    wallet_id:      row.get(1),
    amount_cents:   row.get(2),
    movement_type:  parse_movement_type(row.get(3))?,
    reason:         row.get(4),
    related_entity: row.get(5),
    dedupe_key:     row.get(6),
    created_at:     row.get(7),
  })
}

pub fn job(row: &Row) -> Result<Job> {
  Ok(Job {
    id:           row.get(0),
    job_type:     parse_job_type(row.get(1))?,
    status:       parse_job_status(row.get(2))?,
    payload:      row.get(3),
    run_at:       row.get(4),
    attempts:     row.get(5),
    max_attempts: row.get(6),
    locked_at:    row.get(7),
    last_error:   row.get(8),
    completed_at: row.get(9),
    active_key:   row.get(10),
    book_id:      row.get(11),
    borrow_id:    row.get(12),
    created_at:   row.get(13),
  })
}

pub fn event(row: &Row) -> Result<Event> {
  Ok(Event {
    id:          row.get(0),
    event_type:  parse_event_type(row.get(1))?,
    user_id:     row.get(2),
    book_id:     row.get(3),
    borrow_id:   row.get(4),
    purchase_id: row.get(5),
    job_id:      row.get(6),
    metadata:    row.get(7),
    dedupe_key:  row.get(8),
    created_at:  row.get(9),
  })
}

pub fn email(row: &Row) -> Result<SimulatedEmail> {
  Ok(SimulatedEmail {
    id:         row.get(0),
    recipient:  row.get(1),
    subject:    row.get(2),
    body:       row.get(3),
    email_type: parse_email_type(row.get(4))?,
    dedupe_key: row.get(5),
    created_at: row.get(6),
  })
}

pub fn idempotency(row: &Row) -> Result<IdempotencyRecord> {
  Ok(IdempotencyRecord {
    key:         row.get(0),
    user_id:     row.get(1),
    endpoint:    row.get(2),
    response:    row.get(3),
    status_code: row.get(4),
    expires_at:  row.get(5),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn discriminant_parsers_reject_unknown_values() {
    assert!(parse_borrow_status("active").is_err());
    assert!(parse_purchase_status("REFUNDED").is_err());
    assert!(parse_movement_type("").is_err());
    assert!(parse_job_type("SWEEP").is_err());
    assert!(parse_job_status("RUNNING").is_err());
    assert!(parse_event_type("BORROWED").is_err());
    assert!(parse_email_type("SMS").is_err());
  }

  #[test]
  fn discriminant_parsers_roundtrip_core_strings() {
    for status in [JobStatus::Pending, JobStatus::Processing, JobStatus::Completed, JobStatus::Failed, JobStatus::Canceled] {
      assert_eq!(parse_job_status(status.as_str()).unwrap(), status);
    }
    for ty in [EventType::Borrow, EventType::Return, EventType::Buy, EventType::CancelBuy, EventType::LowStockEmail, EventType::RestockScheduled, EventType::RestockDelivered, EventType::ReminderSent, EventType::MilestoneEmail] {
      assert_eq!(parse_event_type(ty.as_str()).unwrap(), ty);
    }
  }
}
