//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;

use gym_core::{
  account::{Account, AccountPatch, NewAccount, Role},
  client::{Client, ClientPatch, NewClient, NewEmergencyContact},
  contract::{
    ContractPatch, ContractStatus, ContractView, FreezeContract, NewContract, RenewContract,
  },
  membership::{Membership, NewMembership},
  query::{ClientQuery, ContractQuery, PageRequest},
  schedule::AvailabilityQuery,
  session::{NewSession, SessionPatch, SessionStatus},
  store::GymStore,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn core(err: Error) -> gym_core::Error { err.into() }

fn today() -> NaiveDate { Utc::now().date_naive() }

/// Midnight UTC two days from now, plus `hours`.
fn slot(hours: i64) -> DateTime<Utc> {
  let midnight = today().and_hms_opt(0, 0, 0).expect("midnight").and_utc();
  midnight + Duration::days(2) + Duration::hours(hours)
}

fn new_account(n: u32, role: Role) -> NewAccount {
  NewAccount {
    first_name:      "Ana".into(),
    last_name:       "Gomez".into(),
    email:           format!("user{n}@example.com"),
    phone:           Some("3001234567".into()),
    address:         None,
    gender:          None,
    document_type:   None,
    document_number: format!("1000{n:03}"),
    birth_date:      NaiveDate::from_ymd_opt(1990, 4, 2).unwrap(),
    role,
    password_hash:   "$argon2id$test".into(),
  }
}

fn new_client(n: u32) -> NewClient {
  NewClient {
    account:            Some(new_account(n, Role::Client)),
    holder_id:          None,
    relationship:       None,
    active:             true,
    emergency_contacts: vec![],
  }
}

async fn seed_client(s: &SqliteStore, n: u32) -> Client {
  s.create_client(new_client(n)).await.unwrap()
}

async fn seed_account(s: &SqliteStore, n: u32, role: Role) -> Account {
  s.create_account(new_account(n, role)).await.unwrap()
}

async fn seed_membership(s: &SqliteStore, name: &str) -> Membership {
  s.create_membership(NewMembership {
    name:          name.into(),
    description:   None,
    access_days:   30,
    validity_days: 30,
    price:         Decimal::new(1990, 1),
    active:        true,
  })
  .await
  .unwrap()
}

async fn seed_contract(s: &SqliteStore, client_id: i64, membership_id: i64) -> ContractView {
  s.create_contract(
    NewContract {
      client_id,
      membership_id,
      start_date: today(),
      end_date: today() + Duration::days(30),
      price: None,
      status: None,
    },
    None,
  )
  .await
  .unwrap()
}

// ─── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn account_codes_are_sequential() {
  let s = store().await;
  let a = seed_account(&s, 1, Role::Admin).await;
  let b = seed_account(&s, 2, Role::Trainer).await;
  assert_eq!(a.code, "U001");
  assert_eq!(b.code, "U002");

  let fetched = s.get_account(b.account_id).await.unwrap().unwrap();
  assert_eq!(fetched, b);
}

#[tokio::test]
async fn duplicate_email_is_a_validation_error() {
  let s = store().await;
  seed_account(&s, 1, Role::Admin).await;

  let mut dup = new_account(2, Role::Admin);
  dup.email = "user1@example.com".into();
  let err = s.create_account(dup).await.unwrap_err();
  assert!(matches!(core(err), gym_core::Error::Validation(_)));
}

#[tokio::test]
async fn credentials_carry_the_password_hash() {
  let s = store().await;
  let account = seed_account(&s, 1, Role::Admin).await;

  let creds = s.find_credentials("user1@example.com".into()).await.unwrap().unwrap();
  assert_eq!(creds.account.account_id, account.account_id);
  assert_eq!(creds.password_hash, "$argon2id$test");
  assert!(s.find_credentials("nobody@example.com".into()).await.unwrap().is_none());
}

// ─── Clients ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_client_links_account_and_contacts() {
  let s = store().await;
  let mut input = new_client(1);
  if let Some(account) = input.account.as_mut() {
    account.role = Role::Admin;
  }
  input.emergency_contacts = vec![NewEmergencyContact {
    name:                "Luis Gomez".into(),
    phone:               "3007654321".into(),
    relationship:        Some("brother".into()),
    same_as_beneficiary: false,
  }];

  let client = s.create_client(input).await.unwrap();
  assert_eq!(client.code, "P001");
  let account = client.account.as_ref().expect("linked account");
  assert_eq!(account.role, Role::Client);
  assert_eq!(client.emergency_contacts.len(), 1);
  assert_eq!(client.emergency_contacts[0].name, "Luis Gomez");

  let fetched = s.get_client(client.client_id).await.unwrap().unwrap();
  assert_eq!(fetched.emergency_contacts, client.emergency_contacts);
}

#[tokio::test]
async fn beneficiaries_and_holder_cycles() {
  let s = store().await;
  let holder = seed_client(&s, 1).await;
  let mut input = new_client(2);
  input.holder_id = Some(holder.client_id);
  input.relationship = Some("daughter".into());
  let beneficiary = s.create_client(input).await.unwrap();

  let listed = s.beneficiaries(holder.client_id).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].client_id, beneficiary.client_id);

  let err = s
    .update_client(holder.client_id, ClientPatch {
      holder_id: Some(Some(beneficiary.client_id)),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert!(matches!(core(err), gym_core::Error::Validation(_)));
}

#[tokio::test]
async fn failed_update_leaves_no_partial_writes() {
  let s = store().await;
  seed_client(&s, 1).await;
  let second = seed_client(&s, 2).await;

  // The clients row is written before the account update hits the unique
  // email index.
  let err = s
    .update_client(second.client_id, ClientPatch {
      relationship: Some(Some("partner".into())),
      account: Some(AccountPatch {
        email: Some("user1@example.com".into()),
        ..Default::default()
      }),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert!(matches!(core(err), gym_core::Error::Validation(_)));

  let fetched = s.get_client(second.client_id).await.unwrap().unwrap();
  assert_eq!(fetched.relationship, None);
}

#[tokio::test]
async fn deactivated_clients_are_filtered_out() {
  let s = store().await;
  let a = seed_client(&s, 1).await;
  seed_client(&s, 2).await;
  let deactivated = s.deactivate_client(a.client_id).await.unwrap();
  assert!(!deactivated.active);

  let active = s
    .list_clients(ClientQuery { active: Some(true), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(active.pagination.total, 1);
  assert_ne!(active.data[0].client_id, a.client_id);
}

#[tokio::test]
async fn concurrent_creations_get_distinct_codes() {
  let s = store().await;
  let mut set = tokio::task::JoinSet::new();
  for n in 1..=10 {
    let s = s.clone();
    set.spawn(async move { s.create_client(new_client(n)).await.unwrap().code });
  }
  let mut codes = set.join_all().await;
  codes.sort();

  let expected: Vec<String> = (1..=10).map(|n| format!("P{n:03}")).collect();
  assert_eq!(codes, expected);
}

#[tokio::test]
async fn client_codes_continue_past_p999() {
  let s = store().await;
  s.execute_raw(
    "INSERT INTO clients (code, registered_at, updated_at) \
     VALUES ('P999', '2025-01-01T00:00:00.000000Z', '2025-01-01T00:00:00.000000Z')",
  )
  .await
  .unwrap();

  let first = seed_client(&s, 1).await;
  let second = seed_client(&s, 2).await;
  assert_eq!(first.code, "P1000");
  assert_eq!(second.code, "P1001");
}

#[tokio::test]
async fn list_clients_paginates_and_searches() {
  let s = store().await;
  for n in 1..=12 {
    seed_client(&s, n).await;
  }

  let page = s
    .list_clients(ClientQuery {
      page: PageRequest { page: 3, limit: 5 },
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(page.pagination.total, 12);
  assert_eq!(page.pagination.total_pages, 3);
  assert_eq!(page.data.len(), 2);

  let found = s
    .list_clients(ClientQuery { search: Some("user3@".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(found.pagination.total, 1);
  assert_eq!(found.data[0].code, "P003");
}

// ─── Memberships ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn memberships_keep_exact_prices_and_unique_names() {
  let s = store().await;
  let gold = seed_membership(&s, "Gold").await;
  assert_eq!(gold.code, "M001");
  assert_eq!(gold.price, Decimal::new(1990, 1));

  let fetched = s.get_membership(gold.membership_id).await.unwrap().unwrap();
  assert_eq!(fetched, gold);

  let err = s
    .create_membership(NewMembership {
      name:          "Gold".into(),
      description:   None,
      access_days:   10,
      validity_days: 10,
      price:         Decimal::from(50),
      active:        true,
    })
    .await
    .unwrap_err();
  assert!(matches!(core(err), gym_core::Error::Validation(_)));

  let inactive = s.deactivate_membership(gold.membership_id).await.unwrap();
  assert!(!inactive.active);
}

// ─── Contracts ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn creation_records_one_history_entry_with_actor_name() {
  let s = store().await;
  let admin = seed_account(&s, 90, Role::Admin).await;
  let client = seed_client(&s, 1).await;
  let plan = seed_membership(&s, "Gold").await;

  let view = s
    .create_contract(
      NewContract {
        client_id:     client.client_id,
        membership_id: plan.membership_id,
        start_date:    today(),
        end_date:      today() + Duration::days(30),
        price:         None,
        status:        None,
      },
      Some(admin.account_id),
    )
    .await
    .unwrap();

  assert_eq!(view.contract.code, "C0001");
  assert_eq!(view.contract.status, ContractStatus::Active);
  assert_eq!(view.contract.price, plan.price);
  assert_eq!(view.contract.created_by, Some(admin.account_id));
  assert_eq!(view.history.len(), 1);
  let entry = &view.history[0];
  assert_eq!(entry.previous_status, None);
  assert_eq!(entry.new_status, ContractStatus::Active);
  assert_eq!(entry.reason, "contract creation");
  assert_eq!(entry.actor_name.as_deref(), Some("Ana Gomez"));
}

#[tokio::test]
async fn same_status_update_writes_no_history() {
  let s = store().await;
  let client = seed_client(&s, 1).await;
  let plan = seed_membership(&s, "Gold").await;
  let created = seed_contract(&s, client.client_id, plan.membership_id).await;
  let id = created.contract.contract_id;

  let view = s
    .update_contract(
      id,
      ContractPatch {
        status: Some(ContractStatus::Active),
        price: Some(Decimal::from(25)),
        ..Default::default()
      },
      None,
    )
    .await
    .unwrap();
  assert_eq!(view.contract.price, Decimal::from(25));
  assert_eq!(view.history.len(), 1);

  let view = s
    .update_contract(
      id,
      ContractPatch {
        status: Some(ContractStatus::AboutToExpire),
        reason: Some("five days left".into()),
        ..Default::default()
      },
      None,
    )
    .await
    .unwrap();
  assert_eq!(view.history.len(), 2);
  assert_eq!(view.history[0].new_status, ContractStatus::AboutToExpire);
  assert_eq!(view.history[0].previous_status, Some(ContractStatus::Active));
  assert_eq!(view.history[0].reason, "five days left");
}

#[tokio::test]
async fn freeze_only_applies_to_active_contracts() {
  let s = store().await;
  let client = seed_client(&s, 1).await;
  let plan = seed_membership(&s, "Gold").await;
  let id = seed_contract(&s, client.client_id, plan.membership_id).await.contract.contract_id;

  let frozen = s
    .freeze_contract(FreezeContract { contract_id: id, reason: "injury".into() }, None)
    .await
    .unwrap();
  assert_eq!(frozen.contract.status, ContractStatus::Frozen);
  assert_eq!(frozen.history[0].reason, "injury");

  let err = s
    .freeze_contract(FreezeContract { contract_id: id, reason: "again".into() }, None)
    .await
    .unwrap_err();
  assert!(matches!(core(err), gym_core::Error::InvalidState(_)));

  let history = s.contract_history(id).await.unwrap();
  assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn renewal_expires_the_source_and_links_the_successor() {
  let s = store().await;
  let client = seed_client(&s, 1).await;
  let plan = seed_membership(&s, "Gold").await;
  let source = seed_contract(&s, client.client_id, plan.membership_id).await.contract;

  let renewed = s
    .renew_contract(
      RenewContract {
        contract_id:   source.contract_id,
        membership_id: plan.membership_id,
        start_date:    source.end_date,
        end_date:      source.end_date + Duration::days(30),
        price:         Some(Decimal::from(45)),
      },
      None,
    )
    .await
    .unwrap();
  assert_eq!(renewed.contract.code, "C0002");
  assert_eq!(renewed.contract.status, ContractStatus::Active);
  assert_eq!(renewed.contract.renewed_from, Some(source.contract_id));
  assert_eq!(renewed.contract.client_id, client.client_id);
  assert_eq!(renewed.history.len(), 1);
  assert_eq!(renewed.history[0].reason, "creation via renewal");

  let old = s.get_contract(source.contract_id).await.unwrap().unwrap();
  assert_eq!(old.contract.status, ContractStatus::Expired);
  assert_eq!(old.history.len(), 2);
  assert_eq!(old.history[0].new_status, ContractStatus::Expired);
  assert_eq!(old.history[0].reason, "renewal");
  assert_eq!(old.history[1].previous_status, None);
}

#[tokio::test]
async fn cancellation_is_always_recorded() {
  let s = store().await;
  let client = seed_client(&s, 1).await;
  let plan = seed_membership(&s, "Gold").await;
  let id = seed_contract(&s, client.client_id, plan.membership_id).await.contract.contract_id;

  s.cancel_contract(id, None).await.unwrap();
  let view = s.cancel_contract(id, None).await.unwrap();
  assert_eq!(view.contract.status, ContractStatus::Cancelled);
  assert_eq!(view.history.len(), 3);
  assert_eq!(view.history[0].previous_status, Some(ContractStatus::Cancelled));
}

#[tokio::test]
async fn unknown_contracts() {
  let s = store().await;
  assert!(s.get_contract(404).await.unwrap().is_none());
  assert!(s.contract_history(404).await.unwrap().is_empty());

  let err = s.cancel_contract(404, None).await.unwrap_err();
  assert!(matches!(core(err), gym_core::Error::NotFound { entity: "contract", id: 404 }));
}

#[tokio::test]
async fn history_rows_cannot_be_rewritten() {
  let s = store().await;
  let client = seed_client(&s, 1).await;
  let plan = seed_membership(&s, "Gold").await;
  seed_contract(&s, client.client_id, plan.membership_id).await;

  assert!(s.execute_raw("UPDATE contract_history SET reason = 'edited'").await.is_err());
  assert!(s.execute_raw("DELETE FROM contract_history").await.is_err());
}

#[tokio::test]
async fn list_contracts_filters_by_status() {
  let s = store().await;
  let client = seed_client(&s, 1).await;
  let plan = seed_membership(&s, "Gold").await;
  let first = seed_contract(&s, client.client_id, plan.membership_id).await.contract;
  seed_contract(&s, client.client_id, plan.membership_id).await;
  s.cancel_contract(first.contract_id, None).await.unwrap();

  let cancelled = s
    .list_contracts(ContractQuery {
      status: Some(ContractStatus::Cancelled),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(cancelled.pagination.total, 1);
  assert_eq!(cancelled.data[0].contract_id, first.contract_id);

  let all = s
    .list_contracts(ContractQuery { client_id: Some(client.client_id), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(all.pagination.total, 2);
}

// ─── Sessions ────────────────────────────────────────────────────────────────

struct Booking {
  trainer: i64,
  client:  i64,
}

async fn booking_fixture(s: &SqliteStore) -> Booking {
  let trainer = seed_account(s, 80, Role::Trainer).await;
  let client = seed_client(s, 1).await;
  let plan = seed_membership(s, "Gold").await;
  seed_contract(s, client.client_id, plan.membership_id).await;
  Booking { trainer: trainer.account_id, client: client.client_id }
}

fn session(b: &Booking, from: i64, to: i64) -> NewSession {
  NewSession {
    title:       "Strength".into(),
    description: None,
    start:       slot(from),
    end:         slot(to),
    trainer_id:  b.trainer,
    client_id:   b.client,
    notes:       None,
  }
}

#[tokio::test]
async fn booking_requires_an_active_contract() {
  let s = store().await;
  let trainer = seed_account(&s, 80, Role::Trainer).await;
  let client = seed_client(&s, 1).await;
  let b = Booking { trainer: trainer.account_id, client: client.client_id };

  let err = s.create_session(session(&b, 10, 11)).await.unwrap_err();
  assert!(matches!(core(err), gym_core::Error::InvalidState(_)));
}

#[tokio::test]
async fn overlapping_bookings_conflict_and_adjacent_ones_do_not() {
  let s = store().await;
  let b = booking_fixture(&s).await;

  let first = s.create_session(session(&b, 10, 11)).await.unwrap();
  assert_eq!(first.status, SessionStatus::Scheduled);
  assert_eq!(first.start, slot(10));

  let err = s.create_session(session(&b, 10, 12)).await.unwrap_err();
  match core(err) {
    gym_core::Error::Conflict { conflicts } => assert_eq!(conflicts, vec![first.session_id]),
    other => panic!("expected a conflict, got {other:?}"),
  }

  s.create_session(session(&b, 11, 12)).await.unwrap();
}

#[tokio::test]
async fn cancelled_sessions_free_their_slot() {
  let s = store().await;
  let b = booking_fixture(&s).await;
  let first = s.create_session(session(&b, 10, 11)).await.unwrap();

  let cancelled = s.cancel_session(first.session_id).await.unwrap();
  assert_eq!(cancelled.status, SessionStatus::Cancelled);

  let availability = s
    .check_availability(AvailabilityQuery {
      start:      slot(10),
      end:        slot(11),
      trainer_id: Some(b.trainer),
    })
    .await
    .unwrap();
  assert!(availability.available);
  s.create_session(session(&b, 10, 11)).await.unwrap();
}

#[tokio::test]
async fn clients_cannot_be_double_booked_across_trainers() {
  let s = store().await;
  let b = booking_fixture(&s).await;
  let first = s.create_session(session(&b, 10, 11)).await.unwrap();

  let coach = seed_account(&s, 81, Role::Trainer).await;
  let other = Booking { trainer: coach.account_id, client: b.client };
  let err = s.create_session(session(&other, 10, 12)).await.unwrap_err();
  match core(err) {
    gym_core::Error::Conflict { conflicts } => assert_eq!(conflicts, vec![first.session_id]),
    other => panic!("expected a conflict, got {other:?}"),
  }

  s.create_session(session(&other, 11, 12)).await.unwrap();
}

#[tokio::test]
async fn restoring_a_cancelled_session_checks_its_slot() {
  let s = store().await;
  let b = booking_fixture(&s).await;
  let first = s.create_session(session(&b, 10, 11)).await.unwrap();
  s.cancel_session(first.session_id).await.unwrap();
  let second = s.create_session(session(&b, 10, 11)).await.unwrap();

  let restore = SessionPatch { status: Some(SessionStatus::Scheduled), ..Default::default() };
  let err = s.update_session(first.session_id, restore).await.unwrap_err();
  match core(err) {
    gym_core::Error::Conflict { conflicts } => assert_eq!(conflicts, vec![second.session_id]),
    other => panic!("expected a conflict, got {other:?}"),
  }

  let stored = s.get_session(first.session_id).await.unwrap().unwrap();
  assert_eq!(stored.status, SessionStatus::Cancelled);
}

#[tokio::test]
async fn sub_microsecond_sessions_are_rejected_as_invalid() {
  let s = store().await;
  let b = booking_fixture(&s).await;
  let mut input = session(&b, 10, 11);
  input.end = input.start + Duration::nanoseconds(500);

  let err = s.create_session(input).await.unwrap_err();
  assert!(matches!(core(err), gym_core::Error::Validation(_)));
}

#[tokio::test]
async fn rescheduling_ignores_the_session_itself() {
  let s = store().await;
  let b = booking_fixture(&s).await;
  let first = s.create_session(session(&b, 10, 12)).await.unwrap();
  let second = s.create_session(session(&b, 13, 14)).await.unwrap();

  let moved = s
    .update_session(first.session_id, SessionPatch {
      start: Some(slot(11)),
      end: Some(slot(13)),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(moved.end, slot(13));

  let err = s
    .update_session(first.session_id, SessionPatch {
      end: Some(slot(14)),
      ..Default::default()
    })
    .await
    .unwrap_err();
  match core(err) {
    gym_core::Error::Conflict { conflicts } => assert_eq!(conflicts, vec![second.session_id]),
    other => panic!("expected a conflict, got {other:?}"),
  }
}

#[tokio::test]
async fn availability_reports_conflicting_sessions() {
  let s = store().await;
  let b = booking_fixture(&s).await;
  let booked = s.create_session(session(&b, 9, 10)).await.unwrap();

  let busy = s
    .check_availability(AvailabilityQuery {
      start:      slot(9),
      end:        slot(11),
      trainer_id: Some(b.trainer),
    })
    .await
    .unwrap();
  assert!(!busy.available);
  assert_eq!(busy.conflicts, vec![booked.session_id]);

  let other_trainer = seed_account(&s, 81, Role::Trainer).await;
  let free = s
    .check_availability(AvailabilityQuery {
      start:      slot(9),
      end:        slot(11),
      trainer_id: Some(other_trainer.account_id),
    })
    .await
    .unwrap();
  assert!(free.available);
}

#[tokio::test]
async fn schedules_list_upcoming_sessions_in_order() {
  let s = store().await;
  let b = booking_fixture(&s).await;
  let late = s.create_session(session(&b, 15, 16)).await.unwrap();
  let early = s.create_session(session(&b, 8, 9)).await.unwrap();
  let dropped = s.create_session(session(&b, 11, 12)).await.unwrap();
  s.cancel_session(dropped.session_id).await.unwrap();

  let ids = |list: Vec<gym_core::session::TrainingSession>| {
    list.into_iter().map(|x| x.session_id).collect::<Vec<_>>()
  };
  assert_eq!(ids(s.client_schedule(b.client).await.unwrap()), vec![
    early.session_id,
    late.session_id
  ]);
  assert_eq!(ids(s.trainer_schedule(b.trainer).await.unwrap()), vec![
    early.session_id,
    late.session_id
  ]);
}
