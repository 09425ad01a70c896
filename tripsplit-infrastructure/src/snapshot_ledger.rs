use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use thiserror::Error;
use tripsplit_application::{ExpenseLedger, LedgerError, LedgerSnapshot};
use tripsplit_domain::{Expense, ExpenseId, ExpenseSplit, MemberId, TripId};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to access snapshot {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot lock poisoned")]
    Poisoned,
}

/// Display names keyed by member id, in snapshot order.
pub type MemberNames = IndexMap<MemberId, String>;

impl From<SnapshotError> for LedgerError {
    fn from(err: SnapshotError) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

/// On-disk layout of a snapshot file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripSnapshot {
    #[serde(default)]
    pub trips: Vec<TripRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRecord {
    pub id: TripId,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub members: MemberNames,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub splits: Vec<ExpenseSplit>,
}

impl TripRecord {
    /// `e{n}` where `n` is one past the highest numbered id in use, so ids of
    /// deleted expenses are not handed out again while later ones exist.
    fn next_expense_id(&self) -> ExpenseId {
        let highest = self
            .expenses
            .iter()
            .filter_map(|expense| expense.id.as_str().strip_prefix('e')?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        ExpenseId::new(format!("e{}", highest + 1))
    }
}

/// [`ExpenseLedger`] over a JSON snapshot held in memory.
///
/// Ledgers opened from a file write the whole snapshot back after every
/// change. A change that cannot be written is not applied in memory either.
#[derive(Debug)]
pub struct SnapshotLedger {
    path: Option<PathBuf>,
    state: RwLock<TripSnapshot>,
}

impl SnapshotLedger {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref().to_path_buf();
        let content = fs::read_to_string(&path).map_err(|source| SnapshotError::Io {
            path: path.clone(),
            source,
        })?;
        let snapshot: TripSnapshot = serde_json::from_str(&content)?;

        tracing::debug!(
            path = %path.display(),
            trip_count = snapshot.trips.len(),
            "Loaded snapshot"
        );

        Ok(Self {
            path: Some(path),
            state: RwLock::new(snapshot),
        })
    }

    pub fn in_memory(snapshot: TripSnapshot) -> Self {
        Self {
            path: None,
            state: RwLock::new(snapshot),
        }
    }

    pub fn trip_ids(&self) -> Result<Vec<TripId>, SnapshotError> {
        Ok(self.read()?.trips.iter().map(|trip| trip.id.clone()).collect())
    }

    /// Display names for a trip's members. Usable as a `MemberDirectory`.
    pub fn member_names(
        &self,
        trip_id: &TripId,
    ) -> Result<HashMap<MemberId, String>, LedgerError> {
        let state = self.read()?;
        let trip = find_trip(&state, trip_id)?;
        Ok(trip
            .members
            .iter()
            .map(|(id, name)| (id.clone(), name.clone()))
            .collect())
    }

    pub fn to_snapshot(&self) -> Result<TripSnapshot, SnapshotError> {
        Ok(self.read()?.clone())
    }

    fn persist(&self, snapshot: &TripSnapshot) -> Result<(), SnapshotError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(path, json).map_err(|source| SnapshotError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Saved snapshot");
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, TripSnapshot>, SnapshotError> {
        self.state.read().map_err(|_| SnapshotError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, TripSnapshot>, SnapshotError> {
        self.state.write().map_err(|_| SnapshotError::Poisoned)
    }
}

fn find_trip<'s>(
    snapshot: &'s TripSnapshot,
    trip_id: &TripId,
) -> Result<&'s TripRecord, LedgerError> {
    snapshot
        .trips
        .iter()
        .find(|trip| &trip.id == trip_id)
        .ok_or_else(|| LedgerError::TripNotFound(trip_id.clone()))
}

fn find_trip_mut<'s>(
    snapshot: &'s mut TripSnapshot,
    trip_id: &TripId,
) -> Result<&'s mut TripRecord, LedgerError> {
    snapshot
        .trips
        .iter_mut()
        .find(|trip| &trip.id == trip_id)
        .ok_or_else(|| LedgerError::TripNotFound(trip_id.clone()))
}

impl ExpenseLedger for SnapshotLedger {
    fn snapshot(&self, trip_id: &TripId) -> Result<LedgerSnapshot, LedgerError> {
        let state = self.read()?;
        let trip = find_trip(&state, trip_id)?;
        Ok(LedgerSnapshot {
            trip_id: trip.id.clone(),
            expenses: trip.expenses.clone(),
            splits: trip.splits.clone(),
        })
    }

    fn next_expense_id(&self, trip_id: &TripId) -> Result<ExpenseId, LedgerError> {
        let state = self.read()?;
        Ok(find_trip(&state, trip_id)?.next_expense_id())
    }

    fn put_expense(&self, expense: Expense, splits: Vec<ExpenseSplit>) -> Result<(), LedgerError> {
        let mut state = self.write()?;
        let mut next = state.clone();
        let trip = find_trip_mut(&mut next, &expense.trip_id)?;

        trip.splits.retain(|split| split.expense_id != expense.id);
        trip.splits.extend(splits);
        match trip.expenses.iter_mut().find(|existing| existing.id == expense.id) {
            Some(existing) => *existing = expense,
            None => trip.expenses.push(expense),
        }

        self.persist(&next)?;
        *state = next;
        Ok(())
    }

    fn remove_expense(
        &self,
        trip_id: &TripId,
        expense_id: &ExpenseId,
    ) -> Result<bool, LedgerError> {
        let mut state = self.write()?;
        let mut next = state.clone();
        let trip = find_trip_mut(&mut next, trip_id)?;

        let before = trip.expenses.len();
        trip.expenses.retain(|expense| &expense.id != expense_id);
        if trip.expenses.len() == before {
            return Ok(false);
        }
        trip.splits.retain(|split| &split.expense_id != expense_id);

        self.persist(&next)?;
        *state = next;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tripsplit_application::{ExpenseDraft, ExpenseProcessor};
    use tripsplit_domain::Money;

    const SAMPLE: &str = r#"{
        "trips": [
            {
                "id": "okinawa",
                "members": { "u1": "Aki", "u2": "Ben" },
                "expenses": [
                    { "id": "e1", "trip_id": "okinawa", "amount": "90.00", "payer_id": "u1", "description": "Dinner" },
                    { "id": "e4", "trip_id": "okinawa", "amount": "12.50", "payer_id": "u2" }
                ],
                "splits": [
                    { "expense_id": "e1", "user_id": "u1", "amount": "10.00" },
                    { "expense_id": "e1", "user_id": "u2", "amount": "10.00" },
                    { "expense_id": "e4", "user_id": "u1", "amount": "12.50" }
                ]
            },
            { "id": "empty" }
        ]
    }"#;

    #[fixture]
    fn ledger() -> SnapshotLedger {
        SnapshotLedger::in_memory(serde_json::from_str(SAMPLE).unwrap())
    }

    fn okinawa() -> TripId {
        TripId::from("okinawa")
    }

    #[rstest]
    fn loads_trips_with_optional_fields(ledger: SnapshotLedger) {
        assert_eq!(
            ledger.trip_ids().unwrap(),
            vec![okinawa(), TripId::from("empty")]
        );

        let snapshot = ledger.snapshot(&okinawa()).unwrap();
        assert_eq!(snapshot.expenses.len(), 2);
        assert_eq!(snapshot.splits.len(), 3);
        assert_eq!(snapshot.expenses[0].description.as_deref(), Some("Dinner"));
        assert_eq!(snapshot.expenses[1].amount, Money::from_cents(1_250));

        assert!(ledger.snapshot(&TripId::from("empty")).unwrap().expenses.is_empty());
        assert!(ledger.member_names(&TripId::from("empty")).unwrap().is_empty());
    }

    #[rstest]
    fn member_names_follow_the_snapshot(ledger: SnapshotLedger) {
        let names = ledger.member_names(&okinawa()).unwrap();
        assert_eq!(names.get(&MemberId::from("u2")).map(String::as_str), Some("Ben"));
    }

    #[rstest]
    fn next_id_follows_highest_numbered_expense(ledger: SnapshotLedger) {
        assert_eq!(
            ledger.next_expense_id(&okinawa()).unwrap(),
            ExpenseId::from("e5")
        );
        assert_eq!(
            ledger.next_expense_id(&TripId::from("empty")).unwrap(),
            ExpenseId::from("e1")
        );
    }

    #[rstest]
    fn unknown_trip_is_not_found(ledger: SnapshotLedger) {
        let missing = TripId::from("nowhere");
        assert_eq!(
            ledger.snapshot(&missing),
            Err(LedgerError::TripNotFound(missing.clone()))
        );
        assert_eq!(
            ledger.remove_expense(&missing, &ExpenseId::from("e1")),
            Err(LedgerError::TripNotFound(missing))
        );
    }

    #[rstest]
    fn put_replaces_expense_and_all_its_splits(ledger: SnapshotLedger) {
        let mut expense = ledger.snapshot(&okinawa()).unwrap().expenses[0].clone();
        expense.amount = Money::from_cents(3_000);
        let split = ExpenseSplit {
            expense_id: expense.id.clone(),
            user_id: MemberId::from("u2"),
            amount: Money::from_cents(3_000),
        };

        ledger.put_expense(expense, vec![split.clone()]).unwrap();

        let snapshot = ledger.snapshot(&okinawa()).unwrap();
        assert_eq!(snapshot.expenses[0].amount, Money::from_cents(3_000));
        assert_eq!(
            snapshot
                .split_index()
                .splits_for(&ExpenseId::from("e1"))
                .collect::<Vec<_>>(),
            vec![&split]
        );
        assert_eq!(snapshot.splits.len(), 2);
    }

    #[rstest]
    fn remove_reports_whether_expense_existed(ledger: SnapshotLedger) {
        assert!(ledger.remove_expense(&okinawa(), &ExpenseId::from("e1")).unwrap());
        assert!(!ledger.remove_expense(&okinawa(), &ExpenseId::from("e1")).unwrap());

        let snapshot = ledger.snapshot(&okinawa()).unwrap();
        assert_eq!(snapshot.expenses.len(), 1);
        assert!(snapshot.splits.iter().all(|split| split.expense_id.as_str() == "e4"));
    }

    #[rstest]
    fn stored_corruption_heals_on_read(ledger: SnapshotLedger) {
        let processor = ExpenseProcessor::new(&ledger);
        let view = processor
            .expense_shares(&okinawa(), &ExpenseId::from("e1"))
            .unwrap();

        assert!(view.reconciliation.was_recomputed());
        assert_eq!(
            view.reconciliation.share_of(&MemberId::from("u1")),
            Some(Money::from_cents(4_500))
        );
    }

    #[test]
    fn writes_are_persisted_to_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trips.json");
        fs::write(&path, SAMPLE).unwrap();

        let ledger = SnapshotLedger::open(&path).unwrap();
        let processor = ExpenseProcessor::new(&ledger);
        let created = processor
            .create_expense(
                &okinawa(),
                ExpenseDraft::equal(Money::from_cents(3_000), "u2", ["u1", "u2", "u3"]),
            )
            .unwrap();
        assert_eq!(created.id, ExpenseId::from("e5"));

        let reopened = SnapshotLedger::open(&path).unwrap();
        assert_eq!(reopened.to_snapshot().unwrap(), ledger.to_snapshot().unwrap());
        let snapshot = reopened.snapshot(&okinawa()).unwrap();
        assert_eq!(snapshot.expenses.len(), 3);
        assert_eq!(
            snapshot
                .split_index()
                .splits_for(&created.id)
                .map(|split| split.amount)
                .collect::<Vec<_>>(),
            vec![Money::from_cents(1_000); 3]
        );
    }

    #[rstest]
    fn failed_write_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trips.json");
        fs::write(&path, SAMPLE).unwrap();
        let ledger = SnapshotLedger::open(&path).unwrap();
        let before = ledger.to_snapshot().unwrap();
        dir.close().unwrap();

        let mut expense = before.trips[0].expenses[0].clone();
        expense.id = ExpenseId::from("e5");
        assert!(matches!(
            ledger.put_expense(expense, vec![]),
            Err(LedgerError::Storage(_))
        ));
        assert!(matches!(
            ledger.remove_expense(&okinawa(), &ExpenseId::from("e1")),
            Err(LedgerError::Storage(_))
        ));

        assert_eq!(ledger.to_snapshot().unwrap(), before);
    }

    #[rstest]
    #[case::missing_file(None)]
    #[case::bad_json(Some("{ \"trips\": ["))]
    #[case::too_precise(Some(r#"{ "trips": [ { "id": "t", "expenses": [
        { "id": "e1", "trip_id": "t", "amount": "1.005", "payer_id": "u1" } ] } ] }"#))]
    fn open_rejects_unreadable_snapshots(#[case] content: Option<&str>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trips.json");
        if let Some(content) = content {
            fs::write(&path, content).unwrap();
        }

        let err = SnapshotLedger::open(&path).unwrap_err();
        match content {
            None => assert!(matches!(err, SnapshotError::Io { .. })),
            Some(_) => assert!(matches!(err, SnapshotError::Json(_))),
        }
        assert!(matches!(LedgerError::from(err), LedgerError::Storage(_)));
    }
}
