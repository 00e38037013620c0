use serde::{Deserialize, Serialize};
use uuid::Uuid;

use station_core::{
    CurrencyKind, LineKind, OperationType, OwnType, StateType, TransactionRecord, UserId,
};

/// Effect a purchase grants to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantedEffect {
    /// Permanent ownership flag
    Entitlement { state_name: String },
    /// Time-limited access, in seconds
    Duration { state_name: String, seconds: i64 },
}

/// Currency movement paying for a purchase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyDebit {
    pub currency: CurrencyKind,
    pub initial: i64,
    pub resulting: i64,
}

impl CurrencyDebit {
    pub fn amount(&self) -> i64 {
        self.initial - self.resulting
    }
}

/// One of the two line items bundled in a transaction entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionItem {
    GrantedEffect(GrantedEffect),
    CurrencyDebit(CurrencyDebit),
}

const DURATION_DESC_ID: i32 = 2;

impl TransactionItem {
    /// Flat wire and ledger representation
    pub fn line(&self) -> LineItem {
        match self {
            TransactionItem::GrantedEffect(GrantedEffect::Entitlement { state_name }) => LineItem {
                state_name: state_name.clone(),
                state_type: StateType::Item,
                own_type: OwnType::Owned,
                operation_type: OperationType::Purchase,
                initial_value: 0,
                resulting_value: 1,
                delta_value: 1,
                desc_id: 0,
            },
            TransactionItem::GrantedEffect(GrantedEffect::Duration { state_name, seconds }) => LineItem {
                state_name: state_name.clone(),
                state_type: StateType::Duration,
                own_type: OwnType::TimeLimited,
                operation_type: OperationType::Purchase,
                initial_value: *seconds,
                resulting_value: *seconds,
                delta_value: 0,
                desc_id: DURATION_DESC_ID,
            },
            TransactionItem::CurrencyDebit(debit) => LineItem {
                state_name: debit.currency.state_name().to_string(),
                state_type: debit.currency.state_type(),
                own_type: OwnType::NotOwned,
                operation_type: OperationType::Purchase,
                initial_value: debit.initial,
                resulting_value: debit.resulting,
                delta_value: debit.amount(),
                desc_id: 0,
            },
        }
    }

    /// Rebuild an item from a persisted ledger row
    pub fn from_record(record: &TransactionRecord) -> Option<Self> {
        let state_name = record.state_name.clone();
        match (record.line_kind, record.state_type) {
            (LineKind::Granted, StateType::Item) => {
                Some(TransactionItem::GrantedEffect(GrantedEffect::Entitlement { state_name }))
            }
            (LineKind::Granted, StateType::Duration) => {
                Some(TransactionItem::GrantedEffect(GrantedEffect::Duration {
                    state_name,
                    seconds: record.initial_value,
                }))
            }
            (LineKind::Debit, StateType::Credits) => Some(TransactionItem::CurrencyDebit(CurrencyDebit {
                currency: CurrencyKind::Credits,
                initial: record.initial_value,
                resulting: record.resulting_value,
            })),
            (LineKind::Debit, StateType::Gold) => Some(TransactionItem::CurrencyDebit(CurrencyDebit {
                currency: CurrencyKind::Gold,
                initial: record.initial_value,
                resulting: record.resulting_value,
            })),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub state_name: String,
    pub state_type: StateType,
    pub own_type: OwnType,
    pub operation_type: OperationType,
    pub initial_value: i64,
    pub resulting_value: i64,
    pub delta_value: i64,
    pub desc_id: i32,
}

/// Result of applying one offer: the granted effect and the debit that paid for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "TransactionEntryWire")]
pub struct TransactionEntry {
    pub offer_id: String,
    pub granted: GrantedEffect,
    pub debit: CurrencyDebit,
    pub session_id: Uuid,
    pub reference_id: Uuid,
    pub time_stamp: i64,
}

impl TransactionEntry {
    /// New entry with freshly minted session and reference ids
    pub fn new(
        offer_id: impl Into<String>,
        granted: GrantedEffect,
        debit: CurrencyDebit,
        time_stamp: i64,
    ) -> Self {
        Self {
            offer_id: offer_id.into(),
            granted,
            debit,
            session_id: Uuid::new_v4(),
            reference_id: Uuid::new_v4(),
            time_stamp,
        }
    }

    pub fn items(&self) -> [TransactionItem; 2] {
        [
            TransactionItem::GrantedEffect(self.granted.clone()),
            TransactionItem::CurrencyDebit(self.debit.clone()),
        ]
    }

    /// Ledger rows for this entry, granted effect first
    pub fn to_records(&self, user_id: UserId) -> [TransactionRecord; 2] {
        let [granted, debit] = self.items();
        [
            self.record(user_id, LineKind::Granted, granted.line()),
            self.record(user_id, LineKind::Debit, debit.line()),
        ]
    }

    fn record(&self, user_id: UserId, line_kind: LineKind, line: LineItem) -> TransactionRecord {
        TransactionRecord {
            user_id,
            offer_id: self.offer_id.clone(),
            line_kind,
            initial_value: line.initial_value,
            resulting_value: line.resulting_value,
            delta_value: line.delta_value,
            operation_type: line.operation_type,
            session_id: self.session_id,
            reference_id: self.reference_id,
            time_stamp: self.time_stamp,
            state_name: line.state_name,
            state_type: line.state_type,
            own_type: line.own_type,
            desc_id: line.desc_id,
        }
    }

    /// Reassemble an entry from its pair of ledger rows
    pub fn from_records(granted: &TransactionRecord, debit: &TransactionRecord) -> Option<Self> {
        if granted.reference_id != debit.reference_id || granted.offer_id != debit.offer_id {
            return None;
        }

        let TransactionItem::GrantedEffect(effect) = TransactionItem::from_record(granted)? else {
            return None;
        };
        let TransactionItem::CurrencyDebit(payment) = TransactionItem::from_record(debit)? else {
            return None;
        };

        Some(Self {
            offer_id: granted.offer_id.clone(),
            granted: effect,
            debit: payment,
            session_id: granted.session_id,
            reference_id: granted.reference_id,
            time_stamp: granted.time_stamp,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtendedInfoItem {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    pub value: String,
}

/// Client-facing shape of a transaction entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEntryWire {
    pub transaction_items: Vec<LineItem>,
    pub session_id: String,
    pub reference_id: String,
    pub offer_id: String,
    pub time_stamp: i64,
    pub operation_type: OperationType,
    pub extended_info_items: Vec<ExtendedInfoItem>,
}

impl From<TransactionEntry> for TransactionEntryWire {
    fn from(entry: TransactionEntry) -> Self {
        Self {
            transaction_items: entry.items().iter().map(TransactionItem::line).collect(),
            session_id: entry.session_id.to_string(),
            reference_id: entry.reference_id.to_string(),
            offer_id: entry.offer_id,
            time_stamp: entry.time_stamp,
            operation_type: OperationType::Purchase,
            extended_info_items: vec![ExtendedInfoItem {
                key: String::new(),
                value: String::new(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loadout_entry() -> TransactionEntry {
        TransactionEntry::new(
            "weapon_loadout_ak_cr",
            GrantedEffect::Entitlement { state_name: "weapon_loadout_ak".to_string() },
            CurrencyDebit { currency: CurrencyKind::Credits, initial: 20, resulting: 15 },
            1_700_000_000,
        )
    }

    #[test]
    fn test_entry_mints_distinct_ids() {
        let a = loadout_entry();
        let b = loadout_entry();
        assert_ne!(a.session_id, a.reference_id);
        assert_ne!(a.session_id, b.session_id);
        assert_ne!(a.reference_id, b.reference_id);
    }

    #[test]
    fn test_records_reassemble_into_same_entry() {
        let entry = loadout_entry();
        let [granted, debit] = entry.to_records(42);

        assert_eq!(granted.line_kind, LineKind::Granted);
        assert_eq!((granted.initial_value, granted.resulting_value, granted.delta_value), (0, 1, 1));
        assert_eq!(debit.state_name, "credits");
        assert_eq!((debit.initial_value, debit.resulting_value, debit.delta_value), (20, 15, 5));

        assert_eq!(TransactionEntry::from_records(&granted, &debit), Some(entry));
    }

    #[test]
    fn test_mismatched_pair_is_rejected() {
        let [granted, _] = loadout_entry().to_records(1);
        let [_, other_debit] = loadout_entry().to_records(1);
        assert!(TransactionEntry::from_records(&granted, &other_debit).is_none());
    }

    #[test]
    fn test_wire_shape() {
        let entry = TransactionEntry::new(
            "xp_boost_1d",
            GrantedEffect::Duration { state_name: "xp_boost_1d".to_string(), seconds: 86400 },
            CurrencyDebit { currency: CurrencyKind::Gold, initial: 50, resulting: 10 },
            123,
        );
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["offerId"], "xp_boost_1d");
        assert_eq!(json["timeStamp"], 123);
        assert_eq!(json["operationType"], 0);
        assert_eq!(json["sessionId"], entry.session_id.to_string());
        assert_eq!(json["extendedInfoItems"][0]["Key"], "");

        let items = json["transactionItems"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["stateType"], 4);
        assert_eq!(items[0]["ownType"], 2);
        assert_eq!(items[0]["initialValue"], 86400);
        assert_eq!(items[0]["deltaValue"], 0);
        assert_eq!(items[0]["descId"], 2);
        assert_eq!(items[1]["stateName"], "gold");
        assert_eq!(items[1]["stateType"], 3);
        assert_eq!(items[1]["deltaValue"], 40);
    }
}
