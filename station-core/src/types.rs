use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::StoreError;

pub type UserId = i64;

/// Virtual currency an offer is priced in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CurrencyKind {
    Credits,
    Gold,
}

impl CurrencyKind {
    /// Offer identifiers carrying this suffix are priced in credits.
    pub const CREDITS_SUFFIX: &'static str = "_cr";

    pub fn of_offer(offer_id: &str) -> Self {
        if offer_id.ends_with(Self::CREDITS_SUFFIX) {
            CurrencyKind::Credits
        } else {
            CurrencyKind::Gold
        }
    }

    /// Name of the user state holding the balance.
    pub fn state_name(&self) -> &'static str {
        match self {
            CurrencyKind::Credits => "credits",
            CurrencyKind::Gold => "gold",
        }
    }

    pub fn state_type(&self) -> StateType {
        match self {
            CurrencyKind::Credits => StateType::Credits,
            CurrencyKind::Gold => StateType::Gold,
        }
    }
}

impl fmt::Display for CurrencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurrencyKind::Credits => f.write_str("Credits"),
            CurrencyKind::Gold => f.write_str("Gold"),
        }
    }
}

/// Ownership semantics of a user state entry. Currency balances use `NotOwned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum OwnType {
    NotOwned = 0,
    Owned = 1,
    TimeLimited = 2,
}

/// Classification consumed by game clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum StateType {
    Item = 0,
    Credits = 2,
    Gold = 3,
    Duration = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum OperationType {
    Purchase = 0,
}

macro_rules! wire_tag {
    ($ty:ident, $field:literal, { $($variant:ident),+ $(,)? }) => {
        impl $ty {
            pub fn tag(self) -> i16 {
                self as i16
            }
        }

        impl TryFrom<i16> for $ty {
            type Error = StoreError;

            fn try_from(value: i16) -> Result<Self, Self::Error> {
                $(
                    if value == $ty::$variant as i16 {
                        return Ok($ty::$variant);
                    }
                )+
                Err(StoreError::InvalidTag { field: $field, value: value.into() })
            }
        }

        impl Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_i16(self.tag())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = i16::deserialize(deserializer)?;
                $ty::try_from(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

wire_tag!(OwnType, "own_type", { NotOwned, Owned, TimeLimited });
wire_tag!(StateType, "state_type", { Item, Credits, Gold, Duration });
wire_tag!(OperationType, "operation_type", { Purchase });

/// Which half of an applied offer a ledger row describes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Granted,
    Debit,
}

impl LineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineKind::Granted => "granted",
            LineKind::Debit => "debit",
        }
    }
}

impl FromStr for LineKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "granted" => Ok(LineKind::Granted),
            "debit" => Ok(LineKind::Debit),
            _ => Err(StoreError::Backend(format!("unknown line kind: {}", s))),
        }
    }
}

/// A per-user named integer: currency balance, entitlement flag or remaining duration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserStateEntry {
    pub user_id: UserId,
    pub state_name: String,
    pub value: i64,
    pub own_type: OwnType,
    pub state_type: StateType,
}

impl UserStateEntry {
    pub fn new(
        user_id: UserId,
        state_name: impl Into<String>,
        value: i64,
        own_type: OwnType,
        state_type: StateType,
    ) -> Self {
        Self {
            user_id,
            state_name: state_name.into(),
            value,
            own_type,
            state_type,
        }
    }

    /// Balance entry for a currency.
    pub fn currency(user_id: UserId, kind: CurrencyKind, value: i64) -> Self {
        Self::new(user_id, kind.state_name(), value, OwnType::NotOwned, kind.state_type())
    }
}

/// Immutable audit row. Never updated or deleted once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub user_id: UserId,
    pub offer_id: String,
    pub line_kind: LineKind,
    pub initial_value: i64,
    pub resulting_value: i64,
    pub delta_value: i64,
    pub operation_type: OperationType,
    pub session_id: Uuid,
    pub reference_id: Uuid,
    pub time_stamp: i64,
    pub state_name: String,
    pub state_type: StateType,
    pub own_type: OwnType,
    pub desc_id: i32,
}
