use station_core::{LineKind, TransactionRecord};
use tracing::warn;

use crate::models::TransactionEntry;

/// Rebuild transaction entries from ledger rows in insertion order.
///
/// Each applied offer is stored as a granted row immediately followed by its
/// debit row. Rows that do not pair up are skipped.
pub fn replay(records: &[TransactionRecord]) -> Vec<TransactionEntry> {
    let mut entries = Vec::with_capacity(records.len() / 2);
    let mut pending: Option<&TransactionRecord> = None;

    for record in records {
        match record.line_kind {
            LineKind::Granted => {
                if let Some(orphan) = pending.replace(record) {
                    warn!("Ledger row without debit skipped: reference {}", orphan.reference_id);
                }
            }
            LineKind::Debit => {
                let Some(granted) = pending.take() else {
                    warn!("Ledger debit without granted row skipped: reference {}", record.reference_id);
                    continue;
                };
                match TransactionEntry::from_records(granted, record) {
                    Some(entry) => entries.push(entry),
                    None => warn!(
                        "Ledger rows do not form an entry: references {} / {}",
                        granted.reference_id, record.reference_id
                    ),
                }
            }
        }
    }

    if let Some(orphan) = pending {
        warn!("Ledger row without debit skipped: reference {}", orphan.reference_id);
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CurrencyDebit, GrantedEffect};
    use station_core::CurrencyKind;

    fn entry(offer_id: &str, initial: i64, resulting: i64) -> TransactionEntry {
        TransactionEntry::new(
            offer_id,
            GrantedEffect::Duration { state_name: offer_id.to_string(), seconds: 3600 },
            CurrencyDebit { currency: CurrencyKind::Gold, initial, resulting },
            99,
        )
    }

    #[test]
    fn test_replay_preserves_order() {
        let first = entry("boost_a", 30, 20);
        let second = entry("boost_b", 20, 5);
        let records: Vec<_> = first
            .to_records(1)
            .into_iter()
            .chain(second.to_records(1))
            .collect();

        assert_eq!(replay(&records), vec![first, second]);
    }

    #[test]
    fn test_replay_skips_incomplete_pairs() {
        let complete = entry("boost_a", 30, 20);
        let [dangling_granted, _] = entry("boost_b", 20, 10).to_records(1);
        let [_, dangling_debit] = entry("boost_c", 10, 0).to_records(1);

        let mut records = vec![dangling_debit, dangling_granted];
        records.extend(complete.to_records(1));

        assert_eq!(replay(&records), vec![complete]);
    }

    #[test]
    fn test_replay_empty() {
        assert!(replay(&[]).is_empty());
    }
}
