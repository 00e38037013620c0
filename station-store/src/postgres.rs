use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use station_core::{
    OperationType, OwnType, StateType, Storage, StoreError, StoreResult, TransactionLedger,
    TransactionRecord, UserId, UserStateEntry, UserStateRepository,
};

/// Postgres-backed user state store and ledger. One unit of work is one
/// database transaction holding the user's advisory lock.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct UserStateRow {
    user_id: i64,
    state_name: String,
    value: i64,
    own_type: i16,
    state_type: i16,
}

impl UserStateRow {
    fn into_entry(self) -> StoreResult<UserStateEntry> {
        Ok(UserStateEntry {
            user_id: self.user_id,
            state_name: self.state_name,
            value: self.value,
            own_type: OwnType::try_from(self.own_type)?,
            state_type: StateType::try_from(self.state_type)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TransactionRow {
    user_id: i64,
    offer_id: String,
    line_kind: String,
    initial_value: i64,
    resulting_value: i64,
    delta_value: i64,
    operation_type: i16,
    session_id: Uuid,
    reference_id: Uuid,
    time_stamp: i64,
    state_name: String,
    state_type: i16,
    own_type: i16,
    desc_id: i32,
}

impl TransactionRow {
    fn into_record(self) -> StoreResult<TransactionRecord> {
        Ok(TransactionRecord {
            user_id: self.user_id,
            offer_id: self.offer_id,
            line_kind: self.line_kind.parse()?,
            initial_value: self.initial_value,
            resulting_value: self.resulting_value,
            delta_value: self.delta_value,
            operation_type: OperationType::try_from(self.operation_type)?,
            session_id: self.session_id,
            reference_id: self.reference_id,
            time_stamp: self.time_stamp,
            state_name: self.state_name,
            state_type: StateType::try_from(self.state_type)?,
            own_type: OwnType::try_from(self.own_type)?,
            desc_id: self.desc_id,
        })
    }
}

#[async_trait]
impl Storage for PgStore {
    type UnitOfWork = Transaction<'static, Postgres>;

    async fn begin(&self, user_id: UserId) -> StoreResult<Self::UnitOfWork> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        // Serializes batches of the same user until commit/rollback
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        Ok(tx)
    }

    async fn commit(&self, uow: Self::UnitOfWork) -> StoreResult<()> {
        uow.commit().await.map_err(backend)
    }

    async fn rollback(&self, uow: Self::UnitOfWork) -> StoreResult<()> {
        uow.rollback().await.map_err(backend)
    }
}

#[async_trait]
impl UserStateRepository for PgStore {
    async fn read_state(
        &self,
        uow: &mut Self::UnitOfWork,
        user_id: UserId,
        state_name: &str,
    ) -> StoreResult<i64> {
        let value: Option<i64> = sqlx::query_scalar(
            "SELECT value FROM user_states WHERE user_id = $1 AND state_name = $2 FOR UPDATE",
        )
        .bind(user_id)
        .bind(state_name)
        .fetch_optional(&mut **uow)
        .await
        .map_err(backend)?;

        Ok(value.unwrap_or(0))
    }

    async fn write_state(
        &self,
        uow: &mut Self::UnitOfWork,
        entry: &UserStateEntry,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_states (user_id, state_name, value, own_type, state_type)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, state_name)
            DO UPDATE SET value = EXCLUDED.value, own_type = EXCLUDED.own_type, state_type = EXCLUDED.state_type
            "#,
        )
        .bind(entry.user_id)
        .bind(&entry.state_name)
        .bind(entry.value)
        .bind(entry.own_type.tag())
        .bind(entry.state_type.tag())
        .execute(&mut **uow)
        .await
        .map_err(backend)?;

        Ok(())
    }

    async fn reset_state(
        &self,
        uow: &mut Self::UnitOfWork,
        user_id: UserId,
        state_name: &str,
        value: i64,
        own_type: OwnType,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE user_states SET value = $1, own_type = $2 WHERE user_id = $3 AND state_name = $4",
        )
        .bind(value)
        .bind(own_type.tag())
        .bind(user_id)
        .bind(state_name)
        .execute(&mut **uow)
        .await
        .map_err(backend)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_states(&self, user_id: UserId) -> StoreResult<Vec<UserStateEntry>> {
        let rows: Vec<UserStateRow> = sqlx::query_as(
            "SELECT user_id, state_name, value, own_type, state_type FROM user_states WHERE user_id = $1 ORDER BY state_name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(UserStateRow::into_entry).collect()
    }
}

#[async_trait]
impl TransactionLedger for PgStore {
    async fn append(
        &self,
        uow: &mut Self::UnitOfWork,
        record: &TransactionRecord,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions
            (user_id, offer_id, line_kind, initial_value, resulting_value, delta_value, operation_type,
             session_id, reference_id, time_stamp, state_name, state_type, own_type, desc_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(record.user_id)
        .bind(&record.offer_id)
        .bind(record.line_kind.as_str())
        .bind(record.initial_value)
        .bind(record.resulting_value)
        .bind(record.delta_value)
        .bind(record.operation_type.tag())
        .bind(record.session_id)
        .bind(record.reference_id)
        .bind(record.time_stamp)
        .bind(&record.state_name)
        .bind(record.state_type.tag())
        .bind(record.own_type.tag())
        .bind(record.desc_id)
        .execute(&mut **uow)
        .await
        .map_err(backend)?;

        Ok(())
    }

    async fn list_for_user(&self, user_id: UserId) -> StoreResult<Vec<TransactionRecord>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            r#"
            SELECT user_id, offer_id, line_kind, initial_value, resulting_value, delta_value, operation_type,
                   session_id, reference_id, time_stamp, state_name, state_type, own_type, desc_id
            FROM transactions
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(TransactionRow::into_record).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use station_core::LineKind;

    fn state_row(own_type: i16, state_type: i16) -> UserStateRow {
        UserStateRow {
            user_id: 7,
            state_name: "xp_boost_1d".to_string(),
            value: 86400,
            own_type,
            state_type,
        }
    }

    fn transaction_row(line_kind: &str, operation_type: i16, state_type: i16) -> TransactionRow {
        TransactionRow {
            user_id: 7,
            offer_id: "xp_boost_1d_cr".to_string(),
            line_kind: line_kind.to_string(),
            initial_value: 20,
            resulting_value: 14,
            delta_value: 6,
            operation_type,
            session_id: Uuid::new_v4(),
            reference_id: Uuid::new_v4(),
            time_stamp: 1_700_000_000,
            state_name: "credits".to_string(),
            state_type,
            own_type: 0,
            desc_id: 0,
        }
    }

    #[test]
    fn test_state_row_maps_tags() {
        let entry = state_row(2, 4).into_entry().unwrap();
        assert_eq!(entry.own_type, OwnType::TimeLimited);
        assert_eq!(entry.state_type, StateType::Duration);
        assert_eq!(entry.value, 86400);
    }

    #[test]
    fn test_state_row_rejects_unknown_tags() {
        assert!(matches!(
            state_row(9, 4).into_entry(),
            Err(StoreError::InvalidTag { field: "own_type", value: 9 })
        ));
        assert!(matches!(
            state_row(1, 1).into_entry(),
            Err(StoreError::InvalidTag { field: "state_type", value: 1 })
        ));
    }

    #[test]
    fn test_transaction_row_maps_record() {
        let row = transaction_row("debit", 0, 2);
        let reference_id = row.reference_id;
        let record = row.into_record().unwrap();

        assert_eq!(record.line_kind, LineKind::Debit);
        assert_eq!(record.operation_type, OperationType::Purchase);
        assert_eq!(record.state_type, StateType::Credits);
        assert_eq!(record.own_type, OwnType::NotOwned);
        assert_eq!(record.reference_id, reference_id);
        assert_eq!((record.initial_value, record.resulting_value, record.delta_value), (20, 14, 6));
    }

    #[test]
    fn test_transaction_row_rejects_unknown_values() {
        assert!(matches!(
            transaction_row("refund", 0, 2).into_record(),
            Err(StoreError::Backend(_))
        ));
        assert!(matches!(
            transaction_row("debit", 3, 2).into_record(),
            Err(StoreError::InvalidTag { field: "operation_type", value: 3 })
        ));
        assert!(matches!(
            transaction_row("granted", 0, 7).into_record(),
            Err(StoreError::InvalidTag { field: "state_type", value: 7 })
        ));
    }
}
