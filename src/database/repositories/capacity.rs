//! Event capacity repository implementation

use sqlx::{PgConnection, PgPool};
use crate::models::event::{CapacityEntry, EventCapacity};
use crate::models::role::Role;
use crate::utils::errors::EventDeskError;

#[derive(Debug, Clone)]
pub struct CapacityRepository {
    pool: PgPool,
}

impl CapacityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Capacity set of an event
    pub async fn list_for_event(&self, event_id: i64) -> Result<Vec<EventCapacity>, EventDeskError> {
        let capacities = sqlx::query_as::<_, EventCapacity>(
            "SELECT event_id, role, capacity FROM event_capacities WHERE event_id = $1 ORDER BY role ASC"
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(capacities)
    }

    /// Replace the whole capacity set of an event
    pub async fn replace_all(
        conn: &mut PgConnection,
        event_id: i64,
        entries: &[CapacityEntry],
    ) -> Result<Vec<EventCapacity>, EventDeskError> {
        sqlx::query("DELETE FROM event_capacities WHERE event_id = $1")
            .bind(event_id)
            .execute(&mut *conn)
            .await?;

        let mut rows = Vec::with_capacity(entries.len());
        for entry in entries {
            let row = sqlx::query_as::<_, EventCapacity>(
                r#"
                INSERT INTO event_capacities (event_id, role, capacity)
                VALUES ($1, $2, $3)
                RETURNING event_id, role, capacity
                "#
            )
            .bind(event_id)
            .bind(entry.role.as_str())
            .bind(entry.capacity)
            .fetch_one(&mut *conn)
            .await?;
            rows.push(row);
        }

        Ok(rows)
    }

    /// Lock the (event, role) capacity row; this is the admission serialization point
    pub async fn lock_for_update(
        conn: &mut PgConnection,
        event_id: i64,
        role: Role,
    ) -> Result<Option<i32>, EventDeskError> {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT capacity FROM event_capacities WHERE event_id = $1 AND role = $2 FOR UPDATE"
        )
        .bind(event_id)
        .bind(role.as_str())
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.map(|(capacity,)| capacity))
    }
}
