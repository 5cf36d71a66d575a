//! Event repository implementation

use sqlx::{PgConnection, PgPool};
use chrono::{DateTime, Utc};
use crate::database::store::SweepCriteria;
use crate::models::event::{Event, EventStatus, NewEvent};
use crate::utils::errors::EventDeskError;

const EVENT_COLUMNS: &str = "id, title, description, location, department_id, created_by, status, audience, mode, \
     max_capacity, start_time, end_time, registration_start, registration_end, checkin_start, checkin_end, \
     created_at, updated_at";

#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new DRAFT event
    pub async fn insert(conn: &mut PgConnection, event: &NewEvent) -> Result<Event, EventDeskError> {
        let query = format!(
            r#"
            INSERT INTO events (title, description, location, department_id, created_by, status, audience, mode,
                                max_capacity, start_time, end_time, registration_start, registration_end,
                                checkin_start, checkin_end, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $16)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        );

        let event = sqlx::query_as::<_, Event>(&query)
            .bind(&event.title)
            .bind(&event.description)
            .bind(&event.location)
            .bind(event.department_id)
            .bind(event.created_by)
            .bind(EventStatus::Draft.as_str())
            .bind(event.audience.as_str())
            .bind(event.mode.as_str())
            .bind(event.max_capacity)
            .bind(event.start_time)
            .bind(event.end_time)
            .bind(event.registration_start)
            .bind(event.registration_end)
            .bind(event.checkin_start)
            .bind(event.checkin_end)
            .bind(event.created_at)
            .fetch_one(&mut *conn)
            .await?;

        Ok(event)
    }

    /// Find event by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Event>, EventDeskError> {
        let query = format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS);
        let event = sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(event)
    }

    /// Read the status of an event and lock its row until the transaction ends.
    /// `exclusive` takes `FOR UPDATE`, otherwise `FOR SHARE`.
    pub async fn locked_status(
        conn: &mut PgConnection,
        id: i64,
        exclusive: bool,
    ) -> Result<Option<EventStatus>, EventDeskError> {
        let query = if exclusive {
            "SELECT status FROM events WHERE id = $1 FOR UPDATE"
        } else {
            "SELECT status FROM events WHERE id = $1 FOR SHARE"
        };
        let status: Option<(String,)> = sqlx::query_as(query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        status.map(|(s,)| s.parse()).transpose()
    }

    /// Update payload fields if the status still matches `expected`
    pub async fn update_if_status(
        conn: &mut PgConnection,
        event: &Event,
        expected: EventStatus,
    ) -> Result<bool, EventDeskError> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET title = $3,
                description = $4,
                location = $5,
                audience = $6,
                mode = $7,
                max_capacity = $8,
                start_time = $9,
                end_time = $10,
                registration_start = $11,
                registration_end = $12,
                checkin_start = $13,
                checkin_end = $14,
                updated_at = $15
            WHERE id = $1 AND status = $2
            "#
        )
        .bind(event.id)
        .bind(expected.as_str())
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.audience.as_str())
        .bind(event.mode.as_str())
        .bind(event.max_capacity)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(event.registration_start)
        .bind(event.registration_end)
        .bind(event.checkin_start)
        .bind(event.checkin_end)
        .bind(event.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Compare-and-set the status
    pub async fn set_status_if(
        &self,
        id: i64,
        expected: EventStatus,
        target: EventStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, EventDeskError> {
        let result = sqlx::query(
            "UPDATE events SET status = $3, updated_at = $4 WHERE id = $1 AND status = $2"
        )
        .bind(id)
        .bind(expected.as_str())
        .bind(target.as_str())
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Events matching a sweep selection
    pub async fn find_sweep_candidates(&self, criteria: SweepCriteria) -> Result<Vec<Event>, EventDeskError> {
        let (deadline_column, now) = match criteria {
            SweepCriteria::RegistrationEnded { now } => ("registration_end", now),
            SweepCriteria::EventEnded { now } => ("end_time", now),
        };
        let query = format!(
            "SELECT {} FROM events WHERE status = $1 AND {} < $2 ORDER BY id ASC",
            EVENT_COLUMNS, deadline_column
        );

        let events = sqlx::query_as::<_, Event>(&query)
            .bind(criteria.status().as_str())
            .bind(now)
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }
}
