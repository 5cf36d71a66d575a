//! Registration repository implementation

use sqlx::{PgConnection, PgPool};
use chrono::{DateTime, Utc};
use crate::models::registration::{NewRegistration, Registration, RegistrationStatus};
use crate::models::role::Role;
use crate::utils::errors::EventDeskError;

const REGISTRATION_COLUMNS: &str =
    "id, event_id, user_id, user_email, role, status, checkin_code, created_at, canceled_at, checkin_at";

fn status_names(statuses: &[RegistrationStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

#[derive(Debug, Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a REGISTERED row
    pub async fn insert(conn: &mut PgConnection, registration: &NewRegistration) -> Result<Registration, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO registrations (event_id, user_id, user_email, role, status, checkin_code, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            REGISTRATION_COLUMNS
        );

        sqlx::query_as::<_, Registration>(&query)
            .bind(registration.event_id)
            .bind(registration.user_id)
            .bind(&registration.user_email)
            .bind(registration.role.as_str())
            .bind(RegistrationStatus::Registered.as_str())
            .bind(&registration.checkin_code)
            .bind(registration.created_at)
            .fetch_one(&mut *conn)
            .await
    }

    /// Count registrations inside an open transaction
    pub async fn count_in(
        conn: &mut PgConnection,
        event_id: i64,
        role: Option<Role>,
        statuses: &[RegistrationStatus],
    ) -> Result<i64, EventDeskError> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM registrations
            WHERE event_id = $1 AND ($2::TEXT IS NULL OR role = $2) AND status = ANY($3)
            "#
        )
        .bind(event_id)
        .bind(role.map(|r| r.as_str()))
        .bind(status_names(statuses))
        .fetch_one(&mut *conn)
        .await?;

        Ok(count.0)
    }

    /// Status of the (user, event) registration, if any
    pub async fn existing_status(
        conn: &mut PgConnection,
        user_id: i64,
        event_id: i64,
    ) -> Result<Option<RegistrationStatus>, EventDeskError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT status FROM registrations WHERE user_id = $1 AND event_id = $2"
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(&mut *conn)
        .await?;

        row.map(|(s,)| s.parse()).transpose()
    }

    /// Count registrations for an event
    pub async fn count(
        &self,
        event_id: i64,
        role: Option<Role>,
        statuses: &[RegistrationStatus],
    ) -> Result<i64, EventDeskError> {
        let mut conn = self.pool.acquire().await?;
        Self::count_in(&mut *conn, event_id, role, statuses).await
    }

    pub async fn find_by_user_and_event(&self, user_id: i64, event_id: i64) -> Result<Option<Registration>, EventDeskError> {
        let query = format!(
            "SELECT {} FROM registrations WHERE user_id = $1 AND event_id = $2",
            REGISTRATION_COLUMNS
        );
        let registration = sqlx::query_as::<_, Registration>(&query)
            .bind(user_id)
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(registration)
    }

    pub async fn find_by_email(&self, event_id: i64, email: &str) -> Result<Option<Registration>, EventDeskError> {
        let query = format!(
            "SELECT {} FROM registrations WHERE event_id = $1 AND lower(user_email) = lower($2)",
            REGISTRATION_COLUMNS
        );
        let registration = sqlx::query_as::<_, Registration>(&query)
            .bind(event_id)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(registration)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Registration>, EventDeskError> {
        let query = format!("SELECT {} FROM registrations WHERE id = $1", REGISTRATION_COLUMNS);
        let registration = sqlx::query_as::<_, Registration>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(registration)
    }

    /// Registrations of an event, oldest first
    pub async fn list_for_event(&self, event_id: i64) -> Result<Vec<Registration>, EventDeskError> {
        let query = format!(
            "SELECT {} FROM registrations WHERE event_id = $1 ORDER BY created_at ASC, id ASC",
            REGISTRATION_COLUMNS
        );
        let registrations = sqlx::query_as::<_, Registration>(&query)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(registrations)
    }

    /// Registrations of a user, newest first
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<Registration>, EventDeskError> {
        let query = format!(
            "SELECT {} FROM registrations WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
            REGISTRATION_COLUMNS
        );
        let registrations = sqlx::query_as::<_, Registration>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(registrations)
    }

    /// Compare-and-set the status, stamping the matching timestamp
    pub async fn set_status_if(
        &self,
        id: i64,
        expected: RegistrationStatus,
        target: RegistrationStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Registration>, EventDeskError> {
        let query = format!(
            r#"
            UPDATE registrations
            SET status = $3,
                canceled_at = CASE WHEN $3 = 'CANCELED' THEN $4 ELSE canceled_at END,
                checkin_at = CASE WHEN $3 = 'ATTENDED' THEN $4 ELSE checkin_at END
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            REGISTRATION_COLUMNS
        );

        let registration = sqlx::query_as::<_, Registration>(&query)
            .bind(id)
            .bind(expected.as_str())
            .bind(target.as_str())
            .bind(at)
            .fetch_optional(&self.pool)
            .await?;

        Ok(registration)
    }

    /// Move REGISTERED rows of an event to ABSENT
    pub async fn mark_absent(&self, event_id: i64) -> Result<u64, EventDeskError> {
        let result = sqlx::query(
            "UPDATE registrations SET status = 'ABSENT' WHERE event_id = $1 AND status = 'REGISTERED'"
        )
        .bind(event_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
