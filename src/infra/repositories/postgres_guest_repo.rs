use crate::domain::{models::guest::Guest, ports::GuestRepository};
use crate::error::AppError;
use super::contains_pattern;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

const GUEST_COLUMNS: &str = "id, name, phone, email, token, access_preset, event_access, max_devices_allowed, allowed_devices, token_used_first_time, token_expires_at, rsvp_submitted, rsvp_status, attendee_counts, menu_preference, dietary_notes, preferences_submitted, created_at, updated_at";

pub struct PostgresGuestRepo {
    pool: PgPool,
}

impl PostgresGuestRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Writes every mutable column. With `expected_devices` the write only
    /// lands if `allowed_devices` still holds that value.
    async fn write(&self, guest: &Guest, expected_devices: Option<&str>) -> Result<Option<Guest>, AppError> {
        let guard = if expected_devices.is_some() { " AND allowed_devices = $19" } else { "" };
        let sql = format!(
            r#"UPDATE guests SET
                name = $1, phone = $2, email = $3, token = $4, access_preset = $5, event_access = $6,
                max_devices_allowed = $7, allowed_devices = $8, token_used_first_time = $9, token_expires_at = $10,
                rsvp_submitted = $11, rsvp_status = $12, attendee_counts = $13, menu_preference = $14,
                dietary_notes = $15, preferences_submitted = $16, updated_at = $17
            WHERE id = $18 {guard} RETURNING {GUEST_COLUMNS}"#
        );
        let mut query = sqlx::query_as::<_, Guest>(&sql)
            .bind(&guest.name)
            .bind(&guest.phone)
            .bind(&guest.email)
            .bind(&guest.token)
            .bind(&guest.access_preset)
            .bind(&guest.event_access)
            .bind(guest.max_devices_allowed)
            .bind(&guest.allowed_devices)
            .bind(guest.token_used_first_time)
            .bind(guest.token_expires_at)
            .bind(guest.rsvp_submitted)
            .bind(&guest.rsvp_status)
            .bind(&guest.attendee_counts)
            .bind(&guest.menu_preference)
            .bind(&guest.dietary_notes)
            .bind(guest.preferences_submitted)
            .bind(guest.updated_at)
            .bind(&guest.id);
        if let Some(expected) = expected_devices {
            query = query.bind(expected.to_string());
        }
        query.fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}

#[async_trait]
impl GuestRepository for PostgresGuestRepo {
    async fn create(&self, guest: &Guest) -> Result<Guest, AppError> {
        let sql = format!(
            "INSERT INTO guests ({GUEST_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19) RETURNING {GUEST_COLUMNS}"
        );
        sqlx::query_as::<_, Guest>(&sql)
            .bind(&guest.id)
            .bind(&guest.name)
            .bind(&guest.phone)
            .bind(&guest.email)
            .bind(&guest.token)
            .bind(&guest.access_preset)
            .bind(&guest.event_access)
            .bind(guest.max_devices_allowed)
            .bind(&guest.allowed_devices)
            .bind(guest.token_used_first_time)
            .bind(guest.token_expires_at)
            .bind(guest.rsvp_submitted)
            .bind(&guest.rsvp_status)
            .bind(&guest.attendee_counts)
            .bind(&guest.menu_preference)
            .bind(&guest.dietary_notes)
            .bind(guest.preferences_submitted)
            .bind(guest.created_at)
            .bind(guest.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Guest>, AppError> {
        sqlx::query_as::<_, Guest>(&format!("SELECT {GUEST_COLUMNS} FROM guests WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Guest>, AppError> {
        sqlx::query_as::<_, Guest>(&format!("SELECT {GUEST_COLUMNS} FROM guests WHERE token = $1"))
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list(&self, search: Option<&str>) -> Result<Vec<Guest>, AppError> {
        match search.map(str::trim).filter(|s| !s.is_empty()) {
            Some(term) => {
                let pattern = contains_pattern(&term.to_lowercase());
                sqlx::query_as::<_, Guest>(&format!(
                    "SELECT {GUEST_COLUMNS} FROM guests WHERE LOWER(name) LIKE $1 ESCAPE '\\' OR phone LIKE $2 ESCAPE '\\' OR LOWER(email) LIKE $3 ESCAPE '\\' ORDER BY name ASC"
                ))
                    .bind(&pattern)
                    .bind(&pattern)
                    .bind(&pattern)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(AppError::Database)
            }
            None => sqlx::query_as::<_, Guest>(&format!("SELECT {GUEST_COLUMNS} FROM guests ORDER BY name ASC"))
                .fetch_all(&self.pool)
                .await
                .map_err(AppError::Database),
        }
    }

    async fn update(&self, guest: &Guest) -> Result<Guest, AppError> {
        self.write(guest, None).await?
            .ok_or(AppError::NotFound("Guest not found".into()))
    }

    async fn update_if_devices(&self, guest: &Guest, expected_devices: &str) -> Result<Option<Guest>, AppError> {
        self.write(guest, Some(expected_devices)).await
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM guests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Guest not found".into()));
        }
        Ok(())
    }

    async fn delete_many(&self, ids: &[String]) -> Result<u64, AppError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<Postgres>::new("DELETE FROM guests WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let result = builder.build()
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}
