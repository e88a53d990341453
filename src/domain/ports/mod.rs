use crate::domain::models::{admin::Admin, event::Event, guest::Guest};
use crate::error::AppError;
use async_trait::async_trait;

#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn create(&self, admin: &Admin) -> Result<Admin, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Admin>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Admin>, AppError>;
    async fn list(&self) -> Result<Vec<Admin>, AppError>;
    async fn count(&self) -> Result<i64, AppError>;
    /// Deletes the admin only if at least one other admin remains.
    /// Returns `false` when the row was kept because it is the last one.
    async fn delete_unless_last(&self, id: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn upsert(&self, event: &Event) -> Result<Event, AppError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Event>, AppError>;
    async fn list(&self) -> Result<Vec<Event>, AppError>;
    async fn delete(&self, slug: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait GuestRepository: Send + Sync {
    async fn create(&self, guest: &Guest) -> Result<Guest, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Guest>, AppError>;
    async fn find_by_token(&self, token: &str) -> Result<Option<Guest>, AppError>;
    async fn list(&self, search: Option<&str>) -> Result<Vec<Guest>, AppError>;
    async fn update(&self, guest: &Guest) -> Result<Guest, AppError>;
    /// Like `update`, but only writes while the stored `allowed_devices` still
    /// equals `expected_devices`. `None` means another write got there first.
    async fn update_if_devices(&self, guest: &Guest, expected_devices: &str) -> Result<Option<Guest>, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
    async fn delete_many(&self, ids: &[String]) -> Result<u64, AppError>;
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError>;
}
