//! Runs only when `TEST_POSTGRES_URL` points at a disposable database.

use sqlx::postgres::PgPoolOptions;
use wedding_invite::domain::{models::admin::Admin, ports::AdminRepository};
use wedding_invite::infra::repositories::postgres_admin_repo::PostgresAdminRepo;

#[tokio::test]
async fn test_concurrent_deletes_keep_one_admin_on_postgres() {
    let Ok(url) = std::env::var("TEST_POSTGRES_URL") else {
        eprintln!("TEST_POSTGRES_URL not set, skipping");
        return;
    };

    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .expect("Failed to connect to Postgres");

    sqlx::migrate!("./migrations/postgres")
        .run(&pool)
        .await
        .expect("Failed to migrate Postgres");

    let repo = PostgresAdminRepo::new(pool.clone());

    for round in 0..20 {
        sqlx::query("DELETE FROM admins").execute(&pool).await.unwrap();
        let a = repo.create(&Admin::new(&format!("a{}@example.com", round), "hash".into())).await.unwrap();
        let b = repo.create(&Admin::new(&format!("b{}@example.com", round), "hash".into())).await.unwrap();

        let (first, second) = tokio::join!(repo.delete_unless_last(&a.id), repo.delete_unless_last(&b.id));
        let deleted = [first.unwrap(), second.unwrap()].iter().filter(|d| **d).count();

        assert_eq!(deleted, 1, "round {}", round);
        assert_eq!(repo.count().await.unwrap(), 1, "round {}", round);
    }
}
