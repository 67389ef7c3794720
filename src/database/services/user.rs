use super::super::types::User;
use super::super::UserStore;
use super::DatabaseError;
use super::DatabaseService;
use async_trait::async_trait;

const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        tg_id BIGINT PRIMARY KEY,
        phone TEXT,
        lat DOUBLE PRECISION,
        lon DOUBLE PRECISION
    )
"#;

// Single statement, so all three fields land together or not at all.
const UPSERT_USER: &str = r#"
    INSERT INTO users (tg_id, phone, lat, lon)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (tg_id) DO UPDATE
    SET phone = EXCLUDED.phone, lat = EXCLUDED.lat, lon = EXCLUDED.lon
"#;

#[async_trait]
impl UserStore for DatabaseService {
    async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        sqlx::query(CREATE_USERS_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    async fn upsert_user(&self, user: &User) -> Result<(), DatabaseError> {
        sqlx::query(UPSERT_USER)
            .bind(user.tg_id)
            .bind(user.phone.as_deref())
            .bind(user.lat)
            .bind(user.lon)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // Find user based on telegram id
    async fn get_user(&self, tg_id: i64) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT tg_id, phone, lat, lon FROM users WHERE tg_id = $1",
        )
        .bind(tg_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
