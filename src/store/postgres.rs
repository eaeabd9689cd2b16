//! `PostgreSQL` identity store (`users` + `contributors`, see `db/sql/01_accounts.sql`).

use sqlx::{postgres::PgRow, Connection, PgPool, Row};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use super::IdentityStore;
use crate::accounts::{Contributor, Error, Identity, NewContributor};

const SELECT_CONTRIBUTOR: &str = r"
    SELECT u.id, u.email, u.password_hash, u.display_name, u.last_login,
           c.email_verified, c.postal_code, c.phone_primary, c.about_me
    FROM contributors c
    JOIN users u ON u.id = c.user_id
";

#[derive(Clone, Debug)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl IdentityStore for PgIdentityStore {
    async fn get(&self, id: Uuid) -> Result<Contributor, Error> {
        let query = format!("{SELECT_CONTRIBUTOR} WHERE u.id = $1");
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;

        row.map(|row| contributor_from_row(&row))
            .ok_or(Error::NotFound(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Contributor>, Error> {
        let query = format!("{SELECT_CONTRIBUTOR} WHERE u.email = $1 ORDER BY u.created_at LIMIT 1");
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;

        Ok(row.map(|row| contributor_from_row(&row)))
    }

    async fn insert(&self, contributor: NewContributor) -> Result<Contributor, Error> {
        contributor.validate()?;

        // Identity and profile are created together so the one-to-one link holds.
        let mut tx = self.pool.begin().await?;

        let query = r"
            INSERT INTO users (email, password_hash, display_name)
            VALUES ($1, $2, $3)
            RETURNING id
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(&contributor.email)
            .bind(&contributor.password_hash)
            .bind(&contributor.display_name)
            .fetch_one(&mut *tx)
            .instrument(span)
            .await;

        let id: Uuid = match row {
            Ok(row) => row.get("id"),
            Err(err) => {
                let _ = tx.rollback().await;
                if is_unique_violation(&err) {
                    return Err(Error::AlreadyExists(contributor.email));
                }
                return Err(err.into());
            }
        };

        let record = contributor.into_contributor(id);

        let query = r"
            INSERT INTO contributors (user_id, postal_code, phone_primary, about_me)
            VALUES ($1, $2, $3, $4)
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .bind(&record.postal_code)
            .bind(record.phone_primary.as_deref())
            .bind(record.about_me.as_deref())
            .execute(&mut *tx)
            .instrument(span)
            .await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn mark_email_verified(&self, id: Uuid) -> Result<(), Error> {
        let query = "UPDATE contributors SET email_verified = TRUE WHERE user_id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(span)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(id));
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), Error> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self.pool.acquire().instrument(acquire_span).await?;

        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping().instrument(ping_span).await?;
        Ok(())
    }
}

fn contributor_from_row(row: &PgRow) -> Contributor {
    Contributor {
        identity: Identity {
            id: row.get("id"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            display_name: row.get("display_name"),
            last_login: row.get("last_login"),
        },
        email_verified: row.get("email_verified"),
        postal_code: row.get("postal_code"),
        phone_primary: row.get("phone_primary"),
        about_me: row.get("about_me"),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}
