use crate::models::{NewSession, NewUser, User};
use crate::schema::{sessions, users};
use chrono::{Duration, Utc};
use diesel::prelude::*;
use mealwise_core::Owner;

use super::crypto::{generate_token, hash_token};

const SESSION_DAYS: i64 = 30;

/// Errors from issuing a session token.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Failed to generate token: {0}")]
    Random(#[from] rand::rand_core::OsError),
}

/// Find or create the user with this email and open a session for them.
/// Returns the raw bearer token; only its hash is stored.
pub fn issue_session(
    conn: &mut PgConnection,
    email: &str,
    name: &str,
) -> Result<String, SessionError> {
    let token = generate_token()?;
    let token_hash = hash_token(&token);

    conn.transaction(|conn| {
        let user_id: uuid::Uuid = diesel::insert_into(users::table)
            .values(NewUser { name, email })
            .on_conflict(users::email)
            .do_update()
            .set(users::name.eq(name))
            .returning(users::id)
            .get_result(conn)?;

        diesel::insert_into(sessions::table)
            .values(NewSession {
                user_id,
                token_hash: &token_hash,
                expires_at: Utc::now() + Duration::days(SESSION_DAYS),
            })
            .execute(conn)?;

        Ok::<_, diesel::result::Error>(())
    })?;

    Ok(token)
}

/// Resolve a bearer token to the owner it was issued for. `Ok(None)` covers
/// unknown and expired tokens and users that have since been deleted.
pub fn find_session_owner(
    conn: &mut PgConnection,
    token: &str,
) -> Result<Option<Owner>, diesel::result::Error> {
    let token_hash = hash_token(token);

    let user = sessions::table
        .inner_join(users::table)
        .filter(sessions::token_hash.eq(&token_hash))
        .filter(sessions::expires_at.gt(Utc::now()))
        .filter(users::deleted_at.is_null())
        .select(User::as_select())
        .first(conn)
        .optional()?;

    Ok(user.map(Owner::from))
}
