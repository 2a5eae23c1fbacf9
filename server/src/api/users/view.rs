use crate::models::User;
use crate::schema::subscriptions;
use diesel::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use utoipa::ToSchema;
use uuid::Uuid;

/// Public view of a user, as seen by the (possibly anonymous) viewer.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Whether the viewer follows this user. Always false for anonymous viewers.
    pub is_subscribed: bool,
    pub avatar: Option<String>,
}

impl UserResponse {
    pub fn new(user: User, is_subscribed: bool) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
            avatar: user.avatar,
        }
    }
}

/// Which of `author_ids` the viewer is subscribed to.
pub fn subscribed_to(
    conn: &mut PgConnection,
    viewer: Option<Uuid>,
    author_ids: &[Uuid],
) -> QueryResult<HashSet<Uuid>> {
    let Some(viewer) = viewer else {
        return Ok(HashSet::new());
    };
    if author_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let ids: Vec<Uuid> = subscriptions::table
        .filter(subscriptions::user_id.eq(viewer))
        .filter(subscriptions::author_id.eq_any(author_ids))
        .select(subscriptions::author_id)
        .load(conn)?;

    Ok(ids.into_iter().collect())
}

/// Build responses for `users` in order, resolving subscriptions in one query.
pub fn user_responses(
    conn: &mut PgConnection,
    viewer: Option<Uuid>,
    users: Vec<User>,
) -> QueryResult<Vec<UserResponse>> {
    let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
    let subscribed = subscribed_to(conn, viewer, &ids)?;

    Ok(users
        .into_iter()
        .map(|u| {
            let is_subscribed = subscribed.contains(&u.id);
            UserResponse::new(u, is_subscribed)
        })
        .collect())
}
