//! User commands. Both need an admin token.

use shopfront_core::listing::ListQuery;
use shopfront_core::{User, UserId};

use super::{CliError, Context, confirm, print_table};

/// `shop-cli users list`
///
/// # Errors
///
/// Returns an error if no admin token can be obtained or the backend
/// request fails.
pub async fn list(ctx: &Context, q: Option<String>, role: Option<String>) -> Result<(), CliError> {
    let token = ctx.admin_token().await?;
    let query = ListQuery {
        q,
        role,
        ..ListQuery::default()
    };
    let users = query
        .user_filter()
        .apply(ctx.client.list_users(&token).await?);

    print_table(
        &["ID", "NAME", "EMAIL", "ROLE", "JOINED"],
        &users.iter().map(user_row).collect::<Vec<_>>(),
    );
    Ok(())
}

fn user_row(user: &User) -> Vec<String> {
    vec![
        user.id.to_string(),
        user.name.clone(),
        user.email.to_string(),
        user.role.to_string(),
        user.created_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
    ]
}

/// `shop-cli users delete`
///
/// # Errors
///
/// Returns an error if the deletion is not confirmed or the backend
/// refuses it.
pub async fn delete(ctx: &Context, id: &str, yes: bool) -> Result<(), CliError> {
    let token = ctx.admin_token().await?;
    let id = UserId::new(id);
    let user = ctx
        .client
        .list_users(&token)
        .await?
        .into_iter()
        .find(|u| u.id == id);
    let label = user.map_or_else(|| id.to_string(), |u| format!("{} <{}>", u.name, u.email));
    confirm(&format!("Delete user {label}?"), yes)?;

    ctx.client.delete_user(&token, &id).await?;
    tracing::info!(user_id = %id, "User deleted");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_row() {
        let user: User = serde_json::from_value(serde_json::json!({
            "_id": "u1", "name": "Ada", "email": "ada@shop.test", "role": "admin",
            "created_at": "2024-03-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(
            user_row(&user),
            vec!["u1", "Ada", "ada@shop.test", "admin", "2024-03-01"]
        );
    }
}
