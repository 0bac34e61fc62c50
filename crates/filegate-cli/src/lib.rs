use anyhow::Context;
use filegate_core::models::{NewUser, TenantId, UserRole};
use filegate_core::password::hash_password;
use serde::Serialize;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Build an onboarding record, hashing the password. Role and tenant must agree.
pub fn new_user(
    username: &str,
    password: &str,
    role: UserRole,
    tenant_id: Option<TenantId>,
) -> anyhow::Result<NewUser> {
    let username = username.trim();
    if username.is_empty() {
        anyhow::bail!("Username must not be empty");
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        anyhow::bail!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        );
    }

    let user = NewUser {
        username: username.to_string(),
        password_hash: String::new(),
        role,
        tenant_id,
    };
    user.check_tenant_scope()?;

    Ok(NewUser {
        password_hash: hash_password(password)?,
        ..user
    })
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use filegate_core::password::verify_password;

    #[test]
    fn new_user_hashes_password() {
        let user = new_user(" client1 ", "s3cret-pass", UserRole::Client, Some(3)).unwrap();
        assert_eq!(user.username, "client1");
        assert_ne!(user.password_hash, "s3cret-pass");
        assert!(verify_password("s3cret-pass", &user.password_hash).unwrap());
    }

    #[test]
    fn new_user_rejects_role_tenant_mismatch() {
        assert!(new_user("root", "s3cret-pass", UserRole::Admin, Some(3)).is_err());
        assert!(new_user("emp", "s3cret-pass", UserRole::Employee, None).is_err());
    }

    #[test]
    fn new_user_rejects_short_password_and_blank_name() {
        assert!(new_user("emp", "short", UserRole::Employee, Some(1)).is_err());
        assert!(new_user("  ", "s3cret-pass", UserRole::Employee, Some(1)).is_err());
    }
}
