//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a staff member; the password comes from LOYALTY_USER_PASSWORD
//! loyalty-cli user create -e staff@example.com --first-name Sam --last-name Lee -r staff
//! ```

use loyalty_api::services::AuthService;
use loyalty_api::services::auth::Registration;
use loyalty_core::{Email, UserRole};

use super::{CommandError, connect};

/// Environment variable read when `--password` is omitted.
pub const PASSWORD_ENV: &str = "LOYALTY_USER_PASSWORD";

/// Arguments for `user create`.
#[derive(Debug)]
pub struct NewUserArgs {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub password: Option<String>,
}

impl NewUserArgs {
    fn registration(self) -> Result<Registration, CommandError> {
        let email = Email::parse(&self.email)
            .map_err(|e| CommandError::InvalidArgument(format!("Invalid email: {e}")))?;
        let role: UserRole = self.role.parse().map_err(|_| {
            CommandError::InvalidArgument(format!(
                "Invalid role: {}. Valid roles: customer, staff, manager, admin",
                self.role
            ))
        })?;
        let password = self
            .password
            .or_else(|| std::env::var(PASSWORD_ENV).ok())
            .ok_or(CommandError::MissingEnvVar(PASSWORD_ENV))?;

        Ok(Registration {
            email,
            password,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone: None,
            marketing_consent: false,
            role,
        })
    }
}

/// Create a user with the given role and a linked customer record.
///
/// # Errors
///
/// Returns `CommandError` for invalid arguments, a weak password, an existing
/// email or a database failure.
pub async fn create(args: NewUserArgs) -> Result<i32, CommandError> {
    let registration = args.registration()?;
    let email = registration.email.clone();
    let role = registration.role;

    let pool = connect().await?;
    tracing::info!("Creating user: {} ({})", email, role);

    let (user, _customer) = AuthService::new(&pool).register(registration).await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        email,
        role
    );
    Ok(user.id.as_i32())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args(role: &str, password: Option<&str>) -> NewUserArgs {
        NewUserArgs {
            email: "staff@example.com".to_string(),
            first_name: " Sam ".to_string(),
            last_name: "Lee".to_string(),
            role: role.to_string(),
            password: password.map(String::from),
        }
    }

    #[test]
    fn test_registration_from_args() {
        let registration = args("staff", Some("correct horse battery")).registration().unwrap();
        assert_eq!(registration.role, UserRole::Staff);
        assert_eq!(registration.first_name, "Sam");
        assert_eq!(registration.email.as_str(), "staff@example.com");
    }

    #[test]
    fn test_rejects_unknown_role() {
        let err = args("owner", Some("correct horse battery"))
            .registration()
            .unwrap_err();
        assert!(err.to_string().starts_with("Invalid role: owner"));
    }
}
