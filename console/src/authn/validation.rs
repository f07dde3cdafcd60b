//! Local form validation, run before any request is sent

use crate::errors::ConsoleError;

/// Usernames the backend refuses at signup
pub const RESERVED_USERNAMES: &[&str] = &[
    "admin", "api", "www", "easytp", "easytpcloud", "root", "system",
    "administrator", "user", "guest", "student", "teacher", "support",
    "help", "info", "mail", "email", "test", "demo", "default", "null",
    "undefined", "none", "login", "logout", "signup", "register",
    "dashboard", "home", "index", "main", "app", "apps", "config",
    "settings", "profile", "account", "accounts", "service", "services",
    "auth", "authentication", "authorization", "security", "backup",
    "database", "db", "server", "client", "public", "private", "static",
];

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 30;
const PASSWORD_MIN: usize = 8;

fn invalid(message: &str) -> ConsoleError {
    ConsoleError::ValidationError(message.to_string())
}

pub fn validate_login(username: &str, password: &str) -> Result<(), ConsoleError> {
    if username.is_empty() {
        return Err(invalid("Username is required"));
    }
    if password.is_empty() {
        return Err(invalid("Password is required"));
    }
    Ok(())
}

pub fn validate_signup(
    username: &str,
    email: &str,
    password: &str,
    password_confirm: &str,
) -> Result<(), ConsoleError> {
    validate_username(username)?;
    validate_email(email)?;
    if password.chars().count() < PASSWORD_MIN {
        return Err(invalid("Password must be at least 8 characters"));
    }
    if password != password_confirm {
        return Err(invalid("Passwords don't match"));
    }
    Ok(())
}

fn validate_username(username: &str) -> Result<(), ConsoleError> {
    let len = username.chars().count();
    if len < USERNAME_MIN {
        return Err(invalid("Username must be at least 3 characters"));
    }
    if len > USERNAME_MAX {
        return Err(invalid("Username must be no more than 30 characters"));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(invalid(
            "Username can only contain letters, numbers, hyphens, and underscores",
        ));
    }
    let lowered = username.to_ascii_lowercase();
    if RESERVED_USERNAMES.contains(&lowered.as_str()) {
        return Err(invalid("This username is reserved and cannot be used"));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), ConsoleError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
                && domain
                    .rsplit_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(invalid("Please enter a valid email"))
    }
}
