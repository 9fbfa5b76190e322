//! Account schema: users identified by email with an argon2 password hash.

use argon2::{
    password_hash::{self, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params as HashParams, PasswordHash, Version,
};
use chrono::Utc;
use configs::Config;
use models::{params::param_str, user, Changeset, LoginField, Params};
use rand::rngs::OsRng;
use serde_json::Value;

use crate::context::schema::{PasswordError, UserSchema};

pub const DEFAULT_PASSWORD_MIN_LENGTH: usize = 8;
pub const PASSWORD_MAX_LENGTH: usize = 4096;
/// Column widths of the `users` table.
pub const EMAIL_MAX_LENGTH: usize = 255;
pub const NAME_MAX_LENGTH: usize = 128;

#[derive(Debug, Clone)]
pub struct AccountSchema {
    hash_params: HashParams,
    password_min_length: usize,
}

impl Default for AccountSchema {
    fn default() -> Self {
        Self { hash_params: HashParams::default(), password_min_length: DEFAULT_PASSWORD_MIN_LENGTH }
    }
}

impl AccountSchema {
    /// Schema hashing with the given argon2 memory (KiB) and time cost.
    pub fn with_cost(m_cost: u32, t_cost: u32) -> Result<Self, PasswordError> {
        let hash_params = HashParams::new(m_cost, t_cost, HashParams::DEFAULT_P_COST, None)
            .map_err(|e| PasswordError::Hash(e.to_string()))?;
        Ok(Self { hash_params, ..Self::default() })
    }

    pub fn password_min_length(mut self, min: usize) -> Self {
        self.password_min_length = min;
        self
    }

    /// Reads `password_min_length`, `argon2_m_cost` and `argon2_t_cost`
    /// from the context options.
    pub fn from_options<R: ?Sized, S: ?Sized>(config: &Config<R, S>) -> Result<Self, PasswordError> {
        let defaults = HashParams::default();
        let number = |key: &str, default: u32| -> Result<u32, PasswordError> {
            config
                .get(key, &default.to_string())
                .parse()
                .map_err(|_| PasswordError::Hash(format!("option `{key}` must be a number")))
        };
        let schema = Self::with_cost(number("argon2_m_cost", defaults.m_cost())?, number("argon2_t_cost", defaults.t_cost())?)?;
        let min = number("password_min_length", DEFAULT_PASSWORD_MIN_LENGTH as u32)?;
        Ok(schema.password_min_length(min as usize))
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.hash_params.clone())
    }

    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        self.hasher()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Hash(e.to_string()))
    }

    fn check_hash(&self, hash: &str, password: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::Malformed(e.to_string()))?;
        match self.hasher().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::Hash(e.to_string())),
        }
    }

    fn normalize_email(&self, changeset: &mut Changeset<user::Model>) {
        let Some(email) = changeset.get_change("email").and_then(Value::as_str) else { return };
        let normalized = self.normalize_login_value(email);
        if normalized == changeset.data().email {
            changeset.delete_change("email");
        } else {
            changeset.put_change("email", normalized);
        }
    }

    fn validate_email(changeset: &mut Changeset<user::Model>) {
        let Some(Value::String(email)) = changeset.get_change("email") else { return };
        let valid = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.chars().any(char::is_whitespace)
            }
            None => false,
        };
        if !valid {
            changeset.add_error("email", "has invalid format");
        }
    }

    /// Hashes `password` into `password_hash`, checking length and the
    /// optional `password_confirmation`.
    fn put_password(&self, changeset: &mut Changeset<user::Model>, params: &Params) {
        let Some(password) = param_str(params, "password") else { return };
        let len = password.chars().count();
        if len < self.password_min_length {
            changeset.add_error("password", format!("should be at least {} character(s)", self.password_min_length));
        } else if len > PASSWORD_MAX_LENGTH {
            changeset.add_error("password", format!("should be at most {PASSWORD_MAX_LENGTH} character(s)"));
        }
        if let Some(confirmation) = params.get("password_confirmation") {
            if confirmation.as_str() != Some(password) {
                changeset.add_error("password_confirmation", "does not match confirmation");
            }
        }
        if !changeset.errors_on("password").is_empty() {
            return;
        }
        match self.hash_password(password) {
            Ok(hash) => changeset.put_change("password_hash", hash),
            Err(e) => changeset.add_error("password", e.to_string()),
        }
    }

    /// A stored user must prove the current password before changing the
    /// login field or the password.
    fn validate_current_password(&self, changeset: &mut Changeset<user::Model>, params: &Params) {
        let existing = &changeset.data().password_hash;
        if existing.is_empty() {
            return;
        }
        let sensitive = changeset.get_change("email").is_some() || changeset.get_change("password_hash").is_some();
        if !sensitive {
            return;
        }
        let verified = match param_str(params, "current_password") {
            Some(current) => matches!(self.check_hash(existing, current), Ok(true)),
            None => false,
        };
        if !verified {
            changeset.add_error("current_password", "is invalid");
        }
    }
}

impl UserSchema for AccountSchema {
    type User = user::Model;

    fn login_field(&self) -> LoginField {
        LoginField::EMAIL
    }

    fn normalize_login_value(&self, value: &str) -> String {
        value.trim().to_lowercase()
    }

    fn blank(&self) -> user::Model {
        user::Model::blank()
    }

    fn changeset(&self, user: user::Model, params: &Params) -> Changeset<user::Model> {
        let mut changeset = Changeset::cast(user, params, &["email", "name"]);
        self.normalize_email(&mut changeset);
        changeset.validate_required(&["email"]);
        Self::validate_email(&mut changeset);
        changeset.validate_length("email", None, Some(EMAIL_MAX_LENGTH));
        changeset.validate_length("name", None, Some(NAME_MAX_LENGTH));
        self.put_password(&mut changeset, params);
        let has_hash = !changeset.data().password_hash.is_empty() || changeset.get_change("password_hash").is_some();
        if !has_hash && changeset.errors_on("password").is_empty() {
            changeset.add_error("password", "can't be blank");
        }
        self.validate_current_password(&mut changeset, params);
        if !changeset.changes().is_empty() {
            changeset.put_change("updated_at", Utc::now().to_rfc3339());
        }
        changeset
    }

    fn verify_password(&self, user: &user::Model, password: Option<&str>) -> Result<bool, PasswordError> {
        match password {
            Some(password) if !user.password_hash.is_empty() => self.check_hash(&user.password_hash, password),
            _ => Ok(false),
        }
    }
}
