//! Registering users and checking their passwords.
use crate::datastore::{
    structs::{NewUser, User},
    Client,
};
use crate::twoface::{BlockingResp, Cause, Describe, ExternalError, Fallible, TfError};
use actix_web::web::block;
use anyhow::anyhow;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::Deserialize;
use tracing::info;

/// Shortest password a user may choose.
pub const MIN_PASSWORD_CHARS: usize = 3;

/// The sign-up form.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

impl Registration {
    /// Every reason this form can't become a user. Empty if it's fine.
    pub fn errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.username.trim().is_empty() {
            errors.push("Username can't be blank".to_owned());
        }
        if self.email.trim().is_empty() {
            errors.push("Email can't be blank".to_owned());
        }
        if self.password.chars().count() < MIN_PASSWORD_CHARS {
            errors.push(format!(
                "Password is too short (minimum is {} characters)",
                MIN_PASSWORD_CHARS
            ));
        }
        if self.password_confirmation.is_empty() {
            errors.push("Password confirmation can't be blank".to_owned());
        } else if self.password_confirmation != self.password {
            errors.push("Password confirmation doesn't match Password".to_owned());
        }
        errors
    }

    pub async fn register<DS: Client + ?Sized>(self, ds: &DS) -> Fallible<User> {
        let errors = self.errors();
        if !errors.is_empty() {
            return Err(TfError::invalid_fields("Failed to create user", errors));
        }
        let password = self.password;
        let password_hash = block(move || hash_password(&password)).await.to_resp()?;
        let user = ds
            .new_user(NewUser {
                username: self.username.trim().to_owned(),
                email: self.email.trim().to_owned(),
                password_hash,
            })
            .await?;
        info!(user_id = %user.id, "registered user");
        Ok(user)
    }
}

/// The log-in form.
#[derive(Deserialize, Debug, Clone)]
pub struct Login {
    pub email: String,
    pub password: String,
}

impl Login {
    /// The user these credentials belong to. Unknown email and wrong password look the same.
    pub async fn authenticate<DS: Client + ?Sized>(self, ds: &DS) -> Fallible<User> {
        let user = ds.find_user_by_email(self.email.trim().to_owned()).await?;
        guard!(let Some(user) = user else {
            return Err(TfError::user(Cause::UserBadAuth, "Login failed"))
        });
        let password = self.password;
        let hash = user.password_hash.clone();
        let matches = block(move || verify_password(&password, &hash))
            .await
            .to_resp()?;
        if !matches {
            return Err(TfError::user(Cause::UserBadAuth, "Login failed"));
        }
        Ok(user)
    }
}

/// Hash a password with Argon2id and a random salt, into a PHC string.
pub fn hash_password(password: &str) -> Fallible<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> Fallible<bool> {
    let parsed = PasswordHash::new(password_hash).map_err(|e| {
        anyhow!("invalid password hash: {}", e).describe(ExternalError::default())
    })?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow!("password verification failed: {}", e).into()),
    }
}
