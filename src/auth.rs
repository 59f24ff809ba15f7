//! Bearer tokens, and finding out who is making a request.
use crate::twoface::{Cause, Describe, DescribeErr, ExternalError, Fallible};
use actix_web::{dev::Payload, http::header::Header, web, FromRequest, HttpRequest};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use anyhow::anyhow;
use chrono::{offset::Utc, Duration};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    exp: usize,
}

/// Signs and verifies the HS256 bearer tokens handed out at login.
pub struct Tokens {
    secret: Vec<u8>,
    ttl: Duration,
}

impl Tokens {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    pub fn issue(&self, user_id: Uuid) -> Fallible<String> {
        let claims = Claims {
            sub: user_id,
            exp: (Utc::now() + self.ttl).timestamp() as usize,
        };
        let token = encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )?;
        Ok(token)
    }

    /// Returns the user the token was issued to, if it's genuine and unexpired.
    pub fn verify(&self, token: &str) -> Fallible<Uuid> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &Validation::default(),
        )
        .describe_err(ExternalError::new(
            Cause::UserBadAuth,
            "Invalid or expired token",
        ))?;
        Ok(data.claims.sub)
    }
}

/// The logged-in user making the request. Handlers that accept anonymous requests take
/// `Option<Viewer>`, which is None when the token is missing or invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Uuid,
}

impl FromRequest for Viewer {
    type Error = crate::twoface::TfError;
    type Future = Ready<Fallible<Self>>;
    type Config = ();

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(viewer_from(req))
    }
}

fn viewer_from(req: &HttpRequest) -> Fallible<Viewer> {
    guard!(let Some(tokens) = req.app_data::<web::Data<Tokens>>() else {
        return Err(anyhow!("no token keys registered with the app").into())
    });
    let auth = Authorization::<Bearer>::parse(req).map_err(|e| {
        anyhow!("bad authorization header: {}", e)
            .describe_as(Cause::UserBadAuth, "Missing or malformed bearer token")
    })?;
    let user_id = tokens.verify(auth.into_scheme().token())?;
    Ok(Viewer { user_id })
}
