use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{self, SaltString},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use tracing::{debug, info};
use uuid::Uuid;

use scoreboard_db::Database;
use scoreboard_db::models::UserRow;
use scoreboard_types::api::{
    AuthActionRequest, AuthResponse, Claims, CredentialsRequest, MeResponse,
};

use crate::error::ApiError;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_USERNAME_LEN: usize = 64;
pub const TOKEN_TTL_DAYS: i64 = 30;

/// Well-formed Argon2id hash with default parameters that no password matches.
const DUMMY_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

type JsonBody<T> = WithRejection<Json<T>, ApiError>;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    register_user(&state, req).await
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    login_user(&state, req).await
}

/// POST /api/auth: `action` selects register or login.
pub async fn dispatch(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<AuthActionRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    match req.action.as_deref() {
        Some("register") => register_user(&state, req.credentials).await,
        Some("login") => login_user(&state, req.credentials).await,
        _ => Err(ApiError::validation("Invalid action")),
    }
}

/// GET /api/auth/me: identity carried by the bearer token.
pub async fn me(Extension(claims): Extension<Claims>) -> Json<MeResponse> {
    Json(MeResponse {
        success: true,
        user_id: claims.sub,
        username: claims.username,
    })
}

async fn register_user(
    state: &AppState,
    req: CredentialsRequest,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let (username, password) = required_credentials(req)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(ApiError::validation(format!(
            "Username must be at most {MAX_USERNAME_LEN} characters"
        )));
    }

    let user_id = Uuid::new_v4();

    // Hashing and the insert both block, keep them off the async runtime
    let app = state.clone();
    let name = username.clone();
    let created = tokio::task::spawn_blocking(move || -> anyhow::Result<bool> {
        if app.db.get_user_by_username(&name)?.is_some() {
            return Ok(false);
        }
        let password_hash = hash_password(&password)?;
        app.db.create_user(&user_id.to_string(), &name, &password_hash)
    })
    .await??;

    if !created {
        debug!("Registration rejected, username '{}' taken", username);
        return Err(ApiError::Conflict("Username already exists".into()));
    }

    info!("Registered user '{}' ({})", username, user_id);
    let token = create_token(&state.jwt_secret, user_id, &username)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            message: "Account created successfully".into(),
            token,
            username,
        }),
    ))
}

async fn login_user(
    state: &AppState,
    req: CredentialsRequest,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let (username, password) = required_credentials(req)?;

    let app = state.clone();
    let user = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        let user = app.db.get_user_by_username(&username)?;
        if user.is_none() {
            debug!("Login failed, no user '{}'", username);
        }
        check_password(user, &password, verify_password)
    })
    .await??
    .ok_or(ApiError::Auth)?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| anyhow::anyhow!("Corrupt user id '{}': {}", user.id, e))?;

    let token = create_token(&state.jwt_secret, user_id, &user.username)?;

    Ok((
        StatusCode::OK,
        Json(AuthResponse {
            success: true,
            message: "Login successful".into(),
            token,
            username: user.username,
        }),
    ))
}

/// Verify `password` against the user's stored hash. An unknown user is
/// checked against `DUMMY_PASSWORD_HASH` so both failures cost one Argon2 run.
fn check_password<F>(
    user: Option<UserRow>,
    password: &str,
    verify: F,
) -> anyhow::Result<Option<UserRow>>
where
    F: Fn(&str, &str) -> anyhow::Result<bool>,
{
    let stored_hash = user.as_ref().map_or(DUMMY_PASSWORD_HASH, |u| u.password.as_str());
    let matches = verify(password, stored_hash)?;

    match user {
        Some(user) if matches => Ok(Some(user)),
        Some(user) => {
            debug!("Login failed, bad password for '{}'", user.username);
            Ok(None)
        }
        None => Ok(None),
    }
}

/// Both fields present and non-blank. The username comes back trimmed; the
/// password is used as given.
fn required_credentials(req: CredentialsRequest) -> Result<(String, String), ApiError> {
    let username = req.username.as_deref().map(str::trim).unwrap_or_default();
    let password = req.password.unwrap_or_default();
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::validation("Username and password are required"));
    }
    Ok((username.to_string(), password))
}

/// Argon2id with a fresh random salt.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, stored_hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| anyhow::anyhow!("Stored password hash is unreadable: {}", e))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("Password verification failed: {}", e)),
    }
}

pub fn create_token(secret: &str, user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp() as u64,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Check signature and expiry.
pub fn decode_token(secret: &str, token: &str) -> jsonwebtoken::errors::Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies_only_the_original() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter22", &hash).unwrap());
        assert!(!verify_password("hunter23", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        assert_ne!(hash_password("secret1").unwrap(), hash_password("secret1").unwrap());
    }

    #[test]
    fn garbage_hash_is_an_error() {
        assert!(verify_password("whatever", "not-a-phc-string").is_err());
    }

    fn user_row(password_hash: &str) -> UserRow {
        UserRow {
            id: Uuid::new_v4().to_string(),
            username: "Ann".into(),
            password: password_hash.into(),
            created_at: String::new(),
        }
    }

    #[test]
    fn unknown_user_still_runs_the_verifier() {
        let seen = std::cell::RefCell::new(Vec::new());
        let verify = |password: &str, hash: &str| -> anyhow::Result<bool> {
            seen.borrow_mut().push((password.to_string(), hash.to_string()));
            Ok(true)
        };

        let result = check_password(None, "hunter22", verify).unwrap();
        assert!(result.is_none());
        assert_eq!(
            seen.into_inner(),
            [("hunter22".to_string(), DUMMY_PASSWORD_HASH.to_string())]
        );
    }

    #[test]
    fn known_user_is_checked_against_its_own_hash() {
        let hash = hash_password("hunter22").unwrap();

        let ok = check_password(Some(user_row(&hash)), "hunter22", verify_password).unwrap();
        assert_eq!(ok.map(|u| u.username).as_deref(), Some("Ann"));

        let bad = check_password(Some(user_row(&hash)), "hunter23", verify_password).unwrap();
        assert!(bad.is_none());
    }

    #[test]
    fn dummy_hash_parses_and_matches_nothing() {
        let parsed = PasswordHash::new(DUMMY_PASSWORD_HASH).unwrap();
        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        assert!(!verify_password("hunter22", DUMMY_PASSWORD_HASH).unwrap());
        assert!(!verify_password("", DUMMY_PASSWORD_HASH).unwrap());
    }

    #[test]
    fn token_carries_identity() {
        let id = Uuid::new_v4();
        let token = create_token("test-secret", id, "Ann").unwrap();
        let claims = decode_token("test-secret", &token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.username, "Ann");

        let ttl = claims.exp as i64 - chrono::Utc::now().timestamp();
        assert!(ttl > 29 * 24 * 3600 && ttl <= 30 * 24 * 3600);
    }

    #[test]
    fn token_rejected_with_other_secret() {
        let token = create_token("secret-a", Uuid::new_v4(), "Ann").unwrap();
        assert!(decode_token("secret-b", &token).is_err());
    }

    #[test]
    fn credentials_are_trimmed_and_required() {
        let (user, pass) = required_credentials(CredentialsRequest {
            username: Some("  Ann ".into()),
            password: Some(" pw with spaces ".into()),
        })
        .unwrap();
        assert_eq!(user, "Ann");
        assert_eq!(pass, " pw with spaces ");

        for (username, password) in [
            (None, Some("secret")),
            (Some("Ann"), None),
            (Some("   "), Some("secret")),
            (Some("Ann"), Some("")),
        ] {
            let req = CredentialsRequest {
                username: username.map(Into::into),
                password: password.map(Into::into),
            };
            assert!(matches!(
                required_credentials(req),
                Err(ApiError::Validation { .. })
            ));
        }
    }
}
