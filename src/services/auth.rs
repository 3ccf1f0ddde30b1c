// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::AdminRepository,
    models::admin::{Admin, AdminRole, Claims, RegisterAdminPayload, UpdateAdminStatusPayload},
};

// Assina e valida os JWT (HS256). Não depende do banco.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Retorna o token e o instante de expiração (unix, segundos).
    pub fn issue(&self, admin: &Admin) -> Result<(String, i64), AppError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;

        let claims = Claims {
            sub: admin.id,
            role: admin.role,
            is_verified: admin.is_verified,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok((token, expires_at.timestamp()))
    }

    // Assinatura e expiração sempre conferidas
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AppError::InvalidToken)
    }
}

#[derive(Clone)]
pub struct AuthService {
    admin_repo: AdminRepository,
    tokens: TokenCodec,
    pool: PgPool,
}

pub struct Session {
    pub admin: Admin,
    pub token: String,
    pub expires_at: i64,
}

impl AuthService {
    pub fn new(admin_repo: AdminRepository, tokens: TokenCodec, pool: PgPool) -> Self {
        Self {
            admin_repo,
            tokens,
            pool,
        }
    }

    pub async fn register_admin(&self, payload: &RegisterAdminPayload) -> Result<Admin, AppError> {
        // Hashing fora da transação (não toca no banco)
        let password = payload.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("hashing task failed: {}", e))??;

        let mut tx = self.pool.begin().await?;

        self.admin_repo.lock_registration(&mut *tx).await?;
        let first_admin = self.admin_repo.count(&mut *tx).await? == 0;
        let (role, is_verified) = if first_admin {
            (AdminRole::Admin, true)
        } else {
            (AdminRole::Viewer, false)
        };

        let admin = self
            .admin_repo
            .create_admin(
                &mut *tx,
                payload.first_name.trim(),
                payload.last_name.trim(),
                &payload.email.trim().to_lowercase(),
                payload.username.trim(),
                role,
                is_verified,
            )
            .await?;
        self.admin_repo
            .create_credentials(&mut *tx, admin.id, &password_hash)
            .await?;

        tx.commit().await?;

        if first_admin {
            tracing::info!("👑 First admin '{}' registered as verified admin", admin.username);
        } else {
            tracing::info!("Admin '{}' registered, awaiting verification", admin.username);
        }
        Ok(admin)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AppError> {
        let found = self
            .admin_repo
            .find_with_hash_by_username(username.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password = password.to_owned();
        let password_hash = found.password_hash;
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("password verification task failed: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        let (token, expires_at) = self.tokens.issue(&found.admin)?;
        Ok(Session {
            admin: found.admin,
            token,
            expires_at,
        })
    }

    /// Valida o token e recarrega o admin, para que mudanças de papel
    /// e verificação valham imediatamente.
    pub async fn authenticate(&self, token: &str) -> Result<Admin, AppError> {
        let claims = self.tokens.verify(token)?;
        self.admin_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    pub async fn is_first_run(&self) -> Result<bool, AppError> {
        Ok(self.admin_repo.count(&self.pool).await? == 0)
    }

    pub async fn list_admins(&self) -> Result<Vec<Admin>, AppError> {
        self.admin_repo.list_all().await
    }

    pub async fn update_status(
        &self,
        actor: &Admin,
        id: Uuid,
        payload: &UpdateAdminStatusPayload,
    ) -> Result<Admin, AppError> {
        if actor.id == id && (!payload.is_verified || payload.role == Some(AdminRole::Viewer)) {
            return Err(AppError::BadRequest(
                "You cannot revoke your own access".into(),
            ));
        }
        self.admin_repo
            .update_status(id, payload.is_verified, payload.role)
            .await?
            .ok_or(AppError::NotFound("Admin"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Admin {
        Admin {
            id: Uuid::new_v4(),
            first_name: "Nimal".into(),
            last_name: "Perera".into(),
            email: "nimal@example.com".into(),
            username: "nimal".into(),
            role: AdminRole::Admin,
            is_verified: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_round_trips_claims() {
        let codec = TokenCodec::new("test-secret", 60);
        let admin = admin();

        let (token, expires_at) = codec.issue(&admin).unwrap();
        let claims = codec.verify(&token).unwrap();

        assert_eq!(claims.sub, admin.id);
        assert_eq!(claims.role, AdminRole::Admin);
        assert!(claims.is_verified);
        assert_eq!(claims.exp as i64, expires_at);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let codec = TokenCodec::new("test-secret", 60);
        let (token, _) = codec.issue(&admin()).unwrap();

        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        // troca a assinatura
        parts[2] = parts[2].chars().rev().collect();
        let tampered = parts.join(".");

        assert!(matches!(codec.verify(&tampered), Err(AppError::InvalidToken)));
        assert!(matches!(codec.verify("not-a-jwt"), Err(AppError::InvalidToken)));
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let (token, _) = TokenCodec::new("other-secret", 60).issue(&admin()).unwrap();
        let codec = TokenCodec::new("test-secret", 60);
        assert!(matches!(codec.verify(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn expired_token_is_rejected() {
        // Bem além da tolerância padrão de 60 s
        let codec = TokenCodec::new("test-secret", -10);
        let (token, _) = codec.issue(&admin()).unwrap();
        assert!(matches!(codec.verify(&token), Err(AppError::InvalidToken)));
    }
}
