//! Capability gate for the admin "management view".
//!
//! Unlocking is a server-side operation: verifying the role's secret issues
//! an expiring session token, and every authorization check consults the
//! session store. Client-held flags are never trusted. This is a UI access
//! control, not a cryptographic boundary; real authorization still lives
//! with the backing identity provider.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Back-office roles that can request the management view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    Analyst,
    Operations,
    SuperAdmin,
}

impl AdminRole {
    /// Verification each role must pass before the view unlocks.
    pub const fn required_verification(self) -> VerificationMethod {
        match self {
            AdminRole::Analyst | AdminRole::Operations => VerificationMethod::Pin,
            AdminRole::SuperAdmin => VerificationMethod::Password,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMethod {
    Pin,
    Password,
}

/// Opaque handle to an unlocked session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SessionToken(pub String);

#[derive(Debug, Clone)]
struct ViewSession {
    role: AdminRole,
    expires_at: DateTime<Utc>,
}

/// Session lifetime policy for the view gate.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    session_ttl: Duration,
}

impl AccessPolicy {
    pub fn new(session_ttl_minutes: i64) -> Self {
        let minutes = session_ttl_minutes.max(1);
        Self {
            session_ttl: Duration::minutes(minutes),
        }
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new(30)
    }
}

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Guard owning the role credentials and the live session table.
pub struct ViewGate {
    policy: AccessPolicy,
    credentials: HashMap<AdminRole, String>,
    sessions: Mutex<HashMap<SessionToken, ViewSession>>,
}

impl ViewGate {
    pub fn new(policy: AccessPolicy) -> Self {
        Self {
            policy,
            credentials: HashMap::new(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Register the secret a role verifies against. Replaces any previous
    /// secret for the role.
    pub fn register(&mut self, role: AdminRole, secret: impl Into<String>) {
        self.credentials.insert(role, secret.into());
    }

    /// Verify the role's secret and open an expiring session.
    pub fn unlock(
        &self,
        role: AdminRole,
        secret: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionToken, AccessError> {
        let expected = self
            .credentials
            .get(&role)
            .ok_or(AccessError::RoleNotProvisioned(role))?;

        if expected != secret {
            return Err(AccessError::VerificationFailed {
                role,
                method: role.required_verification(),
            });
        }

        let sequence = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let token = SessionToken(format!("view-{sequence:08x}"));
        let session = ViewSession {
            role,
            expires_at: now + self.policy.session_ttl,
        };

        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        sessions.insert(token.clone(), session);
        Ok(token)
    }

    /// Resolve a token to its role, failing closed on unknown or expired
    /// sessions. Expired sessions are removed on the way out.
    pub fn authorize(
        &self,
        token: &SessionToken,
        now: DateTime<Utc>,
    ) -> Result<AdminRole, AccessError> {
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        let session = sessions
            .get(token)
            .cloned()
            .ok_or(AccessError::SessionUnknown)?;

        if now >= session.expires_at {
            sessions.remove(token);
            return Err(AccessError::SessionExpired);
        }

        Ok(session.role)
    }

    /// Explicitly close a session (logout).
    pub fn revoke(&self, token: &SessionToken) {
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        sessions.remove(token);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("no credential provisioned for role {0:?}")]
    RoleNotProvisioned(AdminRole),
    #[error("{method:?} verification failed for role {role:?}")]
    VerificationFailed {
        role: AdminRole,
        method: VerificationMethod,
    },
    #[error("session token not recognized")]
    SessionUnknown,
    #[error("session expired")]
    SessionExpired,
}
