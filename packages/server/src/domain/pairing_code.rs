//! Pairing Code Authority
//!
//! An admin holds at most one live code. Issuing a new code retires the old
//! one. Codes are redeemed by client displays; a use is only recorded once the
//! admin approves the resulting handshake.

use std::collections::HashMap;

use super::{
    error::CodeError,
    rate_limit::{RateLimit, RateLimiter},
    value_object::{ConnectionId, PairingCode, Timestamp},
};

/// Source of candidate pairing codes
#[cfg_attr(test, mockall::automock)]
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> PairingCode;
}

/// Tunables of the code authority
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodePolicy {
    pub ttl_ms: i64,
    pub max_uses: u32,
    pub issue_limit: RateLimit,
    pub redeem_limit: RateLimit,
    /// Collision retries before expired codes are purged
    pub max_generation_attempts: u32,
}

impl Default for CodePolicy {
    fn default() -> Self {
        Self {
            ttl_ms: 5 * 60 * 1000,
            max_uses: 1,
            issue_limit: RateLimit::new(3, 60_000),
            redeem_limit: RateLimit::new(5, 60_000),
            max_generation_attempts: 10,
        }
    }
}

/// A live pairing code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCode {
    pub code: PairingCode,
    pub owner: ConnectionId,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    pub max_uses: u32,
    /// Clients whose handshake was approved with this code, in approval order
    pub used_by: Vec<ConnectionId>,
}

impl IssuedCode {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    pub fn is_exhausted(&self) -> bool {
        self.used_by.len() >= self.max_uses as usize
    }
}

pub struct CodeAuthority {
    policy: CodePolicy,
    generator: Box<dyn CodeGenerator>,
    codes: HashMap<PairingCode, IssuedCode>,
    by_owner: HashMap<ConnectionId, PairingCode>,
    issue_limiter: RateLimiter,
    redeem_limiter: RateLimiter,
    /// Codes removed because they expired, waiting to be announced
    evicted: Vec<IssuedCode>,
}

impl CodeAuthority {
    pub fn new(policy: CodePolicy, generator: Box<dyn CodeGenerator>) -> Self {
        Self {
            policy,
            generator,
            codes: HashMap::new(),
            by_owner: HashMap::new(),
            issue_limiter: RateLimiter::new(policy.issue_limit),
            redeem_limiter: RateLimiter::new(policy.redeem_limit),
            evicted: Vec::new(),
        }
    }

    /// Issue a fresh code for `owner`, retiring any code it held.
    pub fn issue(&mut self, owner: &ConnectionId, now: Timestamp) -> Result<IssuedCode, CodeError> {
        self.issue_limiter
            .try_acquire(owner, now)
            .map_err(|retry_after_ms| CodeError::RateLimited { retry_after_ms })?;

        let code = match self.draw_free_code(self.policy.max_generation_attempts) {
            Some(code) => code,
            None => {
                let purged = self.purge_expired(now);
                tracing::warn!(
                    "Pairing code collisions after {} attempts, purged {} expired codes",
                    self.policy.max_generation_attempts,
                    purged
                );
                self.draw_free_code(1)
                    .ok_or(CodeError::GenerationExhausted)?
            }
        };

        self.retire(owner);

        let issued = IssuedCode {
            code: code.clone(),
            owner: owner.clone(),
            issued_at: now,
            expires_at: now.plus_millis(self.policy.ttl_ms),
            max_uses: self.policy.max_uses,
            used_by: Vec::new(),
        };
        self.codes.insert(code.clone(), issued.clone());
        self.by_owner.insert(owner.clone(), code);
        Ok(issued)
    }

    fn draw_free_code(&self, attempts: u32) -> Option<PairingCode> {
        (0..attempts)
            .map(|_| self.generator.generate())
            .find(|candidate| !self.codes.contains_key(candidate))
    }

    /// Validate a redemption attempt by `redeemer`, without consuming a use.
    ///
    /// An expired code is evicted as a side effect.
    pub fn check_redeemable(
        &mut self,
        redeemer: &ConnectionId,
        code: &PairingCode,
        now: Timestamp,
    ) -> Result<&IssuedCode, CodeError> {
        self.redeem_limiter
            .try_acquire(redeemer, now)
            .map_err(|retry_after_ms| CodeError::RateLimited { retry_after_ms })?;

        let expired = match self.codes.get(code) {
            None => return Err(CodeError::CodeNotFound),
            Some(issued) => issued.is_expired(now),
        };
        if expired {
            self.evict(code);
            return Err(CodeError::CodeExpired);
        }

        let issued = self.codes.get(code).ok_or(CodeError::CodeNotFound)?;
        if issued.is_exhausted() {
            return Err(CodeError::UsageExhausted);
        }
        Ok(issued)
    }

    /// Whether `code` is live with no uses left.
    pub fn is_exhausted(&self, code: &PairingCode) -> bool {
        self.codes.get(code).is_some_and(IssuedCode::is_exhausted)
    }

    /// Record an approved use. A code that has since expired or been retired
    /// is left alone.
    pub fn record_use(&mut self, code: &PairingCode, client: &ConnectionId) {
        if let Some(issued) = self.codes.get_mut(code) {
            if !issued.used_by.contains(client) {
                issued.used_by.push(client.clone());
            }
        }
    }

    /// Drop the live code of `owner`, if any.
    pub fn retire(&mut self, owner: &ConnectionId) -> Option<IssuedCode> {
        let code = self.by_owner.remove(owner)?;
        self.codes.remove(&code)
    }

    /// Forget everything held for a departing connection.
    pub fn forget(&mut self, id: &ConnectionId) -> Option<IssuedCode> {
        self.issue_limiter.forget(id);
        self.redeem_limiter.forget(id);
        self.retire(id)
    }

    /// Evict every code past its expiry. Returns how many were evicted.
    pub fn purge_expired(&mut self, now: Timestamp) -> usize {
        let expired: Vec<PairingCode> = self
            .codes
            .values()
            .filter(|issued| issued.is_expired(now))
            .map(|issued| issued.code.clone())
            .collect();
        for code in &expired {
            self.evict(code);
        }
        expired.len()
    }

    fn evict(&mut self, code: &PairingCode) {
        if let Some(issued) = self.codes.remove(code) {
            if self.by_owner.get(&issued.owner) == Some(code) {
                self.by_owner.remove(&issued.owner);
            }
            self.evicted.push(issued);
        }
    }

    /// Codes evicted by expiry since the last call
    pub fn take_evicted(&mut self) -> Vec<IssuedCode> {
        std::mem::take(&mut self.evicted)
    }

    pub fn get(&self, code: &PairingCode) -> Option<&IssuedCode> {
        self.codes.get(code)
    }

    pub fn code_of(&self, owner: &ConnectionId) -> Option<&IssuedCode> {
        self.by_owner.get(owner).and_then(|code| self.codes.get(code))
    }

    pub fn live_count(&self) -> usize {
        self.codes.len()
    }
}

impl std::fmt::Debug for CodeAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeAuthority")
            .field("policy", &self.policy)
            .field("live_codes", &self.codes.len())
            .finish()
    }
}
