//! Account reconciliation port

use async_trait::async_trait;

use crate::account::AccountLookup;

/// Checks whether a quiz-taker's email already belongs to an account.
///
/// Infallible by contract: transport failures and timeouts come back as
/// [`AccountLookup::LookupFailed`], which the flow treats as fail-open
/// (proceed as a new user). Blocking onboarding on a lookup failure is
/// worse than occasionally missing a duplicate account.
#[async_trait]
pub trait AccountLookupPort: Send + Sync {
    async fn lookup(&self, email: &str) -> AccountLookup;
}
