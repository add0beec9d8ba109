//! Coin ledger primitives.
//!
//! A user's coins are a running [`CoinBalance`] plus an append-only log of
//! [`CoinTransaction`] rows. Credits carry positive amounts and debits carry
//! negative ones, so `balance = lifetime_earned - lifetime_spent` holds for
//! every committed state.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::UserId;

/// Validation errors for ledger inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoinValidationError {
    /// Action names must be non-empty lowercase snake case.
    #[error("action must be lowercase snake_case and at most 64 characters")]
    InvalidAction,
    /// Amounts must be strictly positive.
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    /// Reference type or id was blank.
    #[error("reference type and id must not be empty")]
    EmptyReference,
    /// Transaction type filter was not `earn` or `spend`.
    #[error("transaction type must be `earn` or `spend`")]
    UnknownKind,
}

/// Per-user balance row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinBalance {
    /// Owner of the balance.
    pub user_id: UserId,
    /// Coins currently available.
    pub balance: i64,
    /// Sum of all credits.
    pub lifetime_earned: i64,
    /// Sum of all debits, as a positive number.
    pub lifetime_spent: i64,
}

impl CoinBalance {
    /// Freshly created balance with nothing earned or spent.
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            balance: 0,
            lifetime_earned: 0,
            lifetime_spent: 0,
        }
    }
}

/// Ledger action name such as `itinerary_10_views`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CoinAction(String);

impl CoinAction {
    const MAX_LEN: usize = 64;

    /// Validate an action name.
    ///
    /// # Examples
    /// ```
    /// use itinera::domain::CoinAction;
    ///
    /// assert!(CoinAction::new("boost_listing").is_ok());
    /// assert!(CoinAction::new("Boost Listing").is_err());
    /// ```
    pub fn new(value: impl Into<String>) -> Result<Self, CoinValidationError> {
        let value = value.into();
        let valid = !value.is_empty()
            && value.len() <= Self::MAX_LEN
            && !value.starts_with('_')
            && value
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if valid {
            Ok(Self(value))
        } else {
            Err(CoinValidationError::InvalidAction)
        }
    }

    /// Borrow the action name.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for CoinAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<CoinAction> for String {
    fn from(value: CoinAction) -> Self {
        value.0
    }
}

impl TryFrom<String> for CoinAction {
    type Error = CoinValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Entity a transaction refers to, e.g. `("itinerary", "<uuid>")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinReference {
    reference_type: String,
    reference_id: String,
}

impl CoinReference {
    /// Build a reference from non-blank parts.
    pub fn new(
        reference_type: impl Into<String>,
        reference_id: impl Into<String>,
    ) -> Result<Self, CoinValidationError> {
        let reference_type = reference_type.into().trim().to_owned();
        let reference_id = reference_id.into().trim().to_owned();
        if reference_type.is_empty() || reference_id.is_empty() {
            return Err(CoinValidationError::EmptyReference);
        }
        Ok(Self {
            reference_type,
            reference_id,
        })
    }

    /// Kind of entity referenced.
    pub fn reference_type(&self) -> &str {
        self.reference_type.as_str()
    }

    /// Identifier of the referenced entity.
    pub fn reference_id(&self) -> &str {
        self.reference_id.as_str()
    }
}

/// One-time award granted when a tracked counter crosses a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Milestone {
    action: &'static str,
    reference_type: &'static str,
    reward: i64,
}

impl Milestone {
    /// Itinerary reached ten views; rewards the owner once per itinerary.
    pub const ITINERARY_10_VIEWS: Self = Self {
        action: "itinerary_10_views",
        reference_type: "itinerary",
        reward: 10,
    };

    /// New account bonus; once per user.
    pub const WELCOME_BONUS: Self = Self {
        action: "welcome_bonus",
        reference_type: "user",
        reward: 50,
    };

    /// Ledger action recorded for this milestone.
    pub fn action(&self) -> CoinAction {
        CoinAction(self.action.to_owned())
    }

    /// Coins granted.
    pub const fn reward(&self) -> i64 {
        self.reward
    }

    /// Award request for `user_id` keyed by `reference_id`.
    pub fn award(
        &self,
        user_id: UserId,
        reference_id: impl Into<String>,
        metadata: Value,
    ) -> Result<AwardRequest, CoinValidationError> {
        let reference = CoinReference::new(self.reference_type, reference_id)?;
        AwardRequest::one_time(user_id, self.reward, self.action(), reference, metadata)
    }
}

/// Request to credit coins.
#[derive(Debug, Clone, PartialEq)]
pub struct AwardRequest {
    user_id: UserId,
    amount: i64,
    action: CoinAction,
    reference: Option<CoinReference>,
    metadata: Value,
    one_time: bool,
}

impl AwardRequest {
    /// Credit that may be granted any number of times.
    pub fn repeatable(
        user_id: UserId,
        amount: i64,
        action: CoinAction,
        reference: Option<CoinReference>,
        metadata: Value,
    ) -> Result<Self, CoinValidationError> {
        ensure_positive(amount)?;
        Ok(Self {
            user_id,
            amount,
            action,
            reference,
            metadata,
            one_time: false,
        })
    }

    /// Credit granted at most once per `(user, action, reference id)`.
    pub fn one_time(
        user_id: UserId,
        amount: i64,
        action: CoinAction,
        reference: CoinReference,
        metadata: Value,
    ) -> Result<Self, CoinValidationError> {
        ensure_positive(amount)?;
        Ok(Self {
            user_id,
            amount,
            action,
            reference: Some(reference),
            metadata,
            one_time: true,
        })
    }

    /// Recipient of the credit.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Ledger entry to persist for this award.
    pub fn into_entry(self) -> LedgerEntry {
        LedgerEntry {
            user_id: self.user_id,
            amount: self.amount,
            action: self.action,
            reference: self.reference,
            metadata: self.metadata,
            one_time: self.one_time,
        }
    }
}

/// Request to debit coins.
#[derive(Debug, Clone, PartialEq)]
pub struct SpendRequest {
    user_id: UserId,
    amount: i64,
    action: CoinAction,
    reference: Option<CoinReference>,
    metadata: Value,
}

impl SpendRequest {
    /// Validate a debit of `amount` coins.
    pub fn new(
        user_id: UserId,
        amount: i64,
        action: CoinAction,
        reference: Option<CoinReference>,
        metadata: Value,
    ) -> Result<Self, CoinValidationError> {
        ensure_positive(amount)?;
        Ok(Self {
            user_id,
            amount,
            action,
            reference,
            metadata,
        })
    }

    /// Ledger entry to persist for this debit.
    pub fn into_entry(self) -> LedgerEntry {
        LedgerEntry {
            user_id: self.user_id,
            amount: self.amount,
            action: self.action,
            reference: self.reference,
            metadata: self.metadata,
            one_time: false,
        }
    }
}

fn ensure_positive(amount: i64) -> Result<(), CoinValidationError> {
    if amount > 0 {
        Ok(())
    } else {
        Err(CoinValidationError::NonPositiveAmount)
    }
}

/// Validated ledger write handed to the repository.
///
/// `amount` is always the positive magnitude; the repository applies the
/// sign for debits.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    /// Account holder.
    pub user_id: UserId,
    /// Positive magnitude of the movement.
    pub amount: i64,
    /// Action recorded on the transaction.
    pub action: CoinAction,
    /// Optional referenced entity.
    pub reference: Option<CoinReference>,
    /// Free-form JSON stored alongside the transaction.
    pub metadata: Value,
    /// Whether storage must reject duplicates of this entry.
    pub one_time: bool,
}

/// Persisted ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinTransaction {
    /// Row identifier.
    pub id: Uuid,
    /// Account holder.
    pub user_id: UserId,
    /// Signed amount: positive credits, negative debits.
    pub amount: i64,
    /// Action recorded.
    pub action: CoinAction,
    /// Referenced entity, if any.
    #[serde(flatten)]
    pub reference: Option<CoinReference>,
    /// Free-form JSON.
    pub metadata: Value,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
}

/// Result of a credit request.
#[derive(Debug, Clone, PartialEq)]
pub enum AwardOutcome {
    /// The credit was recorded.
    Awarded(CoinTransaction),
    /// A one-time credit with the same key already exists; nothing changed.
    AlreadyAwarded,
}

impl AwardOutcome {
    /// True when this call recorded the credit.
    pub fn is_awarded(&self) -> bool {
        matches!(self, Self::Awarded(_))
    }
}

/// Transaction direction filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Credits (`amount > 0`).
    Earn,
    /// Debits (`amount < 0`).
    Spend,
}

impl FromStr for TransactionKind {
    type Err = CoinValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "earn" => Ok(Self::Earn),
            "spend" => Ok(Self::Spend),
            _ => Err(CoinValidationError::UnknownKind),
        }
    }
}

/// Paging and filtering for transaction history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionQuery {
    limit: u32,
    offset: u32,
    kind: Option<TransactionKind>,
}

impl TransactionQuery {
    /// Page size used when the caller does not ask for one.
    pub const DEFAULT_LIMIT: u32 = 20;
    /// Largest page size served.
    pub const MAX_LIMIT: u32 = 50;

    /// Normalise caller input: default the limit and clamp it to
    /// `1..=MAX_LIMIT`.
    ///
    /// # Examples
    /// ```
    /// use itinera::domain::TransactionQuery;
    ///
    /// let query = TransactionQuery::new(Some(500), None, None);
    /// assert_eq!(query.limit(), TransactionQuery::MAX_LIMIT);
    /// assert_eq!(query.offset(), 0);
    /// ```
    pub fn new(limit: Option<u32>, offset: Option<u32>, kind: Option<TransactionKind>) -> Self {
        Self {
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
            offset: offset.unwrap_or(0),
            kind,
        }
    }

    /// Page size.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Rows skipped.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Direction filter.
    pub fn kind(&self) -> Option<TransactionKind> {
        self.kind
    }
}

impl Default for TransactionQuery {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}

/// One page of transaction history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    /// Newest first.
    pub transactions: Vec<CoinTransaction>,
    /// Rows matching the filter across all pages.
    pub total: u64,
    /// Page size applied.
    pub limit: u32,
    /// Rows skipped.
    pub offset: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("itinerary_10_views", true)]
    #[case("welcome_bonus", true)]
    #[case("", false)]
    #[case("_leading", false)]
    #[case("Mixed_Case", false)]
    #[case("has space", false)]
    fn action_names(#[case] raw: &str, #[case] valid: bool) {
        assert_eq!(CoinAction::new(raw).is_ok(), valid);
    }

    #[rstest]
    #[case(0)]
    #[case(-5)]
    fn awards_reject_non_positive_amounts(#[case] amount: i64) {
        let action = CoinAction::new("bonus").expect("action");
        let result = AwardRequest::repeatable(UserId::random(), amount, action, None, json!({}));
        assert_eq!(result, Err(CoinValidationError::NonPositiveAmount));
    }

    #[rstest]
    fn milestone_award_is_one_time_and_keyed() {
        let user_id = UserId::random();
        let entry = Milestone::ITINERARY_10_VIEWS
            .award(user_id.clone(), "it-1", json!({"viewCount": 10}))
            .map(AwardRequest::into_entry)
            .expect("entry");

        assert!(entry.one_time);
        assert_eq!(entry.amount, 10);
        assert_eq!(entry.action.as_str(), "itinerary_10_views");
        let reference = entry.reference.expect("reference");
        assert_eq!(reference.reference_type(), "itinerary");
        assert_eq!(reference.reference_id(), "it-1");
    }

    #[rstest]
    #[case("earn", Ok(TransactionKind::Earn))]
    #[case("spend", Ok(TransactionKind::Spend))]
    #[case("refund", Err(CoinValidationError::UnknownKind))]
    fn parses_transaction_kind(
        #[case] raw: &str,
        #[case] expected: Result<TransactionKind, CoinValidationError>,
    ) {
        assert_eq!(raw.parse::<TransactionKind>(), expected);
    }

    #[rstest]
    #[case(None, 20)]
    #[case(Some(0), 1)]
    #[case(Some(35), 35)]
    #[case(Some(51), 50)]
    fn clamps_limit(#[case] requested: Option<u32>, #[case] expected: u32) {
        assert_eq!(TransactionQuery::new(requested, None, None).limit(), expected);
    }

    #[rstest]
    fn transaction_serialises_reference_inline() {
        let transaction = CoinTransaction {
            id: Uuid::nil(),
            user_id: UserId::from_uuid(Uuid::nil()),
            amount: -5,
            action: CoinAction::new("boost_listing").expect("action"),
            reference: Some(CoinReference::new("itinerary", "abc").expect("reference")),
            metadata: json!({}),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        };

        let value = serde_json::to_value(&transaction).expect("serialise");
        assert_eq!(value["referenceType"], "itinerary");
        assert_eq!(value["referenceId"], "abc");
        assert_eq!(value["amount"], -5);
    }
}
