//! Itinerary view tracking and the view-count milestone.
//!
//! Every recorded view increments the stored counter. Once the counter is at
//! or past [`VIEW_MILESTONE_THRESHOLD`] the owner is offered the
//! `itinerary_10_views` award keyed by the itinerary id; the ledger's
//! uniqueness guarantee turns repeat offers into no-ops, so the award lands
//! exactly once even when views race.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::ports::{
    CoinLedgerCommand, ItineraryRepository, ItineraryRepositoryError, ItineraryViewCommand,
};
use super::{AwardOutcome, BestEffort, Error, Milestone};

/// Views needed before the owner earns the view milestone.
pub const VIEW_MILESTONE_THRESHOLD: u64 = 10;

/// Itinerary identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItineraryId(Uuid);

impl ItineraryId {
    /// Wrap a UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ItineraryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ItineraryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Result of recording a view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRecorded {
    /// Cumulative views after this one.
    pub view_count: u64,
    /// Milestone outcome when the threshold was reached and the ledger
    /// answered; `None` below the threshold or when the award failed.
    pub milestone: Option<AwardOutcome>,
}

/// View tracking service.
#[derive(Clone)]
pub struct ItineraryViewService<I> {
    itinerary_repo: Arc<I>,
    ledger: Arc<dyn CoinLedgerCommand>,
}

impl<I> ItineraryViewService<I> {
    /// Create a service that awards milestones through `ledger`.
    pub fn new(itinerary_repo: Arc<I>, ledger: Arc<dyn CoinLedgerCommand>) -> Self {
        Self {
            itinerary_repo,
            ledger,
        }
    }
}

impl<I> ItineraryViewService<I>
where
    I: ItineraryRepository,
{
    fn map_itinerary_error(error: ItineraryRepositoryError) -> Error {
        match error {
            ItineraryRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("itinerary repository unavailable: {message}"))
            }
            ItineraryRepositoryError::Query { message } => {
                Error::internal(format!("itinerary repository error: {message}"))
            }
        }
    }
}

#[async_trait]
impl<I> ItineraryViewCommand for ItineraryViewService<I>
where
    I: ItineraryRepository,
{
    async fn record_view(&self, itinerary_id: &ItineraryId) -> Result<ViewRecorded, Error> {
        let views = self
            .itinerary_repo
            .record_view(itinerary_id)
            .await
            .map_err(Self::map_itinerary_error)?
            .ok_or_else(|| Error::not_found(format!("itinerary {itinerary_id} not found")))?;

        if views.view_count < VIEW_MILESTONE_THRESHOLD {
            return Ok(ViewRecorded {
                view_count: views.view_count,
                milestone: None,
            });
        }

        let milestone = BestEffort::new("coins.itinerary_10_views")
            .run(async {
                let request = Milestone::ITINERARY_10_VIEWS
                    .award(
                        views.owner_id.clone(),
                        views.itinerary_id.to_string(),
                        json!({ "viewCount": views.view_count }),
                    )
                    .map_err(|err| Error::internal(err.to_string()))?;
                self.ledger.award(request).await
            })
            .await;

        Ok(ViewRecorded {
            view_count: views.view_count,
            milestone,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{ItineraryViews, MockCoinLedgerCommand, MockItineraryRepository};
    use crate::domain::{ErrorCode, UserId};
    use mockall::predicate::always;
    use rstest::rstest;

    fn views(itinerary_id: ItineraryId, view_count: u64) -> ItineraryViews {
        ItineraryViews {
            itinerary_id,
            owner_id: UserId::from_uuid(Uuid::nil()),
            view_count,
        }
    }

    fn repo_returning(count: u64) -> MockItineraryRepository {
        let mut repo = MockItineraryRepository::new();
        repo.expect_record_view()
            .times(1)
            .returning(move |id| Ok(Some(views(*id, count))));
        repo
    }

    #[tokio::test]
    async fn below_threshold_skips_ledger() {
        let mut ledger = MockCoinLedgerCommand::new();
        ledger.expect_award().never();
        let service = ItineraryViewService::new(Arc::new(repo_returning(9)), Arc::new(ledger));

        let recorded = service
            .record_view(&ItineraryId::from_uuid(Uuid::new_v4()))
            .await
            .expect("view");

        assert_eq!(recorded.view_count, 9);
        assert!(recorded.milestone.is_none());
    }

    #[rstest]
    #[case(10)]
    #[case(11)]
    #[tokio::test]
    async fn threshold_offers_owner_award_keyed_by_itinerary(#[case] count: u64) {
        let itinerary_id = ItineraryId::from_uuid(Uuid::new_v4());
        let expected_reference = itinerary_id.to_string();
        let mut ledger = MockCoinLedgerCommand::new();
        ledger
            .expect_award()
            .with(always())
            .times(1)
            .returning(move |request| {
                let entry = request.into_entry();
                assert_eq!(entry.action.as_str(), "itinerary_10_views");
                assert_eq!(entry.amount, 10);
                assert_eq!(
                    entry.reference.as_ref().map(|r| r.reference_id().to_owned()),
                    Some(expected_reference.clone())
                );
                Ok(AwardOutcome::AlreadyAwarded)
            });
        let service = ItineraryViewService::new(Arc::new(repo_returning(count)), Arc::new(ledger));

        let recorded = service.record_view(&itinerary_id).await.expect("view");

        assert_eq!(recorded.milestone, Some(AwardOutcome::AlreadyAwarded));
    }

    #[tokio::test]
    async fn award_failure_does_not_fail_view() {
        let mut ledger = MockCoinLedgerCommand::new();
        ledger
            .expect_award()
            .times(1)
            .returning(|_| Err(Error::service_unavailable("ledger down")));
        let service = ItineraryViewService::new(Arc::new(repo_returning(10)), Arc::new(ledger));

        let recorded = service
            .record_view(&ItineraryId::from_uuid(Uuid::new_v4()))
            .await
            .expect("view still succeeds");

        assert_eq!(recorded.view_count, 10);
        assert!(recorded.milestone.is_none());
    }

    #[tokio::test]
    async fn unknown_itinerary_is_not_found() {
        let mut repo = MockItineraryRepository::new();
        repo.expect_record_view().times(1).returning(|_| Ok(None));
        let service = ItineraryViewService::new(
            Arc::new(repo),
            Arc::new(MockCoinLedgerCommand::new()),
        );

        let error = service
            .record_view(&ItineraryId::from_uuid(Uuid::new_v4()))
            .await
            .expect_err("missing");

        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn persistence_failure_propagates() {
        let mut repo = MockItineraryRepository::new();
        repo.expect_record_view()
            .times(1)
            .returning(|_| Err(ItineraryRepositoryError::query("deadlock")));
        let service = ItineraryViewService::new(
            Arc::new(repo),
            Arc::new(MockCoinLedgerCommand::new()),
        );

        let error = service
            .record_view(&ItineraryId::from_uuid(Uuid::new_v4()))
            .await
            .expect_err("failure");

        assert_eq!(error.code(), ErrorCode::InternalError);
    }
}
