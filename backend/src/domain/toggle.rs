//! Follow and vote flips.
//!
//! Both relations are existence-only edges keyed by `(actor, target)`. A
//! toggle removes the edge when present and creates it otherwise; the driven
//! adapter performs the compare-and-flip atomically.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::{EdgeRepository, ToggleCommand};
use crate::domain::{Error, PostId, StoreDeadline, UserId};

/// Kind of edge being flipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// `actor` follows the user `target`.
    Follow,
    /// `actor` voted on the post `target`.
    Vote,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Follow => "follow",
            Self::Vote => "vote",
        })
    }
}

/// Identity of one edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    relation: Relation,
    actor: UserId,
    target: Uuid,
}

impl EdgeKey {
    /// `actor` follows `followed`.
    #[must_use]
    pub fn follow(actor: UserId, followed: &UserId) -> Self {
        Self {
            relation: Relation::Follow,
            actor,
            target: *followed.as_uuid(),
        }
    }

    /// `actor` votes on `post`.
    #[must_use]
    pub fn vote(actor: UserId, post: &PostId) -> Self {
        Self {
            relation: Relation::Vote,
            actor,
            target: *post.as_uuid(),
        }
    }

    /// Edge kind.
    #[must_use]
    pub const fn relation(&self) -> Relation {
        self.relation
    }

    /// User creating or removing the edge.
    #[must_use]
    pub const fn actor(&self) -> &UserId {
        &self.actor
    }

    /// Followed user or voted post.
    #[must_use]
    pub const fn target(&self) -> &Uuid {
        &self.target
    }
}

/// Result of a flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The edge did not exist and now does.
    Added,
    /// The edge existed and has been removed.
    Removed,
}

impl ToggleOutcome {
    /// Whether the edge exists after the flip.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Added)
    }
}

/// Response body for AJAX toggle callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ToggleState {
    /// Whether the edge exists after the flip.
    pub active: bool,
}

impl From<ToggleOutcome> for ToggleState {
    fn from(value: ToggleOutcome) -> Self {
        Self {
            active: value.is_active(),
        }
    }
}

/// Toggle service implementing [`ToggleCommand`].
#[derive(Clone)]
pub struct ToggleService<E> {
    edges: Arc<E>,
    deadline: StoreDeadline,
}

impl<E> ToggleService<E> {
    /// Create a service over `edges`.
    pub const fn new(edges: Arc<E>, deadline: StoreDeadline) -> Self {
        Self { edges, deadline }
    }
}

#[async_trait]
impl<E> ToggleCommand for ToggleService<E>
where
    E: EdgeRepository,
{
    async fn exists(&self, key: &EdgeKey) -> Result<bool, Error> {
        self.deadline
            .run("edge.exists", self.edges.exists(key))
            .await
    }

    async fn toggle(&self, key: &EdgeKey) -> Result<ToggleOutcome, Error> {
        let outcome = self
            .deadline
            .run("edge.toggle", self.edges.toggle(key))
            .await?;
        tracing::debug!(
            relation = %key.relation(),
            actor = %key.actor(),
            target = %key.target(),
            active = outcome.is_active(),
            "edge toggled"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{EdgeStoreError, InMemorySocialStore, MockEdgeRepository};
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> Arc<InMemorySocialStore> {
        Arc::new(InMemorySocialStore::default())
    }

    fn service(store: &Arc<InMemorySocialStore>) -> ToggleService<InMemorySocialStore> {
        ToggleService::new(Arc::clone(store), StoreDeadline::default())
    }

    #[rstest]
    #[case(1, true)]
    #[case(2, false)]
    #[case(3, true)]
    #[case(4, false)]
    #[tokio::test]
    async fn parity_of_toggles_decides_existence(
        store: Arc<InMemorySocialStore>,
        #[case] flips: usize,
        #[case] expected: bool,
    ) {
        let alice = store.seed_user("alice");
        let bob = store.seed_user("bob");
        let svc = service(&store);
        let key = EdgeKey::follow(alice, &bob);

        for _ in 0..flips {
            svc.toggle(&key).await.expect("toggle");
        }

        assert_eq!(svc.exists(&key).await.expect("exists"), expected);
    }

    #[rstest]
    #[tokio::test]
    async fn follow_then_unfollow(store: Arc<InMemorySocialStore>) {
        let u1 = store.seed_user("user_one");
        let u2 = store.seed_user("user_two");
        let svc = service(&store);
        let key = EdgeKey::follow(u1, &u2);

        assert_eq!(svc.toggle(&key).await.expect("first"), ToggleOutcome::Added);
        assert!(svc.exists(&key).await.expect("exists"));
        assert_eq!(
            svc.toggle(&key).await.expect("second"),
            ToggleOutcome::Removed
        );
        assert!(!svc.exists(&key).await.expect("exists"));
    }

    #[rstest]
    #[tokio::test]
    async fn follow_and_vote_edges_are_independent(store: Arc<InMemorySocialStore>) {
        let author = store.seed_user("author");
        let reader = store.seed_user("reader");
        let post = store.seed_post(&author, "hello");
        let svc = service(&store);

        svc.toggle(&EdgeKey::vote(reader.clone(), &post))
            .await
            .expect("vote");

        assert!(
            !svc.exists(&EdgeKey::follow(reader.clone(), &author))
                .await
                .expect("follow exists")
        );
        assert!(
            svc.exists(&EdgeKey::vote(reader, &post))
                .await
                .expect("vote exists")
        );
    }

    #[rstest]
    #[tokio::test]
    async fn store_failures_are_reported_not_folded_into_false() {
        let mut edges = MockEdgeRepository::new();
        edges
            .expect_exists()
            .times(1)
            .return_once(|_| Err(EdgeStoreError::connection("refused")));
        let svc = ToggleService::new(Arc::new(edges), StoreDeadline::default());

        let err = svc
            .exists(&EdgeKey::follow(UserId::random(), &UserId::random()))
            .await
            .expect_err("store failure surfaces");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }

    #[rstest]
    #[tokio::test]
    async fn missing_target_is_not_found() {
        let mut edges = MockEdgeRepository::new();
        edges
            .expect_toggle()
            .times(1)
            .return_once(|_| Err(EdgeStoreError::missing_target()));
        let svc = ToggleService::new(Arc::new(edges), StoreDeadline::default());

        let err = svc
            .toggle(&EdgeKey::vote(UserId::random(), &PostId::random()))
            .await
            .expect_err("missing target");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn concurrent_toggles_never_duplicate(store: Arc<InMemorySocialStore>) {
        let a = store.seed_user("racer_a");
        let b = store.seed_user("racer_b");
        let svc = service(&store);
        let key = EdgeKey::follow(a, &b);

        let outcomes = futures::future::join_all((0..8).map(|_| svc.toggle(&key))).await;
        let added = outcomes
            .iter()
            .filter(|o| matches!(o, Ok(ToggleOutcome::Added)))
            .count();

        assert_eq!(added, 4);
        assert!(!svc.exists(&key).await.expect("exists"));
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn outcome_maps_to_state() {
        assert!(ToggleState::from(ToggleOutcome::Added).active);
        assert!(!ToggleState::from(ToggleOutcome::Removed).active);
    }
}
