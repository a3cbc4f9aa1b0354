//! Assembly of domain services over driven adapters.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    CommentRepository, EdgeRepository, ImageStore, PostRepository, UserRepository,
};
use crate::domain::{
    AccountService, DirectoryService, PostService, PostStores, StoreDeadline, TokenService,
    ToggleService,
};
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::outbound::FsImageStore;
use crate::outbound::persistence::{
    DbPool, DieselCommentRepository, DieselEdgeRepository, DieselPostRepository,
    DieselUserRepository,
};

/// Driven adapters the services run over.
pub struct Adapters<U, E, P, C, I> {
    /// Account store.
    pub users: Arc<U>,
    /// Follow and vote edges.
    pub edges: Arc<E>,
    /// Post store.
    pub posts: Arc<P>,
    /// Comment store.
    pub comments: Arc<C>,
    /// Uploaded images.
    pub images: Arc<I>,
}

/// PostgreSQL repositories plus the upload directory.
pub type ProductionAdapters = Adapters<
    DieselUserRepository,
    DieselEdgeRepository,
    DieselPostRepository,
    DieselCommentRepository,
    FsImageStore,
>;

impl ProductionAdapters {
    /// Diesel repositories sharing `pool`.
    #[must_use]
    pub fn diesel(pool: &DbPool, images: FsImageStore) -> Self {
        Self {
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            edges: Arc::new(DieselEdgeRepository::new(pool.clone())),
            posts: Arc::new(DieselPostRepository::new(pool.clone())),
            comments: Arc::new(DieselCommentRepository::new(pool.clone())),
            images: Arc::new(images),
        }
    }
}

impl<U, E, P, C, I> Adapters<U, E, P, C, I>
where
    U: UserRepository + 'static,
    E: EdgeRepository + 'static,
    P: PostRepository + 'static,
    C: CommentRepository + 'static,
    I: ImageStore + 'static,
{
    /// Wire every driving port over these adapters.
    pub fn into_http_state(
        self,
        tokens: Arc<TokenService>,
        clock: Arc<dyn Clock>,
        deadline: StoreDeadline,
    ) -> HttpState {
        let Self {
            users,
            edges,
            posts,
            comments,
            images,
        } = self;
        let content = Arc::new(PostService::new(
            PostStores {
                posts,
                comments,
                users: Arc::clone(&users),
                images,
            },
            Arc::clone(&clock),
            deadline,
        ));
        let ports = HttpStatePorts {
            accounts: Arc::new(AccountService::new(Arc::clone(&users), clock, deadline)),
            users: Arc::new(DirectoryService::new(users, Arc::clone(&edges), deadline)),
            posts: content.clone(),
            posts_query: content,
            toggles: Arc::new(ToggleService::new(edges, deadline)),
        };
        HttpState::new(ports, tokens)
    }
}
