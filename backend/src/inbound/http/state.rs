//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::TokenService;
use crate::domain::ports::{AccountsCommand, PostsCommand, PostsQuery, ToggleCommand, UsersQuery};

/// Parameter object bundling the port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    /// Signup and login.
    pub accounts: Arc<dyn AccountsCommand>,
    /// User lookup, search and profiles.
    pub users: Arc<dyn UsersQuery>,
    /// Post and comment writes.
    pub posts: Arc<dyn PostsCommand>,
    /// Post, feed and comment reads.
    pub posts_query: Arc<dyn PostsQuery>,
    /// Follow and vote toggles.
    pub toggles: Arc<dyn ToggleCommand>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Signup and login.
    pub accounts: Arc<dyn AccountsCommand>,
    /// User lookup, search and profiles.
    pub users: Arc<dyn UsersQuery>,
    /// Post and comment writes.
    pub posts: Arc<dyn PostsCommand>,
    /// Post, feed and comment reads.
    pub posts_query: Arc<dyn PostsQuery>,
    /// Follow and vote toggles.
    pub toggles: Arc<dyn ToggleCommand>,
    /// Issues tokens at login and validates them for optional viewers.
    pub tokens: Arc<TokenService>,
}

impl HttpState {
    /// Construct state from a ports bundle and the token service.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use mockable::DefaultClock;
    /// use tsuki::domain::ports::{InMemoryImageStore, InMemorySocialStore};
    /// use tsuki::domain::{
    ///     AccountService, DirectoryService, PostService, PostStores, StoreDeadline, TokenService,
    ///     TokenSettings, ToggleService,
    /// };
    /// use tsuki::inbound::http::state::{HttpState, HttpStatePorts};
    ///
    /// let store = Arc::new(InMemorySocialStore::default());
    /// let clock = Arc::new(DefaultClock);
    /// let deadline = StoreDeadline::default();
    /// let posts = Arc::new(PostService::new(
    ///     PostStores {
    ///         posts: store.clone(),
    ///         comments: store.clone(),
    ///         users: store.clone(),
    ///         images: Arc::new(InMemoryImageStore::default()),
    ///     },
    ///     clock.clone(),
    ///     deadline,
    /// ));
    /// let ports = HttpStatePorts {
    ///     accounts: Arc::new(AccountService::new(store.clone(), clock.clone(), deadline)),
    ///     users: Arc::new(DirectoryService::new(store.clone(), store.clone(), deadline)),
    ///     posts: posts.clone(),
    ///     posts_query: posts,
    ///     toggles: Arc::new(ToggleService::new(store, deadline)),
    /// };
    /// let tokens = Arc::new(TokenService::new(&TokenSettings::new("tsuki", b"secret".to_vec()), clock));
    /// let state = HttpState::new(ports, tokens);
    /// let _accounts = state.accounts.clone();
    /// ```
    #[must_use]
    pub fn new(ports: HttpStatePorts, tokens: Arc<TokenService>) -> Self {
        let HttpStatePorts {
            accounts,
            users,
            posts,
            posts_query,
            toggles,
        } = ports;
        Self {
            accounts,
            users,
            posts,
            posts_query,
            toggles,
            tokens,
        }
    }
}
