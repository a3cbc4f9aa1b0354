//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, test, web};
use serde_json::json;

use crate::domain::fixture_clock::fixture_clock;
use crate::domain::ports::{InMemoryImageStore, InMemorySocialStore};
use crate::domain::{
    AccountService, DirectoryService, PostService, PostStores, StoreDeadline, TokenService,
    TokenSettings, ToggleService,
};
use crate::inbound::http::session_config::SESSION_COOKIE_NAME;
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::middleware::SessionGate;

/// Password used by [`signup_as`].
pub const TEST_PASSWORD: &str = "correct horse";

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Uses the production cookie name and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name(SESSION_COOKIE_NAME.to_owned())
        .cookie_secure(false)
        .build()
}

/// Session cookie set by `res`, if any.
pub fn session_cookie<B>(res: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(Cookie::into_owned)
}

/// Real services over in-memory adapters, wired the way the server wires
/// them.
pub struct TestHarness {
    /// Users, edges, posts and comments.
    pub store: Arc<InMemorySocialStore>,
    /// Uploaded images.
    pub images: Arc<InMemoryImageStore>,
    /// Handler state built over the stores.
    pub state: HttpState,
}

impl TestHarness {
    /// Fresh harness with empty stores.
    pub fn new() -> Self {
        let store = Arc::new(InMemorySocialStore::default());
        let images = Arc::new(InMemoryImageStore::default());
        let deadline = StoreDeadline::default();
        let clock = fixture_clock();
        let posts = Arc::new(PostService::new(
            PostStores {
                posts: Arc::clone(&store),
                comments: Arc::clone(&store),
                users: Arc::clone(&store),
                images: Arc::clone(&images),
            },
            Arc::clone(&clock),
            deadline,
        ));
        let ports = HttpStatePorts {
            accounts: Arc::new(AccountService::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                deadline,
            )),
            users: Arc::new(DirectoryService::new(
                Arc::clone(&store),
                Arc::clone(&store),
                deadline,
            )),
            posts: posts.clone(),
            posts_query: posts,
            toggles: Arc::new(ToggleService::new(Arc::clone(&store), deadline)),
        };
        let tokens = Arc::new(TokenService::new(
            &TokenSettings::new("tsuki-test", b"handler-test-secret".to_vec()),
            clock,
        ));
        Self {
            store,
            images,
            state: HttpState::new(ports, tokens),
        }
    }

    /// Application serving the full `/api/v1` surface over this harness.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let gate = SessionGate::new(Arc::clone(&self.state.tokens));
        App::new()
            .app_data(web::Data::new(self.state.clone()))
            .service(
                web::scope("/api/v1")
                    .wrap(test_session_middleware())
                    .configure(|cfg| super::configure(cfg, &gate)),
            )
    }
}

/// Sign up `username` with [`TEST_PASSWORD`] and return the session cookie.
pub async fn signup_as<S, B>(app: &S, username: &str) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/signup")
            .set_json(json!({ "username": username, "password": TEST_PASSWORD }))
            .to_request(),
    )
    .await;
    assert!(res.status().is_success(), "signup failed: {}", res.status());
    session_cookie(&res).expect("signup sets the session cookie")
}
