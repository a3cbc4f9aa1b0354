//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! The cookie session carries two entries: the signed identity token under
//! [`AUTHORIZATION_KEY`] and the resolved user id under [`USER_ID_KEY`].

use actix_session::{Session, SessionExt};
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::{Ready, ready};

use crate::domain::{Error, SessionToken, UserId};

/// Session entry holding the identity token.
pub const AUTHORIZATION_KEY: &str = "Authorization";

/// Session entry holding the user id written by the session gate.
pub const USER_ID_KEY: &str = "userId";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub const fn new(session: Session) -> Self {
        Self(session)
    }

    /// Store a freshly issued token and its subject, renewing the session
    /// identifier.
    pub fn establish(&self, token: &SessionToken, user_id: &UserId) -> Result<(), Error> {
        self.0.renew();
        self.insert(AUTHORIZATION_KEY, token.as_str())?;
        self.persist_user(user_id)
    }

    /// Record the authenticated user's id.
    pub fn persist_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.insert(USER_ID_KEY, user_id.as_ref())
    }

    /// The raw token string, if one is held.
    pub fn token(&self) -> Result<Option<String>, Error> {
        self.0
            .get::<String>(AUTHORIZATION_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))
    }

    /// The stored user id, if present and well formed.
    pub fn user_id(&self) -> Result<Option<UserId>, Error> {
        let id = self
            .0
            .get::<String>(USER_ID_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        Ok(id.and_then(|raw| match UserId::new(raw) {
            Ok(id) => Some(id),
            Err(error) => {
                tracing::warn!(%error, "invalid user id in session cookie");
                None
            }
        }))
    }

    /// Clear every entry and expire the cookie.
    pub fn end(&self) {
        self.0.purge();
    }

    fn insert(&self, key: &str, value: &str) -> Result<(), Error> {
        self.0
            .insert(key, value)
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(Self::new(req.get_session())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::session_config::SESSION_COOKIE_NAME;
    use crate::inbound::http::test_utils::{session_cookie, test_session_middleware};
    use actix_web::http::StatusCode;
    use actix_web::{HttpResponse, test, web};

    const FIXTURE_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    fn fixture_token() -> SessionToken {
        SessionToken::from_raw("header.payload.signature")
    }

    #[actix_web::test]
    async fn establish_round_trips_token_and_user() {
        let app = test::init_service(
            actix_web::App::new()
                .wrap(test_session_middleware())
                .route(
                    "/set",
                    web::get().to(|session: SessionContext| async move {
                        let id = UserId::new(FIXTURE_ID).expect("fixture id");
                        session.establish(&fixture_token(), &id)?;
                        Ok::<_, Error>(HttpResponse::Ok())
                    }),
                )
                .route(
                    "/get",
                    web::get().to(|session: SessionContext| async move {
                        let token = session.token()?.unwrap_or_default();
                        let id = session.user_id()?.map(|id| id.to_string()).unwrap_or_default();
                        Ok::<_, Error>(HttpResponse::Ok().body(format!("{token}|{id}")))
                    }),
                ),
        )
        .await;

        let set = test::call_service(&app, test::TestRequest::get().uri("/set").to_request()).await;
        assert_eq!(set.status(), StatusCode::OK);
        let cookie = session_cookie(&set).expect("session cookie set");
        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);

        let get = test::call_service(
            &app,
            test::TestRequest::get().uri("/get").cookie(cookie).to_request(),
        )
        .await;
        let body = test::read_body(get).await;
        assert_eq!(body, format!("header.payload.signature|{FIXTURE_ID}").as_bytes());
    }

    #[actix_web::test]
    async fn malformed_user_id_reads_as_absent() {
        let app = test::init_service(
            actix_web::App::new()
                .wrap(test_session_middleware())
                .route(
                    "/set-invalid",
                    web::get().to(|session: Session| async move {
                        session
                            .insert(USER_ID_KEY, "not-a-uuid")
                            .expect("set invalid user id");
                        HttpResponse::Ok()
                    }),
                )
                .route(
                    "/get",
                    web::get().to(|session: SessionContext| async move {
                        let present = session.user_id()?.is_some();
                        Ok::<_, Error>(HttpResponse::Ok().body(present.to_string()))
                    }),
                ),
        )
        .await;

        let set = test::call_service(
            &app,
            test::TestRequest::get().uri("/set-invalid").to_request(),
        )
        .await;
        let cookie = session_cookie(&set).expect("session cookie set");
        let get = test::call_service(
            &app,
            test::TestRequest::get().uri("/get").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(test::read_body(get).await, "false");
    }

    #[actix_web::test]
    async fn end_expires_the_cookie() {
        let app = test::init_service(
            actix_web::App::new()
                .wrap(test_session_middleware())
                .route(
                    "/set",
                    web::get().to(|session: SessionContext| async move {
                        session.persist_user(&UserId::new(FIXTURE_ID).expect("fixture id"))?;
                        Ok::<_, Error>(HttpResponse::Ok())
                    }),
                )
                .route(
                    "/end",
                    web::get().to(|session: SessionContext| async move {
                        session.end();
                        HttpResponse::Ok()
                    }),
                ),
        )
        .await;

        let set = test::call_service(&app, test::TestRequest::get().uri("/set").to_request()).await;
        let cookie = session_cookie(&set).expect("session cookie set");
        let end = test::call_service(
            &app,
            test::TestRequest::get().uri("/end").cookie(cookie).to_request(),
        )
        .await;
        let removal = session_cookie(&end).expect("removal cookie");
        assert_eq!(removal.value(), "");
    }
}
