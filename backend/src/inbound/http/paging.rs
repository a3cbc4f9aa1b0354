//! Shared plumbing for "load more" endpoints and toggle responses.

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse};
use pagination::{PageRequest, Paginated};
use serde::Deserialize;
use url::Url;
use utoipa::IntoParams;

use crate::domain::{Error, ToggleOutcome, ToggleState};

/// `?cursor=&limit=` query parameters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Opaque cursor from a previous page's `nextCursor`.
    pub cursor: Option<String>,
    /// Page size, clamped to `1..=100`; defaults to 10.
    pub limit: Option<u32>,
}

impl PageQuery {
    /// Validate the query into a [`PageRequest`].
    pub fn to_request(&self) -> Result<PageRequest, Error> {
        Ok(PageRequest::from_query(self.limit, self.cursor.as_deref())?)
    }
}

/// Absolute URL of the current request, used as the base for page links.
fn request_url(req: &HttpRequest) -> Result<Url, Error> {
    let info = req.connection_info();
    let raw = format!("{}://{}{}", info.scheme(), info.host(), req.uri());
    Url::parse(&raw).map_err(|err| Error::internal(format!("invalid request url {raw}: {err}")))
}

/// Wrap `data` fetched for `page` into the response envelope.
pub fn paginate<T>(req: &HttpRequest, data: Vec<T>, page: &PageRequest) -> Result<Paginated<T>, Error> {
    let base = request_url(req)?;
    Ok(Paginated::new(data, page, &base))
}

/// Whether the caller expects JSON rather than a page navigation.
fn wants_json(req: &HttpRequest) -> bool {
    let header_contains = |name: header::HeaderName, needle: &str| {
        req.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.to_ascii_lowercase().contains(needle))
    };
    header_contains(header::HeaderName::from_static("x-requested-with"), "xmlhttprequest")
        || header_contains(header::ACCEPT, "application/json")
}

/// Respond to a toggle: `200 {"active": bool}` for AJAX callers, otherwise a
/// `302` back to the referring page, or to `fallback` without a referrer.
pub fn toggle_response(req: &HttpRequest, outcome: ToggleOutcome, fallback: &str) -> HttpResponse {
    if wants_json(req) {
        return HttpResponse::Ok().json(ToggleState::from(outcome));
    }
    let location = req
        .headers()
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(fallback)
        .to_owned();
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use rstest::rstest;

    #[rstest]
    #[case::ajax(Some(("X-Requested-With", "XMLHttpRequest")), StatusCode::OK)]
    #[case::json(Some(("Accept", "application/json")), StatusCode::OK)]
    #[case::form(None, StatusCode::FOUND)]
    fn toggle_response_depends_on_the_caller(
        #[case] header: Option<(&str, &str)>,
        #[case] expected: StatusCode,
    ) {
        let mut builder = TestRequest::post().uri("/api/v1/posts/x/vote");
        if let Some(pair) = header {
            builder = builder.insert_header(pair);
        }
        let res = toggle_response(&builder.to_http_request(), ToggleOutcome::Added, "/posts/x");
        assert_eq!(res.status(), expected);
        if expected == StatusCode::FOUND {
            assert_eq!(
                res.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
                Some("/posts/x")
            );
        }
    }

    #[rstest]
    fn form_toggles_return_to_the_referrer() {
        let req = TestRequest::post()
            .uri("/api/v1/users/x/follow")
            .insert_header((header::REFERER, "/profiles/ada"))
            .to_http_request();
        let res = toggle_response(&req, ToggleOutcome::Removed, "/");
        assert_eq!(
            res.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
            Some("/profiles/ada")
        );
    }

    #[rstest]
    fn page_links_keep_the_filter() {
        let req = TestRequest::get()
            .uri("/api/v1/users?search=ad&limit=2")
            .to_http_request();
        let page = PageRequest::new(Some(2), None);
        let envelope = paginate(&req, vec![1, 2], &page).expect("envelope");
        let next = envelope.links.next.expect("full page has a next link");
        assert!(next.contains("search=ad"));
        assert!(next.contains("cursor="));
    }

    #[rstest]
    fn malformed_cursors_are_rejected() {
        let query = PageQuery {
            cursor: Some("%%%".to_owned()),
            limit: None,
        };
        let err = query.to_request().expect_err("bad cursor");
        assert_eq!(err.code(), crate::domain::ErrorCode::InvalidRequest);
    }
}
