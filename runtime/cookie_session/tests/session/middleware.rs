use crate::assertions::is_removal_cookie;
use crate::fixtures::{middleware, signed_config, spy_middleware};
use crate::helpers::{
    bigcookie, get, incrementor, nothing, request, session_id, set_cookie, set_cookie_header,
    slashcookie,
};
use cookie_session::{
    Session, SessionConfig, SessionMiddleware, Signer, Transport,
    coder::{DefaultCoder, SessionCoder},
    errors::FinalizeError,
};
use googletest::{
    assert_that,
    prelude::{contains_substring, none, not},
};
use http::header::SET_COOKIE;
use http::{HeaderValue, Response, StatusCode};
use insta::assert_snapshot;

static_assertions::assert_impl_all!(SessionMiddleware: Send, Sync);
static_assertions::assert_impl_all!(Session: Send, Sync, Clone);

#[test]
fn oversized_cookies_are_rejected() {
    let middleware = middleware(SessionConfig::default());

    let err = middleware.call(request(None), bigcookie).unwrap_err();
    assert!(matches!(err, FinalizeError::CookieTooLarge { .. }));
    assert_snapshot!(err, @"The session cookie (`session`) would be 12095 bytes long, exceeding the limit of 4096 bytes. Store less data in the session.");

    let response: Response<String> = err.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn the_size_limit_applies_to_the_percent_encoded_cookie() {
    let middleware = middleware(SessionConfig::default());

    // Before percent-encoding, the cookie fits.
    let mut session = middleware.load(&request(None));
    slashcookie(request(None), &mut session);
    let payload = DefaultCoder::default().encode(&session.to_map()).unwrap();
    let raw_value = Signer::unsigned().sign(&payload);
    let raw_size = "session".len() + raw_value.len();
    assert!(raw_size <= 4096, "The raw cookie is {raw_size} bytes long");

    // Once rendered, it doesn't.
    let err = middleware.call(request(None), slashcookie).unwrap_err();
    let FinalizeError::CookieTooLarge { size, limit, .. } = err else {
        panic!("Expected `CookieTooLarge`, got {err:?}");
    };
    assert_eq!(limit, 4096);
    assert!(size > limit);
    assert!(size > raw_size);
}

#[test]
fn emitted_cookies_never_exceed_the_size_limit() {
    let mut config = SessionConfig::default();
    config.state.max_cookie_size = 16 * 1024;
    let middleware = middleware(config);

    let response = get(&middleware, None, slashcookie);
    let pair = set_cookie(&response).unwrap();
    let (name, value) = pair.split_once('=').unwrap();
    assert!(name.len() + value.len() <= 16 * 1024);
}

#[test]
fn the_size_limit_can_be_raised() {
    let mut config = SessionConfig::default();
    config.state.max_cookie_size = 16 * 1024;
    let middleware = middleware(config);

    let response = get(&middleware, None, bigcookie);
    assert_that!(set_cookie_header(&response), not(none()));
}

#[test]
fn the_size_limit_accounts_for_the_signature() {
    let mut config = signed_config();
    // Large enough for the unsigned cookie, too small once the digest is appended.
    config.state.max_cookie_size = 12095 + 10;
    let middleware = middleware(config);

    let err = middleware.call(request(None), bigcookie).unwrap_err();
    assert!(matches!(err, FinalizeError::CookieTooLarge { size: 12161, .. }));
}

#[test]
fn secure_cookies_are_not_sent_over_plaintext_connections() {
    let mut config = SessionConfig::default();
    config.cookie.secure = true;
    let (middleware, call_tracker) = spy_middleware(config);

    let response = get(&middleware, None, incrementor);
    assert_that!(set_cookie_header(&response), none());
    // The state was never encoded.
    assert_eq!(call_tracker.operation_log(), ["decode"]);
}

#[test]
fn secure_cookies_are_sent_behind_a_tls_terminating_proxy() {
    let mut config = SessionConfig::default();
    config.cookie.secure = true;
    let middleware = middleware(config);

    let mut request = request(None);
    request
        .headers_mut()
        .insert("x-forwarded-proto", HeaderValue::from_static("https"));
    let response = middleware.call(request, incrementor).unwrap();

    let header = set_cookie_header(&response).unwrap();
    assert_that!(header, contains_substring("session="));
    assert_that!(header, contains_substring("Secure"));
}

#[test]
fn secure_cookies_are_sent_if_the_server_reports_an_encrypted_connection() {
    let mut config = SessionConfig::default();
    config.cookie.secure = true;
    let middleware = middleware(config);

    let mut request = request(None);
    request.extensions_mut().insert(Transport::Encrypted);
    let response = middleware.call(request, incrementor).unwrap();

    assert_that!(set_cookie_header(&response), not(none()));
}

#[test]
fn the_state_is_decoded_once_and_never_encoded_if_only_read() {
    let (middleware, call_tracker) = spy_middleware(SessionConfig::default());

    let response = get(&middleware, None, session_id);
    assert_that!(set_cookie_header(&response), none());
    assert_eq!(call_tracker.operation_log(), ["decode"]);
}

#[test]
fn the_state_is_decoded_once_even_if_the_cookie_is_tampered_with() {
    let (middleware, call_tracker) = spy_middleware(signed_config());

    let response = get(&middleware, Some("session=e30=--deadbeef"), nothing);
    assert_that!(set_cookie_header(&response), none());
    assert_eq!(call_tracker.operation_log(), ["decode"]);
}

#[test]
fn invalidating_a_stored_session_removes_the_cookie() {
    let middleware = middleware(SessionConfig::default());
    let response = get(&middleware, None, incrementor);
    let cookie = set_cookie(&response).unwrap();

    let response = get(&middleware, Some(&cookie), |_, session: &mut Session| {
        session.invalidate();
        Response::new(String::new())
    });

    let header = set_cookie_header(&response).unwrap();
    assert_that!(header, is_removal_cookie());
    assert_that!(header, contains_substring("Path=/"));
}

#[test]
fn invalidating_a_fresh_session_sends_nothing() {
    let middleware = middleware(SessionConfig::default());

    let response = get(&middleware, None, |_, session: &mut Session| {
        session.insert("key", "value").unwrap();
        session.invalidate();
        Response::new(String::new())
    });

    assert_that!(set_cookie_header(&response), none());
}

#[test]
fn invalidating_a_session_with_a_broken_cookie_sends_nothing() {
    let middleware = middleware(SessionConfig::default());

    let response = get(&middleware, Some("session=blarghfasel"), |_, session: &mut Session| {
        session.invalidate();
        Response::new(String::new())
    });

    assert_that!(set_cookie_header(&response), none());
}

#[test]
fn existing_set_cookie_headers_are_preserved() {
    let middleware = middleware(SessionConfig::default());

    let response = get(&middleware, None, |request, session: &mut Session| {
        let mut response = incrementor(request, session);
        response
            .headers_mut()
            .insert(SET_COOKIE, HeaderValue::from_static("theme=dark"));
        response
    });

    let headers: Vec<_> = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|h| h.to_str().unwrap())
        .collect();
    assert_eq!(headers.len(), 2);
    assert_eq!(headers[0], "theme=dark");
    assert!(headers[1].starts_with("session="));
}

#[test]
fn load_and_finalize_can_be_driven_separately() {
    let middleware = middleware(SessionConfig::default());

    let request = request(None);
    let transport = Transport::of(&request);
    let mut session = middleware.load(&request);
    session.insert("counter", 1).unwrap();

    let response = middleware
        .finalize(transport, Response::new(()), &session)
        .unwrap();
    assert!(response.headers().contains_key(SET_COOKIE));
}
