#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use pubic::cache::CredentialCache;
use pubic::credentials::{ClientCredentials, StaticLoginProvider};
use pubic::hubic::HubicClient;
use pubic::AuthFlow;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const CLIENT_ID: &str = "api_hubic_test";
pub const CLIENT_SECRET: &str = "client-secret-value";
pub const LOGIN: &str = "me@example.com";
pub const PASSWORD: &str = "s3cret!";
pub const FORM_TOKEN: &str = "FORMTOKEN42";
pub const CODE: &str = "CODE123";
pub const SCOPE: &str = "account.r,credentials.r";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub const LOGIN_BODY: &str = "oauth=FORMTOKEN42&action=accepted&account=r&credentials=r&login=me%40example.com&user_pwd=s3cret%21";

pub fn basic_auth() -> String {
    format!("Basic {}", STANDARD.encode(format!("{CLIENT_ID}:{CLIENT_SECRET}")))
}

pub fn redirect_uri(server: &MockServer) -> String {
    format!("{}/callback", server.uri())
}

pub fn login_page(token: &str) -> String {
    format!(
        r#"<html><body>
        <form action="/oauth/auth/" method="post">
          <input type="hidden" name="oauth" value="{token}">
          <input type="hidden" name="action" value="accepted">
          <input type="email" name="login">
          <input type="password" name="user_pwd">
        </form>
        </body></html>"#
    )
}

pub fn token_body(access: &str, refresh: &str) -> String {
    format!(
        r#"{{"access_token":"{access}","refresh_token":"{refresh}","expires_in":21600,"token_type":"Bearer"}}"#
    )
}

pub fn storage_body(token: &str, endpoint: &str) -> String {
    format!(r#"{{"token":"{token}","endpoint":"{endpoint}","expires":"2099-12-14T22:52:45+01:00"}}"#)
}

/// The state sent in the authorization GET, as seen by the mock vendor.
#[derive(Clone, Default)]
pub struct SeenState(Arc<Mutex<Option<String>>>);

impl SeenState {
    pub fn get(&self) -> Option<String> {
        self.0.lock().expect("state lock poisoned").clone()
    }
}

/// Serves the login page and remembers the request's `state`.
struct LoginPage {
    seen: SeenState,
}

impl Respond for LoginPage {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let state = request
            .url
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned());
        *self.seen.0.lock().expect("state lock poisoned") = state;

        ResponseTemplate::new(200).set_body_raw(login_page(FORM_TOKEN), "text/html")
    }
}

/// How the mock vendor answers the login POST.
#[derive(Clone)]
pub enum LoginOutcome {
    /// Redirect with the code and the state it saw.
    Grant,
    /// Redirect with the code and a different state.
    ForgedState,
    /// Redirect with `error`/`error_description`.
    Deny { error: String, description: String },
}

struct LoginRedirect {
    seen: SeenState,
    target: String,
    outcome: LoginOutcome,
}

impl Respond for LoginRedirect {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let location = match &self.outcome {
            LoginOutcome::Grant => format!(
                "{}?code={CODE}&scope={SCOPE}&state={}",
                self.target,
                self.seen.get().unwrap_or_default()
            ),
            LoginOutcome::ForgedState => {
                format!("{}?code={CODE}&scope={SCOPE}&state=forged", self.target)
            }
            LoginOutcome::Deny { error, description } => format!(
                "{}?error={error}&error_description={}",
                self.target,
                urlencoding::encode(description)
            ),
        };
        ResponseTemplate::new(302).insert_header("Location", location.as_str())
    }
}

/// Mount the authorization GET, login POST and redirect target.
pub async fn mount_authorization(server: &MockServer, outcome: LoginOutcome) -> SeenState {
    let seen = mount_authorization_to(server, outcome, redirect_uri(server)).await;

    Mock::given(method("GET"))
        .and(path("/callback"))
        .respond_with(ResponseTemplate::new(200).set_body_string("authorized"))
        .mount(server)
        .await;

    seen
}

/// Mount the authorization GET and login POST, redirecting to `redirect`.
pub async fn mount_authorization_to(
    server: &MockServer,
    outcome: LoginOutcome,
    redirect: String,
) -> SeenState {
    let seen = SeenState::default();

    Mock::given(method("GET"))
        .and(path("/oauth/auth/"))
        .and(query_param("client_id", CLIENT_ID))
        .and(query_param("redirect_uri", redirect.as_str()))
        .and(query_param("scope", SCOPE))
        .and(query_param("response_type", "code"))
        .and(header("content-type", FORM_CONTENT_TYPE))
        .respond_with(LoginPage { seen: seen.clone() })
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth/auth/"))
        .and(header("content-type", FORM_CONTENT_TYPE))
        .and(body_string(LOGIN_BODY))
        .respond_with(LoginRedirect {
            seen: seen.clone(),
            target: redirect,
            outcome,
        })
        .mount(server)
        .await;

    seen
}

/// A local URL nothing listens on.
pub fn closed_port_uri() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}/cb")
}

/// Mount the code exchange, expecting exactly `times` calls.
pub async fn mount_code_exchange(server: &MockServer, access: &str, refresh: &str, times: u64) {
    mount_code_exchange_for(server, &redirect_uri(server), access, refresh, times).await;
}

/// Mount the code exchange for a specific redirect URI.
pub async fn mount_code_exchange_for(
    server: &MockServer,
    redirect: &str,
    access: &str,
    refresh: &str,
    times: u64,
) {
    let body = format!(
        "code={CODE}&redirect_uri={}&grant_type=authorization_code",
        urlencoding::encode(redirect)
    );

    Mock::given(method("POST"))
        .and(path("/oauth/token/"))
        .and(header("authorization", basic_auth().as_str()))
        .and(header("content-type", FORM_CONTENT_TYPE))
        .and(body_string(body))
        .respond_with(ResponseTemplate::new(200).set_body_raw(token_body(access, refresh), "application/json"))
        .expect(times)
        .mount(server)
        .await;
}

/// Mount the storage credentials endpoint for a given bearer token.
pub async fn mount_storage_credentials(server: &MockServer, access: &str, storage_token: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path("/1.0/account/credentials"))
        .and(header("authorization", format!("Bearer {access}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            storage_body(storage_token, "https://lb1949.hubic.ovh.net/v1/AUTH_test"),
            "application/json",
        ))
        .expect(times)
        .mount(server)
        .await;
}

pub fn client(server: &MockServer) -> HubicClient {
    HubicClient::with_base_url(server.uri(), Duration::from_secs(5)).expect("client builds")
}

pub fn client_credentials() -> ClientCredentials {
    ClientCredentials::new(CLIENT_ID, CLIENT_SECRET)
}

pub fn flow(server: &MockServer, cache: Arc<dyn CredentialCache>) -> AuthFlow {
    AuthFlow::new(
        client(server),
        client_credentials(),
        Arc::new(StaticLoginProvider::new(LOGIN, PASSWORD)),
        cache,
    )
    .with_redirect_uri(redirect_uri(server))
}

/// `(method, path)` of every request the server received, in order.
pub async fn request_log(server: &MockServer) -> Vec<(String, String)> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| (r.method.to_string(), r.url.path().to_string()))
        .collect()
}
