use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::http_client::{HttpClientTrait, TransportError};
use crate::domain::{AuthError, AuthPayload, IdentityServiceClient, SessionToken, User, UserId};

pub const DEFAULT_IDENTITY_ENDPOINT: &str = "http://localhost:4000/graphql";

const LOGIN_MUTATION: &str = r#"mutation Login($email: String!, $password: String!) {
  login(email: $email, password: $password) {
    token
    user { id name email }
  }
}"#;

const REGISTER_MUTATION: &str = r#"mutation Register($name: String!, $email: String!, $password: String!) {
  register(name: $name, email: $email, password: $password) {
    token
    user { id name email }
  }
}"#;

const CURRENT_USER_QUERY: &str = r#"query GetCurrentUser {
  getCurrentUser { id name email }
}"#;

const UPDATE_PROFILE_MUTATION: &str = r#"mutation UpdateProfile($id: ID!, $name: String!, $email: String!) {
  updateUser(id: $id, name: $name, email: $email) { id name email }
}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Login,
    Register,
    CurrentUser,
    UpdateUser,
}

impl Operation {
    fn document(self) -> &'static str {
        match self {
            Self::Login => LOGIN_MUTATION,
            Self::Register => REGISTER_MUTATION,
            Self::CurrentUser => CURRENT_USER_QUERY,
            Self::UpdateUser => UPDATE_PROFILE_MUTATION,
        }
    }

    /// Top-level field of `data` carrying the answer
    fn field(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Register => "register",
            Self::CurrentUser => "getCurrentUser",
            Self::UpdateUser => "updateUser",
        }
    }

    /// An authentication failure means a bad token for bearer calls and bad
    /// credentials otherwise
    fn unauthenticated(self, message: String) -> AuthError {
        match self {
            Self::Login | Self::Register => AuthError::InvalidCredentials(message),
            Self::CurrentUser | Self::UpdateUser => AuthError::TokenInvalid(message),
        }
    }

    /// Classification for a server error that carries no recognised code
    fn rejected(self, message: String) -> AuthError {
        match self {
            Self::Login | Self::Register => AuthError::InvalidCredentials(message),
            Self::CurrentUser => AuthError::TokenInvalid(message),
            Self::UpdateUser => AuthError::ValidationRejected(message),
        }
    }

    fn missing_data(self) -> AuthError {
        match self {
            Self::Login => AuthError::invalid_credentials("Login failed"),
            Self::Register => AuthError::invalid_credentials("Registration failed"),
            Self::CurrentUser => AuthError::token_invalid("No current user"),
            Self::UpdateUser => AuthError::unknown("Failed to update profile"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    extensions: Option<GraphQlErrorExtensions>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorExtensions {
    code: Option<String>,
}

impl GraphQlError {
    fn classify(self, operation: Operation) -> AuthError {
        let code = self.extensions.and_then(|e| e.code).unwrap_or_default();

        match code.as_str() {
            "UNAUTHENTICATED" | "FORBIDDEN" => operation.unauthenticated(self.message),
            "BAD_USER_INPUT" | "GRAPHQL_VALIDATION_FAILED" | "GRAPHQL_PARSE_FAILED" => {
                AuthError::ValidationRejected(self.message)
            }
            "INTERNAL_SERVER_ERROR" => AuthError::Unknown(self.message),
            _ => operation.rejected(self.message),
        }
    }
}

/// Identity service client speaking GraphQL over HTTP
#[derive(Debug)]
pub struct GraphQlIdentityClient<C: HttpClientTrait> {
    client: C,
    endpoint: String,
}

impl<C: HttpClientTrait> GraphQlIdentityClient<C> {
    pub fn new(client: C) -> Self {
        Self::with_endpoint(client, DEFAULT_IDENTITY_ENDPOINT)
    }

    pub fn with_endpoint(client: C, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: Operation,
        variables: serde_json::Value,
        token: Option<&SessionToken>,
    ) -> Result<T, AuthError> {
        let body = serde_json::json!({
            "query": operation.document(),
            "variables": variables,
        });

        let bearer = token.map(SessionToken::bearer);
        let mut headers = vec![("Content-Type", "application/json")];
        if let Some(ref bearer) = bearer {
            headers.push(("Authorization", bearer.as_str()));
        }

        tracing::debug!(operation = operation.field(), endpoint = %self.endpoint, "Calling identity service");

        let response = self
            .client
            .post_json(&self.endpoint, headers, &body)
            .await
            .map_err(|e| classify_transport(operation, e))?;

        parse_response(operation, response)
    }
}

fn parse_response<T: DeserializeOwned>(
    operation: Operation,
    response: serde_json::Value,
) -> Result<T, AuthError> {
    let response: GraphQlResponse = serde_json::from_value(response)
        .map_err(|e| AuthError::unknown(format!("Malformed identity response: {}", e)))?;

    if let Some(error) = response.errors.into_iter().next() {
        return Err(error.classify(operation));
    }

    let payload = response
        .data
        .and_then(|mut data| data.get_mut(operation.field()).map(serde_json::Value::take))
        .filter(|value| !value.is_null())
        .ok_or_else(|| operation.missing_data())?;

    serde_json::from_value(payload)
        .map_err(|e| AuthError::unknown(format!("Malformed identity response: {}", e)))
}

fn classify_transport(operation: Operation, error: TransportError) -> AuthError {
    match error {
        TransportError::Request(message) => AuthError::NetworkFailure(message),
        TransportError::Decode(message) => {
            AuthError::unknown(format!("Malformed identity response: {}", message))
        }
        TransportError::Status { status, body } => {
            // Many GraphQL servers answer errors with a non-2xx status and a
            // regular error document
            let first_error = serde_json::from_str::<GraphQlResponse>(&body)
                .ok()
                .and_then(|r| r.errors.into_iter().next());
            if let Some(error) = first_error {
                return error.classify(operation);
            }

            let message = format!("HTTP {}", status);
            match status {
                401 | 403 => operation.unauthenticated(message),
                400 | 422 => AuthError::ValidationRejected(message),
                _ => AuthError::Unknown(message),
            }
        }
    }
}

#[async_trait]
impl<C: HttpClientTrait> IdentityServiceClient for GraphQlIdentityClient<C> {
    async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, AuthError> {
        let variables = serde_json::json!({ "email": email, "password": password });
        self.execute(Operation::Login, variables, None).await
    }

    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthPayload, AuthError> {
        let variables = serde_json::json!({ "name": name, "email": email, "password": password });
        self.execute(Operation::Register, variables, None).await
    }

    async fn fetch_current_user(&self, token: &SessionToken) -> Result<User, AuthError> {
        self.execute(Operation::CurrentUser, serde_json::json!({}), Some(token))
            .await
    }

    async fn update_user(
        &self,
        token: &SessionToken,
        id: &UserId,
        name: &str,
        email: &str,
    ) -> Result<User, AuthError> {
        let variables = serde_json::json!({ "id": id.as_str(), "name": name, "email": email });
        self.execute(Operation::UpdateUser, variables, Some(token))
            .await
    }

    fn client_name(&self) -> &'static str {
        "graphql"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::identity::http_client::mock::MockHttpClient;
    use crate::infrastructure::identity::HttpClient;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_URL: &str = "http://localhost:4000/graphql";

    fn auth_response(field: &str) -> serde_json::Value {
        serde_json::json!({
            "data": {
                field: {
                    "token": "tok1",
                    "user": { "id": "1", "name": "A", "email": "a@b.com" }
                }
            }
        })
    }

    #[tokio::test]
    async fn test_login() {
        let client = MockHttpClient::new().with_response(TEST_URL, auth_response("login"));
        let identity = GraphQlIdentityClient::new(client);

        let payload = identity.login("a@b.com", "pw").await.unwrap();

        assert_eq!(payload.token, SessionToken::new("tok1"));
        assert_eq!(payload.user, User::new("1", "A", "a@b.com"));

        assert_eq!(identity.endpoint(), TEST_URL);
        let requests = identity.client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, TEST_URL);
        assert_eq!(requests[0].body["variables"]["email"], "a@b.com");
        assert_eq!(requests[0].body["variables"]["password"], "pw");
        assert!(requests[0].body["query"].as_str().unwrap().contains("mutation Login"));
        assert!(requests[0].header("Authorization").is_none());
    }

    #[tokio::test]
    async fn test_register() {
        let client = MockHttpClient::new().with_response(TEST_URL, auth_response("register"));
        let identity = GraphQlIdentityClient::new(client);

        let payload = identity.register("A", "a@b.com", "pw").await.unwrap();

        assert_eq!(payload.user.name(), "A");
        assert_eq!(identity.client.requests()[0].body["variables"]["name"], "A");
    }

    #[tokio::test]
    async fn test_login_error_surfaces_server_message() {
        let response = serde_json::json!({
            "data": null,
            "errors": [{ "message": "Invalid email or password" }]
        });
        let client = MockHttpClient::new().with_response(TEST_URL, response);
        let identity = GraphQlIdentityClient::new(client);

        let error = identity.login("a@b.com", "wrong").await.unwrap_err();

        assert_eq!(error, AuthError::invalid_credentials("Invalid email or password"));
    }

    #[tokio::test]
    async fn test_login_without_data_fails() {
        let client = MockHttpClient::new().with_response(TEST_URL, serde_json::json!({ "data": { "login": null } }));
        let identity = GraphQlIdentityClient::new(client);

        let error = identity.login("a@b.com", "pw").await.unwrap_err();

        assert_eq!(error.message(), "Login failed");
    }

    #[tokio::test]
    async fn test_register_validation_error() {
        let response = serde_json::json!({
            "errors": [{
                "message": "Email already registered",
                "extensions": { "code": "BAD_USER_INPUT" }
            }]
        });
        let client = MockHttpClient::new().with_response(TEST_URL, response);
        let identity = GraphQlIdentityClient::new(client);

        let error = identity.register("A", "a@b.com", "pw").await.unwrap_err();

        assert_eq!(error, AuthError::validation_rejected("Email already registered"));
    }

    #[tokio::test]
    async fn test_fetch_current_user_sends_bearer() {
        let response = serde_json::json!({
            "data": { "getCurrentUser": { "id": "1", "name": "A", "email": "a@b.com" } }
        });
        let client = MockHttpClient::new().with_response(TEST_URL, response);
        let identity = GraphQlIdentityClient::new(client);

        let user = identity
            .fetch_current_user(&SessionToken::new("tok1"))
            .await
            .unwrap();

        assert_eq!(user.id().as_str(), "1");
        let requests = identity.client.requests();
        assert_eq!(requests[0].header("Authorization"), Some("Bearer tok1"));
    }

    #[tokio::test]
    async fn test_fetch_current_user_unauthenticated() {
        let response = serde_json::json!({
            "errors": [{
                "message": "jwt expired",
                "extensions": { "code": "UNAUTHENTICATED" }
            }]
        });
        let client = MockHttpClient::new().with_response(TEST_URL, response);
        let identity = GraphQlIdentityClient::new(client);

        let error = identity
            .fetch_current_user(&SessionToken::new("tok1"))
            .await
            .unwrap_err();

        assert_eq!(error, AuthError::token_invalid("jwt expired"));
    }

    #[tokio::test]
    async fn test_fetch_current_user_null() {
        let response = serde_json::json!({ "data": { "getCurrentUser": null } });
        let client = MockHttpClient::new().with_response(TEST_URL, response);
        let identity = GraphQlIdentityClient::new(client);

        let error = identity
            .fetch_current_user(&SessionToken::new("tok1"))
            .await
            .unwrap_err();

        assert!(matches!(error, AuthError::TokenInvalid(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_failure() {
        let client = MockHttpClient::new()
            .with_error(TEST_URL, TransportError::Request("connection refused".to_string()));
        let identity = GraphQlIdentityClient::new(client);

        let error = identity.login("a@b.com", "pw").await.unwrap_err();

        assert_eq!(error, AuthError::network("connection refused"));
    }

    #[tokio::test]
    async fn test_update_user_generic_error_is_validation() {
        let response = serde_json::json!({ "errors": [{ "message": "Email already in use" }] });
        let client = MockHttpClient::new().with_response(TEST_URL, response);
        let identity = GraphQlIdentityClient::new(client);

        let error = identity
            .update_user(&SessionToken::new("tok1"), &UserId::new("1"), "A", "taken@b.com")
            .await
            .unwrap_err();

        assert_eq!(error, AuthError::validation_rejected("Email already in use"));
    }

    #[test]
    fn test_status_classification() {
        let unauthorized = TransportError::Status { status: 401, body: String::new() };
        assert!(matches!(
            classify_transport(Operation::Login, unauthorized.clone()),
            AuthError::InvalidCredentials(_)
        ));
        assert!(matches!(
            classify_transport(Operation::CurrentUser, unauthorized),
            AuthError::TokenInvalid(_)
        ));

        let bad_request = TransportError::Status { status: 400, body: "oops".to_string() };
        assert!(matches!(
            classify_transport(Operation::Register, bad_request),
            AuthError::ValidationRejected(_)
        ));

        let server_error = TransportError::Status { status: 502, body: String::new() };
        assert_eq!(
            classify_transport(Operation::Login, server_error),
            AuthError::unknown("HTTP 502")
        );

        let decode = TransportError::Decode("expected value".to_string());
        assert!(matches!(
            classify_transport(Operation::CurrentUser, decode),
            AuthError::Unknown(_)
        ));
    }

    fn graphql_error(code: &str, message: &str) -> GraphQlError {
        serde_json::from_value(serde_json::json!({
            "message": message,
            "extensions": { "code": code }
        }))
        .unwrap()
    }

    #[test]
    fn test_error_code_classification() {
        assert_eq!(
            graphql_error("FORBIDDEN", "Not allowed").classify(Operation::Login),
            AuthError::invalid_credentials("Not allowed")
        );
        assert_eq!(
            graphql_error("FORBIDDEN", "Not allowed").classify(Operation::UpdateUser),
            AuthError::token_invalid("Not allowed")
        );
        assert_eq!(
            graphql_error("GRAPHQL_VALIDATION_FAILED", "Unknown field").classify(Operation::CurrentUser),
            AuthError::validation_rejected("Unknown field")
        );
        assert_eq!(
            graphql_error("GRAPHQL_PARSE_FAILED", "Syntax error").classify(Operation::Register),
            AuthError::validation_rejected("Syntax error")
        );
        assert_eq!(
            graphql_error("INTERNAL_SERVER_ERROR", "Database down").classify(Operation::CurrentUser),
            AuthError::unknown("Database down")
        );
    }

    #[test]
    fn test_status_with_error_document_uses_document() {
        let body = serde_json::json!({
            "errors": [{ "message": "Not authorised!", "extensions": { "code": "UNAUTHENTICATED" } }]
        })
        .to_string();

        let error = classify_transport(Operation::CurrentUser, TransportError::Status { status: 400, body });

        assert_eq!(error, AuthError::token_invalid("Not authorised!"));
    }

    #[tokio::test]
    async fn test_http_login_roundtrip() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_partial_json(serde_json::json!({
                "variables": { "email": "a@b.com", "password": "pw" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_response("login")))
            .expect(1)
            .mount(&server)
            .await;

        let identity = GraphQlIdentityClient::with_endpoint(
            HttpClient::new(),
            format!("{}/graphql", server.uri()),
        );

        let payload = identity.login("a@b.com", "pw").await.unwrap();
        assert_eq!(payload.token.as_str(), "tok1");
    }

    #[tokio::test]
    async fn test_http_current_user_bearer_header() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(header("authorization", "Bearer tok1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "getCurrentUser": { "id": "1", "name": "A", "email": "a@b.com" } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let identity = GraphQlIdentityClient::with_endpoint(
            HttpClient::new(),
            format!("{}/graphql", server.uri()),
        );

        let user = identity
            .fetch_current_user(&SessionToken::new("tok1"))
            .await
            .unwrap();
        assert_eq!(user.email(), "a@b.com");
    }

    #[tokio::test]
    async fn test_http_unauthorized_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let identity = GraphQlIdentityClient::with_endpoint(
            HttpClient::new(),
            format!("{}/graphql", server.uri()),
        );

        let error = identity
            .fetch_current_user(&SessionToken::new("expired"))
            .await
            .unwrap_err();
        assert_eq!(error, AuthError::token_invalid("HTTP 401"));
    }

    #[tokio::test]
    async fn test_http_unreachable_is_network_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}/graphql", listener.local_addr().unwrap());
        drop(listener);

        let identity = GraphQlIdentityClient::with_endpoint(HttpClient::new(), endpoint);

        let error = identity.login("a@b.com", "pw").await.unwrap_err();
        assert!(error.is_transient());
    }
}
