use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::{AuthIdentity, AuthProvider, GatewayError, HealthCheck, ProductStore, UserStore};
use crate::config::BackendConfig;
use crate::filter::ProductQuery;
use crate::models::{Product, ProductChanges, User, UserChanges};

const USERS_TABLE: &str = "users";
const PRODUCTS_TABLE: &str = "products";
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

type Params = Vec<(&'static str, String)>;

/// REST client for a Supabase project.
///
/// Table operations (`/rest/v1`) always authenticate with the service key.
/// Auth operations (`/auth/v1`) use the public key, as a browser client would.
#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    base_url: Url,
    public_key: String,
    service_key: String,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    pub fn new(config: &BackendConfig) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.request_timeout.min(MAX_CONNECT_TIMEOUT))
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.clone(),
            public_key: config.public_key.clone(),
            service_key: config.service_key.clone(),
        })
    }

    pub fn users(&self) -> SupabaseUsers {
        SupabaseUsers {
            client: self.clone(),
        }
    }

    pub fn products(&self) -> SupabaseProducts {
        SupabaseProducts {
            client: self.clone(),
        }
    }

    fn endpoint(&self, path: &str, params: &[(&'static str, String)]) -> Url {
        let mut url = self.base_url.clone();
        let prefix = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{}/{}", prefix, path));
        url.set_query(None);
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    fn with_service_key(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    fn with_public_key(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.public_key)
            .bearer_auth(&self.public_key)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: Params,
    ) -> Result<Vec<T>, GatewayError> {
        let mut params: Params = vec![("select", "*".to_string())];
        params.extend(filters);
        let url = self.endpoint(&format!("rest/v1/{}", table), &params);

        tracing::debug!(table, "select");
        let response = self.with_service_key(Method::GET, url).send().await?;
        rows(response).await
    }

    async fn insert<T, B>(&self, table: &str, body: &B) -> Result<Vec<T>, GatewayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(&format!("rest/v1/{}", table), &[]);

        tracing::debug!(table, "insert");
        let response = self
            .with_service_key(Method::POST, url)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        rows(response).await
    }

    async fn update<T, B>(&self, table: &str, filters: Params, body: &B) -> Result<Vec<T>, GatewayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(&format!("rest/v1/{}", table), &filters);

        tracing::debug!(table, "update");
        let response = self
            .with_service_key(Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        rows(response).await
    }

    async fn delete<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: Params,
    ) -> Result<Vec<T>, GatewayError> {
        let url = self.endpoint(&format!("rest/v1/{}", table), &filters);

        tracing::debug!(table, "delete");
        let response = self
            .with_service_key(Method::DELETE, url)
            .header("Prefer", "return=representation")
            .send()
            .await?;
        rows(response).await
    }
}

fn eq(column: &'static str, value: &str) -> (&'static str, String) {
    (column, format!("eq.{}", value))
}

async fn check(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::Rejected {
        status: status.as_u16(),
        message: error_message(status, &body),
    })
}

async fn rows<T: DeserializeOwned>(response: Response) -> Result<Vec<T>, GatewayError> {
    check(response)
        .await?
        .json::<Vec<T>>()
        .await
        .map_err(|e| GatewayError::Decode(e.to_string()))
}

/// Pull a human readable message out of a PostgREST or GoTrue error body
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["msg", "message", "error_description", "error"] {
            if let Some(Value::String(message)) = map.get(key) {
                return message.clone();
            }
        }
    }

    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        body.chars().take(200).collect()
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthUserBody {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// Signup answers with a session when auto-confirm is on, or with the bare user otherwise
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpBody {
    Session { user: AuthUserBody },
    User(AuthUserBody),
}

#[derive(Deserialize)]
struct TokenBody {
    user: AuthUserBody,
}

impl AuthUserBody {
    fn into_identity(self, fallback_email: &str) -> AuthIdentity {
        AuthIdentity {
            id: self.id,
            email: self.email.unwrap_or_else(|| fallback_email.to_string()),
        }
    }
}

#[async_trait]
impl AuthProvider for SupabaseClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthIdentity, GatewayError> {
        let url = self.endpoint("auth/v1/signup", &[]);
        let response = self
            .with_public_key(Method::POST, url)
            .json(&Credentials { email, password })
            .send()
            .await?;

        let body: SignUpBody = check(response)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        let user = match body {
            SignUpBody::Session { user } => user,
            SignUpBody::User(user) => user,
        };
        Ok(user.into_identity(email))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthIdentity, GatewayError> {
        let url = self.endpoint("auth/v1/token", &[("grant_type", "password".to_string())]);
        let response = self
            .with_public_key(Method::POST, url)
            .json(&Credentials { email, password })
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED
        ) {
            return Err(GatewayError::InvalidCredentials);
        }

        let body: TokenBody = check(response)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        Ok(body.user.into_identity(email))
    }
}

#[async_trait]
impl HealthCheck for SupabaseClient {
    async fn ping(&self) -> Result<(), GatewayError> {
        let url = self.endpoint("auth/v1/health", &[]);
        let response = self.with_public_key(Method::GET, url).send().await?;
        check(response).await.map(|_| ())
    }
}

/// Records in the `users` collection
#[derive(Debug, Clone)]
pub struct SupabaseUsers {
    client: SupabaseClient,
}

#[async_trait]
impl UserStore for SupabaseUsers {
    async fn insert(&self, user: &User) -> Result<User, GatewayError> {
        self.client
            .insert::<User, _>(USERS_TABLE, user)
            .await?
            .into_iter()
            .next()
            .ok_or(GatewayError::EmptyResult("insert"))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, GatewayError> {
        let users: Vec<User> = self.client.select(USERS_TABLE, vec![eq("id", id)]).await?;
        Ok(users.into_iter().next())
    }

    async fn update(&self, id: &str, changes: &UserChanges) -> Result<Option<User>, GatewayError> {
        let users: Vec<User> = self
            .client
            .update(USERS_TABLE, vec![eq("id", id)], changes)
            .await?;
        Ok(users.into_iter().next())
    }
}

/// Records in the `products` collection
#[derive(Debug, Clone)]
pub struct SupabaseProducts {
    client: SupabaseClient,
}

#[async_trait]
impl ProductStore for SupabaseProducts {
    async fn insert(&self, product: &Product) -> Result<Product, GatewayError> {
        self.client
            .insert::<Product, _>(PRODUCTS_TABLE, product)
            .await?
            .into_iter()
            .next()
            .ok_or(GatewayError::EmptyResult("insert"))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, GatewayError> {
        let products: Vec<Product> = self
            .client
            .select(PRODUCTS_TABLE, vec![eq("id", id)])
            .await?;
        Ok(products.into_iter().next())
    }

    async fn update(
        &self,
        id: &str,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, GatewayError> {
        let products: Vec<Product> = self
            .client
            .update(PRODUCTS_TABLE, vec![eq("id", id)], changes)
            .await?;
        Ok(products.into_iter().next())
    }

    async fn delete(&self, id: &str) -> Result<bool, GatewayError> {
        let deleted: Vec<Product> = self
            .client
            .delete(PRODUCTS_TABLE, vec![eq("id", id)])
            .await?;
        Ok(!deleted.is_empty())
    }

    async fn list(&self, query: &ProductQuery) -> Result<Vec<Product>, GatewayError> {
        let mut params: Params = vec![("order", "created_at.asc".to_string())];
        if let Some(category) = &query.category {
            params.push(eq("category", category));
        }
        params.push(("limit", query.page.limit().to_string()));
        params.push(("offset", query.page.offset().to_string()));

        self.client.select(PRODUCTS_TABLE, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> SupabaseClient {
        SupabaseClient::new(&BackendConfig {
            url: Url::parse(base).unwrap(),
            public_key: "anon".to_string(),
            service_key: "service".to_string(),
            request_timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path_and_encodes_filters() {
        let client = client("https://example.supabase.co/proxy/");
        let url = client.endpoint("rest/v1/products", &[eq("category", "home & garden")]);
        assert_eq!(url.path(), "/proxy/rest/v1/products");
        assert_eq!(url.query(), Some("category=eq.home+%26+garden"));

        let bare = client.endpoint("auth/v1/health", &[]);
        assert_eq!(bare.as_str(), "https://example.supabase.co/proxy/auth/v1/health");
    }

    #[test]
    fn test_error_message_prefers_backend_text() {
        assert_eq!(
            error_message(StatusCode::UNPROCESSABLE_ENTITY, r#"{"code":422,"msg":"User already registered"}"#),
            "User already registered"
        );
        assert_eq!(
            error_message(StatusCode::CONFLICT, r#"{"code":"23505","message":"duplicate key"}"#),
            "duplicate key"
        );
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, ""), "Bad Gateway");
    }
}
