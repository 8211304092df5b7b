//! Commerce API client implementation.
//!
//! Plain JSON REST over `reqwest`. Catalog listings are cached with `moka`;
//! cart and checkout calls always hit the store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cartsync_core::{
    Cart, CartId, CheckoutToken, LineItemId, OrderPayload, OrderReceipt, Product, ProductId,
    Quantity,
};
use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::config::CommerceConfig;

use super::conversions::{convert_cart, convert_order, convert_products};
use super::{CartGateway, GatewayError, wire};

const AUTH_HEADER: &str = "X-Authorization";
const CATALOG_KEY: &str = "products";

/// Characters of a response body included in logs.
const LOG_BODY_CHARS: usize = 500;

// =============================================================================
// CommerceClient
// =============================================================================

/// Client for the hosted commerce API.
///
/// Cheap to clone; clones share the HTTP connection pool and catalog cache.
#[derive(Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

struct CommerceClientInner {
    client: reqwest::Client,
    base_url: Url,
    public_key: String,
    catalog: Cache<&'static str, Arc<Vec<Product>>>,
}

impl CommerceClient {
    /// Create a new commerce API client.
    #[must_use]
    pub fn new(config: &CommerceConfig, catalog_ttl: Duration) -> Self {
        let catalog = Cache::builder()
            .max_capacity(16)
            .time_to_live(catalog_ttl)
            .build();

        Self {
            inner: Arc::new(CommerceClientInner {
                client: reqwest::Client::new(),
                base_url: config.api_url.clone(),
                public_key: config.public_key().to_string(),
                catalog,
            }),
        }
    }

    /// Drop cached catalog listings.
    pub async fn invalidate_catalog(&self) {
        self.inner.catalog.invalidate(CATALOG_KEY).await;
    }

    /// Build an endpoint URL from path segments, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GatewayError::Malformed("API URL cannot have a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.inner
            .client
            .request(method, url)
            .header(AUTH_HEADER, &self.inner.public_key)
            .header("Accept", "application/json")
    }

    /// Send a request and decode a successful JSON body.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        let response = request.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(GatewayError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let err = GatewayError::from_response(status, &body);
            if status.is_server_error() {
                tracing::error!(
                    status = %status,
                    body = %body.chars().take(LOG_BODY_CHARS).collect::<String>(),
                    "Commerce API returned server error"
                );
            } else {
                debug!(status = %status, error = %err, "Commerce API rejected request");
            }
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(LOG_BODY_CHARS).collect::<String>(),
                "Failed to parse commerce API response"
            );
            GatewayError::Parse(e)
        })
    }

    async fn cart_mutation(&self, request: RequestBuilder) -> Result<Cart, GatewayError> {
        let envelope: wire::CartEnvelope = self.execute(request).await?;
        convert_cart(envelope.cart)
    }

    async fn fetch_cart(&self, cart: &CartId) -> Result<Cart, GatewayError> {
        let url = self.url(&["carts", cart.as_str()])?;
        let wire: wire::Cart = self.execute(self.request(Method::GET, url)).await?;
        convert_cart(wire)
    }
}

#[async_trait]
impl CartGateway for CommerceClient {
    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, GatewayError> {
        if let Some(products) = self.inner.catalog.get(CATALOG_KEY).await {
            debug!("Cache hit for catalog");
            return Ok(products.as_ref().clone());
        }

        let url = self.url(&["products"])?;
        let list: wire::List<wire::Product> = self.execute(self.request(Method::GET, url)).await?;
        let products = convert_products(list);
        debug!(count = products.len(), "Fetched catalog");

        self.inner
            .catalog
            .insert(CATALOG_KEY, Arc::new(products.clone()))
            .await;

        Ok(products)
    }

    #[instrument(skip(self))]
    async fn retrieve(&self, cart: Option<&CartId>) -> Result<Cart, GatewayError> {
        match cart {
            Some(id) => self.fetch_cart(id).await,
            None => {
                let url = self.url(&["carts"])?;
                let wire: wire::Cart = self.execute(self.request(Method::GET, url)).await?;
                let cart = convert_cart(wire)?;
                debug!(cart_id = %cart.id, "Store issued new cart");
                Ok(cart)
            }
        }
    }

    #[instrument(skip(self), fields(cart_id = %cart, product_id = %product, quantity = %quantity))]
    async fn add(
        &self,
        cart: &CartId,
        product: &ProductId,
        quantity: Quantity,
    ) -> Result<Cart, GatewayError> {
        let url = self.url(&["carts", cart.as_str()])?;
        let body = wire::AddRequest {
            id: product,
            quantity: quantity.get(),
        };
        self.cart_mutation(self.request(Method::POST, url).json(&body))
            .await
    }

    #[instrument(skip(self), fields(cart_id = %cart, line_item_id = %item, quantity = %quantity))]
    async fn update(
        &self,
        cart: &CartId,
        item: &LineItemId,
        quantity: Quantity,
    ) -> Result<Cart, GatewayError> {
        let url = self.url(&["carts", cart.as_str(), "items", item.as_str()])?;
        let body = wire::UpdateRequest {
            quantity: quantity.get(),
        };
        self.cart_mutation(self.request(Method::PUT, url).json(&body))
            .await
    }

    #[instrument(skip(self), fields(cart_id = %cart, line_item_id = %item))]
    async fn remove(&self, cart: &CartId, item: &LineItemId) -> Result<Cart, GatewayError> {
        let url = self.url(&["carts", cart.as_str(), "items", item.as_str()])?;
        self.cart_mutation(self.request(Method::DELETE, url)).await
    }

    #[instrument(skip(self), fields(cart_id = %cart))]
    async fn empty(&self, cart: &CartId) -> Result<Cart, GatewayError> {
        let url = self.url(&["carts", cart.as_str(), "items"])?;
        self.cart_mutation(self.request(Method::DELETE, url)).await
    }

    #[instrument(skip(self), fields(cart_id = %cart))]
    async fn refresh(&self, cart: &CartId) -> Result<Cart, GatewayError> {
        self.fetch_cart(cart).await
    }

    #[instrument(skip(self, payload), fields(checkout_token = %token))]
    async fn capture_checkout(
        &self,
        token: &CheckoutToken,
        payload: &OrderPayload,
    ) -> Result<OrderReceipt, GatewayError> {
        let url = self.url(&["checkouts", token.as_str()])?;
        let order: wire::Order = self
            .execute(self.request(Method::POST, url).json(payload))
            .await?;
        convert_order(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn client(base: &str) -> CommerceClient {
        CommerceClient::new(
            &CommerceConfig {
                api_url: Url::parse(base).unwrap(),
                public_key: SecretString::from("pk_test"),
            },
            Duration::from_secs(60),
        )
    }

    #[test]
    fn test_url_appends_segments() {
        let url = client("https://api.chec.io/v1")
            .url(&["carts", "cart_1", "items"])
            .unwrap();
        assert_eq!(url.as_str(), "https://api.chec.io/v1/carts/cart_1/items");
    }

    #[test]
    fn test_url_handles_trailing_slash() {
        let url = client("http://127.0.0.1:8080/").url(&["products"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/products");
    }

    #[test]
    fn test_url_encodes_opaque_ids() {
        let url = client("https://api.chec.io/v1")
            .url(&["checkouts", "chkt/../admin"])
            .unwrap();
        assert_eq!(url.as_str(), "https://api.chec.io/v1/checkouts/chkt%2F..%2Fadmin");
    }
}
