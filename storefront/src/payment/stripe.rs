// Checkout Sessions over the Stripe REST API.
// Auth: secret key as bearer token, bodies are form-encoded.

use async_trait::async_trait;
use common::config::PaymentConfig;
use metrics::histogram;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;
use tracing::{debug, error, info};

use super::{PaymentData, PaymentGateway, SessionDetails, SessionPaymentStatus, SocialLink};
use crate::model::{GenericError, OrderId};

#[derive(Debug)]
pub enum StripeError {
    Http(reqwest::Error),
    Api { status: u16, body: String },
    InvalidResponse(String),
}

impl fmt::Display for StripeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StripeError::Http(e) => write!(f, "http error: {e}"),
            StripeError::Api { status, body } => write!(f, "stripe api error status={status} body={body}"),
            StripeError::InvalidResponse(e) => write!(f, "invalid response: {e}"),
        }
    }
}

impl std::error::Error for StripeError {}

impl From<reqwest::Error> for StripeError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

#[derive(Debug, Deserialize)]
struct CheckoutSession {
    id: String,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl CheckoutSession {
    fn into_details(self) -> SessionDetails {
        let status = SessionPaymentStatus::from_gateway(self.payment_status.as_deref().unwrap_or(""));
        let social_links = self
            .metadata
            .get("social_links")
            .and_then(|raw| serde_json::from_str::<Vec<SocialLink>>(raw).ok())
            .unwrap_or_default();
        SessionDetails {
            session_id: self.id,
            status,
            order_id: self
                .metadata
                .get("order_id")
                .filter(|id| !id.is_empty())
                .map(|id| OrderId::from(id.as_str())),
            social_links,
        }
    }
}

pub struct StripeGateway {
    client: reqwest::Client,
    config: PaymentConfig,
}

impl StripeGateway {
    pub fn new(config: PaymentConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Form fields for `POST /v1/checkout/sessions`.
    pub fn session_form(&self, payment: &PaymentData) -> Result<Vec<(String, String)>, GenericError> {
        let mut form = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), self.config.success_url.clone()),
            ("cancel_url".to_string(), self.config.cancel_url.clone()),
            ("customer_email".to_string(), payment.email.clone()),
            ("metadata[customer_name]".to_string(), payment.full_name.clone()),
        ];
        if let Some(order_id) = &payment.order_id {
            form.push(("metadata[order_id]".to_string(), order_id.to_string()));
            form.push(("client_reference_id".to_string(), order_id.to_string()));
        }

        for (i, item) in payment.items.iter().enumerate() {
            let prefix = format!("line_items[{i}]");
            form.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
            form.push((format!("{prefix}[price_data][currency]"), self.config.currency.clone()));
            form.push((format!("{prefix}[price_data][unit_amount]"), item.price.cents().to_string()));
            form.push((format!("{prefix}[price_data][product_data][name]"), item.name.clone()));
            if let Some(link) = &item.social_media_link {
                form.push((format!("{prefix}[price_data][product_data][metadata][social_link]"), link.clone()));
            }
        }

        let links: Vec<SocialLink> = payment
            .items
            .iter()
            .map(|item| SocialLink {
                item_id: item.id.clone(),
                link: item.social_media_link.clone().unwrap_or_default(),
            })
            .collect();
        form.push(("metadata[social_links]".to_string(), serde_json::to_string(&links)?));
        Ok(form)
    }

    async fn parse_session(resp: reqwest::Response) -> Result<CheckoutSession, StripeError> {
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(StripeError::Api {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str::<CheckoutSession>(&body)
            .map_err(|e| StripeError::InvalidResponse(format!("{e}; body={body}")))
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(&self, payment: &PaymentData) -> Result<String, GenericError> {
        let form = self.session_form(payment)?;
        let t0 = Instant::now();
        let resp = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.config.api_base))
            .bearer_auth(&self.config.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(StripeError::from)?;
        let session = Self::parse_session(resp).await;
        histogram!("storefront_gateway_seconds", "op" => "create_session").record(t0.elapsed().as_secs_f64());

        match session {
            Ok(session) => {
                info!(session_id = %session.id, order_id = ?payment.order_id, amount = %payment.amount, "Created checkout session");
                Ok(session.id)
            }
            Err(e) => {
                error!(error = %e, order_id = ?payment.order_id, "Checkout session creation failed");
                Err(e.into())
            }
        }
    }

    async fn check_payment_status(&self, session_id: &str) -> Result<SessionDetails, GenericError> {
        let t0 = Instant::now();
        let resp = self
            .client
            .get(format!("{}/v1/checkout/sessions/{}", self.config.api_base, session_id))
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(StripeError::from)?;
        let session = Self::parse_session(resp).await;
        histogram!("storefront_gateway_seconds", "op" => "retrieve_session").record(t0.elapsed().as_secs_f64());

        let details = session?.into_details();
        debug!(session_id, status = %details.status, "Retrieved checkout session");
        Ok(details)
    }
}
