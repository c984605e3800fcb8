//! # Checkout Configuration
//!
//! The parameters for one embedded checkout session: amount, backend action
//! route, public key, optional customer/cards, theme, pricing summary and the
//! success/failure URL fragments the observer watches for.
//!
//! A `CheckoutConfig` can only be obtained validated: through the builder,
//! through deserialization (TOML, JSON, JS objects) or from `CHECKOUT_*`
//! environment variables. It is read-only afterwards.

use crate::error::{CheckoutError, CheckoutResult};
use crate::observer::is_placeholder_action;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};
use url::Url;

/// Hosted tokenizer script loaded by the generated HTML
pub const DEFAULT_SCRIPT_URL: &str =
    "https://www.mercadopago.com/integrations/v1/web-tokenize-checkout.js";

/// Optional colours for the hosted checkout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    /// Hex colour for all the elements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<String>,

    /// Hex colour for the header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
}

impl Theme {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the elements colour
    pub fn with_elements(mut self, color: impl Into<String>) -> Self {
        self.elements = Some(color.into());
        self
    }

    /// Builder: set the header colour
    pub fn with_header(mut self, color: impl Into<String>) -> Self {
        self.header = Some(color.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_none() && self.header.is_none()
    }

    fn validate(&self) -> CheckoutResult<()> {
        if let Some(ref color) = self.elements {
            validate_hex_color("theme.elements", color)?;
        }
        if let Some(ref color) = self.header {
            validate_hex_color("theme.header", color)?;
        }
        Ok(())
    }
}

/// Configuration for a single checkout session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCheckoutConfig", rename_all = "camelCase")]
pub struct CheckoutConfig {
    /// Amount to pay for the product
    pub amount: f64,

    /// Backend route the tokenized card data is posted to
    pub action: String,

    /// Public key of the payment provider account
    pub public_key: String,

    /// Restore the payment form after a failure instead of closing it
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub keep_open: bool,

    /// Cards already associated to the customer
    #[serde(rename = "cardsIds", skip_serializing_if = "Vec::is_empty")]
    pub card_ids: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,

    #[serde(skip_serializing_if = "Theme::is_empty")]
    pub theme: Theme,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_label: Option<String>,

    /// Maximum number of installments offered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_installments: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping: Option<f64>,

    /// Additional charge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub taxes: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrears: Option<f64>,

    /// Substring identifying the success redirect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,

    /// Substring identifying the failure redirect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_url: Option<String>,

    /// Override for the hosted tokenizer script
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_url: Option<String>,
}

impl CheckoutConfig {
    /// Start building a config from the three required fields
    pub fn builder(
        amount: f64,
        action: impl Into<String>,
        public_key: impl Into<String>,
    ) -> CheckoutConfigBuilder {
        CheckoutConfigBuilder::new(amount, action, public_key)
    }

    /// Script URL for the generated HTML (override or default)
    pub fn script_url(&self) -> &str {
        self.script_url.as_deref().unwrap_or(DEFAULT_SCRIPT_URL)
    }

    /// Parse a config from TOML.
    ///
    /// Both `camelCase` and `snake_case` keys are accepted.
    pub fn from_toml_str(content: &str) -> CheckoutResult<Self> {
        let raw: RawCheckoutConfig = toml::from_str(content)
            .map_err(|e| CheckoutError::Serialization(format!("Invalid TOML config: {}", e)))?;
        Self::try_from(raw)
    }

    /// Parse a config from JSON
    pub fn from_json_str(content: &str) -> CheckoutResult<Self> {
        let raw: RawCheckoutConfig = serde_json::from_str(content)
            .map_err(|e| CheckoutError::Serialization(format!("Invalid JSON config: {}", e)))?;
        Self::try_from(raw)
    }

    /// Load a TOML config file
    pub fn from_toml_file(path: impl AsRef<Path>) -> CheckoutResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CheckoutError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded checkout config from {}", path.display());
        Ok(config)
    }

    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `CHECKOUT_AMOUNT`
    /// - `CHECKOUT_ACTION`
    /// - `CHECKOUT_PUBLIC_KEY`
    ///
    /// Optional: `CHECKOUT_CUSTOMER_ID`, `CHECKOUT_CARD_IDS` (comma separated),
    /// `CHECKOUT_KEEP_OPEN`, `CHECKOUT_PRODUCT_LABEL`, `CHECKOUT_DISCOUNT_LABEL`,
    /// `CHECKOUT_DISCOUNT`, `CHECKOUT_SHIPPING`, `CHECKOUT_CHARGE`,
    /// `CHECKOUT_TAXES`, `CHECKOUT_ARREARS`, `CHECKOUT_MAX_INSTALLMENTS`,
    /// `CHECKOUT_ELEMENTS_COLOR`, `CHECKOUT_HEADER_COLOR`,
    /// `CHECKOUT_SUCCESS_URL`, `CHECKOUT_FAILURE_URL`, `CHECKOUT_SCRIPT_URL`.
    pub fn from_env() -> CheckoutResult<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any `CHECKOUT_*` variable source
    pub fn from_lookup<F>(lookup: F) -> CheckoutResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| CheckoutError::Configuration(format!("{} not set", key)))
        };

        let amount = parse_number("amount", &required("CHECKOUT_AMOUNT")?)?;

        let mut builder = Self::builder(
            amount,
            required("CHECKOUT_ACTION")?,
            required("CHECKOUT_PUBLIC_KEY")?,
        );

        if let Some(customer_id) = lookup("CHECKOUT_CUSTOMER_ID") {
            builder = builder.with_customer_id(customer_id);
        }
        if let Some(card_ids) = lookup("CHECKOUT_CARD_IDS") {
            builder = builder.with_card_ids(card_ids.split(',').map(|id| id.trim().to_string()));
        }
        if let Some(keep_open) = lookup("CHECKOUT_KEEP_OPEN") {
            let keep_open = keep_open.trim().parse().map_err(|_| {
                CheckoutError::Configuration(format!(
                    "CHECKOUT_KEEP_OPEN must be true or false, got {:?}",
                    keep_open
                ))
            })?;
            builder = builder.with_keep_open(keep_open);
        }
        if let Some(label) = lookup("CHECKOUT_PRODUCT_LABEL") {
            builder = builder.with_product_label(label);
        }
        if let Some(label) = lookup("CHECKOUT_DISCOUNT_LABEL") {
            builder = builder.with_discount_label(label);
        }
        if let Some(value) = lookup("CHECKOUT_DISCOUNT") {
            builder = builder.with_discount(parse_number("discount", &value)?);
        }
        if let Some(value) = lookup("CHECKOUT_SHIPPING") {
            builder = builder.with_shipping(parse_number("shipping", &value)?);
        }
        if let Some(value) = lookup("CHECKOUT_CHARGE") {
            builder = builder.with_charge(parse_number("charge", &value)?);
        }
        if let Some(value) = lookup("CHECKOUT_TAXES") {
            builder = builder.with_taxes(parse_number("taxes", &value)?);
        }
        if let Some(value) = lookup("CHECKOUT_ARREARS") {
            builder = builder.with_arrears(parse_number("arrears", &value)?);
        }
        if let Some(installments) = lookup("CHECKOUT_MAX_INSTALLMENTS") {
            let installments = installments.trim().parse().map_err(|_| {
                CheckoutError::InvalidAmount {
                    field: "max_installments",
                    message: format!("{:?} is not a whole number", installments),
                }
            })?;
            builder = builder.with_max_installments(installments);
        }
        if let Some(color) = lookup("CHECKOUT_ELEMENTS_COLOR") {
            builder = builder.with_elements_color(color);
        }
        if let Some(color) = lookup("CHECKOUT_HEADER_COLOR") {
            builder = builder.with_header_color(color);
        }
        if let Some(url) = lookup("CHECKOUT_SUCCESS_URL") {
            builder = builder.with_success_url(url);
        }
        if let Some(url) = lookup("CHECKOUT_FAILURE_URL") {
            builder = builder.with_failure_url(url);
        }
        if let Some(url) = lookup("CHECKOUT_SCRIPT_URL") {
            builder = builder.with_script_url(url);
        }

        builder.build()
    }

    /// Check every field; called on every construction path
    fn validate(&self) -> CheckoutResult<()> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(CheckoutError::InvalidAmount {
                field: "amount",
                message: format!("{} must be a positive number", self.amount),
            });
        }

        require_non_empty("action", &self.action)?;
        if is_placeholder_action(&self.action) {
            return Err(CheckoutError::PlaceholderAction(self.action.clone()));
        }
        require_non_empty("public_key", &self.public_key)?;

        if self.card_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(CheckoutError::MissingField { field: "card_ids" });
        }

        for (field, value) in [
            ("customer_id", &self.customer_id),
            ("product_label", &self.product_label),
            ("discount_label", &self.discount_label),
            ("success_url", &self.success_url),
            ("failure_url", &self.failure_url),
            ("script_url", &self.script_url),
        ] {
            if let Some(value) = value {
                require_non_empty(field, value)?;
            }
        }

        for (field, value) in [
            ("discount", self.discount),
            ("shipping", self.shipping),
            ("charge", self.charge),
            ("taxes", self.taxes),
            ("arrears", self.arrears),
        ] {
            if let Some(value) = value {
                if !value.is_finite() || value < 0.0 {
                    return Err(CheckoutError::InvalidAmount {
                        field,
                        message: format!("{} must be zero or a positive number", value),
                    });
                }
            }
        }

        if self.max_installments == Some(0) {
            return Err(CheckoutError::InvalidAmount {
                field: "max_installments",
                message: "must be at least 1".to_string(),
            });
        }

        self.theme.validate()?;

        if let Some(ref script_url) = self.script_url {
            Url::parse(script_url)
                .map_err(|e| CheckoutError::InvalidUrl(format!("script_url: {}", e)))?;
        }

        debug!(action = %self.action, amount = self.amount, "Validated checkout config");
        Ok(())
    }
}

/// Builder for [`CheckoutConfig`]; `build` validates
#[derive(Debug, Clone)]
pub struct CheckoutConfigBuilder {
    config: CheckoutConfig,
}

impl CheckoutConfigBuilder {
    pub fn new(amount: f64, action: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            config: CheckoutConfig {
                amount,
                action: action.into(),
                public_key: public_key.into(),
                keep_open: false,
                card_ids: Vec::new(),
                customer_id: None,
                theme: Theme::default(),
                product_label: None,
                discount_label: None,
                max_installments: None,
                discount: None,
                shipping: None,
                charge: None,
                taxes: None,
                arrears: None,
                success_url: None,
                failure_url: None,
                script_url: None,
            },
        }
    }

    pub fn with_keep_open(mut self, keep_open: bool) -> Self {
        self.config.keep_open = keep_open;
        self
    }

    pub fn with_customer_id(mut self, customer_id: impl Into<String>) -> Self {
        self.config.customer_id = Some(customer_id.into());
        self
    }

    pub fn with_card_ids<I, S>(mut self, card_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.card_ids = card_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.config.theme = theme;
        self
    }

    pub fn with_elements_color(mut self, color: impl Into<String>) -> Self {
        self.config.theme.elements = Some(color.into());
        self
    }

    pub fn with_header_color(mut self, color: impl Into<String>) -> Self {
        self.config.theme.header = Some(color.into());
        self
    }

    pub fn with_product_label(mut self, label: impl Into<String>) -> Self {
        self.config.product_label = Some(label.into());
        self
    }

    pub fn with_discount_label(mut self, label: impl Into<String>) -> Self {
        self.config.discount_label = Some(label.into());
        self
    }

    pub fn with_max_installments(mut self, installments: u32) -> Self {
        self.config.max_installments = Some(installments);
        self
    }

    pub fn with_discount(mut self, amount: f64) -> Self {
        self.config.discount = Some(amount);
        self
    }

    pub fn with_shipping(mut self, amount: f64) -> Self {
        self.config.shipping = Some(amount);
        self
    }

    pub fn with_charge(mut self, amount: f64) -> Self {
        self.config.charge = Some(amount);
        self
    }

    pub fn with_taxes(mut self, amount: f64) -> Self {
        self.config.taxes = Some(amount);
        self
    }

    pub fn with_arrears(mut self, amount: f64) -> Self {
        self.config.arrears = Some(amount);
        self
    }

    pub fn with_success_url(mut self, url: impl Into<String>) -> Self {
        self.config.success_url = Some(url.into());
        self
    }

    pub fn with_failure_url(mut self, url: impl Into<String>) -> Self {
        self.config.failure_url = Some(url.into());
        self
    }

    pub fn with_script_url(mut self, url: impl Into<String>) -> Self {
        self.config.script_url = Some(url.into());
        self
    }

    /// Validate and return the config
    pub fn build(self) -> CheckoutResult<CheckoutConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Wire shape accepted by deserialization, before validation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCheckoutConfig {
    #[serde(default)]
    amount: Option<f64>,
    #[serde(default)]
    action: String,
    #[serde(default, alias = "public_key")]
    public_key: String,
    #[serde(default, alias = "keep_open")]
    keep_open: Option<bool>,
    #[serde(default, rename = "cardsIds", alias = "card_ids", alias = "cardIds")]
    card_ids: Option<Vec<String>>,
    #[serde(default, alias = "customer_id")]
    customer_id: Option<String>,
    #[serde(default)]
    theme: Option<Theme>,
    #[serde(default, alias = "product_label")]
    product_label: Option<String>,
    #[serde(default, alias = "discount_label")]
    discount_label: Option<String>,
    #[serde(default, alias = "max_installments")]
    max_installments: Option<u32>,
    #[serde(default)]
    discount: Option<f64>,
    #[serde(default)]
    shipping: Option<f64>,
    #[serde(default)]
    charge: Option<f64>,
    #[serde(default)]
    taxes: Option<f64>,
    #[serde(default)]
    arrears: Option<f64>,
    #[serde(default, alias = "success_url")]
    success_url: Option<String>,
    #[serde(default, alias = "failure_url")]
    failure_url: Option<String>,
    #[serde(default, alias = "script_url")]
    script_url: Option<String>,
}

impl TryFrom<RawCheckoutConfig> for CheckoutConfig {
    type Error = CheckoutError;

    fn try_from(raw: RawCheckoutConfig) -> CheckoutResult<Self> {
        let amount = raw.amount.ok_or(CheckoutError::MissingField { field: "amount" })?;

        let config = CheckoutConfig {
            amount,
            action: raw.action,
            public_key: raw.public_key,
            keep_open: raw.keep_open.unwrap_or_default(),
            card_ids: raw.card_ids.unwrap_or_default(),
            customer_id: raw.customer_id,
            theme: raw.theme.unwrap_or_default(),
            product_label: raw.product_label,
            discount_label: raw.discount_label,
            max_installments: raw.max_installments,
            discount: raw.discount,
            shipping: raw.shipping,
            charge: raw.charge,
            taxes: raw.taxes,
            arrears: raw.arrears,
            success_url: raw.success_url,
            failure_url: raw.failure_url,
            script_url: raw.script_url,
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_number(field: &'static str, value: &str) -> CheckoutResult<f64> {
    value.trim().parse().map_err(|_| CheckoutError::InvalidAmount {
        field,
        message: format!("{:?} is not a number", value),
    })
}

fn require_non_empty(field: &'static str, value: &str) -> CheckoutResult<()> {
    if value.trim().is_empty() {
        return Err(CheckoutError::MissingField { field });
    }
    Ok(())
}

/// Accepts `#rgb` and `#rrggbb`
fn validate_hex_color(field: &'static str, value: &str) -> CheckoutResult<()> {
    let valid = value
        .strip_prefix('#')
        .map(|hex| (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false);

    if !valid {
        return Err(CheckoutError::InvalidColor {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}
