//! # Checkout Payload
//!
//! Turns a [`CheckoutConfig`] into what the web view loads: either a URL of
//! the hosted checkout page carrying every field as a query parameter, or an
//! HTML document whose form posts to the configured action and embeds the
//! tokenizer script with one `data-*` attribute per field.
//!
//! Both renderings are pure. Absent optional fields are omitted, never
//! emitted empty, and the field order is fixed.

use crate::config::CheckoutConfig;
use crate::error::{CheckoutError, CheckoutResult};
use url::Url;

/// One config field as it appears in the payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadField {
    /// Query parameter name
    pub query_key: &'static str,
    /// HTML attribute name (`None` for fields carried elsewhere in the markup)
    pub attribute: Option<&'static str>,
    /// Rendered value
    pub value: String,
}

impl PayloadField {
    fn new(query_key: &'static str, attribute: Option<&'static str>, value: String) -> Self {
        Self {
            query_key,
            attribute,
            value,
        }
    }
}

/// Ordered payload fields for a config
pub fn payload_fields(config: &CheckoutConfig) -> Vec<PayloadField> {
    let mut fields = vec![
        PayloadField::new("publicKey", Some("data-public-key"), config.public_key.clone()),
        PayloadField::new(
            "amount",
            Some("data-transaction-amount"),
            format_number(config.amount),
        ),
        PayloadField::new("action", None, config.action.clone()),
    ];

    let mut push = |key, attribute, value: Option<String>| {
        if let Some(value) = value {
            fields.push(PayloadField::new(key, Some(attribute), value));
        }
    };

    push("customerId", "data-customer-id", config.customer_id.clone());
    push(
        "cardsIds",
        "data-card-ids",
        (!config.card_ids.is_empty()).then(|| config.card_ids.join(",")),
    );
    push(
        "productLabel",
        "data-summary-product-label",
        config.product_label.clone(),
    );
    push(
        "discountLabel",
        "data-summary-discount-label",
        config.discount_label.clone(),
    );
    push("discount", "data-summary-discount", config.discount.map(format_number));
    push("shipping", "data-summary-shipping", config.shipping.map(format_number));
    push("charge", "data-summary-charge", config.charge.map(format_number));
    push("taxes", "data-summary-taxes", config.taxes.map(format_number));
    push("arrears", "data-summary-arrears", config.arrears.map(format_number));
    push(
        "maxInstallments",
        "data-max-installments",
        config.max_installments.map(|n| n.to_string()),
    );
    push("elementsColor", "data-elements-color", config.theme.elements.clone());
    push("headerColor", "data-header-color", config.theme.header.clone());
    push(
        "keepOpen",
        "data-open",
        config.keep_open.then(|| "true".to_string()),
    );

    fields
}

/// The `(key, value)` query pairs for a config, in payload order
pub fn query_pairs(config: &CheckoutConfig) -> Vec<(&'static str, String)> {
    payload_fields(config)
        .into_iter()
        .map(|field| (field.query_key, field.value))
        .collect()
}

/// Append the config's query pairs to a hosted checkout page URL.
///
/// Pairs already present on `base` are kept ahead of the config pairs.
pub fn checkout_url(config: &CheckoutConfig, base: &str) -> CheckoutResult<Url> {
    let mut url =
        Url::parse(base).map_err(|e| CheckoutError::InvalidUrl(format!("{}: {}", base, e)))?;

    if url.cannot_be_a_base() {
        return Err(CheckoutError::InvalidUrl(format!(
            "{} cannot carry a query string",
            base
        )));
    }

    url.query_pairs_mut().extend_pairs(query_pairs(config));
    Ok(url)
}

/// Render the HTML document loaded into the web view
pub fn render_html(config: &CheckoutConfig) -> String {
    let mut attributes = String::new();
    for field in payload_fields(config) {
        if let Some(name) = field.attribute {
            attributes.push_str(&format!(
                "\n      {}=\"{}\"",
                name,
                escape_html(&field.value)
            ));
        }
    }

    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
  </head>
  <body>
    <form action="{action}" method="POST">
      <script
      src="{script}"{attributes}>
      </script>
    </form>
  </body>
</html>
"#,
        action = escape_html(&config.action),
        script = escape_html(config.script_url()),
        attributes = attributes,
    )
}

/// Shortest representation that round-trips (`100`, `10.5`)
fn format_number(value: f64) -> String {
    value.to_string()
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Theme;
    use crate::query::extract_query;

    fn minimal() -> CheckoutConfig {
        CheckoutConfig::builder(100.0, "https://shop.example.com/process", "TEST-pk")
            .build()
            .unwrap()
    }

    fn full() -> CheckoutConfig {
        CheckoutConfig::builder(1250.5, "https://shop.example.com/process", "TEST-pk")
            .with_customer_id("cus_9")
            .with_card_ids(["c1", "c2"])
            .with_theme(Theme::new().with_elements("#112233").with_header("#fff"))
            .with_product_label("Sneakers")
            .with_discount_label("Promo")
            .with_discount(50.0)
            .with_shipping(10.25)
            .with_charge(0.0)
            .with_taxes(21.0)
            .with_arrears(3.0)
            .with_max_installments(12)
            .with_keep_open(true)
            .build()
            .unwrap()
    }

    #[test]
    fn test_minimal_query_pairs() {
        let pairs = query_pairs(&minimal());
        assert_eq!(
            pairs,
            vec![
                ("publicKey", "TEST-pk".to_string()),
                ("amount", "100".to_string()),
                ("action", "https://shop.example.com/process".to_string()),
            ]
        );
    }

    #[test]
    fn test_full_query_pairs() {
        let keys: Vec<_> = query_pairs(&full()).into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                "publicKey",
                "amount",
                "action",
                "customerId",
                "cardsIds",
                "productLabel",
                "discountLabel",
                "discount",
                "shipping",
                "charge",
                "taxes",
                "arrears",
                "maxInstallments",
                "elementsColor",
                "headerColor",
                "keepOpen",
            ]
        );
    }

    #[test]
    fn test_checkout_url_carries_every_field() {
        let config = full();
        let url = checkout_url(&config, "https://checkout.example.com/pay?lang=es").unwrap();
        let params = extract_query(url.as_str());

        assert_eq!(params.get("lang"), Some("es"));
        assert_eq!(params.get("amount"), Some("1250.5"));
        assert_eq!(params.get("action"), Some("https://shop.example.com/process"));
        assert_eq!(params.get("cardsIds"), Some("c1,c2"));
        assert_eq!(params.get("elementsColor"), Some("#112233"));
        assert_eq!(params.get("shipping"), Some("10.25"));
        assert_eq!(params.get("keepOpen"), Some("true"));
    }

    #[test]
    fn test_checkout_url_rejects_bad_base() {
        assert!(matches!(
            checkout_url(&minimal(), "not a url"),
            Err(CheckoutError::InvalidUrl(_))
        ));
        assert!(matches!(
            checkout_url(&minimal(), "mailto:someone@example.com"),
            Err(CheckoutError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_html_is_deterministic() {
        let config = full();
        assert_eq!(render_html(&config), render_html(&config));
        assert_eq!(
            checkout_url(&config, "https://c.example.com").unwrap(),
            checkout_url(&config, "https://c.example.com").unwrap()
        );
    }

    #[test]
    fn test_html_contents() {
        let html = render_html(&full());

        assert!(html.contains(r#"<form action="https://shop.example.com/process" method="POST">"#));
        assert!(html.contains(r#"data-public-key="TEST-pk""#));
        assert!(html.contains(r#"data-transaction-amount="1250.5""#));
        assert!(html.contains(r#"data-summary-product-label="Sneakers""#));
        assert!(html.contains(r#"data-max-installments="12""#));
        assert!(html.contains(r##"data-header-color="#fff""##));
        assert!(html.contains(r#"data-open="true""#));
        assert!(html.contains(crate::config::DEFAULT_SCRIPT_URL));
    }

    #[test]
    fn test_html_attribute_layout() {
        let html = render_html(&minimal());

        assert!(html.contains(&format!(
            "src=\"{}\"\n      data-public-key=\"TEST-pk\"\n      data-transaction-amount=\"100\">",
            crate::config::DEFAULT_SCRIPT_URL
        )));
    }

    #[test]
    fn test_html_omits_absent_fields() {
        let html = render_html(&minimal());

        assert!(!html.contains("data-customer-id"));
        assert!(!html.contains("data-elements-color"));
        assert!(!html.contains("data-open"));
        assert!(!html.contains("=\"\""));
    }

    #[test]
    fn test_html_escapes_values() {
        let config = CheckoutConfig::builder(1.0, "/process?a=1&b=2", "pk\"><script>")
            .build()
            .unwrap();
        let html = render_html(&config);

        assert!(html.contains(r#"action="/process?a=1&amp;b=2""#));
        assert!(html.contains(r#"data-public-key="pk&quot;&gt;&lt;script&gt;""#));
    }
}
