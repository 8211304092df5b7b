//! Checkout capture.
//!
//! The YAML payload carries everything except the line items, which are
//! taken from the cart:
//!
//! ```yaml
//! customer:
//!   firstname: Ada
//!   lastname: Lovelace
//!   email: ada@example.com
//! fulfillment:
//!   shipping_method: ship_standard
//! payment:
//!   gateway: test_gateway
//! ```

use std::path::Path;

use cartsync_core::{CheckoutDetails, CheckoutToken};
use cartsync_storefront::sync::CheckoutOutcome;
use tracing::{info, warn};

use super::{connect, print_cart};

/// Parse the YAML payload file.
///
/// # Errors
///
/// Returns an error if the YAML is invalid or lacks customer details.
pub fn parse_details(content: &str) -> Result<CheckoutDetails, serde_yaml::Error> {
    serde_yaml::from_str(content)
}

/// Capture a checkout for every line of the cart.
///
/// # Errors
///
/// Returns an error if the payload file is unreadable or the cart cannot be
/// loaded. A refused capture is logged, not returned as an error.
pub async fn capture(
    cart: Option<String>,
    token: &str,
    payload_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    // Verify file exists
    let path = Path::new(payload_path);
    if !path.exists() {
        return Err(format!("File not found: {payload_path}").into());
    }

    let details = parse_details(&tokio::fs::read_to_string(path).await?)?;
    let (controller, _) = connect(cart).await?;

    match controller
        .capture_checkout(CheckoutToken::new(token), details)
        .await?
    {
        CheckoutOutcome::Captured(order) => {
            let receipt = order.receipt();
            info!("Order {} captured", order.id());
            if let Some(reference) = &receipt.customer_reference {
                info!("  Reference: {reference}");
            }
            info!("  Total: {}", receipt.total);
        }
        CheckoutOutcome::Failed { message, kind } => {
            warn!("Checkout refused ({kind:?}): {message}");
        }
    }

    if let Some(current) = controller.snapshot().cart() {
        print_cart(current);
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payload_file() {
        let file = parse_details(
            r"
customer:
  firstname: Ada
  lastname: Lovelace
  email: ada@example.com
fulfillment:
  shipping_method: ship_standard
payment:
  gateway: test_gateway
  card:
    number: '4242424242424242'
",
        )
        .unwrap();

        assert_eq!(file.customer.email, "ada@example.com");
        assert_eq!(file.fulfillment.unwrap().shipping_method, "ship_standard");
        assert!(file.shipping.is_none());
        assert_eq!(file.payment["gateway"], "test_gateway");
        assert_eq!(file.payment["card"]["number"], "4242424242424242");
    }

    #[test]
    fn test_parse_requires_customer() {
        assert!(parse_details("payment: {}\n").is_err());
    }
}
