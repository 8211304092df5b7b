//! Conversion from commerce API payloads to domain types.
//!
//! Conversions validate the parts of the contract the domain types encode
//! (positive quantities, known currencies) and report violations as
//! [`GatewayError::Malformed`] instead of clamping.

use cartsync_core::{
    Cart, CurrencyCode, LineItem, OrderReceipt, Price, Product, Quantity,
};
use chrono::{DateTime, Utc};

use super::GatewayError;
use super::wire;

fn currency(currency: Option<&wire::Currency>) -> Result<CurrencyCode, GatewayError> {
    currency.map_or(Ok(CurrencyCode::default()), |c| {
        c.code
            .parse()
            .map_err(|e| GatewayError::Malformed(format!("{e}")))
    })
}

const fn price(money: &wire::Money, currency_code: CurrencyCode) -> Price {
    Price::new(money.raw, currency_code)
}

fn convert_line_item(
    item: wire::LineItem,
    currency_code: CurrencyCode,
) -> Result<LineItem, GatewayError> {
    let quantity = Quantity::new(item.quantity).map_err(|e| {
        GatewayError::Malformed(format!("line item {} has invalid quantity: {e}", item.id))
    })?;

    Ok(LineItem {
        unit_price: price(&item.price, currency_code),
        subtotal: price(&item.line_total, currency_code),
        image_url: item.image.map(|i| i.url),
        id: item.id,
        product_id: item.product_id,
        name: item.name,
        quantity,
    })
}

/// Convert a cart payload.
pub fn convert_cart(cart: wire::Cart) -> Result<Cart, GatewayError> {
    let currency_code = currency(cart.currency.as_ref())?;
    let total_unique_items = match cart.total_unique_items {
        Some(n) => n,
        None => u32::try_from(cart.line_items.len())
            .map_err(|_| GatewayError::Malformed("too many line items".to_string()))?,
    };
    let line_items = cart
        .line_items
        .into_iter()
        .map(|item| convert_line_item(item, currency_code))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Cart {
        id: cart.id,
        line_items,
        total_items: cart.total_items,
        total_unique_items,
        total_price: price(&cart.subtotal, currency_code),
    })
}

/// Convert a listing of catalog products.
///
/// The listing carries no currency, so products are priced in the store
/// default.
pub fn convert_products(list: wire::List<wire::Product>) -> Vec<Product> {
    let currency_code = CurrencyCode::default();
    list.data
        .into_iter()
        .map(|p| Product {
            price: price(&p.price, currency_code),
            image_url: p.image.map(|i| i.url),
            id: p.id,
            name: p.name,
            description: p.description,
        })
        .collect()
}

/// Convert a capture response.
pub fn convert_order(order: wire::Order) -> Result<OrderReceipt, GatewayError> {
    let currency_code = currency(order.currency.as_ref())?;
    let captured_at = order
        .created
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now);
    let line_items = order
        .line_items
        .into_iter()
        .map(|item| convert_line_item(item, currency_code))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(OrderReceipt {
        id: order.id,
        customer_reference: order.customer_reference,
        customer: order.customer,
        line_items,
        total: price(&order.total, currency_code),
        captured_at,
    })
}
