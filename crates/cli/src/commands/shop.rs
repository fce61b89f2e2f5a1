//! Catalog and order commands: browse products, checkout, order history.
//!
//! # Usage
//!
//! ```bash
//! aura products --category hoodie
//! aura product 3
//! aura checkout --name "Asha Rao" --email asha@example.com ...
//! aura orders
//! aura order 42
//! ```

use aura_client::api::types::ProductQuery;
use aura_client::checkout::{CheckoutCoordinator, ShippingForm};
use aura_client::error::Result;

use aura_core::{OrderId, ProductId};

use super::Shell;

/// List catalog products, optionally filtered.
pub async fn list_products(
    shell: &Shell,
    category: Option<String>,
    color: Option<String>,
    size: Option<String>,
) -> Result<()> {
    let query = ProductQuery {
        category,
        color,
        size,
        ..ProductQuery::default()
    };
    let products = shell.api.list_products(&query).await?;

    if products.is_empty() {
        println!("No products found.");
        return Ok(());
    }

    for product in products.iter() {
        println!(
            "#{:<4} {:<24} {:<3} {:<8} {:>10}  (stock: {})",
            product.id.as_i32(),
            product.name,
            product.size,
            product.color,
            product.price,
            product.stock
        );
    }
    Ok(())
}

/// Show a single product.
pub async fn show_product(shell: &Shell, id: i32) -> Result<()> {
    let product = shell.api.get_product(ProductId::new(id)).await?;

    println!("{} — {}", product.name, product.price);
    println!("  category: {}", product.category);
    println!("  size: {} / color: {}", product.size, product.color);
    println!("  stock: {}", product.stock);
    if let Some(description) = &product.description {
        println!("  {description}");
    }
    Ok(())
}

/// Place an order from the current cart.
pub async fn checkout(shell: &mut Shell, form: &ShippingForm) -> Result<()> {
    let token = shell.require_token()?;
    let mut cart = shell.cart()?;

    let coordinator = CheckoutCoordinator::new(shell.api.clone());
    let confirmation = coordinator.submit(&token, &mut cart, form).await?;

    println!("Order confirmed!");
    println!("  order id: #{}", confirmation.order_id);
    println!("  status:   {}", confirmation.status.label());
    println!("  total:    {}", confirmation.total_amount);
    Ok(())
}

/// List the current user's orders.
pub async fn list_orders(shell: &Shell) -> Result<()> {
    let token = shell.require_token()?;
    let orders = shell.api.my_orders(&token).await?;

    if orders.is_empty() {
        println!("No orders yet.");
        return Ok(());
    }

    for order in &orders {
        println!(
            "#{:<5} {:<10} {:>10}  {} item(s)  {}",
            order.id.as_i32(),
            order.status.label(),
            order.total_amount,
            order.items.len(),
            order.created_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}

/// Show a single order.
pub async fn show_order(shell: &Shell, id: i32) -> Result<()> {
    let token = shell.require_token()?;
    let order = shell.api.get_order(&token, OrderId::new(id)).await?;

    println!("Order #{} — {}", order.id, order.status.label());
    println!("  placed: {}", order.created_at.format("%Y-%m-%d %H:%M"));
    for item in &order.items {
        println!(
            "  {:<24} x{:<3} @ {}",
            item.product.name, item.quantity, item.price
        );
    }
    if let Some(address) = &order.shipping_address {
        println!("  ship to: {}", address.replace('\n', " / "));
    }
    println!("  total: {}", order.total_amount);
    Ok(())
}
