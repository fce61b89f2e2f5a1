//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! aura cart add 3 --quantity 2
//! aura cart update 3 M black 5
//! aura cart remove 3 M black
//! aura cart show
//! aura cart clear
//! ```

use aura_client::cart::ProductRef;
use aura_client::checkout::{order_total, shipping_fee};
use aura_client::error::Result;

use aura_core::ProductId;

use super::Shell;

/// Fetch a product and add it to the cart, snapshotting its current price.
pub async fn add(shell: &mut Shell, product_id: i32, quantity: u32) -> Result<()> {
    let product = shell.api.get_product(ProductId::new(product_id)).await?;
    let snapshot = ProductRef::snapshot(&product, shell.config.currency);

    let mut cart = shell.cart()?;
    cart.add_item(snapshot, quantity)?;

    println!(
        "Added {} ({} / {}) x{quantity}.",
        product.name, product.size, product.color
    );
    print_summary_line(&cart);
    Ok(())
}

/// Set the quantity of a cart line; zero or less removes it.
pub fn update(
    shell: &mut Shell,
    product_id: i32,
    size: &str,
    color: &str,
    quantity: i64,
) -> Result<()> {
    let mut cart = shell.cart()?;
    cart.update_quantity(ProductId::new(product_id), size, color, quantity)?;
    print_summary_line(&cart);
    Ok(())
}

/// Remove a cart line. Removing something that is not there is fine.
pub fn remove(shell: &mut Shell, product_id: i32, size: &str, color: &str) -> Result<()> {
    let mut cart = shell.cart()?;
    cart.remove_item(ProductId::new(product_id), size, color)?;
    print_summary_line(&cart);
    Ok(())
}

/// Print the cart with line totals and the order summary.
pub fn show(shell: &Shell) -> Result<()> {
    let cart = shell.cart()?;

    if cart.is_empty() {
        println!("Your cart is empty.");
        return Ok(());
    }

    for line in cart.lines() {
        println!(
            "#{:<4} {:<24} {:<3} {:<8} x{:<3} {}",
            line.product.id.as_i32(),
            line.product.name,
            line.product.size,
            line.product.color,
            line.quantity,
            line.line_total()
        );
    }

    let subtotal = cart.total();
    let fee = shipping_fee(&subtotal);
    println!();
    println!("Subtotal: {subtotal}");
    if fee.amount.is_zero() {
        println!("Shipping: Free");
    } else {
        println!("Shipping: {fee}");
    }
    println!("Total:    {}", order_total(&subtotal));
    Ok(())
}

/// Empty the cart.
pub fn clear(shell: &mut Shell) -> Result<()> {
    let mut cart = shell.cart()?;
    cart.clear()?;
    println!("Cart cleared.");
    Ok(())
}

fn print_summary_line(cart: &aura_client::cart::CartManager<super::Store>) {
    println!("Cart: {} item(s), {}.", cart.item_count(), cart.total());
}
