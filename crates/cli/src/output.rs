//! Plain-text rendering for command results.

#![allow(clippy::print_stdout)]

use vexaparts_core::{CartItem, Order, OrderTotals, Product, format_eur};
use vexaparts_storefront::{admin, catalog};

/// Print a line to stdout.
pub fn line(text: impl AsRef<str>) {
    println!("{}", text.as_ref());
}

/// One row per product.
pub fn product_table(products: &[Product]) {
    if products.is_empty() {
        line("Geen producten gevonden.");
        return;
    }
    for product in products {
        line(format!(
            "{:>14}  {:<44}  {:>12}  {}",
            product.id,
            product.name,
            format_eur(product.price),
            catalog::category_of(product).display_name(),
        ));
    }
}

/// Admin view: category label and stock per product.
pub fn admin_table(products: &[Product]) {
    if products.is_empty() {
        line("Geen producten gevonden.");
        return;
    }
    for product in products {
        line(format!(
            "{:>14}  {:<44}  {:>12}  {:<12}  voorraad {}",
            product.id,
            product.name,
            format_eur(product.price),
            admin::category_of(product).admin_label(),
            product.stock_amount(),
        ));
    }
}

/// Full product detail.
pub fn product_detail(product: &Product, related: &[Product]) {
    line(format!("{} ({})", product.name, product.id));
    line(format!(
        "Categorie: {}",
        catalog::category_of(product).display_name()
    ));
    line(format!("Prijs:     {}", format_eur(product.price)));
    line(format!("Voorraad:  {}", product.stock_amount()));
    line(format!("Afbeelding: {}", product.image));
    line("");
    line(catalog::describe(product));

    if product.specifications.is_empty() {
        line("");
        line("Geen specificaties beschikbaar");
    } else {
        line("");
        for (key, value) in &product.specifications {
            line(format!("  {:<24} {value}", key.replace('_', " ")));
        }
    }

    if !related.is_empty() {
        line("");
        line("Gerelateerde producten:");
        for other in related {
            line(format!("  {}  {}  {}", other.id, other.name, format_eur(other.price)));
        }
    }
}

/// Cart lines and totals.
pub fn cart(items: &[CartItem], totals: &OrderTotals) {
    if items.is_empty() {
        line("Je winkelwagen is leeg");
        return;
    }
    for item in items {
        line(format!(
            "{:>14}  {:<44}  {:>3} x {:>10}  {:>12}",
            item.id,
            item.name,
            item.quantity,
            format_eur(item.price),
            format_eur(item.line_total()),
        ));
    }
    totals_block(totals);
}

fn totals_block(totals: &OrderTotals) {
    line(format!("Subtotaal:   {:>12}", format_eur(totals.subtotal)));
    line(format!("Verzending:  {:>12}", format_eur(totals.shipping)));
    line(format!("BTW (21%):   {:>12}", format_eur(totals.vat)));
    line(format!("Totaal:      {:>12}", format_eur(totals.total)));
}

/// One row per order.
pub fn orders(orders: &[Order]) {
    if orders.is_empty() {
        line("Geen bestellingen gevonden");
        return;
    }
    for order in orders {
        line(format!(
            "{}  {}  {:<28}  {:>3} items  {:>12}  {:?}",
            order.order_number,
            order.order_date.format("%Y-%m-%d %H:%M"),
            order.customer.full_name(),
            order.total_items(),
            format_eur(order.totals.total),
            order.status,
        ));
    }
}

/// Confirmation of a placed order.
pub fn order_placed(order: &Order) {
    line(format!("Bestelling geplaatst: {}", order.order_number));
    totals_block(&order.totals);
}
