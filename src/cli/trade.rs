use super::ui;
use crate::AppContext;
use crate::core::error::{normalize_symbol, validate_quantity};
use anyhow::Result;

async fn refresh_symbol(ctx: &AppContext, symbol: &str, quantity: f64) -> Result<String> {
    let symbol = normalize_symbol(symbol)?;
    validate_quantity(&symbol, quantity)?;

    let pb = ui::new_spinner(&format!("Fetching {symbol}..."));
    ctx.refresh_with(&symbol).await?;
    pb.finish_and_clear();
    Ok(symbol)
}

/// Buys `quantity` of `symbol` at the freshly refreshed price and saves the
/// wallet.
pub async fn buy(ctx: &AppContext, symbol: &str, quantity: f64) -> Result<()> {
    let symbol = refresh_symbol(ctx, symbol, quantity).await?;
    let position = ctx.wallet.buy(&symbol, quantity).await?;

    println!(
        "{} {} {}, now holding {}",
        ui::style_text("Bought", ui::StyleType::TotalLabel),
        quantity,
        symbol,
        ui::style_text(&format!("{}", position.quantity), ui::StyleType::TotalValue),
    );
    Ok(())
}

/// Sells `quantity` of `symbol` at the freshly refreshed price and saves the
/// wallet.
pub async fn sell(ctx: &AppContext, symbol: &str, quantity: f64) -> Result<()> {
    let symbol = refresh_symbol(ctx, symbol, quantity).await?;
    let remaining = ctx.wallet.sell(&symbol, quantity).await?;

    let left = remaining.map_or(0.0, |p| p.quantity);
    println!(
        "{} {} {}, now holding {}",
        ui::style_text("Sold", ui::StyleType::TotalLabel),
        quantity,
        symbol,
        ui::style_text(&format!("{left}"), ui::StyleType::TotalValue),
    );
    Ok(())
}
