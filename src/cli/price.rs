use super::ui;
use crate::AppContext;
use crate::core::error::normalize_symbol;
use anyhow::Result;

/// Refreshes the wallet's symbols plus `symbol`, then prints its cached price.
pub async fn run(ctx: &AppContext, symbol: &str) -> Result<()> {
    let symbol = normalize_symbol(symbol)?;

    let pb = ui::new_spinner(&format!("Fetching {symbol}..."));
    ctx.refresh_with(&symbol).await?;
    pb.finish_and_clear();

    let cached = ctx.prices().get(&symbol)?;
    println!(
        "{}: {} USD {}",
        ui::style_text(&symbol, ui::StyleType::TotalLabel),
        ui::style_text(&format!("{:.2}", cached.price), ui::StyleType::TotalValue),
        ui::style_text(
            &format!("(as of {})", cached.updated_at.format("%Y-%m-%d %H:%M:%S UTC")),
            ui::StyleType::Subtle
        ),
    );
    Ok(())
}
