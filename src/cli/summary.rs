use super::ui;
use crate::AppContext;
use crate::core::PositionStore;
use crate::core::valuation::{GrowthResult, WalletValuation};
use anyhow::Result;
use comfy_table::Cell;

fn performer_line(label: &str, performer: Option<&GrowthResult>) -> String {
    let value = performer.map_or_else(
        || ui::style_text("N/A", ui::StyleType::Subtle),
        |p| format!("{} ({:.2}%)", p.symbol, p.growth_rate),
    );
    format!("{}: {}", ui::style_text(label, ui::StyleType::TotalLabel), value)
}

impl WalletValuation {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();

        table.set_header(vec![
            ui::header_cell("Symbol"),
            ui::header_cell("Quantity"),
            ui::header_cell("Cost (USD)"),
            ui::header_cell("Price (USD)"),
            ui::header_cell("Value (USD)"),
            ui::header_cell("Growth (%)"),
        ]);

        for asset in &self.assets {
            table.add_row(vec![
                Cell::new(&asset.symbol),
                ui::format_optional_cell(Some(asset.quantity), |q| format!("{q:.4}")),
                ui::format_optional_cell(Some(asset.purchase_value), |v| format!("{v:.2}")),
                ui::format_optional_cell(asset.current_price, |p| format!("{p:.2}")),
                ui::format_optional_cell(asset.current_value, |v| format!("{v:.2}")),
                ui::growth_cell(asset.growth_rate),
            ]);
        }

        let priced_all = self.assets.iter().all(|a| a.current_value.is_some());
        let total_style = if priced_all {
            ui::StyleType::TotalValue
        } else {
            ui::StyleType::Error
        };

        let mut output = format!(
            "{}\n\n",
            ui::style_text("Wallet", ui::StyleType::Title)
        );
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\n{}: {:.2}\n{}: {}",
            ui::style_text("Total Cost (USD)", ui::StyleType::TotalLabel),
            self.total_purchase_value,
            ui::style_text("Total Value (USD)", ui::StyleType::TotalLabel),
            ui::style_text(&format!("{:.2}", self.total_current_value), total_style),
        ));
        output.push_str(&format!(
            "\n{}\n{}",
            performer_line("Best Performer", self.best.as_ref()),
            performer_line("Worst Performer", self.worst.as_ref()),
        ));

        output
    }
}

/// Values the wallet against whatever is currently cached.
pub async fn render(ctx: &AppContext) -> Result<String> {
    let positions = ctx.store.load_positions().await?;
    Ok(ctx.valuation.valuate(&positions).display_as_table())
}

pub async fn run(ctx: &AppContext) -> Result<()> {
    let pb = ui::new_spinner("Fetching prices...");
    let updated = ctx.refresh_once().await?;
    pb.finish_and_clear();
    tracing::debug!("Refreshed {} prices", updated);

    println!("{}", render(ctx).await?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::core::valuation::{AssetValuation, GrowthResult, WalletValuation};

    #[test]
    fn test_display_as_table_marks_missing_prices() {
        let valuation = WalletValuation {
            assets: vec![
                AssetValuation {
                    symbol: "BTC".to_string(),
                    quantity: 1.0,
                    purchase_value: 40000.0,
                    current_price: Some(50000.0),
                    current_value: Some(50000.0),
                    growth_rate: Some(25.0),
                },
                AssetValuation {
                    symbol: "ETH".to_string(),
                    quantity: 2.0,
                    purchase_value: 3000.0,
                    current_price: None,
                    current_value: None,
                    growth_rate: None,
                },
            ],
            total_purchase_value: 43000.0,
            total_current_value: 50000.0,
            best: Some(GrowthResult {
                symbol: "BTC".to_string(),
                growth_rate: 25.0,
            }),
            worst: None,
        };

        let output = console::strip_ansi_codes(&valuation.display_as_table()).to_string();
        assert!(output.contains("BTC"));
        assert!(output.contains("50000.00"));
        assert!(output.contains("25.00%"));
        assert!(output.contains("N/A"));
        assert!(output.contains("Total Value (USD): 50000.00"));
        assert!(output.contains("Best Performer: BTC (25.00%)"));
        assert!(output.contains("Worst Performer: N/A"));
    }
}
