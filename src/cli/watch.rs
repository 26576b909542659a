use super::{summary, ui};
use crate::AppContext;
use anyhow::Result;
use tracing::info;

/// Refreshes on the configured interval and reprints the wallet after every
/// pass until Ctrl-C.
pub async fn run(ctx: &AppContext) -> Result<()> {
    let period = ctx.config.refresh.interval();
    info!("Refreshing prices every {:?}", period);

    let (handle, mut passes) = ctx
        .refresher
        .clone()
        .spawn_periodic(period, ctx.store.clone());

    loop {
        tokio::select! {
            pass = passes.recv() => {
                let Some(updated) = pass else { break };
                ui::print_separator();
                println!(
                    "{}",
                    ui::style_text(&format!("Updated {updated} prices"), ui::StyleType::Subtle)
                );
                println!("{}", summary::render(ctx).await?);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping price refresh");
                break;
            }
        }
    }

    handle.abort();
    Ok(())
}
