//! `huddle sweep` - one-shot expiry and retention cleanup.

use console::style;

use crate::state::AppState;

pub async fn run_sweep(state: &AppState, json: bool) -> anyhow::Result<()> {
    let report = state.sweeper().run_once().await;

    if json {
        let out = serde_json::json!({
            "expired": report.expired,
            "purged": report.purged,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!();
        println!(
            "  {} Sweep complete: {} expired, {} purged",
            style("✓").green(),
            style(report.expired).bold(),
            style(report.purged).bold()
        );
        println!();
    }
    Ok(())
}
