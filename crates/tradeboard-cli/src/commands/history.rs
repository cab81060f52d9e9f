use anyhow::Result;
use colored::Colorize;
use tradeboard_application::DashboardService;
use tradeboard_core::MarketDomain;

use super::output::{print_history_entry, print_recent};

pub fn show(service: &DashboardService, domain: Option<MarketDomain>) {
    let domains = match domain {
        Some(domain) => vec![domain],
        None => MarketDomain::all(),
    };

    for domain in domains {
        let log = service.engine().history(domain);
        println!("{} ({}/{})", domain.key().bold(), log.len(), log.limit());
        if log.is_empty() {
            println!("  {}", "no sessions".dimmed());
        }
        for entry in log.recent() {
            print_history_entry(entry);
        }
    }
}

pub fn recap(service: &DashboardService, limit: Option<usize>) {
    let engine = service.engine();
    let limit = limit.unwrap_or(engine.config().recap_limit);
    let rows = engine.recent_sessions(limit);

    println!("{}", "Recent sessions".bold());
    if rows.is_empty() {
        println!("  {}", "nothing yet".dimmed());
    }
    for row in &rows {
        print_recent(row);
    }
}

pub async fn clear(service: &mut DashboardService, domain: MarketDomain) -> Result<()> {
    let removed = service.clear_history(domain).await?;
    println!("Cleared {} history entries for {}", removed, domain);
    Ok(())
}

pub async fn dismiss(service: &mut DashboardService, domain: MarketDomain, session_id: &str) -> Result<()> {
    if service.dismiss_history_entry(domain, session_id).await? {
        println!("Dismissed {} from {}", session_id, domain);
    } else {
        println!("{}", format!("No history entry {} in {}", session_id, domain).yellow());
    }
    Ok(())
}
