use colored::{ColoredString, Colorize};
use tradeboard_application::{EngineSignal, RecentSession};
use tradeboard_core::history::HistoryEntry;
use tradeboard_core::session::SessionStatus;

pub fn status_label(status: SessionStatus) -> ColoredString {
    let label = format!("[{}]", status);
    match status {
        SessionStatus::Completed => label.green(),
        SessionStatus::AwaitingApproval => label.yellow().bold(),
        SessionStatus::Running | SessionStatus::Pending => label.cyan(),
        SessionStatus::Cancelled => label.dimmed(),
        SessionStatus::Error => label.red(),
    }
}

pub fn print_history_entry(entry: &HistoryEntry) {
    let duration = entry
        .duration_secs
        .map(|secs| format!(" {}s", secs))
        .unwrap_or_default();
    println!(
        "  {} {} ({}) {}{}  {}",
        status_label(entry.status),
        entry.ticker.bold(),
        entry.display_name,
        entry.timestamp.format("%Y-%m-%d %H:%M"),
        duration,
        entry.session_id.dimmed()
    );
    if let Some(proposal) = &entry.trade_proposal {
        println!(
            "      proposal: {:?} {}",
            proposal.action(),
            proposal.instrument()
        );
    }
    if let Some(summary) = &entry.reasoning_summary {
        for line in summary.lines() {
            println!("      {}", line.italic());
        }
    }
}

pub fn print_recent(row: &RecentSession) {
    let origin = if row.live { "live" } else { "history" };
    println!(
        "  {} {:<16} {} {}  {}",
        status_label(row.status),
        row.market_domain.key(),
        row.ticker.bold(),
        row.updated_at.format("%Y-%m-%d %H:%M"),
        origin.dimmed()
    );
}

pub fn print_signal(signal: &EngineSignal) {
    let (kind, detail) = match signal {
        EngineSignal::SessionStarted { .. } => ("started", String::new()),
        EngineSignal::ApprovalRequested { proposal, .. } => (
            "approval",
            format!(" -> {:?} {}", proposal.action(), proposal.instrument()),
        ),
        EngineSignal::SessionFinished { status, .. } => ("finished", format!(" ({})", status)),
        EngineSignal::SessionRemoved { .. } => ("removed", String::new()),
    };
    println!(
        "    {} {:<9} {} {}{}",
        "⇢".bright_magenta(),
        kind,
        signal.domain(),
        signal.session_id(),
        detail
    );
}
