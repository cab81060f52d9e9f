//! Replays a recorded stream of engine commands.
//!
//! The script holds one JSON `EngineCommand` per line. Blank lines and lines
//! starting with `#` are skipped.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use tradeboard_application::{DashboardService, EngineCommand};

use super::output::{print_recent, print_signal};

/// Parses a script into `(line number, command)` pairs.
pub fn parse_script(script: &str) -> Result<Vec<(usize, EngineCommand)>> {
    script
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(number, line)| {
            serde_json::from_str(line)
                .map(|command| (number, command))
                .with_context(|| format!("Invalid command on line {}", number))
        })
        .collect()
}

pub async fn run(service: &mut DashboardService, script: &Path, save: bool) -> Result<()> {
    let content = tokio::fs::read_to_string(script)
        .await
        .with_context(|| format!("Failed to read {}", script.display()))?;
    let commands = parse_script(&content)?;

    let mut signals = service.engine_mut().subscribe();
    let (mut applied, mut ignored, mut rejected) = (0usize, 0usize, 0usize);

    for (number, command) in commands {
        let kind = command.kind();
        match service.engine_mut().dispatch(command) {
            Ok(true) => {
                applied += 1;
                println!("{:>4} {} {}", number, "ok".green(), kind);
            }
            Ok(false) => {
                ignored += 1;
                println!("{:>4} {} {}", number, "--".dimmed(), kind);
            }
            Err(e) => {
                rejected += 1;
                println!("{:>4} {} {}: {}", number, "!!".red(), kind, e);
            }
        }
        while let Ok(signal) = signals.try_recv() {
            print_signal(&signal);
        }
    }

    println!(
        "\n{} applied, {} ignored, {} rejected",
        applied, ignored, rejected
    );

    let engine = service.engine();
    let active = engine.active_sessions();
    println!("{} ({})", "Active sessions".bold(), active.len());
    for record in active {
        println!(
            "  {} {} {}",
            record.market_domain.key(),
            record.ticker.bold(),
            record.current_stage.as_deref().unwrap_or("-").dimmed()
        );
    }
    println!("{}", "Recent sessions".bold());
    for row in engine.recent_sessions(engine.config().recap_limit) {
        print_recent(&row);
    }

    if save {
        service.flush().await?;
        println!("{}", "Saved history and preferences".green());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradeboard_application::{EngineSignal, SessionEngine};
    use tradeboard_core::MarketDomain;
    use tradeboard_core::session::SessionStatus;

    #[test]
    fn test_parse_script_skips_comments_and_blank_lines() {
        let script = r#"
# open a crypto session
{"type":"create_session","domain":"crypto","session_id":"s","ticker":"KRW-BTC"}

{"type":"cancel_session","domain":"crypto","session_id":"s"}
"#;
        let commands = parse_script(script).unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].0, 3);
        assert_eq!(commands[1].0, 5);
        assert_eq!(commands[1].1.domain(), MarketDomain::Crypto);
    }

    #[test]
    fn test_demo_script_emits_expected_signals() {
        let commands =
            parse_script(include_str!("../../../../demos/approval_flow.jsonl")).unwrap();
        let mut engine = SessionEngine::default();
        let mut rx = engine.subscribe();

        let mut results = Vec::new();
        for (_, command) in commands {
            results.push(engine.dispatch(command));
        }
        let rejected = results.iter().filter(|r| r.is_err()).count();
        let ignored = results.iter().filter(|r| matches!(r, Ok(false))).count();
        assert_eq!(rejected, 1);
        assert_eq!(ignored, 1);

        let mut signals = Vec::new();
        while let Ok(signal) = rx.try_recv() {
            signals.push(signal);
        }
        assert_eq!(signals.len(), 5);
        assert!(matches!(signals[0], EngineSignal::SessionStarted { .. }));
        assert!(matches!(signals[1], EngineSignal::ApprovalRequested { .. }));
        assert!(matches!(
            signals[2],
            EngineSignal::SessionFinished {
                status: SessionStatus::Completed,
                ..
            }
        ));
        assert!(matches!(
            signals[4],
            EngineSignal::SessionFinished {
                status: SessionStatus::Error,
                ..
            }
        ));

        let entry = engine.history(MarketDomain::Crypto).get("s-btc").unwrap();
        assert!(entry.is_full_snapshot());
        assert!(entry.trade_proposal.is_some());
        assert_eq!(
            entry.reasoning_summary.as_deref(),
            Some("RSI(14) at 28, oversold\nFunding rate turned negative")
        );
    }

    #[test]
    fn test_parse_script_reports_line_number() {
        let script = "{\"type\":\"clear_history\",\"domain\":\"crypto\"}\n{\"type\":\"bogus\"}\n";
        let err = parse_script(script).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
