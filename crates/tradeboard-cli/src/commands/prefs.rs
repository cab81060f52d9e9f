use colored::Colorize;
use tradeboard_application::DashboardService;

pub fn show(service: &DashboardService) {
    let prefs = service.engine().preferences();
    println!("{}", "Preferences".bold());
    println!("  language:             {}", prefs.language);
    println!("  compact layout:       {}", prefs.compact_layout);
    println!("  show reasoning panel: {}", prefs.show_reasoning_panel);
}
