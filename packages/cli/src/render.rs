//! Plain-text rendering of map views for the terminal.

use std::fmt::Write as _;

use road_risk_map::notify::{Notification, NotificationLevel};
use road_risk_map::surface::Scene;
use road_risk_map::view::{PanelLayout, ReportPanel, SidebarPanel, ViewState};

/// Renders whichever panel the view currently shows.
pub fn view(view: &ViewState) -> String {
    match &view.layout {
        PanelLayout::Sidebar(sidebar) => self::sidebar(sidebar),
        PanelLayout::Report(report) => self::report(report),
    }
}

fn sidebar(panel: &SidebarPanel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", panel.title);
    let _ = writeln!(out, "{}", panel.subtitle);
    let _ = writeln!(
        out,
        "Heatmap: {}",
        if panel.show_heatmap { "shown" } else { "hidden" }
    );

    let filters: Vec<String> = panel
        .filters
        .iter()
        .map(|f| {
            if f.active {
                format!("[{}]", f.bucket.label())
            } else {
                f.bucket.label().to_string()
            }
        })
        .collect();
    let _ = writeln!(out, "Severity: {}", filters.join(" "));

    for entry in &panel.legend {
        let _ = writeln!(out, "  {} {}", entry.color.hex(), entry.label);
    }

    if let Some(loading) = panel.loading {
        let _ = writeln!(out, "{loading}");
    }
    if let Some(failure) = &panel.failure {
        let _ = writeln!(out, "Error: {failure}");
    }
    if let Some(report) = &panel.minimized_report {
        let _ = writeln!(
            out,
            "Report (minimized): {} risk at {}",
            report.risk_level, report.location
        );
    }

    out
}

/// Renders an expanded risk report.
pub fn report(panel: &ReportPanel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", panel.title);
    let _ = writeln!(out, "{}", "=".repeat(panel.title.len()));
    let _ = writeln!(out, "Location:   {}", panel.location);
    let _ = writeln!(
        out,
        "Risk level: {} ({})",
        panel.risk_level,
        panel.color.hex()
    );
    let _ = writeln!(out, "Confidence: {}", panel.confidence);

    if let Some(summary) = &panel.summary {
        let _ = writeln!(out, "\nSummary\n  {summary}");
    }
    if !panel.drivers.is_empty() {
        let _ = writeln!(out, "\nPrimary drivers");
        for (i, driver) in panel.drivers.iter().enumerate() {
            let _ = writeln!(out, "  {}. {driver}", i + 1);
        }
    }
    if !panel.actions.is_empty() {
        let _ = writeln!(out, "\nRecommended actions");
        for (i, action) in panel.actions.iter().enumerate() {
            let _ = writeln!(out, "  {}. {action}", i + 1);
        }
    }

    out
}

/// Renders the visible heatmap markers as a table.
pub fn markers(scene: &Scene) -> String {
    if scene.heatmap.is_empty() {
        return "No heatmap points.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>10} {:>10} {:>7} {:<8} {:>9} {:>10} SEVERITY",
        "LAT", "LON", "RADIUS", "COLOR", "ACCIDENTS", "CASUALTIES"
    );
    let _ = writeln!(out, "{}", "-".repeat(72));

    for marker in &scene.heatmap {
        let _ = writeln!(
            out,
            "{:>10.4} {:>10.4} {:>7.1} {:<8} {:>9} {:>10} {}",
            marker.latitude,
            marker.longitude,
            marker.radius,
            marker.color.hex(),
            marker.popup.accident_count,
            marker.popup.total_casualties,
            marker.popup.severity_label
        );
    }

    let _ = writeln!(out, "\n{} marker(s)", scene.heatmap.len());
    out
}

/// Renders pending notifications, one per line.
pub fn notifications(notifications: &[Notification]) -> String {
    notifications
        .iter()
        .map(|n| {
            let tag = match n.level {
                NotificationLevel::Success => "ok",
                NotificationLevel::Error => "error",
            };
            format!("[{tag}] {}\n", n.message)
        })
        .collect()
}
