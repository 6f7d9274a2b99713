//! Interactive map session.
//!
//! Each menu action stands in for a gesture on the map (a click, a filter
//! button, the layer toggle). After every action the current panel and the
//! pending notifications are printed.

use dialoguer::{Input, Select};
use road_risk_cli_utils::MultiProgress;
use road_risk_map::RiskMap;
use road_risk_map::notify::Notification;
use road_risk_models::SeverityBucket;

use crate::render;

/// Actions offered by the session menu.
enum MapAction {
    SelectLocation,
    FilterSeverity,
    ToggleHeatmap,
    ReloadHeatmap,
    ShowMarkers,
    MinimizeReport,
    RestoreReport,
    DismissReport,
    DismissNotification,
    ClearNotifications,
    Quit,
}

impl MapAction {
    const ALL: &[Self] = &[
        Self::SelectLocation,
        Self::FilterSeverity,
        Self::ToggleHeatmap,
        Self::ReloadHeatmap,
        Self::ShowMarkers,
        Self::MinimizeReport,
        Self::RestoreReport,
        Self::DismissReport,
        Self::DismissNotification,
        Self::ClearNotifications,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::SelectLocation => "Analyze a location",
            Self::FilterSeverity => "Filter heatmap by severity",
            Self::ToggleHeatmap => "Show/hide accident heatmap",
            Self::ReloadHeatmap => "Reload heatmap",
            Self::ShowMarkers => "List heatmap markers",
            Self::MinimizeReport => "Minimize report",
            Self::RestoreReport => "Restore report",
            Self::DismissReport => "Close report",
            Self::DismissNotification => "Dismiss a notification",
            Self::ClearNotifications => "Clear all notifications",
            Self::Quit => "Quit",
        }
    }
}

/// Runs the interactive session until the user quits.
///
/// Loads the heatmap first, then loops over the action menu.
///
/// # Errors
///
/// Returns an error if a prompt fails (e.g. the terminal is closed).
pub async fn run(
    map: &mut RiskMap,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let center = map.surface().center();
    println!("Road Risk Map");
    println!(
        "Centred on {:.4}, {:.4} at zoom {}",
        center.0,
        center.1,
        map.surface().zoom()
    );
    println!();

    if let Err(message) = crate::load_heatmap(map, multi).await {
        log::warn!("{message}");
    }
    print_state(map);

    let labels: Vec<&str> = MapAction::ALL.iter().map(MapAction::label).collect();

    loop {
        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        match MapAction::ALL[idx] {
            MapAction::SelectLocation => {
                click_location(map)?;
                if let Err(message) = crate::await_prediction(map, multi).await {
                    log::debug!("Prediction failed: {message}");
                }
            }
            MapAction::FilterSeverity => {
                let buckets = SeverityBucket::all();
                let bucket_labels: Vec<&str> = buckets.iter().map(|b| b.label()).collect();
                let current = buckets
                    .iter()
                    .position(|&b| b == map.severity_bucket())
                    .unwrap_or(0);
                let choice = Select::new()
                    .with_prompt("Severity")
                    .items(&bucket_labels)
                    .default(current)
                    .interact()?;
                map.set_severity_bucket(buckets[choice]);
            }
            MapAction::ToggleHeatmap => {
                let visible = !map.heatmap_visible();
                map.set_heatmap_visible(visible);
            }
            MapAction::ReloadHeatmap => {
                if let Err(message) = crate::load_heatmap(map, multi).await {
                    log::debug!("Heatmap reload failed: {message}");
                }
            }
            MapAction::ShowMarkers => {
                print!("{}", render::markers(&map.scene()));
                println!();
                continue;
            }
            MapAction::MinimizeReport => {
                if !map.minimize() {
                    println!("No report to minimize.");
                }
            }
            MapAction::RestoreReport => {
                if !map.restore() {
                    println!("No minimized report.");
                }
            }
            MapAction::DismissReport => {
                if !map.dismiss() {
                    println!("Nothing to close.");
                }
            }
            MapAction::DismissNotification => {
                let pending: Vec<Notification> = map.notifications().cloned().collect();
                if pending.is_empty() {
                    println!("No notifications.");
                    continue;
                }
                let messages: Vec<&str> = pending.iter().map(|n| n.message.as_str()).collect();
                let choice = Select::new()
                    .with_prompt("Dismiss which notification?")
                    .items(&messages)
                    .default(0)
                    .interact()?;
                map.dismiss_notification(pending[choice].id);
            }
            MapAction::ClearNotifications => {
                map.take_notifications();
            }
            MapAction::Quit => break,
        }

        print_state(map);
    }

    Ok(())
}

fn print_state(map: &RiskMap) {
    println!();
    print!("{}", render::view(&map.view()));

    let notifications: Vec<Notification> = map.notifications().cloned().collect();
    if !notifications.is_empty() {
        println!();
        print!("{}", render::notifications(&notifications));
    }
    println!();
}

/// Prompts for a point and clicks it on the map, re-prompting until the
/// click lands on a valid coordinate.
fn click_location(map: &mut RiskMap) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let lat: f64 = Input::new().with_prompt("Latitude").interact_text()?;
        let lon: f64 = Input::new().with_prompt("Longitude").interact_text()?;

        match map.click(lat, lon) {
            Ok(_) => return Ok(()),
            Err(e) => println!("{e}"),
        }
    }
}
