//! Panel layout derived from the selection state.
//!
//! [`derive`] is a pure function: the layout holds no state of its own, so
//! it cannot drift from the machine. The sidebar shows controls, the
//! loading indicator (while `Selecting`), and failure messages; the report
//! replaces the sidebar only once a prediction is `Resolved` and not
//! minimized.

use road_risk_models::{
    Coordinate, PredictionResult, RiskColor, RiskLevel, SeverityBucket, driver_label,
};

use crate::machine::SelectionState;

/// Sidebar heading.
pub const SIDEBAR_TITLE: &str = "Risk Map";
/// Sidebar hint.
pub const SIDEBAR_SUBTITLE: &str = "Click anywhere on the map to analyze risk";
/// Loading indicator text.
pub const LOADING_TEXT: &str = "Analyzing location risk...";
/// Shown while the heatmap is loading.
pub const HEATMAP_LOADING_TEXT: &str = "Loading map data...";
/// Report heading.
pub const REPORT_TITLE: &str = "Risk Analysis Report";

/// Everything a front end needs to draw the panels.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// Sidebar or report.
    pub layout: PanelLayout,
}

impl ViewState {
    /// Whether the report panel is expanded.
    #[must_use]
    pub const fn expanded(&self) -> bool {
        matches!(self.layout, PanelLayout::Report(_))
    }

    /// Whether the loading indicator is visible.
    #[must_use]
    pub const fn loading(&self) -> bool {
        matches!(&self.layout, PanelLayout::Sidebar(sidebar) if sidebar.loading.is_some())
    }
}

/// Which panel occupies the left side.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelLayout {
    /// Controls, legend, and status.
    Sidebar(SidebarPanel),
    /// Full risk report.
    Report(ReportPanel),
}

/// Collapsed-mode sidebar.
#[derive(Debug, Clone, PartialEq)]
pub struct SidebarPanel {
    /// Heading.
    pub title: &'static str,
    /// Hint text.
    pub subtitle: &'static str,
    /// State of the "Show Accident Heatmap" toggle.
    pub show_heatmap: bool,
    /// Severity filter buttons.
    pub filters: Vec<FilterButton>,
    /// Colour legend.
    pub legend: Vec<LegendEntry>,
    /// Present while a prediction is in flight.
    pub loading: Option<&'static str>,
    /// Present when the current prediction failed.
    pub failure: Option<String>,
    /// Present when a resolved report has been minimized.
    pub minimized_report: Option<MinimizedReport>,
}

/// One severity filter button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterButton {
    /// Bucket selected by the button.
    pub bucket: SeverityBucket,
    /// Whether it is the active filter.
    pub active: bool,
}

/// One legend row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegendEntry {
    /// Row label.
    pub label: &'static str,
    /// Swatch.
    pub color: RiskColor,
}

/// Compact reminder of a minimized report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinimizedReport {
    /// Location text.
    pub location: String,
    /// Risk level.
    pub risk_level: RiskLevel,
}

/// Expanded report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPanel {
    /// Heading.
    pub title: &'static str,
    /// Location text, e.g. `"28.6139, 77.2090"`.
    pub location: String,
    /// Risk level.
    pub risk_level: RiskLevel,
    /// Colour used for the level.
    pub color: RiskColor,
    /// Confidence text, e.g. `"82.0%"`.
    pub confidence: String,
    /// Explanation summary, when provided.
    pub summary: Option<String>,
    /// Primary drivers as display text, in order.
    pub drivers: Vec<String>,
    /// Recommended actions, in order.
    pub actions: Vec<String>,
}

impl ReportPanel {
    fn new(coordinate: Coordinate, prediction: &PredictionResult) -> Self {
        let (summary, drivers) = prediction.explanation.as_ref().map_or_else(
            || (None, Vec::new()),
            |e| {
                (
                    e.risk_summary.clone(),
                    e.primary_drivers.iter().map(|d| driver_label(d)).collect(),
                )
            },
        );

        Self {
            title: REPORT_TITLE,
            location: coordinate.to_string(),
            risk_level: prediction.risk_level,
            color: prediction.risk_level.color(),
            confidence: prediction.confidence_text(),
            summary,
            drivers,
            actions: prediction
                .recommendation
                .as_ref()
                .map(|r| r.recommended_actions.clone())
                .unwrap_or_default(),
        }
    }
}

fn legend() -> Vec<LegendEntry> {
    vec![
        LegendEntry {
            label: "High Risk",
            color: RiskColor::Red,
        },
        LegendEntry {
            label: "Medium Risk",
            color: RiskColor::Amber,
        },
        LegendEntry {
            label: "Low Risk",
            color: RiskColor::Green,
        },
    ]
}

/// Derives the panel layout from the selection state and the current
/// control settings.
#[must_use]
pub fn derive(state: &SelectionState, bucket: SeverityBucket, show_heatmap: bool) -> ViewState {
    let mut sidebar = SidebarPanel {
        title: SIDEBAR_TITLE,
        subtitle: SIDEBAR_SUBTITLE,
        show_heatmap,
        filters: SeverityBucket::all()
            .iter()
            .map(|&b| FilterButton {
                bucket: b,
                active: b == bucket,
            })
            .collect(),
        legend: legend(),
        loading: None,
        failure: None,
        minimized_report: None,
    };

    match state {
        SelectionState::Idle => {}
        SelectionState::Selecting { .. } => sidebar.loading = Some(LOADING_TEXT),
        SelectionState::Failed { failure, .. } => sidebar.failure = Some(failure.message.clone()),
        SelectionState::Resolved {
            coordinate,
            prediction,
            minimized: false,
            ..
        } => {
            return ViewState {
                layout: PanelLayout::Report(ReportPanel::new(*coordinate, prediction)),
            };
        }
        SelectionState::Resolved {
            coordinate,
            prediction,
            minimized: true,
            ..
        } => {
            sidebar.minimized_report = Some(MinimizedReport {
                location: coordinate.to_string(),
                risk_level: prediction.risk_level,
            });
        }
    }

    ViewState {
        layout: PanelLayout::Sidebar(sidebar),
    }
}

#[cfg(test)]
mod tests {
    use road_risk_gateway::GatewayErrorKind;
    use road_risk_models::{Explanation, Recommendation};

    use super::*;
    use crate::machine::{Failure, SelectionMachine};

    fn coord() -> Coordinate {
        Coordinate::new(28.6139, 77.209).unwrap()
    }

    fn high_prediction() -> PredictionResult {
        PredictionResult {
            risk_level: RiskLevel::High,
            risk_score: 0.82,
            explanation: Some(Explanation {
                risk_summary: Some("Busy junctions with poor lighting.".to_string()),
                primary_drivers: vec![
                    "Light_Conditions".to_string(),
                    "Junction_Detail".to_string(),
                ],
            }),
            recommendation: Some(Recommendation {
                recommended_actions: vec!["Install street lighting".to_string()],
            }),
        }
    }

    fn sidebar(view: &ViewState) -> &SidebarPanel {
        match &view.layout {
            PanelLayout::Sidebar(sidebar) => sidebar,
            PanelLayout::Report(_) => panic!("expected sidebar"),
        }
    }

    #[test]
    fn idle_shows_controls_only() {
        let view = derive(&SelectionState::Idle, SeverityBucket::High, true);
        assert!(!view.expanded());
        assert!(!view.loading());

        let sidebar = sidebar(&view);
        let active: Vec<SeverityBucket> = sidebar
            .filters
            .iter()
            .filter(|f| f.active)
            .map(|f| f.bucket)
            .collect();
        assert_eq!(active, [SeverityBucket::High]);
        assert_eq!(sidebar.legend.len(), 3);
    }

    #[test]
    fn selecting_shows_loading_in_sidebar() {
        let mut machine = SelectionMachine::new();
        machine.select(coord());
        let view = derive(machine.state(), SeverityBucket::All, true);
        assert!(!view.expanded());
        assert!(view.loading());
        assert_eq!(sidebar(&view).loading, Some(LOADING_TEXT));
    }

    #[test]
    fn resolved_expands_report() {
        let mut machine = SelectionMachine::new();
        let token = machine.select(coord());
        machine.complete(token, Ok(high_prediction())).unwrap();

        let view = derive(machine.state(), SeverityBucket::All, true);
        assert!(view.expanded());
        let PanelLayout::Report(report) = view.layout else {
            panic!("expected report");
        };
        assert_eq!(report.title, REPORT_TITLE);
        assert_eq!(report.location, "28.6139, 77.2090");
        assert_eq!(report.risk_level, RiskLevel::High);
        assert_eq!(report.color.hex(), "#ef4444");
        assert_eq!(report.confidence, "82.0%");
        assert_eq!(report.drivers, ["Light Conditions", "Junction Detail"]);
        assert_eq!(report.actions, ["Install street lighting"]);
    }

    #[test]
    fn minimized_report_collapses_to_sidebar() {
        let mut machine = SelectionMachine::new();
        let token = machine.select(coord());
        machine.complete(token, Ok(high_prediction())).unwrap();
        machine.minimize();

        let view = derive(machine.state(), SeverityBucket::All, false);
        assert!(!view.expanded());
        let sidebar = sidebar(&view);
        assert!(!sidebar.show_heatmap);
        assert_eq!(
            sidebar.minimized_report.as_ref().map(|m| m.risk_level),
            Some(RiskLevel::High)
        );
    }

    #[test]
    fn failed_shows_message_in_sidebar() {
        let state = SelectionState::Failed {
            coordinate: coord(),
            token: SelectionMachine::new().select(coord()),
            failure: Failure {
                kind: GatewayErrorKind::Response,
                message: "The risk prediction service failed with HTTP 500".to_string(),
            },
        };
        let view = derive(&state, SeverityBucket::All, true);
        assert!(!view.expanded());
        assert!(!view.loading());
        assert!(sidebar(&view).failure.as_deref().unwrap().contains("HTTP 500"));
    }

    #[test]
    fn report_without_optionals() {
        let mut machine = SelectionMachine::new();
        let token = machine.select(coord());
        machine
            .complete(
                token,
                Ok(PredictionResult {
                    risk_level: RiskLevel::Low,
                    risk_score: 0.305,
                    explanation: None,
                    recommendation: None,
                }),
            )
            .unwrap();

        let PanelLayout::Report(report) = derive(machine.state(), SeverityBucket::All, true).layout
        else {
            panic!("expected report");
        };
        assert!(report.summary.is_none());
        assert!(report.drivers.is_empty());
        assert!(report.actions.is_empty());
        assert_eq!(report.color, RiskColor::Green);
    }
}
