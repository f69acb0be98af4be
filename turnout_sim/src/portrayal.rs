//! Render hints for grid viewers.
//!
//! Each agent maps to a small drawing instruction: voters are coloured
//! circles on layer 1, polling locations sit underneath on layer 0 as an
//! icon while a machine is free and a white square otherwise. The field
//! names follow the keys grid viewers expect (`Shape`, `Color`, `Filled`,
//! `Layer`).

use serde::{Deserialize, Serialize};
use turnout_core::metrics::{DISENFRANCHISED, MIDDLE_CLASS, POOR, RICH};
use turnout_core::{PollingLocation, Stratum, Voter};

pub const POOR_COLOR: &str = "#FF7F0E";
pub const MIDDLE_COLOR: &str = "#2CA02C";
pub const RICH_COLOR: &str = "#1F77B4";
pub const DISENFRANCHISED_COLOR: &str = "#AA0000";
pub const DEPLETED_COLOR: &str = "#FFFFFF";
pub const MACHINE_ICON: &str = "icon.png";

/// Drawing instruction for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portrayal {
    #[serde(rename = "Shape")]
    pub shape: String,

    #[serde(rename = "Color", skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(rename = "Filled")]
    pub filled: bool,

    #[serde(rename = "Layer")]
    pub layer: u8,

    /// Circle radius
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<f64>,

    /// Icon scale
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

/// A line on the turnout chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSeries {
    #[serde(rename = "Label")]
    pub label: String,
    #[serde(rename = "Color")]
    pub color: String,
}

/// Chart lines in drawing order.
pub fn chart_series() -> Vec<ChartSeries> {
    [
        (DISENFRANCHISED, DISENFRANCHISED_COLOR),
        (POOR, POOR_COLOR),
        (MIDDLE_CLASS, MIDDLE_COLOR),
        (RICH, RICH_COLOR),
    ]
    .into_iter()
    .map(|(label, color)| ChartSeries {
        label: label.to_string(),
        color: color.to_string(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use turnout_core::{AgentId, Pos};

    #[test]
    fn test_voter_colors() {
        let rich = Voter::new(AgentId(1), Pos::new(0, 0), 10, 6);
        let p = portray_voter(&rich);
        assert_eq!(p.shape, "circle");
        assert_eq!(p.color.as_deref(), Some(RICH_COLOR));
        assert_eq!(p.layer, 1);
        assert_eq!(p.r, Some(0.75));

        let odd = Voter::new(AgentId(2), Pos::new(0, 0), 10, 2);
        assert_eq!(portray_voter(&odd).color, None);
    }

    #[test]
    fn test_polling_location_icon_until_depleted() {
        let mut loc = PollingLocation::new(AgentId(0), Pos::new(1, 1), 1);
        let free = portray_polling_location(&loc);
        assert_eq!(free.shape, MACHINE_ICON);
        assert_eq!(free.scale, Some(0.95));
        assert_eq!(free.layer, 0);

        loc.take_all();
        let depleted = portray_polling_location(&loc);
        assert_eq!(depleted.shape, "rect");
        assert_eq!(depleted.color.as_deref(), Some(DEPLETED_COLOR));
        assert_eq!((depleted.w, depleted.h), (Some(1.0), Some(1.0)));
    }

    #[test]
    fn test_serialized_keys() {
        let loc = PollingLocation::new(AgentId(0), Pos::new(0, 0), 0);
        let json = serde_json::to_value(portray_polling_location(&loc)).unwrap();
        assert_eq!(json["Shape"], "rect");
        assert_eq!(json["Color"], DEPLETED_COLOR);
        assert_eq!(json["Filled"], true);
        assert!(json.get("r").is_none());
    }

    #[test]
    fn test_chart_series_labels() {
        let series = chart_series();
        let labels: Vec<&str> = series.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Disenfranchised Voters", "Poor", "Middle Class", "Rich"]
        );
        assert_eq!(series[0].color, DISENFRANCHISED_COLOR);
    }
}
