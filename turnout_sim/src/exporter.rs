//! JSON exporter for offline viewers.
//!
//! Exports periodic grid snapshots plus the full metric series of a run.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use turnout_core::{ModelConfig, StepMetrics, Stratum, VotingModel};

use crate::portrayal::{self, ChartSeries, Portrayal};

/// A single frame of simulation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimFrame {
    /// Completed model steps
    pub step: u64,

    /// Voters still looking for a machine
    pub voters: Vec<VoterFrame>,

    /// Cells with at least one machine installed
    pub polling_locations: Vec<PollingFrame>,
}

impl SimFrame {
    /// Snapshots the model's current grid.
    pub fn capture(model: &VotingModel) -> Self {
        let voters = model
            .world()
            .voters()
            .map(|v| VoterFrame {
                id: v.id.0,
                x: v.pos.x,
                y: v.pos.y,
                speed: v.speed,
                stratum: v.stratum(),
                portrayal: portrayal::portray_voter(v),
            })
            .collect();

        let polling_locations = model
            .world()
            .polling_locations()
            .filter(|loc| loc.max_capacity > 0)
            .map(|loc| PollingFrame {
                x: loc.pos.x,
                y: loc.pos.y,
                capacity: loc.capacity,
                max_capacity: loc.max_capacity,
                portrayal: portrayal::portray_polling_location(loc),
            })
            .collect();

        Self {
            step: model.time(),
            voters,
            polling_locations,
        }
    }
}

/// Voter state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoterFrame {
    pub id: u64,
    pub x: usize,
    pub y: usize,
    pub speed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stratum: Option<Stratum>,
    pub portrayal: Portrayal,
}

/// Polling location state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingFrame {
    pub x: usize,
    pub y: usize,
    pub capacity: u32,
    pub max_capacity: u32,
    pub portrayal: Portrayal,
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Model configuration of the exported run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ModelConfig>,

    pub total_machines: u64,
    pub machines_per_100: u64,

    /// Metrics for every step, including step 0
    pub metrics: Vec<StepMetrics>,

    /// Chart lines for the metric series
    #[serde(default)]
    pub charts: Vec<ChartSeries>,

    /// Periodic frames
    pub frames: Vec<SimFrame>,

    /// Final results
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            config: None,
            total_machines: 0,
            machines_per_100: 0,
            metrics: Vec::new(),
            charts: portrayal::chart_series(),
            frames: Vec::new(),
            passed: false,
            failure_reason: None,
        }
    }

    /// Records the model's setup and its initial frame.
    pub fn begin(&mut self, model: &VotingModel) {
        self.config = Some(model.config().clone());
        self.total_machines = model.total_machines();
        self.machines_per_100 = model.machines_per_100();
        self.add_frame(SimFrame::capture(model));
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, model: &VotingModel, passed: bool, failure_reason: Option<String>) {
        if self.frames.last().map(|f| f.step) != Some(model.time()) {
            self.add_frame(SimFrame::capture(model));
        }
        self.metrics = model.metrics().rows().to_vec();
        self.passed = passed;
        self.failure_reason = failure_reason;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turnout_core::{CapacityMap, Pos, VoterSpec};

    fn model() -> VotingModel {
        let map = CapacityMap::uniform(4, 4, 0).with(Pos::new(3, 3), 2);
        let config = ModelConfig {
            width: 4,
            height: 4,
            ..ModelConfig::default()
        };
        VotingModel::with_voters(
            config,
            &map,
            &[VoterSpec::new((0, 0), 10, 1), VoterSpec::new((1, 2), 10, 3)],
        )
        .unwrap()
    }

    #[test]
    fn test_capture_frame() {
        let model = model();
        let frame = SimFrame::capture(&model);

        assert_eq!(frame.step, 0);
        assert_eq!(frame.voters.len(), 2);
        assert_eq!(frame.voters[1].stratum, Some(Stratum::Middle));
        assert_eq!(frame.polling_locations.len(), 1);
        assert_eq!(frame.polling_locations[0].capacity, 2);
    }

    #[test]
    fn test_export_lifecycle() {
        let mut model = model();
        let mut export = SimExport::new("single_machine", 42);
        export.begin(&model);
        model.run(3);
        export.finalize(&model, true, None);

        assert_eq!(export.total_machines, 2);
        assert_eq!(export.machines_per_100, 100);
        assert_eq!(export.frames.len(), 2);
        assert_eq!(export.frames[1].step, 3);
        assert_eq!(export.metrics.len(), 4);

        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["scenario"], "single_machine");
        assert_eq!(json["config"]["width"], 4);
        assert_eq!(json["charts"][0]["Label"], "Disenfranchised Voters");
        assert_eq!(json["charts"].as_array().map(Vec::len), Some(4));
        assert!(json.get("failure_reason").is_none());
    }

    #[test]
    fn test_write_to_file() {
        let model = model();
        let mut export = SimExport::new("baseline", 1);
        export.begin(&model);
        export.finalize(&model, false, Some("stopped".to_string()));

        let path = std::env::temp_dir().join(format!("turnout_export_{}.json", std::process::id()));
        export.write_to_file(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let parsed: SimExport = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.failure_reason.as_deref(), Some("stopped"));
        assert_eq!(parsed.frames.len(), 1);
        assert_eq!(parsed.charts, export.charts);
    }
}
