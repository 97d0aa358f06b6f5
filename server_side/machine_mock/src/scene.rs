use std::path::Path;

use anyhow::{Context, Result};
use canon::ToolEntry;
use probe_routines::Axis;
use serde::{Deserialize, Serialize};

/// Which way a face of the workpiece points, along its axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Plus,
    Minus,
}
impl Facing {
    pub fn sign(&self) -> f64 {
        match self {
            Facing::Plus => 1.0,
            Facing::Minus => -1.0,
        }
    }
}

/// An unbounded plane of material perpendicular to `axis` at machine
/// coordinate `at`. Only moves travelling against `facing` touch it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub axis: Axis,
    pub at: f64,
    pub facing: Facing,
}
impl Surface {
    pub fn new(axis: Axis, at: f64, facing: Facing) -> Self {
        Surface { axis, at, facing }
    }
}

/// Everything the simulated machine starts from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    /// Starting machine position.
    pub position: [f64; 3],
    pub work_offset: [f64; 3],
    pub tip_diameter: f64,
    pub surfaces: Vec<Surface>,
    /// Soft limits per axis as `[min, max]`; `null` for none.
    pub limits: [Option<[f64; 2]>; 3],
    pub metric: bool,
    pub tools: Vec<ToolEntry>,
    pub current_tool: i32,
    /// 1-based index of an executed line that fails.
    pub fail_at: Option<usize>,
    pub line_delay_ms: u64,
}
impl Default for Scene {
    fn default() -> Self {
        Scene {
            position: [0.0; 3],
            work_offset: [0.0; 3],
            tip_diameter: 2.0,
            surfaces: Vec::new(),
            limits: [None; 3],
            metric: true,
            tools: Vec::new(),
            current_tool: 0,
            fail_at: None,
            line_delay_ms: 0,
        }
    }
}

impl Scene {
    pub async fn load(path: &Path) -> Result<Scene> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading scene {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing scene {}", path.display()))
    }

    /// A block spanning `min..max` on X and Y with its top at `top`.
    pub fn boss(min: [f64; 2], max: [f64; 2], top: f64) -> Scene {
        Scene {
            surfaces: vec![
                Surface::new(Axis::X, min[0], Facing::Minus),
                Surface::new(Axis::X, max[0], Facing::Plus),
                Surface::new(Axis::Y, min[1], Facing::Minus),
                Surface::new(Axis::Y, max[1], Facing::Plus),
                Surface::new(Axis::Z, top, Facing::Plus),
            ],
            ..Default::default()
        }
    }

    /// A pocket spanning `min..max` on X and Y with its floor at `floor`.
    pub fn pocket(min: [f64; 2], max: [f64; 2], floor: f64) -> Scene {
        Scene {
            surfaces: vec![
                Surface::new(Axis::X, min[0], Facing::Plus),
                Surface::new(Axis::X, max[0], Facing::Minus),
                Surface::new(Axis::Y, min[1], Facing::Plus),
                Surface::new(Axis::Y, max[1], Facing::Minus),
                Surface::new(Axis::Z, floor, Facing::Plus),
            ],
            ..Default::default()
        }
    }

    pub fn with_position(self, position: [f64; 3]) -> Scene {
        Scene { position, ..self }
    }

    pub fn limits(&self, axis: Axis) -> Option<(f64, f64)> {
        self.limits[axis.index()].map(|[min, max]| (min, max))
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    pub fn test_partial_scene() {
        let scene: Scene = serde_json::from_str(
            r#"{"surfaces": [{"axis": "X", "at": 10, "facing": "minus"}], "limits": [[-100, 100], null, null]}"#,
        )
        .unwrap();
        assert_eq!(scene.surfaces, vec![Surface::new(Axis::X, 10.0, Facing::Minus)]);
        assert_eq!(scene.limits(Axis::X), Some((-100.0, 100.0)));
        assert_eq!(scene.limits(Axis::Y), None);
        assert_eq!(scene.tip_diameter, 2.0);
        assert!(scene.metric);
    }
}
