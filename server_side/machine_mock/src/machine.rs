use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use canon::{CanonStatus, ToolEntry};
use probe_routines::{Axis, MachineStatus, MotionError, MotionRuntime};
use tracing::{debug, info};

use crate::{
    expr::{evaluate, Parameter},
    scene::Scene,
    words::{parse_assignment, parse_words},
};

const AXES: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
const NO_CONTACT: &str = "Probe move finished without contact";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Motion {
    Linear,
    Probe,
}

/// One line of g-code with its values evaluated.
#[derive(Debug, Default)]
struct Block {
    g: Vec<String>,
    axes: [Option<f64>; 3],
    f: Option<f64>,
    l: Option<f64>,
    p: Option<f64>,
    r: Option<f64>,
}
impl Block {
    fn has(&self, code: &str) -> bool {
        self.g.iter().any(|g| g == code)
    }
    fn has_motion(&self) -> bool {
        self.axes.iter().any(Option::is_some)
    }
}

#[derive(Debug)]
struct MachineState {
    scene: Scene,
    position: [f64; 3],
    offset: [f64; 3],
    rotation: f64,
    relative: bool,
    motion: Motion,
    feed: f64,
    parameters: HashMap<String, f64>,
    contact: Option<[f64; 3]>,
    tools: Vec<ToolEntry>,
    log: Vec<String>,
    aborts: usize,
}

impl MachineState {
    fn new(scene: Scene) -> Self {
        MachineState {
            position: scene.position,
            offset: scene.work_offset,
            rotation: 0.0,
            relative: false,
            motion: Motion::Linear,
            feed: 0.0,
            parameters: HashMap::new(),
            contact: None,
            tools: scene.tools.clone(),
            log: Vec::new(),
            aborts: 0,
            scene,
        }
    }

    fn work_position(&self) -> [f64; 3] {
        std::array::from_fn(|i| self.position[i] - self.offset[i])
    }

    fn tool_mut(&mut self, id: i32) -> &mut ToolEntry {
        let index = match self.tools.iter().position(|tool| tool.id == id) {
            Some(index) => index,
            None => {
                self.tools.push(ToolEntry { id, ..ToolEntry::none() });
                self.tools.len() - 1
            }
        };
        &mut self.tools[index]
    }

    fn parameter(&self, parameter: Parameter<'_>) -> Result<f64, String> {
        match parameter {
            Parameter::Named(name) => {
                let name = name.to_ascii_lowercase();
                let work = self.work_position();
                match name.as_str() {
                    "_x" => Ok(work[0]),
                    "_y" => Ok(work[1]),
                    "_z" => Ok(work[2]),
                    "_abs_x" => Ok(self.position[0]),
                    "_abs_y" => Ok(self.position[1]),
                    "_abs_z" => Ok(self.position[2]),
                    _ => self.parameters.get(&name).copied().ok_or_else(|| format!("unknown parameter #<{}>", name)),
                }
            }
            Parameter::Numbered(number) => {
                let contact = self.contact.unwrap_or_default();
                match number {
                    // last probe contact in work coordinates
                    5061..=5063 => {
                        let i = (number - 5061) as usize;
                        Ok(contact[i] - self.offset[i])
                    }
                    // G92 is never active
                    5210..=5219 => Ok(0.0),
                    // the active system is always G54
                    5220 => Ok(1.0),
                    5221..=5223 => Ok(self.offset[(number - 5221) as usize]),
                    5224..=5229 => Ok(0.0),
                    5230 => Ok(self.rotation),
                    5400 => Ok(self.scene.current_tool as f64),
                    5401..=5409 => {
                        let id = self.scene.current_tool;
                        let tool = self.tools.iter().find(|tool| tool.id == id).copied().unwrap_or_else(ToolEntry::none);
                        Ok(tool.offset[(number - 5401) as usize])
                    }
                    _ => Err(format!("unknown parameter #{}", number)),
                }
            }
        }
    }

    fn evaluate(&self, value: &str) -> Result<f64, MotionError> {
        evaluate(value, |parameter| self.parameter(parameter)).map_err(MotionError::Runtime)
    }

    fn block(&self, line: &str) -> Result<Block, MotionError> {
        let words = parse_words(line).ok_or_else(|| MotionError::Runtime(format!("cannot parse {:?}", line)))?;
        let mut block = Block::default();
        for word in words {
            let value = self.evaluate(word.value)?;
            match word.head {
                'G' => block.g.push(value.to_string()),
                'X' => block.axes[0] = Some(value),
                'Y' => block.axes[1] = Some(value),
                'Z' => block.axes[2] = Some(value),
                'F' => block.f = Some(value),
                'L' => block.l = Some(value),
                'P' => block.p = Some(value),
                'R' => block.r = Some(value),
                other => debug!("ignoring {}{}", other, word.value),
            }
        }
        Ok(block)
    }

    fn execute(&mut self, line: &str) -> Result<(), MotionError> {
        self.log.push(line.to_string());
        if self.scene.fail_at == Some(self.log.len()) {
            return Err(MotionError::Failed(1));
        }
        if let Some((name, value)) = parse_assignment(line) {
            let value = self.evaluate(value)?;
            self.parameters.insert(name.trim().to_ascii_lowercase(), value);
            return Ok(());
        }
        let block = self.block(line)?;
        let mut machine_coordinates = false;
        for code in &block.g {
            match code.as_str() {
                "0" | "1" => self.motion = Motion::Linear,
                "38.2" => self.motion = Motion::Probe,
                "90" => self.relative = false,
                "91" => self.relative = true,
                "53" => machine_coordinates = true,
                "4" | "10" | "43" | "49" | "92.1" => (),
                other => debug!("ignoring G{}", other),
            }
        }
        if let Some(feed) = block.f {
            self.feed = feed;
        }
        if block.has("10") {
            return self.set_coordinates(&block);
        }
        if !block.has_motion() {
            return Ok(());
        }
        let target = self.target(&block, machine_coordinates)?;
        match self.motion {
            Motion::Linear => {
                self.position = target;
                Ok(())
            }
            Motion::Probe => self.probe_to(target),
        }
    }

    fn target(&self, block: &Block, machine_coordinates: bool) -> Result<[f64; 3], MotionError> {
        let mut target = self.position;
        for (i, axis) in AXES.iter().enumerate() {
            let Some(value) = block.axes[i] else { continue };
            target[i] = if machine_coordinates {
                value
            } else if self.relative {
                self.position[i] + value
            } else {
                value + self.offset[i]
            };
            if let Some((min, max)) = self.scene.limits(*axis) {
                if target[i] < min || target[i] > max {
                    return Err(MotionError::Runtime(format!("{} move to {} exceeds soft limits", axis, target[i])));
                }
            }
        }
        Ok(target)
    }

    /// Moves toward `target` until the tip touches a surface facing the move.
    fn probe_to(&mut self, target: [f64; 3]) -> Result<(), MotionError> {
        let start = self.position;
        let radius = self.scene.tip_diameter / 2.0;
        let mut first: Option<(f64, usize, f64)> = None;
        for surface in &self.scene.surfaces {
            let i = surface.axis.index();
            let travel = target[i] - start[i];
            if travel == 0.0 || surface.facing.sign() == travel.signum() {
                continue;
            }
            let reach = if surface.axis == Axis::Z { 0.0 } else { radius };
            let stop = surface.at - travel.signum() * reach;
            let fraction = (stop - start[i]) / travel;
            if fraction > 1e-9 && fraction <= 1.0 && first.map_or(true, |(best, _, _)| fraction < best) {
                first = Some((fraction, i, stop));
            }
        }
        match first {
            Some((fraction, axis, stop)) => {
                let mut contact: [f64; 3] = std::array::from_fn(|i| start[i] + fraction * (target[i] - start[i]));
                contact[axis] = stop;
                debug!("probe contact at {:?}", contact);
                self.position = contact;
                self.contact = Some(contact);
                Ok(())
            }
            None => {
                self.position = target;
                Err(MotionError::Runtime(NO_CONTACT.to_string()))
            }
        }
    }

    fn set_coordinates(&mut self, block: &Block) -> Result<(), MotionError> {
        let system = block.p.unwrap_or(0.0);
        match block.l {
            Some(l) if l == 20.0 && (system == 0.0 || system == 1.0) => {
                for i in 0..3 {
                    if let Some(value) = block.axes[i] {
                        self.offset[i] = self.position[i] - value;
                    }
                }
            }
            Some(l) if l == 2.0 && (system == 0.0 || system == 1.0) => {
                for i in 0..3 {
                    if let Some(value) = block.axes[i] {
                        self.offset[i] = value;
                    }
                }
                if let Some(rotation) = block.r {
                    self.rotation = rotation;
                }
            }
            Some(l) if l == 1.0 => {
                let tool = self.tool_mut(system as i32);
                for i in 0..3 {
                    if let Some(value) = block.axes[i] {
                        tool.offset[i] = value;
                    }
                }
            }
            _ => {
                return Err(MotionError::Runtime(format!(
                    "unsupported G10 L{} P{}",
                    block.l.unwrap_or_default(),
                    system
                )))
            }
        }
        info!("work offset {:?} rotation {}", self.offset, self.rotation);
        Ok(())
    }
}

/// A machine that runs MDI lines against a [`Scene`] instantly. Clones share
/// one machine, so a test can keep a handle while the routines own another.
#[derive(Debug, Clone)]
pub struct SimulatedMachine {
    state: Arc<Mutex<MachineState>>,
    delay: Duration,
}

impl SimulatedMachine {
    pub fn new(scene: Scene) -> Self {
        SimulatedMachine {
            delay: Duration::from_millis(scene.line_delay_ms),
            state: Arc::new(Mutex::new(MachineState::new(scene))),
        }
    }
    fn lock(&self) -> MutexGuard<'_, MachineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
    pub fn machine_position(&self) -> [f64; 3] {
        self.lock().position
    }
    pub fn work_position(&self) -> [f64; 3] {
        self.lock().work_position()
    }
    pub fn work_offset(&self) -> [f64; 3] {
        self.lock().offset
    }
    /// Rotation of the work system in degrees, from `G10 L2 R`.
    pub fn rotation(&self) -> f64 {
        self.lock().rotation
    }
    pub fn is_relative(&self) -> bool {
        self.lock().relative
    }
    pub fn feed(&self) -> f64 {
        self.lock().feed
    }
    pub fn tool(&self, id: i32) -> Option<ToolEntry> {
        self.lock().tools.iter().find(|tool| tool.id == id).copied()
    }
    /// Every line executed so far.
    pub fn log(&self) -> Vec<String> {
        self.lock().log.clone()
    }
    pub fn aborts(&self) -> usize {
        self.lock().aborts
    }
}

#[async_trait]
impl MotionRuntime for SimulatedMachine {
    async fn execute(&mut self, line: &str) -> Result<(), MotionError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.lock().execute(line)
    }
    async fn abort(&mut self) {
        let mut state = self.lock();
        state.aborts += 1;
        state.relative = false;
        state.motion = Motion::Linear;
    }
    async fn probed_position_with_offsets(&mut self) -> Result<[f64; 3], MotionError> {
        let state = self.lock();
        let contact = state.contact.ok_or_else(|| MotionError::Runtime("no probe contact recorded".to_string()))?;
        Ok(std::array::from_fn(|i| contact[i] - state.offset[i]))
    }
    async fn probed_position(&mut self) -> Result<[f64; 3], MotionError> {
        self.lock().contact.ok_or_else(|| MotionError::Runtime("no probe contact recorded".to_string()))
    }
}

impl MachineStatus for SimulatedMachine {
    fn position(&self) -> [f64; 3] {
        self.machine_position()
    }
    fn is_metric(&self) -> bool {
        self.lock().scene.metric
    }
    fn axis_limits(&self, axis: Axis) -> Option<(f64, f64)> {
        self.lock().scene.limits(axis)
    }
}

impl CanonStatus for SimulatedMachine {
    fn tool_table(&self) -> Option<Vec<ToolEntry>> {
        Some(self.lock().tools.clone())
    }
    fn angular_units(&self) -> Option<f64> {
        Some(1.0)
    }
    fn linear_units(&self) -> Option<f64> {
        Some(if self.lock().scene.metric { 1.0 } else { 1.0 / 25.4 })
    }
    fn axis_mask(&self) -> Option<u32> {
        Some(0b111)
    }
    fn block_delete(&self) -> Option<bool> {
        Some(false)
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::scene::{Facing, Surface};

    fn run(machine: &SimulatedMachine, line: &str) -> Result<(), MotionError> {
        machine.lock().execute(line)
    }

    fn is_close(a: [f64; 3], b: [f64; 3]) -> bool {
        a.iter().zip(b.iter()).all(|(a, b)| (a - b).abs() < 1e-9)
    }

    #[test]
    pub fn test_absolute_relative_and_machine_moves() {
        let machine = SimulatedMachine::new(Scene { work_offset: [10.0, 0.0, -5.0], ..Default::default() });
        run(&machine, "G1 X1 Y2 Z3 F500").unwrap();
        assert!(is_close(machine.machine_position(), [11.0, 2.0, -2.0]));
        assert!(is_close(machine.work_position(), [1.0, 2.0, 3.0]));
        assert_eq!(machine.feed(), 500.0);
        run(&machine, "G91").unwrap();
        run(&machine, "G1 X-1").unwrap();
        assert!(is_close(machine.work_position(), [0.0, 2.0, 3.0]));
        run(&machine, "G90").unwrap();
        run(&machine, "G53 G1 Z0").unwrap();
        assert!(is_close(machine.machine_position(), [10.0, 2.0, 0.0]));
        assert!(!machine.is_relative());
    }

    #[test]
    pub fn test_named_parameters() {
        let machine = SimulatedMachine::new(Scene { position: [4.0, 0.0, 0.0], ..Default::default() });
        run(&machine, "#<x> = #<_x>").unwrap();
        run(&machine, "G1 X9").unwrap();
        run(&machine, "G1 X#<x>").unwrap();
        assert!(is_close(machine.machine_position(), [4.0, 0.0, 0.0]));
        assert_eq!(
            run(&machine, "G1 X#<nowhere>"),
            Err(MotionError::Runtime("unknown parameter #<nowhere>".into()))
        );
    }

    #[test]
    pub fn test_probe_stops_at_surface() {
        let scene = Scene {
            surfaces: vec![Surface::new(Axis::X, 10.0, Facing::Minus), Surface::new(Axis::X, 5.0, Facing::Plus)],
            ..Default::default()
        };
        let machine = SimulatedMachine::new(scene);
        run(&machine, "G38.2 X20 F100").unwrap();
        assert!(is_close(machine.machine_position(), [9.0, 0.0, 0.0]));
        // the face at 5 points toward +X, so moving back past it is free
        run(&machine, "G1 X0").unwrap();
        assert_eq!(
            run(&machine, "G38.2 X3"),
            Err(MotionError::Runtime(NO_CONTACT.into()))
        );
        assert!(is_close(machine.machine_position(), [3.0, 0.0, 0.0]));
    }

    #[test]
    pub fn test_set_work_offset() {
        let machine = SimulatedMachine::new(Scene { position: [3.0, 4.0, 5.0], ..Default::default() });
        run(&machine, "G10 L20 P0 X1 Z0").unwrap();
        assert!(is_close(machine.work_offset(), [2.0, 0.0, 5.0]));
        run(&machine, "G10 L20 P0 Z[#<_abs_z>]").unwrap();
        assert!(is_close(machine.work_offset(), [2.0, 0.0, 0.0]));
        run(&machine, "G10 L2 P0 X7 Y8 R1.5").unwrap();
        assert!(is_close(machine.work_offset(), [7.0, 8.0, 0.0]));
        assert_eq!(machine.rotation(), 1.5);
        assert!(run(&machine, "G10 L20 P2 X0").is_err());
    }

    #[test]
    pub fn test_tool_table_update() {
        let machine = SimulatedMachine::new(Scene { current_tool: 4, ..Default::default() });
        run(&machine, "G10 L1 P#5400 Z[-12.5]").unwrap();
        assert_eq!(machine.tool(4).map(|tool| tool.offset[2]), Some(-12.5));
        assert_eq!(machine.tool_table().map(|tools| tools.len()), Some(1));
    }

    #[test]
    pub fn test_injected_failure() {
        let machine = SimulatedMachine::new(Scene { fail_at: Some(2), ..Default::default() });
        run(&machine, "G90").unwrap();
        assert_eq!(run(&machine, "G90"), Err(MotionError::Failed(1)));
        assert_eq!(machine.log(), vec!["G90".to_string(), "G90".to_string()]);
    }

    #[test]
    pub fn test_soft_limits() {
        let machine = SimulatedMachine::new(Scene { limits: [Some([-5.0, 5.0]), None, None], ..Default::default() });
        assert!(run(&machine, "G1 X6").is_err());
        assert!(run(&machine, "G1 Y600").is_ok());
        assert_eq!(machine.axis_limits(Axis::X), Some((-5.0, 5.0)));
    }
}
