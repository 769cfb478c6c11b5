use std::time::Duration;

use async_trait::async_trait;
use helm_interp::{
    ExecutionTarget, InterpreterConfig, RecordingTarget, SensorReadings, SimConfig,
    SimulatedTarget, TargetError, TargetKind, TargetOp,
};
use helm_ir::{
    BytecodeInstruction, ExecutionMode, ManualClock, MotorAction, MotorTarget, OutputFrame,
    SensorTarget, StateTransition,
};
use helm_sim2real::{
    BytecodeTrace, Divergence, RunnerConfig, RunnerError, RunnerMode, Sim2RealRunner,
};

type RecordingRunner = Sim2RealRunner<RecordingTarget, RecordingTarget>;

/// Hardware stand-in whose waits take real time.
struct SlowTarget(RecordingTarget);

#[async_trait]
impl ExecutionTarget for SlowTarget {
    async fn set_motors(
        &mut self,
        target: MotorTarget,
        action: MotorAction,
        speed: f64,
        duration_ms: Option<u64>,
    ) -> Result<(), TargetError> {
        self.0.set_motors(target, action, speed, duration_ms).await
    }

    async fn stop_motors(&mut self) -> Result<(), TargetError> {
        self.0.stop_motors().await
    }

    async fn set_led(
        &mut self,
        r: u8,
        g: u8,
        b: u8,
        duration_ms: Option<u64>,
    ) -> Result<(), TargetError> {
        self.0.set_led(r, g, b, duration_ms).await
    }

    async fn read_sensors(&mut self, target: SensorTarget) -> Result<SensorReadings, TargetError> {
        self.0.read_sensors(target).await
    }

    async fn wait(&mut self, duration_ms: u64) -> Result<(), TargetError> {
        tokio::time::sleep(Duration::from_millis(duration_ms)).await;
        self.0.wait(duration_ms).await
    }
}

fn paired(mode: RunnerMode) -> (RecordingRunner, RecordingTarget, RecordingTarget) {
    let sim = RecordingTarget::new().with_kind(TargetKind::Simulation);
    let phys = RecordingTarget::new();
    let (sim_handle, phys_handle) = (sim.clone(), phys.clone());
    let runner = Sim2RealRunner::new(sim, Some(phys), RunnerConfig::default().with_mode(mode))
        .with_clock(ManualClock::new(0).shared());
    (runner, sim_handle, phys_handle)
}

fn patrol_frame(n: u64) -> OutputFrame {
    OutputFrame::new(vec![
        BytecodeInstruction::motor_for(MotorTarget::Both, MotorAction::Forward, 120.0, 100),
        BytecodeInstruction::led(0, 80, 0),
        BytecodeInstruction::wait(20),
    ])
    .with_id(format!("frame-{n:04}"))
}

#[tokio::test]
async fn test_identical_targets_are_equivalent() {
    let (mut runner, sim, phys) = paired(RunnerMode::Both);
    let outcome = runner.execute_frame(&patrol_frame(1)).await.unwrap();

    let comparison = outcome.comparison.unwrap();
    assert!(comparison.equivalent);
    assert_eq!(outcome.simulation, outcome.physical);
    assert_eq!(sim.total_calls(), 3);
    assert_eq!(phys.total_calls(), 3);
}

#[tokio::test]
async fn test_physical_failure_diverges() {
    let (mut runner, _, phys) = paired(RunnerMode::Both);
    phys.fail_on(TargetOp::SetLed, TargetError::Io("led driver".into()));

    let outcome = runner.execute_frame(&patrol_frame(1)).await.unwrap();
    assert!(outcome.is_divergent());
    let comparison = outcome.comparison.unwrap();
    assert!(matches!(comparison.divergence, Some(Divergence::Executed { .. })));
    assert!(comparison
        .divergence_reason
        .unwrap()
        .starts_with("Executed instructions differ"));
}

#[tokio::test]
async fn test_single_leg_modes() {
    let (mut runner, sim, phys) = paired(RunnerMode::Simulation);
    let outcome = runner.execute_frame(&patrol_frame(1)).await.unwrap();
    assert!(outcome.simulation.is_some());
    assert!(outcome.physical.is_none());
    assert!(outcome.comparison.is_none());
    assert_eq!(phys.total_calls(), 0);

    runner.set_mode(RunnerMode::Physical);
    let outcome = runner.execute_frame(&patrol_frame(2)).await.unwrap();
    assert!(outcome.simulation.is_none());
    assert!(outcome.physical.is_some());
    assert_eq!(sim.total_calls(), 3);
    assert_eq!(phys.total_calls(), 3);
}

#[tokio::test]
async fn test_physical_mode_requires_target() {
    let sim = RecordingTarget::new();
    let mut runner: RecordingRunner =
        Sim2RealRunner::new(sim, None, RunnerConfig::default().with_mode(RunnerMode::Physical));
    let err = runner.execute_frame(&patrol_frame(1)).await.unwrap_err();
    assert!(matches!(
        err,
        RunnerError::PhysicalTargetMissing(RunnerMode::Physical)
    ));
}

#[tokio::test]
async fn test_broken_physical_target_propagates() {
    let (mut runner, _, phys) = paired(RunnerMode::Both);
    phys.fail_on(TargetOp::Wait, TargetError::Broken("usb detached".into()));
    let err = runner.execute_frame(&patrol_frame(1)).await.unwrap_err();
    assert!(matches!(err, RunnerError::Physical(_)));
}

#[tokio::test]
async fn test_motor_runtime_divergence_when_physical_does_not_drive() {
    // The simulated leg spends 500 simulated ms driving. The stand-in physical
    // target returns at once, so its wall-clock runtime stays near zero.
    let sim_clock = ManualClock::new(0);
    let sim = SimulatedTarget::new(SimConfig::default(), sim_clock.clone());
    let mut runner = Sim2RealRunner::new(
        sim,
        Some(RecordingTarget::new()),
        RunnerConfig::default().with_mode(RunnerMode::Both),
    )
    .with_clock(sim_clock.shared());

    let frame = OutputFrame::new(vec![
        BytecodeInstruction::motor(MotorTarget::Both, MotorAction::Forward, 100.0),
        BytecodeInstruction::wait(500),
        BytecodeInstruction::stop(),
    ]);
    let outcome = runner.execute_frame(&frame).await.unwrap();
    let comparison = outcome.comparison.unwrap();

    assert!(!comparison.equivalent);
    match comparison.divergence {
        Some(Divergence::MotorRuntime {
            simulation,
            physical,
            tolerance,
        }) => {
            assert_eq!(simulation, 500);
            assert!(physical < tolerance, "physical = {physical}");
        }
        other => panic!("expected runtime divergence, got {other:?}"),
    }
}

#[tokio::test]
async fn test_physical_runtime_limit_uses_wall_time() {
    let config = RunnerConfig {
        mode: RunnerMode::Physical,
        interpreter: InterpreterConfig::default().with_max_motor_runtime(300),
        ..Default::default()
    };
    let robot = RecordingTarget::new();
    let mut runner = Sim2RealRunner::new(
        RecordingTarget::new().with_kind(TargetKind::Simulation),
        Some(SlowTarget(robot.clone())),
        config,
    )
    .with_clock(ManualClock::new(0).shared());

    let frame = OutputFrame::new(vec![
        BytecodeInstruction::motor(MotorTarget::Both, MotorAction::Forward, 100.0),
        BytecodeInstruction::wait(200),
        BytecodeInstruction::stop(),
    ]);
    for _ in 0..2 {
        let outcome = runner.execute_frame(&frame).await.unwrap();
        assert_eq!(outcome.physical.unwrap().executed, vec![0, 1, 2]);
    }
    assert!(runner.physical().unwrap().motor_runtime() >= 400);

    let outcome = runner.execute_frame(&frame).await.unwrap();
    let result = outcome.physical.unwrap();
    assert_eq!(result.executed, vec![1, 2]);
    assert!(result.errors[0].contains("Motor runtime limit reached"));
    assert_eq!(robot.call_count(TargetOp::SetMotors), 2);
}

#[tokio::test]
async fn test_atomic_abort_keeps_transition_but_diverges() {
    let (mut runner, _, phys) = paired(RunnerMode::Both);
    phys.fail_on(TargetOp::Wait, TargetError::Timeout(30));
    let frame = OutputFrame::new(vec![BytecodeInstruction::composite(
        vec![
            BytecodeInstruction::StateTransition(StateTransition {
                mode: Some(ExecutionMode::Exploring),
                ..Default::default()
            }),
            BytecodeInstruction::wait(10),
        ],
        true,
    )]);
    let outcome = runner.execute_frame(&frame).await.unwrap();
    // Physical aborts after the transition, so the mode still changes on
    // both sides and the first difference is the executed set.
    let comparison = outcome.comparison.unwrap();
    assert!(matches!(comparison.divergence, Some(Divergence::Executed { .. })));
    assert_eq!(
        outcome.physical.unwrap().state_changes.mode,
        Some(ExecutionMode::Exploring)
    );
}

// ── Tracing ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_trace_eviction_keeps_latest_entries() {
    let sim = RecordingTarget::new().with_kind(TargetKind::Simulation);
    let config = RunnerConfig {
        mode: RunnerMode::Both,
        max_trace_entries: 4,
        ..Default::default()
    };
    let mut runner = Sim2RealRunner::new(sim, Some(RecordingTarget::new()), config);

    let id = runner.start_trace().unwrap();
    assert_eq!(id, "trace-0001");
    for n in 0..5 {
        runner.execute_frame(&patrol_frame(n)).await.unwrap();
    }
    let trace = runner.end_trace().unwrap();

    assert_eq!(trace.len(), 4);
    assert_eq!(trace.evicted(), 6);
    let ids: Vec<_> = trace
        .entries()
        .map(|e| (e.frame.id.clone().unwrap(), e.target))
        .collect();
    assert_eq!(
        ids,
        vec![
            ("frame-0003".to_string(), TargetKind::Simulation),
            ("frame-0003".to_string(), TargetKind::Physical),
            ("frame-0004".to_string(), TargetKind::Simulation),
            ("frame-0004".to_string(), TargetKind::Physical),
        ]
    );
    assert!(trace.is_ended());
    assert!(!runner.is_tracing());
}

#[tokio::test]
async fn test_trace_entries_carry_target_kind() {
    // A second simulator standing in as the physical leg.
    let config = RunnerConfig::default().with_mode(RunnerMode::Both);
    let mut runner = Sim2RealRunner::new(
        RecordingTarget::new().with_kind(TargetKind::Simulation),
        Some(RecordingTarget::new().with_kind(TargetKind::Simulation)),
        config,
    );
    runner.start_trace().unwrap();
    runner.execute_frame(&patrol_frame(0)).await.unwrap();
    let trace = runner.end_trace().unwrap();

    let kinds: Vec<_> = trace.entries().map(|e| e.target).collect();
    assert_eq!(kinds, vec![TargetKind::Simulation, TargetKind::Simulation]);
}

#[tokio::test]
async fn test_trace_lifecycle_errors() {
    let (mut runner, _, _) = paired(RunnerMode::Simulation);
    assert!(matches!(runner.end_trace(), Err(RunnerError::Trace(_))));

    runner.start_trace().unwrap();
    assert!(matches!(runner.start_trace(), Err(RunnerError::Trace(_))));
    runner.end_trace().unwrap();

    assert_eq!(runner.start_trace().unwrap(), "trace-0002");
}

#[tokio::test]
async fn test_frames_outside_trace_not_recorded() {
    let (mut runner, _, _) = paired(RunnerMode::Simulation);
    runner.execute_frame(&patrol_frame(0)).await.unwrap();
    runner.start_trace().unwrap();
    runner.execute_frame(&patrol_frame(1)).await.unwrap();
    let trace = runner.end_trace().unwrap();
    assert_eq!(trace.len(), 1);
}

#[tokio::test]
async fn test_trace_text_roundtrip() {
    let (mut runner, _, _) = paired(RunnerMode::Both);
    runner.start_trace().unwrap();
    runner.execute_frame(&patrol_frame(7)).await.unwrap();
    let trace = runner.end_trace().unwrap();

    let text = trace.to_json_string().unwrap();
    let restored = BytecodeTrace::from_json_str(&text).unwrap();
    assert_eq!(restored, trace);
    assert_eq!(restored.mode(), RunnerMode::Both);
}

// ── Certification ────────────────────────────────────────────────────

#[tokio::test]
async fn test_certify_clean_run() {
    let (mut runner, _, _) = paired(RunnerMode::Simulation);
    let frames: Vec<_> = (0..4).map(patrol_frame).collect();
    let report = runner.certify(&frames).await.unwrap();

    assert_eq!(report.frames_run, 4);
    assert!(report.certified);
    assert!(report.divergences.is_empty());
    assert_eq!(runner.mode(), RunnerMode::Simulation);
}

#[tokio::test]
async fn test_certify_lists_divergent_frames() {
    let (mut runner, _, phys) = paired(RunnerMode::Both);
    let frames: Vec<_> = (0..3).map(patrol_frame).collect();

    phys.fail_once(TargetOp::SetLed, TargetError::Rejected("busy".into()));
    let report = runner.certify(&frames).await.unwrap();

    assert!(!report.certified);
    assert_eq!(report.divergences.len(), 1);
    assert_eq!(report.divergences[0].frame_index, 0);
    assert_eq!(report.divergences[0].frame_id.as_deref(), Some("frame-0000"));
}

#[tokio::test]
async fn test_certify_requires_physical() {
    let mut runner: RecordingRunner =
        Sim2RealRunner::new(RecordingTarget::new(), None, RunnerConfig::default());
    let err = runner.certify(&[patrol_frame(0)]).await.unwrap_err();
    assert!(matches!(err, RunnerError::PhysicalTargetMissing(RunnerMode::Both)));
}
