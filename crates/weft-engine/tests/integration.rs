//! Integration tests for the weft execution engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use serde_json::json;
use tokio::time::sleep;

use weft_engine::{ChannelNotifier, ExecutionEvent, ValidationError, WorkflowExecution};
use weft_workflow::{
  ComponentKind, Decision, ExecutionState, InputValue, ResolvedInputs, Step, StepError, StepGroup,
  StepOutputs, Subflow, Trigger, TriggerError, Workflow, WorkflowState,
};

/// A step producing a single `key: value` output.
fn value_step(name: &str, key: &str, value: serde_json::Value) -> Step {
  let key = key.to_string();
  Step::new(name, move |_| {
    let key = key.clone();
    let value = value.clone();
    async move { Ok(StepOutputs::from([(key, value)])) }
  })
}

/// A step that fails with the given message.
fn failing_step(name: &str, message: &'static str) -> Step {
  Step::new(name, move |_| async move { Err(StepError::new(message)) })
}

/// A step that records it ran.
fn flag_step(name: &str, flag: Arc<AtomicBool>) -> Step {
  Step::new(name, move |_| {
    let flag = flag.clone();
    async move {
      flag.store(true, Ordering::SeqCst);
      Ok(StepOutputs::new())
    }
  })
}

/// A step echoing one resolved input into its `echo` output.
fn echo_step(name: &str, input_key: &'static str, input: InputValue) -> Step {
  Step::new(name, move |inputs: ResolvedInputs| async move {
    let value = inputs
      .get(input_key)
      .cloned()
      .ok_or_else(|| StepError::missing_input(input_key))?;
    Ok(StepOutputs::from([("echo".to_string(), value)]))
  })
  .with_input(input_key, input)
}

#[tokio::test]
async fn outputs_are_namespaced_by_step_name() {
  let workflow = Workflow::builder("wf")
    .component(value_step("T", "k", json!("v")))
    .build();

  let outcome = WorkflowExecution::new(workflow).wait().await.unwrap();
  assert_eq!(outcome.state, WorkflowState::Completed);
  assert_eq!(outcome.outputs["T.k"], json!("v"));
}

#[tokio::test]
async fn reference_resolves_against_prior_output() {
  let workflow = Workflow::builder("wf")
    .component(value_step("A", "result", json!("ok")))
    .component(echo_step("B", "prev", InputValue::reference("{A.result}")))
    .build();

  let outcome = WorkflowExecution::new(workflow).wait().await.unwrap();
  assert_eq!(outcome.state, WorkflowState::Completed);
  assert_eq!(outcome.outputs["B.echo"], json!("ok"));
}

#[tokio::test]
async fn reference_default_fills_missing_output() {
  let workflow = Workflow::builder("wf")
    .component(value_step("A", "result", json!("ok")))
    .component(echo_step(
      "B",
      "prev",
      InputValue::reference_or("{A.other}", "fallback"),
    ))
    .build();

  let outcome = WorkflowExecution::new(workflow).wait().await.unwrap();
  assert_eq!(outcome.state, WorkflowState::Completed);
  assert_eq!(outcome.outputs["B.echo"], json!("fallback"));
}

#[tokio::test]
async fn unresolvable_input_without_default_fails_the_step() {
  let workflow = Workflow::builder("wf")
    .component(value_step("A", "result", json!("ok")))
    .component(echo_step("B", "prev", InputValue::reference("{A.other}")))
    .build();

  let outcome = WorkflowExecution::new(workflow).wait().await.unwrap();
  assert_eq!(outcome.state, WorkflowState::Failed);
  let report_b = outcome.report.child("B").unwrap();
  assert_eq!(report_b.state, ExecutionState::Failed);
  assert_eq!(
    report_b.error.as_deref(),
    Some("missing required input 'prev'")
  );
}

#[tokio::test]
async fn sequential_group_stops_at_first_failure() {
  let ran_b = Arc::new(AtomicBool::new(false));
  let group = StepGroup::sequential("pair")
    .with_child(failing_step("A", "boom"))
    .with_child(flag_step("B", ran_b.clone()));
  let workflow = Workflow::builder("wf").component(group).build();

  let outcome = WorkflowExecution::new(workflow).wait().await.unwrap();

  assert_eq!(outcome.state, WorkflowState::Failed);
  assert!(!ran_b.load(Ordering::SeqCst), "B must never execute");

  let group_report = outcome.report.child("pair").unwrap();
  assert_eq!(group_report.state, ExecutionState::Failed);
  assert_eq!(
    group_report.child("A").unwrap().state,
    ExecutionState::Failed
  );
  assert!(group_report.child("B").is_none(), "no record for B");
}

#[tokio::test]
async fn parallel_group_cancels_siblings_on_failure() {
  let slow_finished = Arc::new(AtomicBool::new(false));
  let finished = slow_finished.clone();
  let slow = Step::new("slow", move |_| {
    let finished = finished.clone();
    async move {
      sleep(Duration::from_secs(5)).await;
      finished.store(true, Ordering::SeqCst);
      Ok(StepOutputs::new())
    }
  });
  let fail_fast = Step::new("fail-fast", |_| async {
    sleep(Duration::from_millis(20)).await;
    Err(StepError::new("boom"))
  });

  let group = StepGroup::parallel("fanout")
    .with_child(fail_fast)
    .with_child(slow);
  let workflow = Workflow::builder("wf").component(group).build();

  let started = Instant::now();
  let outcome = WorkflowExecution::new(workflow).wait().await.unwrap();

  assert_eq!(outcome.state, WorkflowState::Failed);
  assert!(
    started.elapsed() < Duration::from_secs(2),
    "slow sibling must be cancelled, not awaited"
  );
  assert!(!slow_finished.load(Ordering::SeqCst));

  let group_report = outcome.report.child("fanout").unwrap();
  assert_eq!(group_report.state, ExecutionState::Failed);
  assert_eq!(
    group_report.child("fail-fast").unwrap().state,
    ExecutionState::Failed
  );
  assert_eq!(
    group_report.child("slow").unwrap().state,
    ExecutionState::Canceled
  );
}

#[tokio::test]
async fn parallel_group_merges_all_outputs() {
  let group = StepGroup::parallel("fanout")
    .with_child(value_step("A", "k", json!(1)))
    .with_child(value_step("B", "k", json!(2)));
  let workflow = Workflow::builder("wf")
    .component(group)
    .component(echo_step("after", "prev", InputValue::reference("{A.k}")))
    .build();

  let outcome = WorkflowExecution::new(workflow).wait().await.unwrap();
  assert_eq!(outcome.state, WorkflowState::Completed);
  assert_eq!(outcome.outputs["A.k"], json!(1));
  assert_eq!(outcome.outputs["B.k"], json!(2));
  // Group outputs are visible to components after the group.
  assert_eq!(outcome.outputs["after.echo"], json!(1));
}

#[tokio::test]
async fn cancel_unwinds_a_sleeping_step() {
  let workflow = Workflow::builder("wf")
    .component(Step::new("sleeper", |_| async {
      sleep(Duration::from_secs(5)).await;
      Ok(StepOutputs::from([("woke".to_string(), json!(true))]))
    }))
    .build();

  let execution = WorkflowExecution::new(workflow);
  let handle = execution.handle();
  let run = tokio::spawn(execution.wait());

  sleep(Duration::from_millis(100)).await;
  handle.cancel().unwrap();

  let outcome = run.await.unwrap().unwrap();
  assert_eq!(outcome.state, WorkflowState::Canceled);
  assert!(outcome.outputs.is_empty());
  assert_eq!(
    outcome.report.child("sleeper").unwrap().state,
    ExecutionState::Canceled
  );
}

#[tokio::test]
async fn cancel_wins_while_paused() {
  let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
  let ran_b = Arc::new(AtomicBool::new(false));

  let a = Step::new("A", move |_| {
    let tx = tx.clone();
    async move {
      let _ = tx.send(());
      sleep(Duration::from_millis(200)).await;
      Ok(StepOutputs::new())
    }
  });
  let workflow = Workflow::builder("wf")
    .component(a)
    .component(flag_step("B", ran_b.clone()))
    .build();

  let execution = WorkflowExecution::new(workflow);
  let handle = execution.handle();
  let run = tokio::spawn(execution.wait());

  // Pause while A is still mid-flight, then let A finish into the hold.
  rx.recv().await.unwrap();
  handle.pause().unwrap();
  sleep(Duration::from_millis(400)).await;
  assert_eq!(handle.state(), WorkflowState::Paused);

  handle.cancel().unwrap();
  let outcome = run.await.unwrap().unwrap();

  assert_eq!(outcome.state, WorkflowState::Canceled);
  assert!(!ran_b.load(Ordering::SeqCst), "B must not start after pause");
}

#[tokio::test]
async fn cancel_wins_while_trigger_is_waiting() {
  let trigger = Trigger::new("stalled", || async {
    sleep(Duration::from_secs(30)).await;
    Ok(Vec::new())
  });
  let workflow = Workflow::builder("wf").component(trigger).build();

  let execution = WorkflowExecution::new(workflow);
  let handle = execution.handle();
  let run = tokio::spawn(execution.wait());

  sleep(Duration::from_millis(100)).await;
  handle.cancel().unwrap();

  let outcome = run.await.unwrap().unwrap();
  assert_eq!(outcome.state, WorkflowState::Canceled);
  assert_eq!(
    outcome.report.child("stalled").unwrap().state,
    ExecutionState::Canceled
  );
}

fn build_pausable_workflow(tx: tokio::sync::mpsc::UnboundedSender<()>) -> Workflow {
  let a = Step::new("A", move |_| {
    let tx = tx.clone();
    async move {
      let _ = tx.send(());
      sleep(Duration::from_millis(100)).await;
      Ok(StepOutputs::from([("x".to_string(), json!(1))]))
    }
  });
  Workflow::builder("wf")
    .component(a)
    .component(echo_step("B", "prev", InputValue::reference("{A.x}")))
    .build()
}

#[tokio::test]
async fn pause_and_resume_match_an_unpaused_run() {
  // Baseline: no pause.
  let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
  let baseline = WorkflowExecution::new(build_pausable_workflow(tx))
    .wait()
    .await
    .unwrap();
  assert_eq!(baseline.state, WorkflowState::Completed);

  // Same component list, paused before B and resumed later.
  let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
  let execution = WorkflowExecution::new(build_pausable_workflow(tx));
  let handle = execution.handle();
  let run = tokio::spawn(execution.wait());

  rx.recv().await.unwrap();
  handle.pause().unwrap();
  sleep(Duration::from_millis(300)).await;
  assert_eq!(handle.state(), WorkflowState::Paused);
  handle.resume().unwrap();

  let paused = run.await.unwrap().unwrap();
  assert_eq!(paused.state, baseline.state);
  assert_eq!(paused.outputs, baseline.outputs);
}

/// A trigger that fires `limit` times, each firing splicing one result step
/// plus a re-armed clone of itself, then terminates with an empty firing.
fn polling_trigger(counter: Arc<AtomicUsize>, limit: usize) -> Trigger {
  Trigger::new("poll", move || {
    let counter = counter.clone();
    async move {
      let n = counter.fetch_add(1, Ordering::SeqCst);
      if n >= limit {
        return Ok(Vec::new());
      }
      let result = value_step(&format!("tick-{n}"), "seq", json!(n));
      Ok(vec![
        result.into(),
        polling_trigger(counter.clone(), limit).into(),
      ])
    }
  })
}

#[tokio::test]
async fn trigger_rearms_exactly_n_times() {
  const N: usize = 3;
  let counter = Arc::new(AtomicUsize::new(0));
  let workflow = Workflow::builder("wf")
    .component(polling_trigger(counter.clone(), N))
    .component(value_step("done", "ok", json!(true)))
    .build();

  let outcome = WorkflowExecution::new(workflow).wait().await.unwrap();
  assert_eq!(outcome.state, WorkflowState::Completed);

  // Exactly N result outputs, no extra firing.
  for n in 0..N {
    assert_eq!(outcome.outputs[&format!("tick-{n}.seq")], json!(n));
  }
  assert!(!outcome.outputs.contains_key(&format!("tick-{N}.seq")));
  assert_eq!(counter.load(Ordering::SeqCst), N + 1);

  // One record per await: N firings plus the terminating empty one, all
  // ahead of the component declared after the trigger.
  assert_eq!(outcome.report.children_named("poll").count(), N + 1);
  let names: Vec<&str> = outcome
    .report
    .child_reports
    .as_ref()
    .unwrap()
    .iter()
    .map(|r| r.name.as_str())
    .collect();
  assert_eq!(
    names,
    [
      "poll", "tick-0", "poll", "tick-1", "poll", "tick-2", "poll", "done"
    ]
  );
}

#[tokio::test]
async fn trigger_error_fails_the_workflow() {
  let trigger = Trigger::new("broken", || async {
    Err(TriggerError::new("poll endpoint unreachable"))
  });
  let workflow = Workflow::builder("wf").component(trigger).build();

  let outcome = WorkflowExecution::new(workflow).wait().await.unwrap();
  assert_eq!(outcome.state, WorkflowState::Failed);
  assert_eq!(
    outcome.report.child("broken").unwrap().state,
    ExecutionState::Failed
  );
}

#[tokio::test]
async fn decision_splices_its_branch_before_the_rest() {
  let decision = Decision::new("route", || async {
    Ok(vec![value_step("chosen", "v", json!("yes")).into()])
  });
  let workflow = Workflow::builder("wf")
    .component(decision)
    .component(value_step("after", "v", json!("later")))
    .build();

  let outcome = WorkflowExecution::new(workflow).wait().await.unwrap();
  assert_eq!(outcome.state, WorkflowState::Completed);
  assert_eq!(outcome.outputs["chosen.v"], json!("yes"));

  let names: Vec<&str> = outcome
    .report
    .child_reports
    .as_ref()
    .unwrap()
    .iter()
    .map(|r| r.name.as_str())
    .collect();
  assert_eq!(names, ["route", "chosen", "after"]);
}

#[tokio::test]
async fn subflow_outputs_merge_unprefixed_into_the_parent() {
  let inner = Workflow::builder("inner")
    .component(value_step("X", "r", json!(1)))
    .build();
  let workflow = Workflow::builder("wf")
    .component(Subflow::new("sub", inner))
    .component(echo_step("after", "prev", InputValue::reference("{X.r}")))
    .build();

  let outcome = WorkflowExecution::new(workflow).wait().await.unwrap();
  assert_eq!(outcome.state, WorkflowState::Completed);
  assert_eq!(outcome.outputs["X.r"], json!(1));
  assert_eq!(outcome.outputs["after.echo"], json!(1));

  // Provenance survives in the report even though output keys are flat.
  let sub = outcome.report.child("sub").unwrap();
  assert_eq!(sub.component_type, ComponentKind::Subflow);
  let x = sub.child("X").unwrap();
  assert_eq!(x.state, ExecutionState::Completed);
}

#[tokio::test]
async fn subflow_failure_propagates_to_the_parent() {
  let inner = Workflow::builder("inner")
    .component(failing_step("X", "boom"))
    .build();
  let ran_after = Arc::new(AtomicBool::new(false));
  let workflow = Workflow::builder("wf")
    .component(Subflow::new("sub", inner))
    .component(flag_step("after", ran_after.clone()))
    .build();

  let outcome = WorkflowExecution::new(workflow).wait().await.unwrap();
  assert_eq!(outcome.state, WorkflowState::Failed);
  assert!(!ran_after.load(Ordering::SeqCst));
  assert_eq!(
    outcome.report.child("sub").unwrap().state,
    ExecutionState::Failed
  );
}

#[tokio::test]
async fn validation_rejects_duplicate_names_before_running() {
  let ran = Arc::new(AtomicBool::new(false));
  let workflow = Workflow::builder("wf")
    .component(flag_step("X", ran.clone()))
    .component(value_step("X", "k", json!(1)))
    .build();

  let err = WorkflowExecution::new(workflow).wait().await.unwrap_err();
  assert!(matches!(
    err,
    ValidationError::DuplicateName { name, .. } if name == "X"
  ));
  assert!(!ran.load(Ordering::SeqCst), "nothing may run");
}

#[tokio::test]
async fn validation_rejects_forward_references() {
  let workflow = Workflow::builder("wf")
    .component(echo_step("B", "prev", InputValue::reference("{A.k}")))
    .component(value_step("A", "k", json!(1)))
    .build();

  let err = WorkflowExecution::new(workflow).wait().await.unwrap_err();
  assert!(matches!(err, ValidationError::UnknownReference { .. }));
}

#[tokio::test]
async fn events_arrive_in_execution_order() {
  let workflow = Workflow::builder("wf")
    .component(value_step("A", "k", json!(1)))
    .component(value_step("B", "k", json!(2)))
    .build();

  let (notifier, mut events) = ChannelNotifier::channel();
  let outcome = WorkflowExecution::with_notifier(workflow, notifier)
    .wait()
    .await
    .unwrap();
  assert_eq!(outcome.state, WorkflowState::Completed);

  let mut labels = Vec::new();
  while let Ok(event) = events.try_recv() {
    labels.push(match event {
      ExecutionEvent::WorkflowStarted { .. } => "workflow_started".to_string(),
      ExecutionEvent::WorkflowCompleted { .. } => "workflow_completed".to_string(),
      ExecutionEvent::ComponentStarted { component, .. } => format!("started:{component}"),
      ExecutionEvent::ComponentCompleted { component, .. } => format!("completed:{component}"),
      other => format!("{other:?}"),
    });
  }
  assert_eq!(
    labels,
    [
      "workflow_started",
      "started:A",
      "completed:A",
      "started:B",
      "completed:B",
      "workflow_completed",
    ]
  );
}

#[tokio::test]
async fn control_calls_outside_their_states_are_rejected() {
  let workflow = Workflow::builder("wf")
    .component(value_step("A", "k", json!(1)))
    .build();
  let execution = WorkflowExecution::new(workflow);
  let handle = execution.handle();

  // Not running yet.
  assert!(handle.pause().is_err());
  assert!(handle.resume().is_err());
  assert!(handle.cancel().is_err());

  let outcome = execution.wait().await.unwrap();
  assert_eq!(outcome.state, WorkflowState::Completed);

  // Terminal: control is over.
  assert!(handle.pause().is_err());
  assert!(handle.cancel().is_err());
}

#[tokio::test]
async fn completed_outputs_survive_a_later_failure() {
  let ran_c = Arc::new(AtomicBool::new(false));
  let workflow = Workflow::builder("wf")
    .component(value_step("A", "k", json!("kept")))
    .component(failing_step("B", "boom"))
    .component(flag_step("C", ran_c.clone()))
    .build();

  let outcome = WorkflowExecution::new(workflow).wait().await.unwrap();

  assert_eq!(outcome.state, WorkflowState::Failed);
  assert_eq!(outcome.outputs["A.k"], json!("kept"));
  assert!(!ran_c.load(Ordering::SeqCst));
  assert!(outcome.report.child("C").is_none());
  assert_eq!(
    outcome.report.child("B").unwrap().error.as_deref(),
    Some("boom")
  );
}

#[tokio::test]
async fn report_root_covers_the_whole_run() {
  let workflow = Workflow::builder("pipeline")
    .component(value_step("A", "k", json!(1)))
    .build();

  let outcome = WorkflowExecution::new(workflow).wait().await.unwrap();
  let report = &outcome.report;
  assert_eq!(report.component_type, ComponentKind::Workflow);
  assert_eq!(report.name, "pipeline");
  assert_eq!(report.state, ExecutionState::Completed);
  assert!(report.execution_time >= report.child("A").unwrap().execution_time);

  let json = serde_json::to_value(report).unwrap();
  assert_eq!(json["child_reports"][0]["name"], "A");
  assert_eq!(json["child_reports"][0]["state"], "completed");
}
