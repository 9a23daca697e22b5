//! Workflow execution.
//!
//! One driving task walks the component queue in declaration order and
//! dispatches each component to its runner. Trigger and decision results are
//! spliced at the front of the queue, so re-arming triggers loop without
//! growing the stack. Parallel groups fan out into spawned tasks that run
//! against a forked snapshot of the output map; the coordinator merges each
//! child's produced outputs back after it settles, keeping the shared map
//! single-writer.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use weft_resolver::{ValidationError, resolve_inputs, validate_workflow};
use weft_workflow::{
  Component, ComponentKind, Decision, ExecutionMode, ExecutionState, Step, StepGroup, Subflow,
  Trigger, Workflow, WorkflowState,
};

use crate::control::{Control, ExecutionHandle};
use crate::error::ComponentError;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::record::ExecutionRecord;
use crate::report::{Report, build_report};

/// The complete observable result of a run: terminal state, merged outputs,
/// and the execution report.
#[derive(Debug, Clone)]
pub struct WorkflowOutcome {
  pub state: WorkflowState,
  /// Merged output map, keyed `"<ComponentName>.<OutputKey>"`. Partial
  /// results from components that completed before a failure or cancellation
  /// are preserved.
  pub outputs: HashMap<String, serde_json::Value>,
  pub report: Report,
}

/// A single run of a workflow.
///
/// Create one per run, grab a control handle if you need pause/resume/cancel,
/// then call `.wait()` to drive the run to a terminal state.
///
/// ```ignore
/// let execution = WorkflowExecution::new(workflow);
/// let handle = execution.handle();
/// let outcome = execution.wait().await?;
/// ```
pub struct WorkflowExecution<N: ExecutionNotifier = NoopNotifier> {
  workflow: Workflow,
  execution_id: String,
  control: Control,
  notifier: Arc<N>,
}

impl WorkflowExecution<NoopNotifier> {
  /// Create an execution with no event observer.
  pub fn new(workflow: Workflow) -> Self {
    Self::with_notifier(workflow, NoopNotifier)
  }
}

impl<N: ExecutionNotifier + 'static> WorkflowExecution<N> {
  /// Create an execution that reports progress to `notifier`.
  pub fn with_notifier(workflow: Workflow, notifier: N) -> Self {
    Self {
      workflow,
      execution_id: uuid::Uuid::new_v4().to_string(),
      control: Control::new(),
      notifier: Arc::new(notifier),
    }
  }

  /// Control handle for this run. Cloneable and usable from any task.
  pub fn handle(&self) -> ExecutionHandle {
    ExecutionHandle::new(self.control.clone())
  }

  pub fn execution_id(&self) -> &str {
    &self.execution_id
  }

  pub fn workflow(&self) -> &Workflow {
    &self.workflow
  }

  /// Drive the run to a terminal state.
  ///
  /// Validates the definition first; a [`ValidationError`] is the only error
  /// surface here. Run failures and cancellations are not errors - they are
  /// terminal states on the returned [`WorkflowOutcome`].
  #[instrument(
    name = "workflow_execute",
    skip(self),
    fields(
      workflow = %self.workflow.name(),
      execution_id = %self.execution_id,
    )
  )]
  pub async fn wait(self) -> Result<WorkflowOutcome, ValidationError> {
    validate_workflow(&self.workflow)?;

    let started = Instant::now();
    self.control.set_state(WorkflowState::Running);
    info!("workflow_started");
    self.notifier.notify(ExecutionEvent::WorkflowStarted {
      execution_id: self.execution_id.clone(),
      workflow: self.workflow.name().to_string(),
    });

    let ctx: Ctx = RunCtx {
      execution_id: self.execution_id.clone(),
      cancel: self.control.cancellation(),
      control: self.control.clone(),
      notifier: self.notifier.clone() as Arc<dyn ExecutionNotifier>,
    };

    let mut scope = OutputScope::default();
    let mut records = Vec::new();
    let result = run_sequence(
      &ctx,
      &mut scope,
      self.workflow.components().to_vec(),
      &mut records,
      true,
    )
    .await;

    let state = match result {
      Ok(()) if ctx.cancel.is_cancelled() => WorkflowState::Canceled,
      Ok(()) => WorkflowState::Completed,
      Err(RunStop::Canceled) => WorkflowState::Canceled,
      Err(RunStop::Failed(err)) => {
        error!(component = %err.component(), error = %err, "workflow_failed");
        self.notifier.notify(ExecutionEvent::WorkflowFailed {
          execution_id: self.execution_id.clone(),
          error: err.to_string(),
        });
        WorkflowState::Failed
      }
    };
    match state {
      WorkflowState::Completed => {
        info!("workflow_completed");
        self.notifier.notify(ExecutionEvent::WorkflowCompleted {
          execution_id: self.execution_id.clone(),
        });
      }
      WorkflowState::Canceled => {
        warn!("workflow_canceled");
        self.notifier.notify(ExecutionEvent::WorkflowCanceled {
          execution_id: self.execution_id.clone(),
        });
      }
      _ => {}
    }
    self.control.set_state(state);

    let report = build_report(self.workflow.name(), state, started.elapsed(), records);
    Ok(WorkflowOutcome {
      state,
      outputs: scope.visible,
      report,
    })
  }
}

/// Everything a component runner needs, cheap to clone into spawned tasks.
struct RunCtx<N: ?Sized + ExecutionNotifier> {
  execution_id: String,
  cancel: CancellationToken,
  control: Control,
  notifier: Arc<N>,
}

type Ctx = RunCtx<dyn ExecutionNotifier>;

impl<N: ?Sized + ExecutionNotifier> Clone for RunCtx<N> {
  fn clone(&self) -> Self {
    Self {
      execution_id: self.execution_id.clone(),
      cancel: self.cancel.clone(),
      control: self.control.clone(),
      notifier: self.notifier.clone(),
    }
  }
}

impl Ctx {
  /// Derive a context whose cancellation scope nests inside this one.
  fn child(&self) -> Ctx {
    RunCtx {
      execution_id: self.execution_id.clone(),
      cancel: self.cancel.child_token(),
      control: self.control.clone(),
      notifier: self.notifier.clone(),
    }
  }

  fn notify(&self, event: ExecutionEvent) {
    self.notifier.notify(event);
  }

  fn component_started(&self, component: &str) {
    self.notify(ExecutionEvent::ComponentStarted {
      execution_id: self.execution_id.clone(),
      component: component.to_string(),
    });
  }

  fn component_completed(&self, component: &str) {
    self.notify(ExecutionEvent::ComponentCompleted {
      execution_id: self.execution_id.clone(),
      component: component.to_string(),
    });
  }

  fn component_failed(&self, component: &str, error: &str) {
    self.notify(ExecutionEvent::ComponentFailed {
      execution_id: self.execution_id.clone(),
      component: component.to_string(),
      error: error.to_string(),
    });
  }

  fn component_canceled(&self, component: &str) {
    self.notify(ExecutionEvent::ComponentCanceled {
      execution_id: self.execution_id.clone(),
      component: component.to_string(),
    });
  }
}

/// Why a sequence stopped early.
enum RunStop {
  Canceled,
  Failed(ComponentError),
}

/// Output map as one scope sees it.
///
/// `visible` is what references resolve against; `produced` is what this
/// scope added and is what a parallel coordinator merges back. At the top
/// level the two coincide.
#[derive(Debug, Default)]
struct OutputScope {
  visible: HashMap<String, serde_json::Value>,
  produced: HashMap<String, serde_json::Value>,
}

impl OutputScope {
  fn insert(&mut self, key: String, value: serde_json::Value) {
    self.visible.insert(key.clone(), value.clone());
    self.produced.insert(key, value);
  }

  /// Snapshot for a parallel child: sees everything produced so far, merges
  /// back only what it produces itself.
  fn fork(&self) -> Self {
    Self {
      visible: self.visible.clone(),
      produced: HashMap::new(),
    }
  }

  fn absorb(&mut self, child: OutputScope) {
    for (key, value) in child.produced {
      self.insert(key, value);
    }
  }
}

/// Run components in order, splicing trigger/decision results at the front.
///
/// `gate_pause` is set for workflow-level sequences (the top-level list and
/// subflow lists): pause holds between components there, while a group pass
/// stays atomic.
async fn run_sequence(
  ctx: &Ctx,
  scope: &mut OutputScope,
  components: Vec<Component>,
  records: &mut Vec<ExecutionRecord>,
  gate_pause: bool,
) -> Result<(), RunStop> {
  let mut queue: VecDeque<Component> = components.into();
  while let Some(component) = queue.pop_front() {
    if ctx.cancel.is_cancelled() {
      return Err(RunStop::Canceled);
    }
    if gate_pause {
      wait_while_paused(ctx).await?;
    }

    let (record, result) = run_component(ctx, scope, component).await;
    records.push(record);
    match result {
      Ok(spliced) => {
        for component in spliced.into_iter().rev() {
          queue.push_front(component);
        }
      }
      Err(stop) => return Err(stop),
    }
  }
  Ok(())
}

/// Hold while the workflow is paused; cancellation wins over resume.
async fn wait_while_paused(ctx: &Ctx) -> Result<(), RunStop> {
  let mut state = ctx.control.subscribe();
  if *state.borrow() != WorkflowState::Paused {
    return Ok(());
  }
  info!(execution_id = %ctx.execution_id, "workflow_paused");
  ctx.notify(ExecutionEvent::WorkflowPaused {
    execution_id: ctx.execution_id.clone(),
  });
  loop {
    tokio::select! {
      _ = ctx.cancel.cancelled() => return Err(RunStop::Canceled),
      changed = state.changed() => {
        if changed.is_err() || *state.borrow() != WorkflowState::Paused {
          break;
        }
      }
    }
  }
  info!(execution_id = %ctx.execution_id, "workflow_resumed");
  ctx.notify(ExecutionEvent::WorkflowResumed {
    execution_id: ctx.execution_id.clone(),
  });
  Ok(())
}

/// Dispatch a component to its runner.
///
/// Returns the execution record for this instance plus any components to
/// splice ahead of the remaining queue (only triggers and decisions yield
/// any). Boxed for recursion through groups and subflows.
fn run_component<'a>(
  ctx: &'a Ctx,
  scope: &'a mut OutputScope,
  component: Component,
) -> BoxFuture<'a, (ExecutionRecord, Result<Vec<Component>, RunStop>)> {
  Box::pin(async move {
    match component {
      Component::Step(step) => {
        let (record, result) = run_step(ctx, scope, step).await;
        (record, result.map(|()| Vec::new()))
      }
      Component::Trigger(trigger) => run_trigger(ctx, trigger).await,
      Component::Decision(decision) => run_decision(ctx, decision).await,
      Component::Group(group) => {
        let (record, result) = run_group(ctx, scope, group).await;
        (record, result.map(|()| Vec::new()))
      }
      Component::Subflow(subflow) => {
        let (record, result) = run_subflow(ctx, scope, subflow).await;
        (record, result.map(|()| Vec::new()))
      }
    }
  })
}

async fn run_step(
  ctx: &Ctx,
  scope: &mut OutputScope,
  step: Step,
) -> (ExecutionRecord, Result<(), RunStop>) {
  let started = Instant::now();
  info!(execution_id = %ctx.execution_id, step = %step.name(), "step_started");
  ctx.component_started(step.name());

  // Resolution happens here, against the output map as it stands right now.
  let resolved = resolve_inputs(step.inputs(), &scope.visible);

  let result = tokio::select! {
    result = step.execute(resolved) => result,
    _ = ctx.cancel.cancelled() => {
      warn!(execution_id = %ctx.execution_id, step = %step.name(), "step_canceled");
      ctx.component_canceled(step.name());
      let record = ExecutionRecord::new(
        ComponentKind::Step,
        step.name(),
        ExecutionState::Canceled,
        started.elapsed(),
      );
      return (record, Err(RunStop::Canceled));
    }
  };

  match result {
    Ok(outputs) => {
      for (key, value) in outputs {
        scope.insert(format!("{}.{key}", step.name()), value);
      }
      info!(execution_id = %ctx.execution_id, step = %step.name(), "step_completed");
      ctx.component_completed(step.name());
      let record = ExecutionRecord::new(
        ComponentKind::Step,
        step.name(),
        ExecutionState::Completed,
        started.elapsed(),
      );
      (record, Ok(()))
    }
    Err(source) => {
      error!(execution_id = %ctx.execution_id, step = %step.name(), error = %source, "step_failed");
      ctx.component_failed(step.name(), &source.to_string());
      let record = ExecutionRecord::new(
        ComponentKind::Step,
        step.name(),
        ExecutionState::Failed,
        started.elapsed(),
      )
      .with_error(source.to_string());
      let stop = RunStop::Failed(ComponentError::Step {
        name: step.name().to_string(),
        source,
      });
      (record, Err(stop))
    }
  }
}

async fn run_trigger(
  ctx: &Ctx,
  trigger: Trigger,
) -> (ExecutionRecord, Result<Vec<Component>, RunStop>) {
  let started = Instant::now();
  info!(execution_id = %ctx.execution_id, trigger = %trigger.name(), "trigger_waiting");
  ctx.component_started(trigger.name());

  let result = tokio::select! {
    result = trigger.wait_for_trigger() => result,
    _ = ctx.cancel.cancelled() => {
      warn!(execution_id = %ctx.execution_id, trigger = %trigger.name(), "trigger_canceled");
      ctx.component_canceled(trigger.name());
      let record = ExecutionRecord::new(
        ComponentKind::Trigger,
        trigger.name(),
        ExecutionState::Canceled,
        started.elapsed(),
      );
      return (record, Err(RunStop::Canceled));
    }
  };

  match result {
    Ok(spliced) => {
      info!(
        execution_id = %ctx.execution_id,
        trigger = %trigger.name(),
        spliced = spliced.len(),
        "trigger_fired"
      );
      ctx.notify(ExecutionEvent::TriggerFired {
        execution_id: ctx.execution_id.clone(),
        trigger: trigger.name().to_string(),
        spliced: spliced.len(),
      });
      ctx.component_completed(trigger.name());
      let record = ExecutionRecord::new(
        ComponentKind::Trigger,
        trigger.name(),
        ExecutionState::Completed,
        started.elapsed(),
      );
      (record, Ok(spliced))
    }
    Err(source) => {
      error!(execution_id = %ctx.execution_id, trigger = %trigger.name(), error = %source, "trigger_failed");
      ctx.component_failed(trigger.name(), &source.to_string());
      let record = ExecutionRecord::new(
        ComponentKind::Trigger,
        trigger.name(),
        ExecutionState::Failed,
        started.elapsed(),
      )
      .with_error(source.to_string());
      let stop = RunStop::Failed(ComponentError::Trigger {
        name: trigger.name().to_string(),
        source,
      });
      (record, Err(stop))
    }
  }
}

async fn run_decision(
  ctx: &Ctx,
  decision: Decision,
) -> (ExecutionRecord, Result<Vec<Component>, RunStop>) {
  let started = Instant::now();
  info!(execution_id = %ctx.execution_id, decision = %decision.name(), "decision_started");
  ctx.component_started(decision.name());

  let result = tokio::select! {
    result = decision.evaluate() => result,
    _ = ctx.cancel.cancelled() => {
      ctx.component_canceled(decision.name());
      let record = ExecutionRecord::new(
        ComponentKind::Decision,
        decision.name(),
        ExecutionState::Canceled,
        started.elapsed(),
      );
      return (record, Err(RunStop::Canceled));
    }
  };

  match result {
    Ok(spliced) => {
      info!(
        execution_id = %ctx.execution_id,
        decision = %decision.name(),
        yielded = spliced.len(),
        "decision_evaluated"
      );
      ctx.component_completed(decision.name());
      let record = ExecutionRecord::new(
        ComponentKind::Decision,
        decision.name(),
        ExecutionState::Completed,
        started.elapsed(),
      );
      (record, Ok(spliced))
    }
    Err(source) => {
      error!(execution_id = %ctx.execution_id, decision = %decision.name(), error = %source, "decision_failed");
      ctx.component_failed(decision.name(), &source.to_string());
      let record = ExecutionRecord::new(
        ComponentKind::Decision,
        decision.name(),
        ExecutionState::Failed,
        started.elapsed(),
      )
      .with_error(source.to_string());
      let stop = RunStop::Failed(ComponentError::Decision {
        name: decision.name().to_string(),
        source,
      });
      (record, Err(stop))
    }
  }
}

async fn run_group(
  ctx: &Ctx,
  scope: &mut OutputScope,
  group: StepGroup,
) -> (ExecutionRecord, Result<(), RunStop>) {
  let started = Instant::now();
  info!(
    execution_id = %ctx.execution_id,
    group = %group.name(),
    mode = ?group.mode(),
    "group_started"
  );
  ctx.component_started(group.name());

  let (children, result) = match group.mode() {
    ExecutionMode::Sequential => {
      let mut children = Vec::new();
      let result = run_sequence(ctx, scope, group.children().to_vec(), &mut children, false).await;
      (children, result)
    }
    ExecutionMode::Parallel => run_group_parallel(ctx, scope, &group).await,
  };

  finish_branch(
    ctx,
    ComponentKind::StepGroup,
    group.name(),
    started,
    children,
    result,
    |name, source| ComponentError::Group {
      name,
      source: Box::new(source),
    },
  )
}

/// Launch every child concurrently; the first failure cancels the rest.
async fn run_group_parallel(
  ctx: &Ctx,
  scope: &mut OutputScope,
  group: &StepGroup,
) -> (Vec<ExecutionRecord>, Result<(), RunStop>) {
  // One token for the whole group: a failing child trips it to unwind its
  // siblings, and a workflow-level cancel propagates in through the parent.
  let group_ctx = ctx.child();

  let handles: Vec<_> = group
    .children()
    .iter()
    .cloned()
    .map(|child| {
      let child_ctx = group_ctx.clone();
      let mut forked = scope.fork();
      tokio::spawn(async move {
        let mut records = Vec::new();
        let result =
          run_sequence(&child_ctx, &mut forked, vec![child], &mut records, false).await;
        if matches!(result, Err(RunStop::Failed(_))) {
          child_ctx.cancel.cancel();
        }
        (forked, records, result)
      })
    })
    .collect();

  let mut children = Vec::new();
  let mut failure: Option<ComponentError> = None;
  for (index, joined) in futures::future::join_all(handles)
    .await
    .into_iter()
    .enumerate()
  {
    match joined {
      Ok((forked, records, result)) => {
        // Merge whatever the child produced, even on failure: partial
        // results from completed steps stay visible.
        scope.absorb(forked);
        children.extend(records);
        if let Err(RunStop::Failed(err)) = result {
          failure.get_or_insert(err);
        }
      }
      Err(join_error) => {
        let child = &group.children()[index];
        children.push(
          ExecutionRecord::new(
            child.kind(),
            child.name(),
            ExecutionState::Failed,
            Duration::ZERO,
          )
          .with_error(join_error.to_string()),
        );
        failure.get_or_insert(ComponentError::Panicked {
          name: child.name().to_string(),
          message: join_error.to_string(),
        });
      }
    }
  }

  if ctx.cancel.is_cancelled() {
    return (children, Err(RunStop::Canceled));
  }
  if let Some(err) = failure {
    return (children, Err(RunStop::Failed(err)));
  }
  (children, Ok(()))
}

async fn run_subflow(
  ctx: &Ctx,
  scope: &mut OutputScope,
  subflow: Subflow,
) -> (ExecutionRecord, Result<(), RunStop>) {
  let started = Instant::now();
  info!(
    execution_id = %ctx.execution_id,
    subflow = %subflow.name(),
    workflow = %subflow.workflow().name(),
    "subflow_started"
  );
  ctx.component_started(subflow.name());

  let mut children = Vec::new();
  // The nested tree shares the parent's scope and control: its outputs merge
  // unprefixed, and pausing or cancelling the parent gates it identically.
  let result = run_sequence(
    ctx,
    scope,
    subflow.workflow().components().to_vec(),
    &mut children,
    true,
  )
  .await;

  finish_branch(
    ctx,
    ComponentKind::Subflow,
    subflow.name(),
    started,
    children,
    result,
    |name, source| ComponentError::Subflow {
      name,
      source: Box::new(source),
    },
  )
}

/// Shared tail for groups and subflows: fold the child result into a branch
/// record, emit the matching events, and wrap the error with branch context.
fn finish_branch(
  ctx: &Ctx,
  kind: ComponentKind,
  name: &str,
  started: Instant,
  children: Vec<ExecutionRecord>,
  result: Result<(), RunStop>,
  wrap: impl FnOnce(String, ComponentError) -> ComponentError,
) -> (ExecutionRecord, Result<(), RunStop>) {
  match result {
    Ok(()) => {
      ctx.component_completed(name);
      let record = ExecutionRecord::new(kind, name, ExecutionState::Completed, started.elapsed())
        .with_children(children);
      (record, Ok(()))
    }
    Err(RunStop::Canceled) => {
      ctx.component_canceled(name);
      let record = ExecutionRecord::new(kind, name, ExecutionState::Canceled, started.elapsed())
        .with_children(children);
      (record, Err(RunStop::Canceled))
    }
    Err(RunStop::Failed(source)) => {
      let wrapped = wrap(name.to_string(), source);
      ctx.component_failed(name, &wrapped.to_string());
      let record = ExecutionRecord::new(kind, name, ExecutionState::Failed, started.elapsed())
        .with_error(wrapped.to_string())
        .with_children(children);
      (record, Err(RunStop::Failed(wrapped)))
    }
  }
}
