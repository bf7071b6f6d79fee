//! Pipeline orchestration
//!
//! Drives one root node through classify → order → resolve → budget →
//! deploy, recording every gate decision. A declared-cost check may be
//! switched on after the budget gate. The first rejection stops the run;
//! no stage retries or recovers on the caller's behalf.

use crate::binding::{BindingResolver, CandidateSource, Compatibility, DomainTable};
use crate::budget::{ComplexityBudgetValidator, ComplexityClass};
use crate::classifier::{Problem, ProblemClassifier};
use crate::cli::Config;
use crate::deploy::{DeploymentGate, Executor};
use crate::errors::{GateError, Result};
use crate::graph::{DependencyGraph, Node, NodeId, SharedGraph};
use crate::pipeline::state::{RunEvent, RunState};
use crate::pipeline::truth::{ExpectAccept, GroundTruth};
use crate::pipeline::types::{GateKind, NodeDeployment, Plan, RunReport};
use crate::qa::{QAVerifier, QaMetrics};
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Gate pipeline over a shared dependency graph
pub struct Pipeline<C = DomainTable> {
    graph: SharedGraph,
    classifier: ProblemClassifier,
    resolver: BindingResolver<C>,
    validator: ComplexityBudgetValidator,
    gate: DeploymentGate,
    ceiling: ComplexityClass,
    check_declared: bool,
    deploy_timeout: Option<Duration>,
    truth: Arc<dyn GroundTruth>,
    qa: Arc<Mutex<QAVerifier>>,
    telemetry: TelemetryCollector,
}

impl Pipeline<DomainTable> {
    /// Pipeline configured from `config`, matching targets by their domain list
    pub fn from_config(config: &Config) -> Self {
        let mut pipeline = Pipeline::new(DomainTable)
            .with_ceiling(config.pipeline.ceiling)
            .with_declared_cost_check(config.pipeline.check_declared_cost);
        if let Some(limit) = config.pipeline.max_depth {
            pipeline = pipeline.with_graph(SharedGraph::from_graph(DependencyGraph::new().with_max_depth(limit)));
        }
        if config.pipeline.deploy_timeout_ms > 0 {
            pipeline = pipeline.with_deploy_timeout(Duration::from_millis(config.pipeline.deploy_timeout_ms));
        }
        if config.pipeline.max_latency_ms > 0 {
            pipeline = pipeline.with_gate(DeploymentGate::with_max_latency(Duration::from_millis(
                config.pipeline.max_latency_ms,
            )));
        }
        pipeline
    }
}

impl<C: Compatibility> Pipeline<C> {
    /// Pipeline with an empty graph, logarithmic ceiling and no deadline
    pub fn new(predicate: C) -> Self {
        Self {
            graph: SharedGraph::new(),
            classifier: ProblemClassifier::new(),
            resolver: BindingResolver::new(predicate),
            validator: ComplexityBudgetValidator::new(),
            gate: DeploymentGate::new(),
            ceiling: ComplexityClass::Logarithmic,
            check_declared: false,
            deploy_timeout: None,
            truth: Arc::new(ExpectAccept),
            qa: Arc::new(Mutex::new(QAVerifier::new())),
            telemetry: TelemetryCollector::new(),
        }
    }

    /// Use an existing shared graph
    pub fn with_graph(mut self, graph: SharedGraph) -> Self {
        self.graph = graph;
        self
    }

    /// Use a classifier with domain rules
    pub fn with_classifier(mut self, classifier: ProblemClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Set the budget ceiling
    pub fn with_ceiling(mut self, ceiling: ComplexityClass) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Also reject bindings above a node's declared auxiliary cost
    pub fn with_declared_cost_check(mut self, enabled: bool) -> Self {
        self.check_declared = enabled;
        self
    }

    /// Use a configured deployment gate
    pub fn with_gate(mut self, gate: DeploymentGate) -> Self {
        self.gate = gate;
        self
    }

    /// Abandon deployments that run past `timeout`
    pub fn with_deploy_timeout(mut self, timeout: Duration) -> Self {
        self.deploy_timeout = Some(timeout);
        self
    }

    /// Set the ground truth used for QA records
    pub fn with_ground_truth<T: GroundTruth + 'static>(mut self, truth: T) -> Self {
        self.truth = Arc::new(truth);
        self
    }

    /// Share a QA ledger with other pipelines
    pub fn with_ledger(mut self, qa: Arc<Mutex<QAVerifier>>) -> Self {
        self.qa = qa;
        self
    }

    /// Report into an existing telemetry collector
    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Shared graph handle
    pub fn graph(&self) -> &SharedGraph {
        &self.graph
    }

    /// Budget ceiling
    pub fn ceiling(&self) -> ComplexityClass {
        self.ceiling
    }

    /// Telemetry collector
    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    /// QA ledger handle
    pub fn ledger(&self) -> Arc<Mutex<QAVerifier>> {
        Arc::clone(&self.qa)
    }

    /// Current QA counts
    pub async fn metrics(&self) -> QaMetrics {
        self.qa.lock().await.metrics()
    }

    /// Classify a problem and insert its node
    pub async fn submit(&self, problem: &Problem) -> Result<NodeId> {
        let id = match self.classifier.submit_shared(&self.graph, problem).await {
            Ok(id) => id,
            Err(err) => {
                self.reject(&problem.id, GateKind::Classify, &err).await;
                return Err(err);
            }
        };
        self.decide(&id, GateKind::Classify, true).await;
        self.telemetry.record(TelemetryEvent::NodeSubmitted {
            node: id.clone(),
            timestamp: Instant::now(),
        });
        Ok(id)
    }

    /// Classify and insert several problems atomically
    ///
    /// A rejected batch records a classify rejection for every member.
    pub async fn submit_all(&self, problems: &[Problem]) -> Result<Vec<NodeId>> {
        let submitted = {
            let mut graph = self.graph.write().await;
            self.classifier.submit_all(&mut graph, problems)
        };
        let ids = match submitted {
            Ok(ids) => ids,
            Err(err) => {
                for problem in problems {
                    self.reject(&problem.id, GateKind::Classify, &err).await;
                }
                return Err(err);
            }
        };
        for id in &ids {
            self.decide(id, GateKind::Classify, true).await;
            self.telemetry.record(TelemetryEvent::NodeSubmitted {
                node: id.clone(),
                timestamp: Instant::now(),
            });
        }
        Ok(ids)
    }

    /// Order, resolve and budget-check everything `root` needs
    ///
    /// Each node is resolved then budget-checked before the next one is
    /// looked at; the first rejection is recorded and returned.
    pub async fn plan<S>(&self, root: &str, source: &S) -> Result<Plan>
    where
        S: CandidateSource + ?Sized,
    {
        let (order, nodes) = {
            let graph = self.graph.read().await;
            let order = graph.topological_order(root)?;
            let nodes = order
                .iter()
                .map(|id| {
                    graph
                        .get(id)
                        .cloned()
                        .ok_or_else(|| GateError::NotFound { id: id.clone() })
                })
                .collect::<Result<Vec<Node>>>()?;
            (order, nodes)
        };
        tracing::debug!(root = %root, order = ?order, "dependency order resolved");

        let mut bindings = Vec::with_capacity(nodes.len());
        for node in &nodes {
            let candidates = source.candidates_for(node);
            let binding = match self.resolver.resolve(node, &candidates) {
                Ok(binding) => {
                    self.decide(&node.id, GateKind::Resolve, true).await;
                    binding
                }
                Err(err) => {
                    self.reject(&node.id, GateKind::Resolve, &err).await;
                    return Err(err);
                }
            };

            match self.validator.validate(&binding, self.ceiling) {
                Ok(()) => self.decide(&node.id, GateKind::Budget, true).await,
                Err(err) => {
                    self.reject(&node.id, GateKind::Budget, &err).await;
                    return Err(err);
                }
            }

            if self.check_declared {
                match self.validator.validate_declared(&binding, node) {
                    Ok(()) => self.decide(&node.id, GateKind::Declared, true).await,
                    Err(err) => {
                        self.reject(&node.id, GateKind::Declared, &err).await;
                        return Err(err);
                    }
                }
            }
            bindings.push(binding);
        }

        Ok(Plan {
            root: root.to_string(),
            order,
            bindings,
        })
    }

    /// Plan several roots concurrently over shared read views of the graph
    pub async fn plan_many<S>(&self, roots: &[NodeId], source: &S) -> Vec<Result<Plan>>
    where
        S: CandidateSource + ?Sized,
    {
        join_all(roots.iter().map(|root| self.plan(root, source))).await
    }

    /// Deploy a plan's bindings in order
    pub async fn execute<E>(&self, plan: &Plan, executor: &E) -> RunReport
    where
        E: Executor + ?Sized,
    {
        let mut report = RunReport::new(plan.root.clone(), RunState::BudgetChecked);
        report.bindings = plan.bindings.clone();
        self.deploy_all(&mut report, executor).await;
        self.finish(&report);
        report
    }

    /// Submit, plan and deploy one problem
    pub async fn run<S, E>(&self, problem: &Problem, source: &S, executor: &E) -> RunReport
    where
        S: CandidateSource + ?Sized,
        E: Executor + ?Sized,
    {
        let mut report = RunReport::new(problem.id.clone(), RunState::Classified);
        tracing::info!(run_id = %report.run_id, root = %problem.id, "run started");

        if let Err(err) = self.submit(problem).await {
            self.fail(&mut report, err);
            self.finish(&report);
            return report;
        }

        match self.plan(&problem.id, source).await {
            Ok(plan) => {
                report.bindings = plan.bindings;
                self.advance(&mut report, RunEvent::BindingsResolved);
                self.advance(&mut report, RunEvent::BudgetPassed);
                self.deploy_all(&mut report, executor).await;
            }
            Err(err) => self.fail(&mut report, err),
        }

        self.finish(&report);
        report
    }

    async fn deploy_all<E>(&self, report: &mut RunReport, executor: &E)
    where
        E: Executor + ?Sized,
    {
        let bindings = report.bindings.clone();
        for binding in &bindings {
            let outcome = match self.deploy_timeout {
                Some(deadline) => self.gate.deploy_with_timeout(binding, executor, deadline).await,
                None => self.gate.deploy(binding, executor).await,
            };

            match outcome {
                Ok(exec) => {
                    let accepted = self.gate.accepts(&exec);
                    self.telemetry.record(TelemetryEvent::DeployCompleted {
                        node: binding.node_id.clone(),
                        duration_ms: exec.latency_ms(),
                        success: exec.functional_pass,
                        timestamp: Instant::now(),
                    });
                    self.decide(&binding.node_id, GateKind::Deploy, accepted).await;
                    report.deployments.push(NodeDeployment {
                        node_id: binding.node_id.clone(),
                        target_id: binding.target.id.clone(),
                        report: exec,
                        accepted,
                    });
                    if !accepted {
                        tracing::warn!(node = %binding.node_id, "deployment rejected");
                        self.advance(report, RunEvent::Fail);
                        return;
                    }
                }
                Err(err) => {
                    self.reject(&binding.node_id, GateKind::Deploy, &err).await;
                    self.fail(report, err);
                    return;
                }
            }
        }

        self.advance(report, RunEvent::DeploymentsFinished);
        self.advance(report, RunEvent::Verify);
    }

    fn advance(&self, report: &mut RunReport, event: RunEvent) {
        match report.state.transition(event) {
            Ok(next) => report.state = next,
            Err(err) => {
                tracing::error!(run_id = %report.run_id, error = %err, "run state machine rejected event");
                report.state = RunState::Failed;
                report.error.get_or_insert(err);
            }
        }
    }

    fn fail(&self, report: &mut RunReport, err: GateError) {
        self.advance(report, RunEvent::Fail);
        report.error = Some(err);
    }

    fn finish(&self, report: &RunReport) {
        match &report.error {
            Some(err) => tracing::info!(run_id = %report.run_id, state = %report.state, error = %err, "run finished"),
            None => tracing::info!(run_id = %report.run_id, state = %report.state, "run finished"),
        }
        self.telemetry.record(TelemetryEvent::RunFinished {
            root: report.root.clone(),
            state: report.state,
            timestamp: Instant::now(),
        });
    }

    async fn decide(&self, node_id: &str, gate: GateKind, accepted: bool) {
        let expected = self.truth.expected(node_id, gate);
        self.qa.lock().await.record(node_id, gate.as_str(), expected, accepted);
        self.telemetry.gate_decision(node_id, gate, accepted);
    }

    async fn reject(&self, node_id: &str, gate: GateKind, err: &GateError) {
        let expected = self.truth.expected(node_id, gate);
        self.qa
            .lock()
            .await
            .record_failure(node_id, gate.as_str(), expected, err);
        self.telemetry.gate_decision(node_id, gate, false);
    }
}
