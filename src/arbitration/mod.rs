//! Model arbitration: scoring which execution path (local or cloud)
//! should serve a task, and enforcing the session-freeze contract.

mod classifiers;

pub use classifiers::{
    assess_token_pressure, KeywordPrivacyClassifier, KeywordTaskClassifier, PrivacyClassifier,
    PrivacyLevel, TaskClassifier, TaskType, TokenPressure,
};

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::types::{family_representative, model_family, ChatTurn, ModelFamily};

/// Where the selected model executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// On-device model.
    Local,
    /// Hosted model.
    Cloud,
}

/// A latency budget below this is considered tight.
const TIGHT_LATENCY_BUDGET: Duration = Duration::from_millis(500);

/// A scored candidate path, for the alternatives list.
#[derive(Debug, Clone, PartialEq)]
pub struct Alternative {
    /// Candidate model id.
    pub model: String,
    /// Where it executes.
    pub mode: ExecutionMode,
    /// Its arbitration score.
    pub score: f64,
}

/// The outcome of one arbitration pass.
///
/// Recomputed per request; never persisted across a session once a
/// model is pinned.
#[derive(Debug, Clone, PartialEq)]
pub struct ArbitrationResult {
    /// The model to use.
    pub selected_model: String,
    /// Where it executes.
    pub execution_mode: ExecutionMode,
    /// Confidence in the selection, in `[0, 1]`.
    pub confidence: f64,
    /// Human-readable rationale.
    pub reason: String,
    /// Remaining candidates, best first.
    pub alternatives: Vec<Alternative>,
}

/// Inputs to one arbitration pass.
#[derive(Debug, Clone)]
pub struct ArbitrationContext<'a> {
    /// The message to serve.
    pub message: &'a str,
    /// Conversation history, for token-pressure assessment.
    pub history: &'a [ChatTurn],
    /// How quickly the caller needs an answer, when known.
    pub latency_budget: Option<Duration>,
    /// Whether an on-device model is reachable.
    pub local_available: bool,
    /// Whether the hosted backend is reachable.
    pub cloud_available: bool,
}

/// Injected observer notified when the pinned session model changes.
pub trait ModelSwitchObserver: Send + Sync {
    /// Called with the previous and new model ids.
    fn on_model_switch(&self, old: &str, new: &str);
}

#[derive(Debug, Clone)]
struct SessionSelection {
    model: String,
    mode: ExecutionMode,
}

/// Scores execution paths and owns the session-freeze state.
pub struct ModelArbitrator {
    task_classifier: Box<dyn TaskClassifier>,
    privacy_classifier: Box<dyn PrivacyClassifier>,
    observer: Option<Arc<dyn ModelSwitchObserver>>,
    session: Mutex<Option<SessionSelection>>,
}

impl ModelArbitrator {
    /// An arbitrator with the default keyword classifiers.
    pub fn new() -> Self {
        Self {
            task_classifier: Box::new(KeywordTaskClassifier),
            privacy_classifier: Box::new(KeywordPrivacyClassifier),
            observer: None,
            session: Mutex::new(None),
        }
    }

    /// Replaces the task classifier strategy.
    pub fn with_task_classifier(mut self, classifier: Box<dyn TaskClassifier>) -> Self {
        self.task_classifier = classifier;
        self
    }

    /// Replaces the privacy classifier strategy.
    pub fn with_privacy_classifier(mut self, classifier: Box<dyn PrivacyClassifier>) -> Self {
        self.privacy_classifier = classifier;
        self
    }

    /// Attaches a model-switch observer.
    pub fn with_observer(mut self, observer: Arc<dyn ModelSwitchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Scores the available execution paths for this request.
    ///
    /// Pure with respect to session state: arbitrating does not pin a
    /// model. Use `select_for_session` for that.
    pub fn arbitrate(&self, context: &ArbitrationContext<'_>) -> ArbitrationResult {
        let task = self.task_classifier.classify(context.message);
        let privacy = self.privacy_classifier.assess(context.message);
        let pressure = assess_token_pressure(context.message, context.history);
        let tight_latency = context
            .latency_budget
            .map(|budget| budget < TIGHT_LATENCY_BUDGET)
            .unwrap_or(false);

        let mut local: f64 = 0.5;
        let mut cloud: f64 = 0.5;

        match privacy {
            PrivacyLevel::Critical => {
                local += 0.4;
                cloud -= 0.4;
            }
            PrivacyLevel::High => {
                local += 0.3;
                cloud -= 0.3;
            }
            PrivacyLevel::Medium => local += 0.1,
            PrivacyLevel::Low => {}
        }

        if tight_latency {
            local += 0.2;
            cloud -= 0.2;
        }

        if task.is_complex() {
            local -= 0.2;
            cloud += 0.3;
        } else if task != TaskType::General {
            cloud += 0.1;
        }

        match pressure {
            TokenPressure::High => {
                local -= 0.3;
                cloud += 0.3;
            }
            TokenPressure::Medium => cloud += 0.1,
            TokenPressure::Low => {}
        }

        let local = local.clamp(0.0, 1.0);
        let cloud = cloud.clamp(0.0, 1.0);

        let local_model = local_model_id().to_string();
        let cloud_model = cloud_model_id(task, pressure).to_string();

        let mut candidates = vec![
            Alternative {
                model: local_model,
                mode: ExecutionMode::Local,
                score: local,
            },
            Alternative {
                model: cloud_model,
                mode: ExecutionMode::Cloud,
                score: cloud,
            },
        ];
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let reachable = |mode: ExecutionMode| match mode {
            ExecutionMode::Local => context.local_available,
            ExecutionMode::Cloud => context.cloud_available,
        };

        let winner = candidates
            .iter()
            .find(|c| reachable(c.mode))
            .cloned();

        match winner {
            Some(choice) if reachable(candidates[0].mode) && choice == candidates[0] => {
                let runner_up = candidates[1].score;
                let confidence = (0.5 + (choice.score - runner_up) / 2.0).clamp(0.0, 1.0);
                let alternatives = candidates
                    .into_iter()
                    .filter(|c| *c != choice)
                    .collect();
                ArbitrationResult {
                    reason: format!(
                        "task={task:?} privacy={privacy:?} pressure={pressure:?} \
                         score {:.2} vs {:.2}",
                        choice.score, runner_up
                    ),
                    selected_model: choice.model,
                    execution_mode: choice.mode,
                    confidence,
                    alternatives,
                }
            }
            Some(choice) => {
                // The top-scored path is unreachable; degrade to the
                // one that is.
                tracing::info!(model = %choice.model, "preferred path unreachable, using fallback");
                let alternatives = candidates
                    .into_iter()
                    .filter(|c| *c != choice)
                    .collect();
                ArbitrationResult {
                    selected_model: choice.model,
                    execution_mode: choice.mode,
                    confidence: 0.3,
                    reason: "fallback: preferred execution path unreachable".to_string(),
                    alternatives,
                }
            }
            None => {
                // Nothing reported reachable; the cloud path is the
                // only sane default.
                ArbitrationResult {
                    selected_model: cloud_model_id(task, pressure).to_string(),
                    execution_mode: ExecutionMode::Cloud,
                    confidence: 0.1,
                    reason: "fallback: no execution path reported reachable".to_string(),
                    alternatives: candidates,
                }
            }
        }
    }

    /// Arbitrates and pins the result for the session, or returns the
    /// already-pinned selection.
    ///
    /// Once a model is pinned — automatically here or manually via
    /// `pin_model` — it stays authoritative for the rest of the
    /// session. There is no silent re-scoring.
    pub fn select_for_session(&self, context: &ArbitrationContext<'_>) -> ArbitrationResult {
        if let Some(pinned) = self.session.lock().clone() {
            return ArbitrationResult {
                selected_model: pinned.model,
                execution_mode: pinned.mode,
                confidence: 1.0,
                reason: "session model is pinned".to_string(),
                alternatives: Vec::new(),
            };
        }

        let result = self.arbitrate(context);
        self.pin(result.selected_model.clone(), result.execution_mode);
        result
    }

    /// Manually pins a model for the session.
    pub fn pin_model(&self, model: &str, mode: ExecutionMode) {
        self.pin(model.to_string(), mode);
    }

    fn pin(&self, model: String, mode: ExecutionMode) {
        let mut session = self.session.lock();
        let previous = session.as_ref().map(|s| s.model.clone());

        if previous.as_deref() == Some(model.as_str()) {
            return;
        }

        if let (Some(old), Some(observer)) = (previous.as_deref(), &self.observer) {
            observer.on_model_switch(old, &model);
        }
        tracing::info!(model = %model, "session model pinned");
        *session = Some(SessionSelection { model, mode });
    }

    /// The pinned session model, if any.
    pub fn session_model(&self) -> Option<String> {
        self.session.lock().as_ref().map(|s| s.model.clone())
    }

    /// Clears the session pin (e.g. when a new conversation starts).
    pub fn clear_session(&self) {
        *self.session.lock() = None;
    }

    /// The explicit fallback chain for a failed model: family order
    /// flash, pro, normal, other, skipping the failed model's family.
    ///
    /// Never invoked automatically — a pinned model that becomes
    /// unavailable fails the request explicitly, and the caller decides
    /// whether to walk this chain.
    pub fn fallback_chain(&self, failed_model: &str) -> Vec<String> {
        let failed_family = model_family(failed_model);
        ModelFamily::FALLBACK_ORDER
            .iter()
            .filter(|family| **family != failed_family)
            .filter_map(|family| family_representative(*family))
            .map(|spec| spec.id.to_string())
            .collect()
    }
}

impl Default for ModelArbitrator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ModelArbitrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArbitrator")
            .field("session", &self.session.lock())
            .finish()
    }
}

fn local_model_id() -> &'static str {
    "gemini-nano"
}

fn cloud_model_id(task: TaskType, pressure: TokenPressure) -> &'static str {
    if task.is_complex() || pressure == TokenPressure::High {
        "gemini-1.5-pro"
    } else {
        "gemini-1.5-flash"
    }
}
