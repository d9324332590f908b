use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use practice_core::Clock;
use practice_core::model::{
    AnsweredQuestionOutcome, EphemeralQuestion, Hint, QuestionId, SessionId, SkillId, Solution,
    UserAnswer, UserAssessmentPerformance,
};
use storage::repository::QuestionRepository;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::controller::{QuestionAssessmentProgressController, QuestionTrainingController};
use super::plan::{QuestionSelector, SelectionStrategy};
use super::session::TrainingSession;
use crate::classifier::AnswerClassifier;
use crate::config::TrainingConfig;
use crate::error::TrainingError;
use crate::exceptions::{ExceptionLogger, TracingExceptionLogger};
use crate::observe::{AsyncResult, DataProvider, Reply};

//
// ─── FAILURE MESSAGES ──────────────────────────────────────────────────────────
//

pub(crate) const NO_CURRENT_QUESTION: &str =
    "Cannot retrieve the current question if a training session has not yet begun.";
const STOP_WITHOUT_SESSION: &str = "Cannot stop a new training session which wasn't started.";
const SUBMIT_WITHOUT_SESSION: &str =
    "Cannot submit an answer if a training session has not yet begun.";
const MOVE_WITHOUT_SESSION: &str =
    "Cannot navigate to a next question if a training session has not begun.";
const HINT_WITHOUT_SESSION: &str = "Cannot reveal a hint if a training session has not yet begun.";
const SOLUTION_WITHOUT_SESSION: &str =
    "Cannot reveal a solution if a training session has not yet begun.";
const PERFORMANCE_WITHOUT_SESSION: &str =
    "Cannot calculate performance if a training session has not yet begun.";

//
// ─── COMMANDS ──────────────────────────────────────────────────────────────────
//

/// Work queued by the controllers. Progress commands carry the stop epoch
/// observed when they were issued.
pub(crate) enum Command {
    StartSession {
        skill_ids: Vec<SkillId>,
        reply: Reply<()>,
    },
    StopSession {
        reply: Reply<()>,
    },
    SubmitAnswer {
        answer: UserAnswer,
        issued_epoch: u64,
        reply: Reply<AnsweredQuestionOutcome>,
    },
    MoveToNext {
        issued_epoch: u64,
        reply: Reply<()>,
    },
    RevealHint {
        question_id: QuestionId,
        revealed: bool,
        hint_index: usize,
        issued_epoch: u64,
        reply: Reply<Hint>,
    },
    RevealSolution {
        question_id: QuestionId,
        issued_epoch: u64,
        reply: Reply<Solution>,
    },
    CalculatePerformance {
        skill_ids: Vec<SkillId>,
        issued_epoch: u64,
        reply: Reply<UserAssessmentPerformance>,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::StartSession { .. } => "start_session",
            Self::StopSession { .. } => "stop_session",
            Self::SubmitAnswer { .. } => "submit_answer",
            Self::MoveToNext { .. } => "move_to_next_question",
            Self::RevealHint { .. } => "submit_hint_is_revealed",
            Self::RevealSolution { .. } => "submit_solution_is_revealed",
            Self::CalculatePerformance { .. } => "calculate_performance",
        }
    }
}

/// Sending side shared by both controllers.
#[derive(Clone)]
pub(crate) struct RuntimeHandle {
    commands: UnboundedSender<Command>,
    stop_epoch: Arc<AtomicU64>,
    current_question: DataProvider<EphemeralQuestion>,
}

impl RuntimeHandle {
    /// Queue a command. If the runtime is gone the command is dropped, which
    /// resolves its reply with `RuntimeUnavailable`.
    pub(crate) fn send(&self, command: Command) {
        let name = command.name();
        if self.commands.send(command).is_err() {
            debug!(command = name, "training runtime is not running");
        }
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.stop_epoch.load(Ordering::SeqCst)
    }

    /// Invalidates every progress command issued so far.
    pub(crate) fn bump_epoch(&self) {
        self.stop_epoch.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn current_question(&self) -> DataProvider<EphemeralQuestion> {
        self.current_question.clone()
    }
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Sole owner of the training state. Commands are applied one at a time.
struct Engine {
    repository: Arc<dyn QuestionRepository>,
    classifier: Arc<dyn AnswerClassifier>,
    exception_logger: Arc<dyn ExceptionLogger>,
    selector: QuestionSelector,
    clock: Clock,
    session: Option<TrainingSession>,
    /// Set when the last start failed; a stop clears it.
    start_failed: bool,
    current_question: DataProvider<EphemeralQuestion>,
    stop_epoch: Arc<AtomicU64>,
}

impl Engine {
    async fn apply(&mut self, command: Command) {
        debug!(command = command.name(), "applying training command");
        match command {
            Command::StartSession { skill_ids, reply } => {
                let result = self.start_session(skill_ids).await;
                self.finish(reply, result);
            }
            Command::StopSession { reply } => {
                let result = self.stop_session();
                self.finish(reply, result);
            }
            Command::SubmitAnswer {
                answer,
                issued_epoch,
                reply,
            } => {
                let result = self.submit_answer(answer, issued_epoch).await;
                self.finish(reply, result);
            }
            Command::MoveToNext {
                issued_epoch,
                reply,
            } => {
                let result = self.move_to_next(issued_epoch);
                self.finish(reply, result);
            }
            Command::RevealHint {
                question_id,
                revealed,
                hint_index,
                issued_epoch,
                reply,
            } => {
                let result = self.reveal_hint(&question_id, revealed, hint_index, issued_epoch);
                self.finish(reply, result);
            }
            Command::RevealSolution {
                question_id,
                issued_epoch,
                reply,
            } => {
                let result = self.reveal_solution(&question_id, issued_epoch);
                self.finish(reply, result);
            }
            Command::CalculatePerformance {
                skill_ids,
                issued_epoch,
                reply,
            } => {
                let result = self
                    .active_session(issued_epoch, PERFORMANCE_WITHOUT_SESSION)
                    .map(|session| session.performance(&skill_ids));
                self.finish(reply, result);
            }
        }
    }

    fn finish<T: Clone>(&self, reply: Reply<T>, result: Result<T, TrainingError>) {
        if let Err(err) = &result {
            self.exception_logger.log_non_fatal(err, self.clock.now());
        }
        reply.resolve(result);
    }

    fn publish_current(&self) {
        let view = match &self.session {
            Some(session) => AsyncResult::Success(session.ephemeral_question()),
            None => AsyncResult::Failure(TrainingError::NoActiveSession(NO_CURRENT_QUESTION)),
        };
        self.current_question.publish(view);
    }

    fn check_epoch(&self, issued_epoch: u64, context: &'static str) -> Result<(), TrainingError> {
        if self.stop_epoch.load(Ordering::SeqCst) == issued_epoch {
            Ok(())
        } else {
            Err(TrainingError::NoActiveSession(context))
        }
    }

    fn active_session(
        &mut self,
        issued_epoch: u64,
        context: &'static str,
    ) -> Result<&mut TrainingSession, TrainingError> {
        self.check_epoch(issued_epoch, context)?;
        self.session
            .as_mut()
            .ok_or(TrainingError::NoActiveSession(context))
    }

    async fn start_session(&mut self, skill_ids: Vec<SkillId>) -> Result<(), TrainingError> {
        if self.session.is_some() {
            return Err(TrainingError::SessionAlreadyActive);
        }

        self.current_question.publish(AsyncResult::Pending);
        match self.build_session(skill_ids).await {
            Ok(session) => {
                info!(
                    session_id = %session.id(),
                    skills = session.skill_ids().len(),
                    questions = session.total_questions(),
                    "training session started"
                );
                self.current_question
                    .publish(AsyncResult::Success(session.ephemeral_question()));
                self.session = Some(session);
                self.start_failed = false;
                Ok(())
            }
            Err(err) => {
                self.start_failed = true;
                self.current_question
                    .publish(AsyncResult::Failure(err.clone()));
                Err(err)
            }
        }
    }

    async fn build_session(&self, skill_ids: Vec<SkillId>) -> Result<TrainingSession, TrainingError> {
        if skill_ids.is_empty() {
            return Err(TrainingError::InvalidRequest);
        }
        let candidates = self.repository.questions_for_skills(&skill_ids).await?;
        let questions = self.selector.select(&skill_ids, candidates)?;
        TrainingSession::new(SessionId::generate(), skill_ids, questions, self.clock.now())
    }

    fn stop_session(&mut self) -> Result<(), TrainingError> {
        let Some(mut session) = self.session.take() else {
            if !std::mem::take(&mut self.start_failed) {
                return Err(TrainingError::NoActiveSession(STOP_WITHOUT_SESSION));
            }
            debug!("failed training session start cleared");
            self.publish_current();
            return Ok(());
        };
        session.end(self.clock.now());
        info!(
            session_id = %session.id(),
            completed = session.metrics().len(),
            questions = session.total_questions(),
            "training session stopped"
        );
        self.publish_current();
        Ok(())
    }

    async fn submit_answer(
        &mut self,
        answer: UserAnswer,
        issued_epoch: u64,
    ) -> Result<AnsweredQuestionOutcome, TrainingError> {
        let session = self.active_session(issued_epoch, SUBMIT_WITHOUT_SESSION)?;
        let interaction = session.answerable_question()?.interaction().clone();

        self.current_question.publish(AsyncResult::Pending);
        let verdict = self.classifier.classify(&interaction, &answer.answer).await;

        // A stop may have been requested while the classifier was running.
        let result = match verdict {
            Ok(verdict) => self
                .active_session(issued_epoch, SUBMIT_WITHOUT_SESSION)
                .and_then(|session| session.record_answer(answer, verdict)),
            Err(err) => Err(err.into()),
        };
        self.publish_current();
        result
    }

    fn move_to_next(&mut self, issued_epoch: u64) -> Result<(), TrainingError> {
        self.active_session(issued_epoch, MOVE_WITHOUT_SESSION)?
            .move_to_next()?;
        self.publish_current();
        Ok(())
    }

    fn reveal_hint(
        &mut self,
        question_id: &QuestionId,
        revealed: bool,
        hint_index: usize,
        issued_epoch: u64,
    ) -> Result<Hint, TrainingError> {
        let hint = self
            .active_session(issued_epoch, HINT_WITHOUT_SESSION)?
            .reveal_hint(question_id, revealed, hint_index)?;
        self.publish_current();
        Ok(hint)
    }

    fn reveal_solution(
        &mut self,
        question_id: &QuestionId,
        issued_epoch: u64,
    ) -> Result<Solution, TrainingError> {
        let solution = self
            .active_session(issued_epoch, SOLUTION_WITHOUT_SESSION)?
            .reveal_solution(question_id)?;
        self.publish_current();
        Ok(solution)
    }
}

//
// ─── RUNTIME ───────────────────────────────────────────────────────────────────
//

/// Drives the training engine.
///
/// Controller calls only enqueue work. Nothing becomes visible to observers
/// until the runtime applies the queue, either on demand with
/// [`run_current`](Self::run_current) or continuously with [`run`](Self::run).
pub struct TrainingRuntime {
    commands: UnboundedReceiver<Command>,
    engine: Engine,
}

impl TrainingRuntime {
    #[must_use]
    pub fn builder(
        repository: Arc<dyn QuestionRepository>,
        classifier: Arc<dyn AnswerClassifier>,
    ) -> TrainingRuntimeBuilder {
        TrainingRuntimeBuilder {
            repository,
            classifier,
            config: TrainingConfig::default(),
            strategy: None,
            exception_logger: Arc::new(TracingExceptionLogger),
            clock: Clock::default(),
        }
    }

    /// Apply every queued command in enqueue order. Returns how many ran.
    pub async fn run_current(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(command) = self.commands.try_recv() {
            self.engine.apply(command).await;
            applied += 1;
        }
        applied
    }

    /// Apply commands until every controller has been dropped.
    pub async fn run(mut self) {
        while let Some(command) = self.commands.recv().await {
            self.engine.apply(command).await;
        }
        debug!("training runtime stopped: all controllers dropped");
    }

    /// Run on the current tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    #[must_use]
    pub fn has_active_session(&self) -> bool {
        self.engine.session.is_some()
    }

    #[must_use]
    pub fn config(&self) -> TrainingConfig {
        self.engine.selector.config()
    }
}

impl fmt::Debug for TrainingRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainingRuntime")
            .field("session", &self.engine.session)
            .field("selector", &self.engine.selector)
            .finish_non_exhaustive()
    }
}

/// The two controllers bound to one runtime.
#[derive(Clone, Debug)]
pub struct TrainingControllers {
    pub training: QuestionTrainingController,
    pub progress: QuestionAssessmentProgressController,
}

pub struct TrainingRuntimeBuilder {
    repository: Arc<dyn QuestionRepository>,
    classifier: Arc<dyn AnswerClassifier>,
    config: TrainingConfig,
    strategy: Option<Arc<dyn SelectionStrategy>>,
    exception_logger: Arc<dyn ExceptionLogger>,
    clock: Clock,
}

impl TrainingRuntimeBuilder {
    #[must_use]
    pub fn with_config(mut self, config: TrainingConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: Arc<dyn SelectionStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    #[must_use]
    pub fn with_exception_logger(mut self, logger: Arc<dyn ExceptionLogger>) -> Self {
        self.exception_logger = logger;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn build(self) -> (TrainingRuntime, TrainingControllers) {
        let (tx, rx) = mpsc::unbounded_channel();
        let stop_epoch = Arc::new(AtomicU64::new(0));
        let current_question = DataProvider::new(AsyncResult::Failure(
            TrainingError::NoActiveSession(NO_CURRENT_QUESTION),
        ));

        let mut selector = QuestionSelector::new(self.config);
        if let Some(strategy) = self.strategy {
            selector = selector.with_strategy(strategy);
        }

        let handle = RuntimeHandle {
            commands: tx,
            stop_epoch: Arc::clone(&stop_epoch),
            current_question: current_question.clone(),
        };
        let engine = Engine {
            repository: self.repository,
            classifier: self.classifier,
            exception_logger: self.exception_logger,
            selector,
            clock: self.clock,
            session: None,
            start_failed: false,
            current_question,
            stop_epoch,
        };

        let controllers = TrainingControllers {
            training: QuestionTrainingController::new(handle.clone()),
            progress: QuestionAssessmentProgressController::new(handle),
        };
        (
            TrainingRuntime {
                commands: rx,
                engine,
            },
            controllers,
        )
    }
}

impl fmt::Debug for TrainingRuntimeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainingRuntimeBuilder")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
