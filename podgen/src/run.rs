//! Bookkeeping of one generation run

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use podmodel::{GenerationStatus, steps};
use tracing::{debug, error, warn};

use crate::{
    error::{GenerationError, Result},
    progress::ProgressStore,
};

/// Identifiants des podcasts en cours de génération
#[derive(Debug, Default, Clone)]
pub(crate) struct ActiveRuns {
    ids: Arc<Mutex<HashSet<String>>>,
}

impl ActiveRuns {
    /// Réserve `podcast_id`, ou échoue si une exécution est déjà en cours
    pub(crate) fn begin(&self, podcast_id: &str) -> Result<RunGuard> {
        let mut ids = self.ids.lock().unwrap();
        if !ids.insert(podcast_id.to_string()) {
            return Err(GenerationError::AlreadyRunning(podcast_id.to_string()));
        }
        Ok(RunGuard {
            podcast_id: podcast_id.to_string(),
            ids: self.ids.clone(),
        })
    }

    #[cfg(test)]
    pub(crate) fn is_active(&self, podcast_id: &str) -> bool {
        self.ids.lock().unwrap().contains(podcast_id)
    }
}

/// Libère la réservation quand l'exécution se termine, même sur panique
#[derive(Debug)]
pub(crate) struct RunGuard {
    podcast_id: String,
    ids: Arc<Mutex<HashSet<String>>>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if let Ok(mut ids) = self.ids.lock() {
            ids.remove(&self.podcast_id);
        }
        debug!("Run for {} released", self.podcast_id);
    }
}

/// A pipeline step as seen by the run bookkeeping
#[derive(Debug, Clone, Copy)]
pub(crate) struct Step {
    pub name: &'static str,
    /// Un échec interrompt l'exécution
    pub required: bool,
    pub failure: &'static str,
}

pub(crate) const SCRIPT_STEP: Step = Step {
    name: steps::SCRIPT,
    required: true,
    failure: "Script generation failed",
};

pub(crate) const AUDIO_STEP: Step = Step {
    name: steps::AUDIO,
    required: false,
    failure: "Audio generation failed",
};

pub(crate) const COVER_STEP: Step = Step {
    name: steps::COVER_ART,
    required: false,
    failure: "Cover art generation failed",
};

/// Issue d'une étape
#[derive(Debug)]
pub(crate) enum StepOutcome<T> {
    Completed(T),
    Failed(GenerationError),
}

impl<T> StepOutcome<T> {
    pub(crate) fn into_result(self) -> Result<T> {
        match self {
            Self::Completed(value) => Ok(value),
            Self::Failed(e) => Err(e),
        }
    }
}

/// Premier échec d'une exécution
#[derive(Debug, Clone)]
struct Failure {
    step: String,
    message: String,
}

/// Writes the progress of one run
///
/// Percentages never go down and the first failure wins. A failed optional
/// step keeps the record `running` while the remaining steps execute; the
/// terminal record (`complete` or `error`) is written once by
/// [`RunTracker::finish`], after the podcast id has been released.
pub(crate) struct RunTracker {
    podcast_id: String,
    store: Arc<dyn ProgressStore>,
    percent: u8,
    failure: Option<Failure>,
    guard: Option<RunGuard>,
    finished: bool,
}

impl RunTracker {
    pub(crate) fn new(podcast_id: &str, store: Arc<dyn ProgressStore>) -> Self {
        Self {
            podcast_id: podcast_id.to_string(),
            store,
            percent: 0,
            failure: None,
            guard: None,
            finished: false,
        }
    }

    /// Garde la réservation de l'id jusqu'à l'écriture de l'état terminal
    pub(crate) fn holding(mut self, guard: RunGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub(crate) fn has_failed(&self) -> bool {
        self.failure.is_some()
    }

    pub(crate) async fn update(
        &mut self,
        status: GenerationStatus,
        step: &str,
        percent: u8,
        message: &str,
    ) {
        if self.finished {
            return;
        }
        self.percent = self.percent.max(percent.min(100));
        debug!("{} {}/{} {}%", self.podcast_id, status, step, self.percent);
        let message = match &self.failure {
            Some(failure) => format!("{} ({})", message, failure.message),
            None => message.to_string(),
        };
        self.store
            .set_progress(&self.podcast_id, status, step, self.percent, &message)
            .await;
    }

    /// Records a failed step; only the first failure is kept
    pub(crate) fn fail(&mut self, step: &str, message: String) {
        if let Some(first) = &self.failure {
            warn!(
                "{}: {} step also failed after '{}': {}",
                self.podcast_id, step, first.message, message
            );
            return;
        }
        error!("{}: {} step failed: {}", self.podcast_id, step, message);
        self.failure = Some(Failure {
            step: step.to_string(),
            message,
        });
    }

    /// Records the result of `step`
    ///
    /// A failed required step ends the run at once. A failed optional step
    /// leaves the record `running` so later steps can still report.
    pub(crate) async fn settle<T>(&mut self, step: &Step, result: Result<T>) -> StepOutcome<T> {
        match result {
            Ok(value) => StepOutcome::Completed(value),
            Err(e) => {
                self.fail(step.name, format!("{}: {}", step.failure, e));
                if step.required {
                    self.finish("").await;
                } else {
                    debug!("{}: optional step {} failed, continuing", self.podcast_id, step.name);
                    self.update(GenerationStatus::Running, step.name, self.percent, "Continuing")
                        .await;
                }
                StepOutcome::Failed(e)
            }
        }
    }

    /// Releases the podcast id, then writes the terminal record
    ///
    /// `complete/finished` at 100% when every step succeeded, otherwise
    /// `error` with the first failing step and its message.
    pub(crate) async fn finish(&mut self, message: &str) {
        if self.finished {
            return;
        }
        drop(self.guard.take());
        self.finished = true;

        match &self.failure {
            Some(failure) => {
                self.store
                    .set_progress(
                        &self.podcast_id,
                        GenerationStatus::Error,
                        &failure.step,
                        self.percent,
                        &failure.message,
                    )
                    .await;
            }
            None => {
                self.percent = 100;
                self.store
                    .set_progress(
                        &self.podcast_id,
                        GenerationStatus::Complete,
                        steps::FINISHED,
                        100,
                        message,
                    )
                    .await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::MemoryProgressStore;

    #[test]
    fn one_run_per_podcast() {
        let runs = ActiveRuns::default();
        let guard = runs.begin("p1").unwrap();
        assert!(matches!(
            runs.begin("p1"),
            Err(GenerationError::AlreadyRunning(_))
        ));
        assert!(runs.begin("p2").is_ok());

        drop(guard);
        assert!(!runs.is_active("p1"));
        assert!(runs.begin("p1").is_ok());
    }

    #[tokio::test]
    async fn percent_never_decreases() {
        let store = Arc::new(MemoryProgressStore::new());
        let mut tracker = RunTracker::new("p1", store.clone());

        tracker
            .update(GenerationStatus::Running, steps::AUDIO, 60, "half way")
            .await;
        tracker
            .update(GenerationStatus::Running, steps::COVER_ART, 50, "late writer")
            .await;

        let record = store.get_progress("p1").await.unwrap();
        assert_eq!(record.progress, 60);
        assert_eq!(record.step, steps::COVER_ART);
    }

    #[tokio::test]
    async fn settle_reports_failed_steps() {
        let store = Arc::new(MemoryProgressStore::new());
        let mut tracker = RunTracker::new("p1", store.clone());

        let done = tracker.settle(&SCRIPT_STEP, Ok::<_, GenerationError>("script")).await;
        assert_eq!(done.into_result().unwrap(), "script");
        assert!(store.get_progress("p1").await.is_none());

        let failed = tracker
            .settle::<()>(&AUDIO_STEP, Err(GenerationError::NoVoices))
            .await;
        assert!(matches!(failed, StepOutcome::Failed(GenerationError::NoVoices)));

        // Étape optionnelle : l'exécution continue
        let record = store.get_progress("p1").await.unwrap();
        assert_eq!(record.status, GenerationStatus::Running);
        assert_eq!(record.step, steps::AUDIO);
        assert!(
            record
                .message
                .contains("Audio generation failed: No voice configured for the speech service")
        );

        tracker.finish("done").await;
        let record = store.get_progress("p1").await.unwrap();
        assert_eq!(record.status, GenerationStatus::Error);
        assert_eq!(
            record.message,
            "Audio generation failed: No voice configured for the speech service"
        );
    }

    #[tokio::test]
    async fn required_failure_ends_the_run() {
        let store = Arc::new(MemoryProgressStore::new());
        let runs = ActiveRuns::default();
        let mut tracker =
            RunTracker::new("p1", store.clone()).holding(runs.begin("p1").unwrap());

        tracker
            .settle::<()>(&SCRIPT_STEP, Err(GenerationError::EmptyScript))
            .await;

        let record = store.get_progress("p1").await.unwrap();
        assert_eq!(record.status, GenerationStatus::Error);
        assert_eq!(record.step, steps::SCRIPT);
        assert!(!runs.is_active("p1"));

        // Plus rien n'est écrit après l'état terminal
        tracker
            .update(GenerationStatus::Running, steps::AUDIO, 40, "late")
            .await;
        assert_eq!(
            store.get_progress("p1").await.unwrap().status,
            GenerationStatus::Error
        );
    }

    #[tokio::test]
    async fn id_is_released_before_terminal_record() {
        let store = Arc::new(MemoryProgressStore::new());
        let runs = ActiveRuns::default();
        let mut tracker =
            RunTracker::new("p1", store.clone()).holding(runs.begin("p1").unwrap());

        tracker
            .update(GenerationStatus::Running, steps::AUDIO, 40, "audio")
            .await;
        assert!(runs.is_active("p1"));

        tracker.finish("Podcast ready").await;
        assert!(!runs.is_active("p1"));
        let record = store.get_progress("p1").await.unwrap();
        assert_eq!(record.status, GenerationStatus::Complete);
        assert_eq!(record.progress, 100);
    }

    #[tokio::test]
    async fn first_failure_is_final() {
        let store = Arc::new(MemoryProgressStore::new());
        let mut tracker = RunTracker::new("p1", store.clone());

        tracker
            .update(GenerationStatus::Running, steps::AUDIO, 40, "audio")
            .await;
        tracker.fail(steps::AUDIO, "speech service down".into());
        tracker.fail(steps::COVER_ART, "image service down".into());
        tracker.finish("done").await;

        let record = store.get_progress("p1").await.unwrap();
        assert_eq!(record.status, GenerationStatus::Error);
        assert_eq!(record.step, steps::AUDIO);
        assert_eq!(record.message, "speech service down");
        assert_eq!(record.progress, 40);
        assert!(tracker.has_failed());
    }
}
