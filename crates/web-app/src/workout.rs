//! Workout controller
//!
//! Connects the session engine to the user interface. Every change is persisted locally before
//! the corresponding remote write is spawned in the background. Remote writes never change the
//! outcome of an operation.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use chrono::Utc;
use liftr_domain::{
    self as domain, ExerciseWeightsService, SettingsService, SyncService, WorkoutService,
};
use log::{debug, warn};

use crate::ticker::{Executor, ONE_SECOND_MS, Ticker};

#[derive(thiserror::Error, Debug)]
pub enum FinishError {
    #[error(transparent)]
    Session(#[from] domain::SessionError),
    #[error("no set completed")]
    NoProgress,
    #[error("failed to save workout: {0}")]
    Save(#[from] domain::WriteError),
}

pub struct WorkoutController<S, E> {
    service: Rc<S>,
    executor: E,
    engine: Rc<RefCell<domain::SessionEngine>>,
    ticker: RefCell<Option<Ticker>>,
    rest: Rc<Cell<Option<u32>>>,
    rest_ticker: Rc<RefCell<Option<Ticker>>>,
}

impl<S, E> WorkoutController<S, E>
where
    S: WorkoutService + ExerciseWeightsService + SettingsService + SyncService + 'static,
    E: Executor,
{
    pub fn new(service: Rc<S>, executor: E) -> Self {
        Self {
            service,
            executor,
            engine: Rc::new(RefCell::new(domain::SessionEngine::new())),
            ticker: RefCell::new(None),
            rest: Rc::new(Cell::new(None)),
            rest_ticker: Rc::new(RefCell::new(None)),
        }
    }

    #[must_use]
    pub fn session(&self) -> Option<domain::ActiveSession> {
        self.engine.borrow().session().cloned()
    }

    #[must_use]
    pub fn state(&self) -> domain::SessionState {
        self.engine.borrow().state()
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u32 {
        self.engine
            .borrow()
            .session()
            .map_or(0, |session| session.elapsed_seconds)
    }

    #[must_use]
    pub fn completed_set_count(&self) -> usize {
        self.engine.borrow().completed_set_count()
    }

    #[must_use]
    pub fn total_set_count(&self) -> usize {
        self.engine.borrow().total_set_count()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.engine.borrow().is_complete()
    }

    #[must_use]
    pub fn current_position(&self) -> Option<domain::Position> {
        self.engine.borrow().current_position()
    }

    #[must_use]
    pub fn previous_position(&self) -> Option<domain::Position> {
        self.engine.borrow().previous_position()
    }

    #[must_use]
    pub fn suggested_weight(&self) -> Option<domain::Weight> {
        let weights = self.service.get_exercise_weights().unwrap_or_default();
        self.engine.borrow().suggested_weight(&weights)
    }

    /// Remaining seconds of the rest period, if one is running.
    #[must_use]
    pub fn rest_seconds(&self) -> Option<u32> {
        self.rest.get()
    }

    pub fn start_workout(&self, day: domain::DayNumber) -> Result<(), domain::SessionError> {
        let weights = self.service.get_exercise_weights().unwrap_or_default();
        let generation = self
            .engine
            .borrow_mut()
            .start_workout(day, &weights, Utc::now())?;
        self.start_ticker(generation);
        Ok(())
    }

    pub fn toggle_pause(&self) -> domain::SessionState {
        let state = self.engine.borrow_mut().toggle_pause();
        let generation = self.engine.borrow().ticker_generation();
        match generation {
            Some(generation) => self.start_ticker(generation),
            None => self.stop_ticker(),
        }
        state
    }

    /// Complete a set and start the rest period.
    ///
    /// Returns false if the set does not exist or is already completed.
    pub fn record_set(
        &self,
        position: domain::Position,
        actual_reps: u32,
        weight: domain::Weight,
    ) -> bool {
        let default_weight = self
            .engine
            .borrow_mut()
            .record_set(position, actual_reps, weight);
        let Some(default_weight) = default_weight else {
            return false;
        };
        self.store_default_weight(&default_weight);
        self.start_rest();
        true
    }

    pub fn update_weight(&self, position: domain::Position, weight: domain::Weight) -> bool {
        let default_weight = self.engine.borrow_mut().update_weight(position, weight);
        let Some(default_weight) = default_weight else {
            return false;
        };
        self.store_default_weight(&default_weight);
        true
    }

    pub fn undo_set(&self, position: domain::Position) -> bool {
        self.engine.borrow_mut().undo_set(position)
    }

    pub fn skip_rest(&self) {
        self.rest.set(None);
        self.rest_ticker.borrow_mut().take();
    }

    /// Finish the session, save the workout locally and publish it in the background.
    ///
    /// A session without any completed set cannot be finished and stays active. If the workout
    /// cannot be saved, the session stays active as well, so finishing can be retried.
    pub fn finish_workout(&self) -> Result<domain::Workout, FinishError> {
        if !self.engine.borrow().is_active() {
            return Err(domain::SessionError::NoActiveSession.into());
        }
        if self.engine.borrow().completed_set_count() == 0 {
            return Err(FinishError::NoProgress);
        }

        let workout = self.engine.borrow().snapshot(Utc::now())?;
        let settings = self.service.save_workout(&workout)?;
        debug!("saved workout {}", workout.id);

        // The record is stored, the session can be dropped.
        self.engine.borrow_mut().cancel_workout()?;
        self.stop_ticker();
        self.skip_rest();

        let service = Rc::clone(&self.service);
        let record = workout.clone();
        self.executor.spawn(async move {
            service.publish_workout(&record, &settings).await;
        });

        Ok(workout)
    }

    pub fn cancel_workout(&self) -> Result<(), domain::SessionError> {
        self.engine.borrow_mut().cancel_workout()?;
        self.stop_ticker();
        self.skip_rest();
        Ok(())
    }

    pub fn update_settings(
        &self,
        update: domain::SettingsUpdate,
    ) -> Result<domain::UserSettings, domain::WriteError> {
        let settings = self.service.update_settings(update)?;
        let service = Rc::clone(&self.service);
        self.executor.spawn(async move {
            service.push_settings(&settings).await;
        });
        Ok(settings)
    }

    fn store_default_weight(&self, default_weight: &domain::DefaultWeight) {
        match self
            .service
            .set_exercise_weight(&default_weight.exercise_name, default_weight.weight)
        {
            Ok(weights) => {
                let service = Rc::clone(&self.service);
                self.executor.spawn(async move {
                    service.push_exercise_weights(&weights).await;
                });
            }
            Err(err) => {
                warn!(
                    "failed to store default weight of {}: {err}",
                    default_weight.exercise_name
                );
            }
        }
    }

    fn start_ticker(&self, generation: domain::TickerGeneration) {
        let engine = Rc::clone(&self.engine);
        let ticker = self.executor.start_ticker(ONE_SECOND_MS, move || {
            if let Ok(mut engine) = engine.try_borrow_mut() {
                engine.tick(generation);
            }
        });
        self.ticker.replace(Some(ticker));
    }

    fn stop_ticker(&self) {
        self.ticker.borrow_mut().take();
    }

    fn start_rest(&self) {
        let seconds = self.service.get_settings().unwrap_or_default().rest_timer_seconds;
        if seconds == 0 {
            self.skip_rest();
            return;
        }
        self.rest.set(Some(seconds));

        let rest = Rc::clone(&self.rest);
        let rest_ticker = Rc::clone(&self.rest_ticker);
        let ticker = self.executor.start_ticker(ONE_SECOND_MS, move || {
            match rest.get() {
                Some(remaining) if remaining > 1 => rest.set(Some(remaining - 1)),
                _ => {
                    rest.set(None);
                    if let Ok(mut ticker) = rest_ticker.try_borrow_mut() {
                        ticker.take();
                    }
                }
            }
        });
        self.rest_ticker.replace(Some(ticker));
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use futures_util::future::{AbortHandle, FutureExt, LocalBoxFuture};
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Default)]
    struct FakeService {
        workouts: RefCell<Vec<domain::Workout>>,
        weights: RefCell<domain::ExerciseWeights>,
        settings: Cell<domain::UserSettings>,
        fail_save: Cell<bool>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeService {
        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl WorkoutService for FakeService {
        fn get_workouts(&self) -> Result<Vec<domain::Workout>, domain::ReadError> {
            Ok(self.workouts.borrow().clone())
        }

        fn save_workout(
            &self,
            workout: &domain::Workout,
        ) -> Result<domain::UserSettings, domain::WriteError> {
            if self.fail_save.get() {
                return Err(domain::WriteError::Other("quota exceeded".into()));
            }
            self.calls.borrow_mut().push("save workout".to_string());
            self.workouts.borrow_mut().insert(0, workout.clone());
            let settings = self.settings.get().merge(domain::SettingsUpdate {
                last_completed_day: Some(Some(workout.day)),
                ..domain::SettingsUpdate::default()
            });
            self.settings.set(settings);
            Ok(settings)
        }
    }

    impl ExerciseWeightsService for FakeService {
        fn get_exercise_weights(&self) -> Result<domain::ExerciseWeights, domain::ReadError> {
            Ok(self.weights.borrow().clone())
        }

        fn set_exercise_weight(
            &self,
            exercise_name: &str,
            weight: domain::Weight,
        ) -> Result<domain::ExerciseWeights, domain::WriteError> {
            self.calls
                .borrow_mut()
                .push(format!("set weight {exercise_name} {weight}"));
            self.weights.borrow_mut().set(exercise_name, weight);
            Ok(self.weights.borrow().clone())
        }
    }

    impl SettingsService for FakeService {
        fn get_settings(&self) -> Result<domain::UserSettings, domain::ReadError> {
            Ok(self.settings.get())
        }

        fn update_settings(
            &self,
            update: domain::SettingsUpdate,
        ) -> Result<domain::UserSettings, domain::WriteError> {
            let settings = self.settings.get().merge(update);
            self.settings.set(settings);
            Ok(settings)
        }
    }

    impl SyncService for FakeService {
        async fn pull_remote_to_local(&self) -> Result<(), domain::SyncError> {
            Ok(())
        }

        async fn push_workout(&self, workout: &domain::Workout) {
            self.calls
                .borrow_mut()
                .push(format!("push workout {}", workout.id));
        }

        async fn push_settings(&self, settings: &domain::UserSettings) {
            self.calls
                .borrow_mut()
                .push(format!("push settings {}", settings.rest_timer_seconds));
        }

        async fn push_exercise_weights(&self, weights: &domain::ExerciseWeights) {
            self.calls
                .borrow_mut()
                .push(format!("push weights {}", weights.iter().count()));
        }

        async fn publish_workout(
            &self,
            workout: &domain::Workout,
            _settings: &domain::UserSettings,
        ) {
            self.calls
                .borrow_mut()
                .push(format!("publish workout {}", workout.day));
        }

        async fn verify_and_reconcile_spreadsheet_link(&self) -> domain::SyncReport {
            domain::SyncReport {
                success: true,
                message: "Everything is in sync!".to_string(),
            }
        }
    }

    /// Collects spawned futures and tickers so tests decide when they run.
    #[derive(Default)]
    struct ManualExecutor {
        spawned: RefCell<VecDeque<LocalBoxFuture<'static, ()>>>,
        tickers: RefCell<Vec<(AbortHandle, Box<dyn FnMut()>)>>,
    }

    impl ManualExecutor {
        async fn run_spawned(&self) {
            loop {
                let next = self.spawned.borrow_mut().pop_front();
                match next {
                    Some(future) => future.await,
                    None => break,
                }
            }
        }

        fn tick(&self) {
            for (handle, on_tick) in self.tickers.borrow_mut().iter_mut() {
                if !handle.is_aborted() {
                    on_tick();
                }
            }
        }

        fn active_tickers(&self) -> usize {
            self.tickers
                .borrow()
                .iter()
                .filter(|(handle, _)| !handle.is_aborted())
                .count()
        }
    }

    impl Executor for Rc<ManualExecutor> {
        fn spawn(&self, future: impl Future<Output = ()> + 'static) {
            self.spawned.borrow_mut().push_back(future.boxed_local());
        }

        fn start_ticker(&self, _period_ms: u32, on_tick: impl FnMut() + 'static) -> Ticker {
            let (handle, _) = AbortHandle::new_pair();
            self.tickers
                .borrow_mut()
                .push((handle.clone(), Box::new(on_tick)));
            Ticker::new(handle)
        }
    }

    type Controller = WorkoutController<FakeService, Rc<ManualExecutor>>;

    fn controller(service: FakeService) -> (Controller, Rc<FakeService>, Rc<ManualExecutor>) {
        let service = Rc::new(service);
        let executor = Rc::new(ManualExecutor::default());
        (
            WorkoutController::new(Rc::clone(&service), Rc::clone(&executor)),
            service,
            executor,
        )
    }

    fn weight(value: f32) -> domain::Weight {
        domain::Weight::new(value).unwrap()
    }

    #[test]
    fn test_start_workout() {
        let service = FakeService::default();
        service.weights.borrow_mut().set("Pull-ups", weight(25.0));
        let (controller, _, executor) = controller(service);

        controller.start_workout(domain::DayNumber::ONE).unwrap();

        let session = controller.session().unwrap();
        assert_eq!(session.day_name, "Upper A");
        assert_eq!(session.exercise_logs[2].name, "Pull-ups");
        assert_eq!(session.exercise_logs[2].sets[0].weight, weight(25.0));
        assert_eq!(session.exercise_logs[0].sets[0].weight, domain::Weight::ZERO);
        assert_eq!(controller.state(), domain::SessionState::Running);
        assert_eq!(executor.active_tickers(), 1);

        executor.tick();
        executor.tick();

        assert_eq!(controller.elapsed_seconds(), 2);
    }

    #[test]
    fn test_start_workout_while_active() {
        let (controller, _, executor) = controller(FakeService::default());
        controller.start_workout(domain::DayNumber::ONE).unwrap();
        executor.tick();

        assert!(matches!(
            controller.start_workout(domain::DayNumber::TWO),
            Err(domain::SessionError::AlreadyActive)
        ));
        assert_eq!(controller.session().unwrap().day, domain::DayNumber::ONE);
        assert_eq!(executor.active_tickers(), 1);

        executor.tick();

        assert_eq!(controller.elapsed_seconds(), 2);
    }

    #[test]
    fn test_toggle_pause() {
        let (controller, _, executor) = controller(FakeService::default());
        controller.start_workout(domain::DayNumber::THREE).unwrap();
        executor.tick();

        assert_eq!(controller.toggle_pause(), domain::SessionState::Paused);
        assert_eq!(executor.active_tickers(), 0);
        executor.tick();
        assert_eq!(controller.elapsed_seconds(), 1);

        assert_eq!(controller.toggle_pause(), domain::SessionState::Running);
        assert_eq!(executor.active_tickers(), 1);
        executor.tick();
        assert_eq!(controller.elapsed_seconds(), 2);
    }

    #[test]
    fn test_toggle_pause_when_idle() {
        let (controller, _, executor) = controller(FakeService::default());

        assert_eq!(controller.toggle_pause(), domain::SessionState::Idle);
        assert_eq!(executor.active_tickers(), 0);
    }

    #[tokio::test]
    async fn test_record_set() {
        let service = FakeService::default();
        service.settings.set(domain::UserSettings {
            rest_timer_seconds: 2,
            ..domain::UserSettings::default()
        });
        let (controller, service, executor) = controller(service);
        controller.start_workout(domain::DayNumber::ONE).unwrap();

        assert!(controller.record_set(domain::Position::new(2, 0), 12, weight(25.0)));
        assert!(!controller.record_set(domain::Position::new(2, 0), 10, weight(30.0)));
        assert!(!controller.record_set(domain::Position::new(9, 0), 10, weight(30.0)));

        assert_eq!(service.weights.borrow().get("Pull-ups"), weight(25.0));
        assert_eq!(service.calls(), vec!["set weight Pull-ups 25"]);
        assert_eq!(controller.completed_set_count(), 1);
        assert_eq!(controller.rest_seconds(), Some(2));

        executor.run_spawned().await;

        assert_eq!(
            service.calls(),
            vec!["set weight Pull-ups 25", "push weights 1"]
        );

        executor.tick();
        assert_eq!(controller.rest_seconds(), Some(1));
        executor.tick();
        assert_eq!(controller.rest_seconds(), None);
        assert_eq!(executor.active_tickers(), 1);
    }

    #[test]
    fn test_update_weight_and_undo_set() {
        let (controller, service, _) = controller(FakeService::default());
        controller.start_workout(domain::DayNumber::FOUR).unwrap();
        let position = domain::Position::new(0, 0);

        assert!(controller.update_weight(position, weight(135.0)));
        assert_eq!(service.weights.borrow().get("Hip Thrusts"), weight(135.0));
        assert_eq!(controller.suggested_weight(), Some(weight(135.0)));

        assert!(controller.record_set(position, 3, weight(135.0)));
        assert!(!controller.update_weight(position, weight(140.0)));
        assert_eq!(controller.previous_position(), Some(position));
        assert_eq!(controller.current_position(), Some(domain::Position::new(0, 1)));
        assert_eq!(controller.suggested_weight(), Some(weight(135.0)));

        assert!(controller.undo_set(position));
        assert!(!controller.undo_set(position));
        let set = controller.session().unwrap().exercise_logs[0].sets[0].clone();
        assert!(!set.completed);
        assert_eq!(set.actual_reps, 3);
        assert_eq!(controller.current_position(), Some(position));
    }

    #[test]
    fn test_finish_workout_without_progress() {
        let (controller, service, executor) = controller(FakeService::default());
        controller.start_workout(domain::DayNumber::ONE).unwrap();

        assert!(matches!(
            controller.finish_workout(),
            Err(FinishError::NoProgress)
        ));
        assert!(controller.session().is_some());
        assert_eq!(executor.active_tickers(), 1);
        assert!(service.workouts.borrow().is_empty());
    }

    #[test]
    fn test_finish_workout_when_idle() {
        let (controller, _, _) = controller(FakeService::default());

        assert!(matches!(
            controller.finish_workout(),
            Err(FinishError::Session(domain::SessionError::NoActiveSession))
        ));
    }

    #[tokio::test]
    async fn test_finish_workout() {
        let (controller, service, executor) = controller(FakeService::default());
        controller.start_workout(domain::DayNumber::TWO).unwrap();
        executor.tick();
        controller.record_set(domain::Position::new(0, 0), 3, weight(100.0));

        let workout = controller.finish_workout().unwrap();

        assert_eq!(workout.day, domain::DayNumber::TWO);
        assert_eq!(workout.duration, 1);
        assert_eq!(workout.num_completed_sets(), 1);
        assert_eq!(controller.state(), domain::SessionState::Idle);
        assert_eq!(controller.rest_seconds(), None);
        assert_eq!(executor.active_tickers(), 0);
        assert_eq!(service.workouts.borrow().clone(), vec![workout.clone()]);
        assert_eq!(
            service.settings.get().last_completed_day,
            Some(domain::DayNumber::TWO)
        );
        assert_eq!(
            service.calls(),
            vec!["set weight Bulgarian Split Squats 100", "save workout"]
        );

        executor.run_spawned().await;

        assert_eq!(
            service.calls(),
            vec![
                "set weight Bulgarian Split Squats 100",
                "save workout",
                "push weights 1",
                "publish workout 2"
            ]
        );
    }

    #[tokio::test]
    async fn test_finish_workout_save_failure() {
        let (controller, service, executor) = controller(FakeService {
            fail_save: Cell::new(true),
            ..FakeService::default()
        });
        controller.start_workout(domain::DayNumber::ONE).unwrap();
        controller.record_set(domain::Position::new(0, 0), 3, weight(95.0));
        executor.run_spawned().await;

        executor.tick();

        assert!(matches!(
            controller.finish_workout(),
            Err(FinishError::Save(_))
        ));

        executor.run_spawned().await;

        assert!(
            !service
                .calls()
                .iter()
                .any(|call| call.starts_with("publish"))
        );
        let session = controller.session().unwrap();
        assert_eq!(session.completed_set_count(), 1);
        assert_eq!(session.elapsed_seconds, 1);
        assert_eq!(controller.state(), domain::SessionState::Running);
        assert_eq!(executor.active_tickers(), 2);

        executor.tick();

        assert_eq!(controller.elapsed_seconds(), 2);
    }

    #[tokio::test]
    async fn test_finish_workout_retry_after_save_failure() {
        let (controller, service, executor) = controller(FakeService {
            fail_save: Cell::new(true),
            ..FakeService::default()
        });
        controller.start_workout(domain::DayNumber::ONE).unwrap();
        controller.record_set(domain::Position::new(0, 0), 3, weight(95.0));
        assert!(controller.finish_workout().is_err());

        service.fail_save.set(false);
        let workout = controller.finish_workout().unwrap();
        executor.run_spawned().await;

        assert_eq!(workout.num_completed_sets(), 1);
        assert_eq!(service.workouts.borrow().clone(), vec![workout]);
        assert_eq!(controller.state(), domain::SessionState::Idle);
        assert_eq!(executor.active_tickers(), 0);
        assert!(service.calls().contains(&"publish workout 1".to_string()));
    }

    #[test]
    fn test_cancel_workout() {
        let (controller, service, executor) = controller(FakeService::default());
        controller.start_workout(domain::DayNumber::ONE).unwrap();

        controller.cancel_workout().unwrap();

        assert_eq!(controller.state(), domain::SessionState::Idle);
        assert_eq!(executor.active_tickers(), 0);
        assert!(service.workouts.borrow().is_empty());
        assert!(matches!(
            controller.cancel_workout(),
            Err(domain::SessionError::NoActiveSession)
        ));
    }

    #[tokio::test]
    async fn test_update_settings() {
        let (controller, service, executor) = controller(FakeService::default());

        let settings = controller
            .update_settings(domain::SettingsUpdate {
                rest_timer_seconds: Some(150),
                ..domain::SettingsUpdate::default()
            })
            .unwrap();

        assert_eq!(settings.rest_timer_seconds, 150);
        assert!(service.calls().is_empty());

        executor.run_spawned().await;

        assert_eq!(service.calls(), vec!["push settings 150"]);
    }
}
