//! The `/action/{lock_name}` state machine.
//!
//! | lock     | method | effect               | status |
//! |----------|--------|----------------------|--------|
//! | unknown  | any    | none                 | 400    |
//! | held     | DELETE | force release        | 200    |
//! | not held | DELETE | none                 | 304    |
//! | held     | GET    | none                 | 200, body = progress |
//! | not held | GET    | none                 | 204    |
//! | not held | POST   | acquire + spawn job  | 201, body = `0` |
//! | held     | POST   | none                 | 503    |

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};

use super::jobs::{Detached, Job, JobResult, JobRunner};
use crate::domain::{Lock, LockName};
use crate::error::RankingError;

/// HTTP method as seen by the action surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionMethod {
    /// Poll progress.
    Get,
    /// Start the job.
    Post,
    /// Force-release the lock.
    Delete,
    /// Anything else.
    Other(String),
}

impl From<&Method> for ActionMethod {
    fn from(method: &Method) -> Self {
        match method.as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "DELETE" => Self::Delete,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Successful outcome of an action request.
#[derive(Debug)]
pub enum ActionOutcome {
    /// A held lock was deleted.
    Released,
    /// DELETE on a lock nobody holds.
    NotHeld,
    /// The lock is held at this percentage.
    Progress(u8),
    /// GET on a lock nobody holds.
    Idle,
    /// The lock was taken and the job spawned.
    Started(Detached<JobResult>),
}

impl IntoResponse for ActionOutcome {
    fn into_response(self) -> Response {
        match self {
            Self::Released => StatusCode::OK.into_response(),
            Self::NotHeld => StatusCode::NOT_MODIFIED.into_response(),
            Self::Progress(progress) => (StatusCode::OK, progress.to_string()).into_response(),
            Self::Idle => StatusCode::NO_CONTENT.into_response(),
            Self::Started(job) => {
                (StatusCode::CREATED, job.lock().progress.to_string()).into_response()
            }
        }
    }
}

/// Dispatches action requests to the lock manager and job runner.
#[derive(Debug, Clone)]
pub struct ActionService {
    runner: JobRunner,
    seed_default: u64,
    seed_max: u64,
}

impl ActionService {
    /// Creates the service. `seed_default` is used when a seed request gives
    /// no count; counts above `seed_max` are rejected.
    #[must_use]
    pub const fn new(runner: JobRunner, seed_default: u64, seed_max: u64) -> Self {
        Self {
            runner,
            seed_default,
            seed_max,
        }
    }

    /// Handles one request against `lock_name`.
    ///
    /// # Errors
    ///
    /// - [`RankingError::UnknownLock`] for any method on an unknown name.
    /// - [`RankingError::UnsupportedMethod`] for methods other than GET, POST
    ///   and DELETE.
    /// - [`RankingError::InvalidRequest`] for an out-of-range `number`.
    /// - [`RankingError::Catalog`] when seeding is requested without a catalog.
    /// - [`RankingError::LockContended`] when POST finds the lock held.
    /// - [`RankingError::Persistence`] on storage failure.
    pub async fn handle(
        &self,
        lock_name: &str,
        method: ActionMethod,
        number: Option<u64>,
    ) -> Result<ActionOutcome, RankingError> {
        let name: LockName = lock_name.parse()?;
        let locks = self.runner.locks();
        match method {
            ActionMethod::Other(method) => Err(RankingError::UnsupportedMethod(method)),
            ActionMethod::Delete => Ok(if locks.release(name).await? {
                ActionOutcome::Released
            } else {
                ActionOutcome::NotHeld
            }),
            ActionMethod::Get => Ok(match locks.get(name).await? {
                Some(lock) => ActionOutcome::Progress(lock.progress),
                None => ActionOutcome::Idle,
            }),
            ActionMethod::Post => {
                let job = self.job_for(name, number)?;
                let Some(lock) = locks.try_acquire(name).await? else {
                    return Err(RankingError::LockContended(name));
                };
                Ok(ActionOutcome::Started(self.runner.launch(lock, job)))
            }
        }
    }

    /// Current state of every known lock.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] on storage failure.
    pub async fn lock_states(&self) -> Result<Vec<(LockName, Option<Lock>)>, RankingError> {
        let mut states = Vec::with_capacity(LockName::ALL.len());
        for name in LockName::ALL {
            states.push((name, self.runner.locks().get(name).await?));
        }
        Ok(states)
    }

    fn job_for(&self, name: LockName, number: Option<u64>) -> Result<Job, RankingError> {
        match name {
            LockName::RatingUpdate => Ok(Job::RecomputeRatings),
            LockName::SeedBattles => {
                let count = number.unwrap_or(self.seed_default);
                if count == 0 || count > self.seed_max {
                    return Err(RankingError::InvalidRequest(format!(
                        "number must be between 1 and {}",
                        self.seed_max
                    )));
                }
                if !self.runner.can_seed() {
                    return Err(RankingError::Catalog(
                        "no character catalog configured".to_string(),
                    ));
                }
                Ok(Job::SeedBattles { count })
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::*;
    use crate::domain::{AccountId, Competitor, NewGame};
    use crate::persistence::{
        AccountStore, CharacterCatalog, GameStore, LockStore, MemoryStore, SnapshotStore,
    };
    use crate::service::jobs::JobReport;
    use crate::service::{BattleSeeder, LockManager, RecomputeJob};

    fn service(store: &Arc<MemoryStore>, with_catalog: bool) -> ActionService {
        let recompute = RecomputeJob::new(
            Arc::clone(store) as Arc<dyn GameStore>,
            Arc::clone(store) as Arc<dyn SnapshotStore>,
        );
        let seeder = with_catalog.then(|| {
            let catalog = Arc::new(CharacterCatalog::new(vec![
                Competitor::new("Kurisu").with_feature("heart_on", 40.0),
                Competitor::new("Mayuri").with_feature("heart_on", 20.0),
            ]));
            BattleSeeder::new(
                catalog,
                Arc::clone(store) as Arc<dyn GameStore>,
                Arc::clone(store) as Arc<dyn AccountStore>,
            )
            .ok()
            .map(Arc::new)
        });
        let runner = JobRunner::new(
            LockManager::new(Arc::clone(store) as Arc<dyn LockStore>),
            Arc::new(recompute),
        )
        .with_seeder(seeder.flatten());
        ActionService::new(runner, 1000, 5000)
    }

    #[tokio::test]
    async fn unknown_lock_is_rejected_for_every_method() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store, true);
        for method in [
            ActionMethod::Get,
            ActionMethod::Post,
            ActionMethod::Delete,
            ActionMethod::Other("PATCH".to_string()),
        ] {
            let result = svc.handle("rebuild-index", method, None).await;
            assert!(matches!(result, Err(RankingError::UnknownLock(_))));
        }
    }

    #[tokio::test]
    async fn unheld_lock_answers_not_modified_and_no_content() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store, true);
        let delete = svc.handle("seed-battles", ActionMethod::Delete, None).await;
        assert!(matches!(delete, Ok(ActionOutcome::NotHeld)));
        let get = svc.handle("seed-battles", ActionMethod::Get, None).await;
        assert!(matches!(get, Ok(ActionOutcome::Idle)));
    }

    #[tokio::test]
    async fn other_methods_are_unsupported() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store, true);
        let result = svc
            .handle("rating-update", ActionMethod::Other("PUT".to_string()), None)
            .await;
        assert!(matches!(result, Err(RankingError::UnsupportedMethod(m)) if m == "PUT"));
    }

    #[tokio::test]
    async fn held_lock_reports_progress_and_rejects_second_start() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store, true);
        let Ok(Some(_)) = svc
            .runner
            .locks()
            .try_acquire(LockName::RatingUpdate)
            .await
        else {
            panic!("acquire failed");
        };
        let get = svc.handle("rating-update", ActionMethod::Get, None).await;
        assert!(matches!(get, Ok(ActionOutcome::Progress(0))));
        let post = svc.handle("rating-update", ActionMethod::Post, None).await;
        assert!(matches!(
            post,
            Err(RankingError::LockContended(LockName::RatingUpdate))
        ));
        let delete = svc.handle("rating-update", ActionMethod::Delete, None).await;
        assert!(matches!(delete, Ok(ActionOutcome::Released)));
    }

    #[tokio::test]
    async fn post_starts_recompute_and_lock_clears() {
        let store = Arc::new(MemoryStore::new());
        let Ok(game) = NewGame::new(AccountId::new(1), "Kurisu", "Mayuri", Utc::now()) else {
            panic!("valid game");
        };
        let _ = GameStore::append(store.as_ref(), game).await;
        let svc = service(&store, false);

        let Ok(ActionOutcome::Started(job)) =
            svc.handle("rating-update", ActionMethod::Post, None).await
        else {
            panic!("expected job start");
        };
        assert_eq!(job.lock().progress, 0);
        assert!(matches!(job.join().await, Ok(Ok(JobReport::Recomputed(_)))));
        let after = svc.handle("rating-update", ActionMethod::Get, None).await;
        assert!(matches!(after, Ok(ActionOutcome::Idle)));
    }

    #[tokio::test]
    async fn seed_number_is_validated_before_locking() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store, true);
        for number in [0, 5001] {
            let result = svc
                .handle("seed-battles", ActionMethod::Post, Some(number))
                .await;
            assert!(matches!(result, Err(RankingError::InvalidRequest(_))));
        }
        assert!(matches!(
            svc.runner.locks().get(LockName::SeedBattles).await,
            Ok(None)
        ));
    }

    #[tokio::test]
    async fn seeding_requires_catalog() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store, false);
        let result = svc.handle("seed-battles", ActionMethod::Post, Some(10)).await;
        assert!(matches!(result, Err(RankingError::Catalog(_))));
    }

    #[tokio::test]
    async fn post_seeds_requested_battles() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store, true);
        let Ok(ActionOutcome::Started(job)) =
            svc.handle("seed-battles", ActionMethod::Post, Some(25)).await
        else {
            panic!("expected job start");
        };
        let _ = job.join().await;
        assert_eq!(store.all_games().await.len(), 25);
    }

    #[tokio::test]
    async fn lock_states_cover_every_lock() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store, false);
        let _ = svc.runner.locks().try_acquire(LockName::SeedBattles).await;
        let Ok(states) = svc.lock_states().await else {
            panic!("lock states");
        };
        assert_eq!(states.len(), LockName::ALL.len());
        assert!(
            states
                .iter()
                .any(|(name, lock)| *name == LockName::SeedBattles && lock.is_some())
        );
        assert!(
            states
                .iter()
                .any(|(name, lock)| *name == LockName::RatingUpdate && lock.is_none())
        );
    }

    #[test]
    fn methods_map_from_http() {
        assert_eq!(ActionMethod::from(&Method::GET), ActionMethod::Get);
        assert_eq!(
            ActionMethod::from(&Method::PATCH),
            ActionMethod::Other("PATCH".to_string())
        );
    }
}
