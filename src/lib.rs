//! # animeu-ranking
//!
//! ELO ranking engine for pairwise character battles.
//!
//! Games are appended to a log. A lock-guarded background job folds the
//! games added since the last snapshot into new ratings, and a second job
//! seeds synthetic battles for demos. Both jobs report progress into their
//! lock row, which operators poll over HTTP.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, CLI)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── ActionService, RankingService (service/)
//!     ├── JobRunner ── RecomputeJob, BattleSeeder
//!     ├── LockManager
//!     │
//!     ├── EloFold + fingerprint (rating/)
//!     │
//!     └── Store traits (persistence/) ── MemoryStore | PostgreSQL
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod rating;
pub mod service;
