//! Crime lifecycle, officer allocation, and tick cycle for the Precinct
//! dispatch simulation.
//!
//! Reports are generated on a timer, officers are allocated to them,
//! adequately staffed reports progress until they resolve, and the running
//! score drives a difficulty curve. Everything lives in one
//! [`DispatchSession`] and advances only when the host runs a tick, so the
//! core is deterministic for a given seed and command stream.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `precinct-config.yaml` into
//!   strongly-typed structs.
//! - [`clock`] -- Tick counter and simulated time.
//! - [`timers`] -- Deferred generation and deadline timers.
//! - [`generator`] -- Severity roll and report manufacture.
//! - [`pool`] -- The officer pool.
//! - [`reports`] -- Active reports and the closed-report archive.
//! - [`allocator`] -- Officer assignment with capacity checks.
//! - [`resolution`] -- Staffing efficiency and progress.
//! - [`difficulty`] -- Score-to-multiplier curve and generation interval.
//! - [`progression`] -- Level thresholds.
//! - [`session`] -- [`DispatchSession`], the context object.
//! - [`command`] -- Commands for the allocation-phase inbox.
//! - [`policy`] -- [`DispatchPolicy`] trait, [`IdlePolicy`], [`GreedyPolicy`].
//! - [`observer`] -- [`DispatchObserver`] callbacks for notifications.
//! - [`tick`] -- The six-phase tick cycle.
//! - [`runner`] -- Bounded session runs.
//! - [`persistence`] -- Save blobs, atomic save files, restore checks.
//! - [`error`] -- The command error taxonomy.
//!
//! [`DispatchSession`]: session::DispatchSession
//! [`DispatchPolicy`]: policy::DispatchPolicy
//! [`IdlePolicy`]: policy::IdlePolicy
//! [`GreedyPolicy`]: policy::GreedyPolicy
//! [`DispatchObserver`]: observer::DispatchObserver

pub mod allocator;
pub mod clock;
pub mod command;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod generator;
pub mod observer;
pub mod persistence;
pub mod policy;
pub mod pool;
pub mod progression;
pub mod reports;
pub mod resolution;
pub mod runner;
pub mod session;
pub mod tick;
pub mod timers;
