//! Core library for Quitbet.
//!
//! This crate owns the authoritative record of a user's recovery progress
//! (streak, money and time saved, lessons and challenges) and reconciles it
//! between two backing stores: a local key-value store for guest sessions
//! and a remote relational store once a session is authenticated. It is
//! independent of any UI layer.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use quitbet_core::store::LocalStore;
//! use quitbet_core::{progression, ProfileStore};
//!
//! # async fn run() -> quitbet_core::StoreResult<()> {
//! let local = Arc::new(LocalStore::open("quitbet.json")?);
//! let store = ProfileStore::initialize_guest(local).await?;
//!
//! store.complete_onboarding(50.0).await?;
//! store.complete_lesson(1).await?;
//! store.complete_challenge(1).await?;
//!
//! let outcome = progression::run_daily_check(&store, quitbet_core::today_local()).await?;
//! println!("streak: {}", outcome.days_clean);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod migration;
pub mod models;
pub mod notify;
pub mod profile_store;
pub mod progression;
pub mod store;

// Re-export commonly used types at crate root
pub use error::{StoreError, StoreResult};
pub use profile_store::{today_local, AuthSession, ProfileStore};
