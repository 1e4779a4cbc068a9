//! Data models
//!
//! This module contains the data structures exchanged with the moderation API:
//! - Listings (Ad, Seller, moderation history)
//! - Paginated list responses
//! - Decision payloads
//! - Statistics

mod ad;
mod decision;
mod page;
mod stats;

pub use ad::{Ad, AdStatus, ModerationAction, ModerationHistoryItem, Priority, Seller};
pub use decision::{Decision, DecisionPayload, InvalidDecision, RejectionReason};
pub use page::{AdsPage, Pagination};
pub use stats::{ActivityData, CategoryStats, DecisionsData, StatsPeriod, StatsSummary};
