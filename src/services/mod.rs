//! Services layer - moderation workflow
//!
//! This module contains the client-side logic of the moderation queue:
//! - list pages with a stale-while-revalidate cache and new-items polling
//! - single listings with periodic refresh
//! - selection and bulk decisions with per-id results
//! - single decisions and statistics

pub mod bulk;
pub mod decision;
pub mod detail;
pub mod error;
pub mod list;
pub mod new_items;
pub mod queue;
pub mod selection;
pub mod stats;

pub use bulk::{BulkAction, BulkActionCoordinator, BulkFailure, BulkOutcome};
pub use decision::DecisionService;
pub use detail::{next_id, previous_id, AdDetailSource, DetailState, DetailWatch};
pub use error::ModerationError;
pub use list::{ListDataSource, ListState, LoadStatus};
pub use new_items::{NewItemsWatcher, PollHandle};
pub use queue::QueueView;
pub use selection::SelectionSet;
pub use stats::{StatsBundle, StatsService};
