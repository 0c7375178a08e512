//! Subscription Filters
//!
//! Turns caller criteria (comma-delimited text, as typed on a command line)
//! into the filter sent once when a subscription opens.
//!
//! Building is purely local: it performs no I/O, and a single malformed
//! token fails the whole build, so a partial filter is never produced.

use super::error::FilterError;
use super::identifier::EntityId;
use super::subscription::SubscriptionKind;

/// Separator between list elements in criteria text.
const LIST_SEPARATOR: char = ',';

// =============================================================================
// Criteria
// =============================================================================

/// Raw, unvalidated filter criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Comma-separated event-type codes, e.g. `"1,2"`.
    pub event_type_ids: Option<String>,
    /// Comma-separated UUID text, e.g. GPU ids or watch ids.
    pub entity_ids: Option<String>,
}

impl FilterCriteria {
    /// Criteria for an events subscription.
    #[must_use]
    pub fn events(event_type_ids: impl Into<String>, entity_ids: impl Into<String>) -> Self {
        Self {
            event_type_ids: Some(event_type_ids.into()),
            entity_ids: Some(entity_ids.into()),
        }
    }

    /// Criteria for a GPU watch subscription.
    #[must_use]
    pub fn gpu_watch(entity_ids: impl Into<String>) -> Self {
        Self {
            event_type_ids: None,
            entity_ids: Some(entity_ids.into()),
        }
    }
}

// =============================================================================
// Filter
// =============================================================================

/// A validated subscription filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionFilter {
    /// Event-type codes, in input order. Always empty for watches.
    pub event_type_ids: Vec<i32>,
    /// Entity identifiers, in input order.
    pub entity_ids: Vec<EntityId>,
}

impl SubscriptionFilter {
    /// Entity identifiers as raw wire bytes.
    #[must_use]
    pub fn entity_ids_wire(&self) -> Vec<Vec<u8>> {
        self.entity_ids.iter().map(EntityId::to_wire).collect()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builds [`SubscriptionFilter`]s from [`FilterCriteria`].
pub struct FilterBuilder;

impl FilterBuilder {
    /// Build the filter for a subscription kind.
    ///
    /// Events subscriptions need both event-type codes and GPU ids. Watch
    /// subscriptions need only watch ids; event-type codes are ignored.
    ///
    /// # Errors
    ///
    /// Returns `FilterError` for a missing criterion or any malformed token.
    pub fn build(
        kind: SubscriptionKind,
        criteria: &FilterCriteria,
    ) -> Result<SubscriptionFilter, FilterError> {
        match kind {
            SubscriptionKind::Events => {
                let events = criteria
                    .event_type_ids
                    .as_deref()
                    .ok_or(FilterError::MissingCriterion("event type ids"))?;
                let ids = criteria
                    .entity_ids
                    .as_deref()
                    .ok_or(FilterError::MissingCriterion("gpu ids"))?;
                Ok(SubscriptionFilter {
                    event_type_ids: parse_event_type_ids(events)?,
                    entity_ids: parse_entity_ids(ids)?,
                })
            }
            SubscriptionKind::GpuWatch => {
                let ids = criteria
                    .entity_ids
                    .as_deref()
                    .ok_or(FilterError::MissingCriterion("gpu watch ids"))?;
                Ok(SubscriptionFilter {
                    event_type_ids: Vec::new(),
                    entity_ids: parse_entity_ids(ids)?,
                })
            }
        }
    }
}

/// Parse comma-separated integer codes. Surrounding whitespace is ignored.
///
/// # Errors
///
/// Returns `FilterError::InvalidEventTypeId` for the first token that is
/// not an `i32`.
pub fn parse_event_type_ids(text: &str) -> Result<Vec<i32>, FilterError> {
    text.split(LIST_SEPARATOR)
        .map(|token| {
            token
                .trim()
                .parse::<i32>()
                .map_err(|e| FilterError::InvalidEventTypeId {
                    token: token.to_string(),
                    reason: e.to_string(),
                })
        })
        .collect()
}

/// Parse comma-separated UUID text. Surrounding whitespace is ignored.
///
/// # Errors
///
/// Returns `FilterError::InvalidEntityId` for the first token that is not
/// UUID text.
pub fn parse_entity_ids(text: &str) -> Result<Vec<EntityId>, FilterError> {
    text.split(LIST_SEPARATOR)
        .map(|token| {
            token
                .trim()
                .parse::<EntityId>()
                .map_err(|e| FilterError::InvalidEntityId {
                    token: token.to_string(),
                    reason: e.to_string(),
                })
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
