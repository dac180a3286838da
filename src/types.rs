use std::{fmt::Debug, ops::RangeInclusive};

use serde::Serialize;
use tracing::error;

/// One lifecycle step of a tracked entity, derived from an event kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Lifecycle {
    /// The event brings a new entity into existence.
    Create,
    /// The event advances an existing entity (votes included).
    Update,
    /// The event puts the entity into a terminal state.
    Complete,
}

/// The decoded, chain-specific payload of a canonical event.
///
/// Each chain family defines one closed enum implementing this trait. The
/// `kind` tag drives handler exclusion lists and entity classification;
/// [`EventData::classify`] is pure and total: kinds that do not map to a
/// tracked entity return `None`, never an error.
pub trait EventData: Clone + Debug + PartialEq + Send + Sync + Serialize + 'static {
    /// The family's closed set of event kinds.
    type Kind: Copy + Eq + Debug + Send + Sync + 'static;
    /// The family's set of tracked entity kinds.
    type Entity: Copy + Eq + Debug + Send + Sync + 'static;

    fn kind(&self) -> Self::Kind;

    /// Maps an event kind to the entity it creates, updates or completes.
    ///
    /// Entities themselves are owned by the external persistence layer; this
    /// crate only classifies.
    fn classify(kind: Self::Kind) -> Option<(Self::Entity, Lifecycle)>;
}

/// The canonical, chain-independent event record, the sole shape delivered
/// to downstream consumers.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainEvent<D: EventData> {
    /// Ledger height at which the event occurred. Drives ordering and
    /// catch-up range arithmetic.
    pub block_number: u64,
    pub data: D,
    /// Advisory: downstream notifications should only target these addresses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_addresses: Option<Vec<String>>,
    /// Advisory: downstream notifications should not target these addresses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_addresses: Option<Vec<String>>,
}

impl<D: EventData> ChainEvent<D> {
    pub fn new(block_number: u64, data: D) -> Self {
        Self { block_number, data, include_addresses: None, exclude_addresses: None }
    }

    #[must_use]
    pub fn excluding(mut self, addresses: Vec<String>) -> Self {
        self.exclude_addresses = Some(addresses);
        self
    }

    #[must_use]
    pub fn including(mut self, addresses: Vec<String>) -> Self {
        self.include_addresses = Some(addresses);
        self
    }

    pub fn kind(&self) -> D::Kind {
        self.data.kind()
    }

    /// Classification of this event's kind, see [`EventData::classify`].
    pub fn entity(&self) -> Option<(D::Entity, Lifecycle)> {
        D::classify(self.data.kind())
    }
}

/// A span of blocks that may have been missed while offline.
///
/// `end_block: None` means "up to the current chain head".
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DisconnectedRange {
    pub start_block: u64,
    pub end_block: Option<u64>,
}

impl DisconnectedRange {
    /// A range open-ended at the current chain head.
    pub fn since(start_block: u64) -> Self {
        Self { start_block, end_block: None }
    }

    pub fn bounded(start_block: u64, end_block: u64) -> Self {
        Self { start_block, end_block: Some(end_block) }
    }
}

/// Validates and fills in a fetch range against the current chain head.
///
/// Returns `None` (after logging the reason) for ranges that must yield an
/// empty fetch result: a start at or past the head, or an inverted range.
/// A missing range means "everything": `0..=head`.
pub(crate) fn normalize_range(
    range: Option<DisconnectedRange>,
    head: u64,
) -> Option<RangeInclusive<u64>> {
    let Some(range) = range else {
        return Some(0..=head);
    };
    if range.start_block >= head {
        error!(
            start_block = range.start_block,
            head, "fetch range starts at or past the current head"
        );
        return None;
    }
    let end_block = range.end_block.unwrap_or(head);
    if range.start_block >= end_block {
        error!(start_block = range.start_block, end_block, "invalid fetch range");
        return None;
    }
    Some(range.start_block..=end_block)
}

/// A raw, chain-specific record pulled off a live feed.
///
/// The listener only needs the originating block number to maintain its
/// high-water mark; everything else is opaque until the processor runs.
pub trait RawRecord: Send + 'static {
    fn block_number(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_range_defaults_to_genesis_through_head() {
        assert_eq!(normalize_range(None, 100), Some(0..=100));
    }

    #[test]
    fn missing_end_defaults_to_head() {
        assert_eq!(normalize_range(Some(DisconnectedRange::since(10)), 100), Some(10..=100));
    }

    #[test]
    fn start_at_or_past_head_is_invalid() {
        assert_eq!(normalize_range(Some(DisconnectedRange::since(100)), 100), None);
        assert_eq!(normalize_range(Some(DisconnectedRange::since(150)), 100), None);
    }

    #[test]
    fn inverted_range_is_invalid() {
        assert_eq!(normalize_range(Some(DisconnectedRange::bounded(50, 50)), 100), None);
        assert_eq!(normalize_range(Some(DisconnectedRange::bounded(60, 40)), 100), None);
    }

    #[test]
    fn bounded_range_passes_through() {
        assert_eq!(normalize_range(Some(DisconnectedRange::bounded(5, 20)), 100), Some(5..=20));
    }
}
