//! Observable events for examdex
//!
//! Events are explicit and typed. Every log line the engine writes names
//! one of these.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration and data
    /// Engine configuration loaded
    ConfigLoaded,
    /// Collection export directory loaded into a store
    DataLoaded,

    // Partition registry
    /// Partition set re-discovered
    RegistryRefreshed,
    /// Partition enumeration failed; registry served the empty set
    RegistryRefreshFailed,
    /// Partition name had no recognizable shape suffix
    PartitionTagDefaulted,
    /// Partition dropped from planning (no shape registered for its tag)
    PartitionExcluded,

    // Query
    /// Federated query received
    QueryReceived,
    /// Page request was clamped to safe values
    PageClamped,
    /// Federated plan built
    QueryPlanned,
    /// Federated query finished
    QueryExecuted,
    /// Federated query failed (fail-fast policy only)
    QueryFailed,
    /// Caller cancelled the query
    QueryCancelled,
    /// Federated `_id` lookup finished
    RecordLookup,

    // Partition execution
    /// Partition count or find call failed
    PartitionUnavailable,
    /// Partition call exceeded its timeout
    PartitionTimeout,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::DataLoaded => "DATA_LOADED",

            Event::RegistryRefreshed => "REGISTRY_REFRESHED",
            Event::RegistryRefreshFailed => "REGISTRY_REFRESH_FAILED",
            Event::PartitionTagDefaulted => "PARTITION_TAG_DEFAULTED",
            Event::PartitionExcluded => "PARTITION_EXCLUDED",

            Event::QueryReceived => "QUERY_BEGIN",
            Event::PageClamped => "PAGE_CLAMPED",
            Event::QueryPlanned => "QUERY_PLANNED",
            Event::QueryExecuted => "QUERY_COMPLETE",
            Event::QueryFailed => "QUERY_FAILED",
            Event::QueryCancelled => "QUERY_CANCELLED",
            Event::RecordLookup => "RECORD_LOOKUP",

            Event::PartitionUnavailable => "PARTITION_UNAVAILABLE",
            Event::PartitionTimeout => "PARTITION_TIMEOUT",
        }
    }

    /// Returns true if the event reports a failed operation
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::QueryFailed)
    }

    /// Returns true if the event reports degraded (but continuing) service
    pub fn is_degraded(&self) -> bool {
        matches!(
            self,
            Event::RegistryRefreshFailed
                | Event::PartitionTagDefaulted
                | Event::PartitionExcluded
                | Event::PartitionUnavailable
                | Event::PartitionTimeout
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::ConfigLoaded,
            Event::DataLoaded,
            Event::RegistryRefreshed,
            Event::RegistryRefreshFailed,
            Event::PartitionTagDefaulted,
            Event::PartitionExcluded,
            Event::QueryReceived,
            Event::PageClamped,
            Event::QueryPlanned,
            Event::QueryExecuted,
            Event::QueryFailed,
            Event::QueryCancelled,
            Event::RecordLookup,
            Event::PartitionUnavailable,
            Event::PartitionTimeout,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_degraded_events() {
        assert!(Event::PartitionUnavailable.is_degraded());
        assert!(Event::PartitionTimeout.is_degraded());
        assert!(!Event::QueryExecuted.is_degraded());
        assert!(!Event::QueryCancelled.is_degraded());
        assert!(Event::QueryFailed.is_failure());
        assert!(!Event::PartitionTimeout.is_failure());
    }

    #[test]
    fn test_event_display() {
        assert_eq!(format!("{}", Event::QueryReceived), "QUERY_BEGIN");
        assert_eq!(format!("{}", Event::PartitionTimeout), "PARTITION_TIMEOUT");
    }
}
