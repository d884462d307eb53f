//! Failure classification.
//!
//! Every failure that reaches the orchestration layer is reduced to an
//! `(ErrorOrigin, Option<FailureCode>)` pair and passed through [`classify`].
//! The result carries a user-facing message and a [`RecoveryAction`]; the
//! orchestrator acts on the recovery action alone.

use std::str::FromStr;

/// Where a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorOrigin {
    Geolocation,
    Geocoding,
    PostalCode,
    BusinessSearch,
    MapLoad,
    Config,
    Render,
    Other,
}

impl ErrorOrigin {
    #[must_use]
    pub fn as_tag(self) -> &'static str {
        match self {
            Self::Geolocation => "geolocation",
            Self::Geocoding => "geocoding",
            Self::PostalCode => "postal_code",
            Self::BusinessSearch => "business_search",
            Self::MapLoad => "map_load",
            Self::Config => "config",
            Self::Render => "render",
            Self::Other => "other",
        }
    }
}

impl FromStr for ErrorOrigin {
    type Err = std::convert::Infallible;

    /// Unrecognised tags parse as [`ErrorOrigin::Other`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "geolocation" => Self::Geolocation,
            "geocoding" => Self::Geocoding,
            "postal_code" | "reverse_geocoding" => Self::PostalCode,
            "business_search" => Self::BusinessSearch,
            "map_load" => Self::MapLoad,
            "config" => Self::Config,
            "render" => Self::Render,
            _ => Self::Other,
        })
    }
}

/// Structured failure codes that error types expose to the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCode {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    NotSupported,
    NoResults,
    ApiKeyMissing,
    ContainerNotFound,
    NotInitialized,
    Transport,
    InvalidResponse,
    InvalidInput,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    LocationPermissionDenied,
    LocationUnavailable,
    GeocodingFailed,
    PostalCodeFailed,
    BusinessSearchFailed,
    MapLoadFailed,
    ApiKeyMissing,
    Unknown,
}

/// What the orchestrator does next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecoveryAction {
    UseDefaultLocation,
    /// Focus the search input so the user can re-enter a query.
    PromptManualEntry,
    ContinueWithPartialData,
    None,
}

/// The UI region a failure message replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiRegion {
    Map,
    LocationLabel,
    SearchInput,
    BusinessList,
}

impl ErrorCategory {
    #[must_use]
    pub fn recovery(self) -> RecoveryAction {
        match self {
            Self::LocationPermissionDenied | Self::LocationUnavailable => {
                RecoveryAction::UseDefaultLocation
            }
            Self::GeocodingFailed => RecoveryAction::PromptManualEntry,
            Self::PostalCodeFailed | Self::BusinessSearchFailed => {
                RecoveryAction::ContinueWithPartialData
            }
            Self::MapLoadFailed | Self::ApiKeyMissing | Self::Unknown => RecoveryAction::None,
        }
    }

    #[must_use]
    pub fn user_message(self) -> &'static str {
        match self {
            Self::LocationPermissionDenied => {
                "Location access was denied. Showing places near the default location."
            }
            Self::LocationUnavailable => {
                "We couldn't determine your location. Showing places near the default location."
            }
            Self::GeocodingFailed => {
                "We couldn't find that place. Check the zip code or search text and try again."
            }
            Self::PostalCodeFailed => "Zip code unavailable for this location.",
            Self::BusinessSearchFailed => "Nearby places are unavailable right now.",
            Self::MapLoadFailed => "The map failed to load. Please refresh the page.",
            Self::ApiKeyMissing => "The map is not configured. Please contact the site owner.",
            Self::Unknown => "Something went wrong. Please try again.",
        }
    }

    #[must_use]
    pub fn region(self) -> UiRegion {
        match self {
            Self::LocationPermissionDenied
            | Self::LocationUnavailable
            | Self::PostalCodeFailed
            | Self::Unknown => UiRegion::LocationLabel,
            Self::GeocodingFailed => UiRegion::SearchInput,
            Self::BusinessSearchFailed => UiRegion::BusinessList,
            Self::MapLoadFailed | Self::ApiKeyMissing => UiRegion::Map,
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::LocationPermissionDenied => "location_permission_denied",
            Self::LocationUnavailable => "location_unavailable",
            Self::GeocodingFailed => "geocoding_failed",
            Self::PostalCodeFailed => "postal_code_failed",
            Self::BusinessSearchFailed => "business_search_failed",
            Self::MapLoadFailed => "map_load_failed",
            Self::ApiKeyMissing => "api_key_missing",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedError {
    pub category: ErrorCategory,
    pub message: &'static str,
    pub recovery: RecoveryAction,
    pub region: UiRegion,
}

/// Map a failure's origin and optional structured code onto the closed
/// error taxonomy.
///
/// A missing API key is recognised from any origin. Every geolocation
/// failure other than a denied permission counts as "unavailable" so the
/// default location always takes over.
#[must_use]
pub fn classify(origin: ErrorOrigin, code: Option<FailureCode>) -> ClassifiedError {
    let category = match (origin, code) {
        (_, Some(FailureCode::ApiKeyMissing)) => ErrorCategory::ApiKeyMissing,
        (ErrorOrigin::Geolocation, Some(FailureCode::PermissionDenied)) => {
            ErrorCategory::LocationPermissionDenied
        }
        (ErrorOrigin::Geolocation, _) => ErrorCategory::LocationUnavailable,
        (ErrorOrigin::Geocoding, _) => ErrorCategory::GeocodingFailed,
        (ErrorOrigin::PostalCode, _) => ErrorCategory::PostalCodeFailed,
        (ErrorOrigin::BusinessSearch, _) => ErrorCategory::BusinessSearchFailed,
        (ErrorOrigin::MapLoad, _) => ErrorCategory::MapLoadFailed,
        (ErrorOrigin::Config | ErrorOrigin::Render | ErrorOrigin::Other, _) => {
            ErrorCategory::Unknown
        }
    };

    ClassifiedError {
        category,
        message: category.user_message(),
        recovery: category.recovery(),
        region: category.region(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_falls_back_to_default_location() {
        let classified = classify(
            ErrorOrigin::Geolocation,
            Some(FailureCode::PermissionDenied),
        );
        assert_eq!(classified.category, ErrorCategory::LocationPermissionDenied);
        assert_eq!(classified.recovery, RecoveryAction::UseDefaultLocation);
    }

    #[test]
    fn every_other_geolocation_failure_is_unavailable() {
        for code in [
            Some(FailureCode::PositionUnavailable),
            Some(FailureCode::Timeout),
            Some(FailureCode::NotSupported),
            Some(FailureCode::Unknown),
            None,
        ] {
            let classified = classify(ErrorOrigin::Geolocation, code);
            assert_eq!(
                classified.category,
                ErrorCategory::LocationUnavailable,
                "code {code:?}"
            );
            assert_eq!(classified.recovery, RecoveryAction::UseDefaultLocation);
        }
    }

    #[test]
    fn forward_geocoding_failure_prompts_manual_entry() {
        let classified = classify(ErrorOrigin::Geocoding, Some(FailureCode::NoResults));
        assert_eq!(classified.category, ErrorCategory::GeocodingFailed);
        assert_eq!(classified.recovery, RecoveryAction::PromptManualEntry);
        assert_eq!(classified.region, UiRegion::SearchInput);
    }

    #[test]
    fn lookup_and_search_failures_continue_with_partial_data() {
        assert_eq!(
            classify(ErrorOrigin::PostalCode, Some(FailureCode::Transport)).recovery,
            RecoveryAction::ContinueWithPartialData
        );
        assert_eq!(
            classify(ErrorOrigin::BusinessSearch, None).recovery,
            RecoveryAction::ContinueWithPartialData
        );
    }

    #[test]
    fn missing_key_wins_over_origin() {
        for origin in [
            ErrorOrigin::Config,
            ErrorOrigin::MapLoad,
            ErrorOrigin::BusinessSearch,
        ] {
            let classified = classify(origin, Some(FailureCode::ApiKeyMissing));
            assert_eq!(classified.category, ErrorCategory::ApiKeyMissing);
            assert_eq!(classified.recovery, RecoveryAction::None);
            assert_eq!(classified.region, UiRegion::Map);
        }
    }

    #[test]
    fn map_load_and_uncategorised_have_no_recovery() {
        assert_eq!(
            classify(ErrorOrigin::MapLoad, Some(FailureCode::ContainerNotFound)).category,
            ErrorCategory::MapLoadFailed
        );
        let other = classify(ErrorOrigin::Other, None);
        assert_eq!(other.category, ErrorCategory::Unknown);
        assert_eq!(other.recovery, RecoveryAction::None);
    }

    #[test]
    fn messages_are_non_technical() {
        for category in [
            ErrorCategory::LocationPermissionDenied,
            ErrorCategory::LocationUnavailable,
            ErrorCategory::GeocodingFailed,
            ErrorCategory::PostalCodeFailed,
            ErrorCategory::BusinessSearchFailed,
            ErrorCategory::MapLoadFailed,
            ErrorCategory::ApiKeyMissing,
            ErrorCategory::Unknown,
        ] {
            let msg = category.user_message();
            assert!(!msg.is_empty());
            assert!(!msg.contains("Error("), "{category}: {msg}");
            assert!(!msg.contains("::"), "{category}: {msg}");
        }
    }

    #[test]
    fn origin_tags_round_trip_and_unknown_tags_map_to_other() {
        for origin in [
            ErrorOrigin::Geolocation,
            ErrorOrigin::Geocoding,
            ErrorOrigin::PostalCode,
            ErrorOrigin::BusinessSearch,
            ErrorOrigin::MapLoad,
            ErrorOrigin::Config,
            ErrorOrigin::Render,
        ] {
            assert_eq!(origin.as_tag().parse::<ErrorOrigin>(), Ok(origin));
        }
        assert_eq!("weather".parse::<ErrorOrigin>(), Ok(ErrorOrigin::Other));
    }
}
