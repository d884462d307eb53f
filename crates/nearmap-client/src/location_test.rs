use super::*;
use crate::test_support::{coord, denver, postal_component, FakeGeocoder, FakePosition};

fn config(lat: Option<f64>, lng: Option<f64>, name: &str) -> DefaultLocationConfig {
    DefaultLocationConfig {
        lat,
        lng,
        name: name.to_string(),
    }
}

fn resolver(position: FakePosition, geocoder: FakeGeocoder) -> LocationResolver {
    LocationResolver::new(
        Arc::new(position),
        Arc::new(geocoder),
        &config(Some(39.7392), Some(-104.9903), "Denver, CO"),
        Duration::from_millis(200),
    )
}

#[tokio::test]
async fn current_location_is_tagged_geolocation() {
    let resolver = resolver(FakePosition::ok(denver()), FakeGeocoder::default());
    assert_eq!(resolver.state(), LocationState::Idle);

    let location = resolver.get_current_location().await.unwrap();
    assert_eq!(location.coordinate, denver());
    assert_eq!(location.source, LocationSource::GEOLOCATION);
    assert_eq!(resolver.state(), LocationState::Ready);
}

#[tokio::test]
async fn current_location_failure_is_typed() {
    let resolver = resolver(
        FakePosition::err(GeolocationError::PermissionDenied),
        FakeGeocoder::default(),
    );
    assert_eq!(
        resolver.get_current_location().await,
        Err(GeolocationError::PermissionDenied)
    );
    assert_eq!(resolver.state(), LocationState::Error);
}

#[tokio::test(start_paused = true)]
async fn slow_position_source_times_out() {
    let resolver = resolver(
        FakePosition::ok(denver()).delayed(Duration::from_secs(60)),
        FakeGeocoder::default(),
    );
    assert_eq!(
        resolver.get_current_location().await,
        Err(GeolocationError::Timeout)
    );
}

#[tokio::test]
async fn postal_code_found() {
    let resolver = resolver(FakePosition::ok(denver()), FakeGeocoder::with_postal_code("80202"));
    assert_eq!(resolver.get_postal_code(denver()).await, "80202");
    assert_eq!(resolver.state(), LocationState::Ready);
}

#[tokio::test]
async fn postal_code_missing_is_unknown_but_ready() {
    let resolver = resolver(FakePosition::ok(denver()), FakeGeocoder::default());
    assert_eq!(resolver.get_postal_code(denver()).await, UNKNOWN_POSTAL_CODE);
    assert_eq!(resolver.state(), LocationState::Ready);
}

#[tokio::test]
async fn postal_code_failure_is_absorbed() {
    let geocoder = FakeGeocoder {
        reverse_fails: true,
        ..FakeGeocoder::default()
    };
    let resolver = resolver(FakePosition::ok(denver()), geocoder);
    assert_eq!(resolver.get_postal_code(denver()).await, UNKNOWN_POSTAL_CODE);
    assert_eq!(resolver.state(), LocationState::Error);
}

#[tokio::test]
async fn zip_code_geocodes_with_formatted_address() {
    let beverly_hills = coord(34.0901, -118.4065);
    let geocoder = FakeGeocoder::default().with_forward(
        beverly_hills,
        "Beverly Hills, CA 90210, USA",
        Some("90210"),
    );
    let resolver = resolver(FakePosition::ok(denver()), geocoder);

    let location = resolver.geocode_zip_code("90210").await.unwrap();
    assert_eq!(location.coordinate, beverly_hills);
    assert_eq!(
        location.formatted_address.as_deref(),
        Some("Beverly Hills, CA 90210, USA")
    );
    assert_eq!(location.postal_code.as_deref(), Some("90210"));
    assert_eq!(location.source, LocationSource::GEOCODING);
}

#[tokio::test]
async fn zip_code_failure_propagates() {
    let resolver = resolver(FakePosition::ok(denver()), FakeGeocoder::default());
    assert!(matches!(
        resolver.geocode_zip_code("00000").await,
        Err(GeocodeError::NoResults { .. })
    ));
    assert_eq!(resolver.state(), LocationState::Error);

    // No terminal states: the next call runs normally.
    assert_eq!(resolver.get_postal_code(denver()).await, UNKNOWN_POSTAL_CODE);
    assert_eq!(resolver.state(), LocationState::Ready);
}

#[tokio::test]
async fn default_location_is_stable_across_failures() {
    let resolver = resolver(
        FakePosition::err(GeolocationError::PositionUnavailable("gps".to_string())),
        FakeGeocoder::default(),
    );
    let first = resolver.get_default_location();
    for _ in 0..3 {
        let _ = resolver.get_current_location().await;
        let _ = resolver.geocode_zip_code("nowhere").await;
    }
    let state = resolver.state();
    assert_eq!(resolver.get_default_location(), first);
    assert_eq!(resolver.state(), state, "default lookup leaves state alone");
    assert_eq!(first.coordinate, denver());
    assert_eq!(first.name.as_deref(), Some("Denver, CO"));
    assert_eq!(first.source, LocationSource::DEFAULT);
}

#[test]
fn invalid_default_config_falls_back_to_literal() {
    for cfg in [
        config(None, Some(-104.0), "Somewhere"),
        config(Some(200.0), Some(-104.0), "Somewhere"),
        config(Some(f64::NAN), Some(f64::NAN), ""),
    ] {
        let location = default_location_from(&cfg);
        assert_eq!(location.coordinate, Coordinate::FALLBACK);
    }
    let unnamed = default_location_from(&config(Some(1.0), Some(2.0), "  "));
    assert_eq!(unnamed.name.as_deref(), Some(FALLBACK_NAME));
    assert_eq!(unnamed.coordinate, coord(1.0, 2.0));
}

#[test]
fn place_selection_extracts_postal_code() {
    let location = location_from_place(
        denver(),
        Some("Union Station"),
        Some("1701 Wynkoop St, Denver, CO 80202"),
        &[postal_component("80202")],
    );
    assert_eq!(location.source, LocationSource::AUTOCOMPLETE);
    assert_eq!(location.postal_code.as_deref(), Some("80202"));
    assert_eq!(location.name.as_deref(), Some("Union Station"));

    let bare = location_from_place(denver(), None, None, &[]);
    assert_eq!(bare.postal_code, None);
}
