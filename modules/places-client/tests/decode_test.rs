use std::path::Path;

use places_client::{decode_geocode, decode_nearby, LatLng, PlacesClient, PlacesError};

fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {e}", path.display()))
}

#[test]
fn geocode_takes_first_result_location() {
    let location = decode_geocode(&fixture("geocode_90210.json")).unwrap().unwrap();
    assert!((location.lat - 34.1030032).abs() < 1e-9);
    assert!((location.lng + 118.4104684).abs() < 1e-9);
}

#[test]
fn geocode_zero_results_is_none() {
    let location = decode_geocode(r#"{"results": [], "status": "ZERO_RESULTS"}"#).unwrap();
    assert!(location.is_none());
}

#[test]
fn denied_request_is_rejected_with_message() {
    let err = decode_geocode(
        r#"{"results": [], "status": "REQUEST_DENIED", "error_message": "The provided API key is invalid."}"#,
    )
    .unwrap_err();
    match err {
        PlacesError::Rejected { status, message } => {
            assert_eq!(status, "REQUEST_DENIED");
            assert!(message.contains("API key"));
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[test]
fn nearby_results_keep_missing_ratings_as_none() {
    let places = decode_nearby(&fixture("nearby_cafes.json")).unwrap();
    assert_eq!(places.len(), 2);

    let alfred = &places[0];
    assert_eq!(alfred.name, "Alfred Coffee");
    assert_eq!(alfred.rating, Some(4.4));
    assert_eq!(alfred.user_ratings_total, Some(1203));
    assert_eq!(alfred.price_level, Some(2));
    assert!(alfred.types.iter().any(|t| t == "cafe"));

    let roastery = &places[1];
    assert_eq!(roastery.rating, None);
    assert_eq!(roastery.user_ratings_total, None);
    assert_eq!(roastery.price_level, None);
}

#[test]
fn latlng_formats_as_query_location() {
    let at = LatLng { lat: 34.1, lng: -118.41 };
    assert_eq!(at.to_string(), "34.1,-118.41");
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() {
    let client = PlacesClient::new("test-key").with_base_url("http://127.0.0.1:9");
    let err = client.geocode_zip("90210").await.unwrap_err();
    assert!(matches!(err, PlacesError::Network(_)));
}
