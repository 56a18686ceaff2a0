use crate::models::job::GeoLocation;

const EARTH_RADIUS_MILES: f64 = 3_958.8;

pub fn haversine_miles(a: &GeoLocation, b: &GeoLocation) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_MILES * central_angle
}

#[cfg(test)]
mod tests {
    use super::haversine_miles;
    use crate::models::job::GeoLocation;

    fn point(lat: f64, lng: f64) -> GeoLocation {
        GeoLocation {
            lat,
            lng,
            address: String::new(),
            name: None,
        }
    }

    #[test]
    fn zero_distance_for_same_point() {
        let p = point(40.7128, -74.0060);
        assert!(haversine_miles(&p, &p) < 1e-9);
    }

    #[test]
    fn manhattan_to_jfk_is_around_13_miles() {
        let midtown = point(40.7549, -73.9840);
        let jfk = point(40.6413, -73.7781);
        let distance = haversine_miles(&midtown, &jfk);
        assert!((distance - 13.4).abs() < 1.0);
    }
}
