//! Geopoint parsing and spherical geometry for `area()` and `distance()`.
use crate::consts::EARTH_EQUATORIAL_RADIUS_METERS;
use crate::value::{js_round, parse_number};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Parse one `lat lng [alt [accuracy]]` point. `None` when a coordinate is
/// missing, out of range or non-numeric.
pub fn parse_point(s: &str) -> Option<GeoPoint> {
    let mut parts = s.split_whitespace();
    let lat = parse_number(parts.next()?);
    let lng = parse_number(parts.next()?);
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return None;
    }
    if let Some(alt) = parts.next()
        && parse_number(alt).is_nan()
    {
        return None;
    }
    if let Some(acc) = parts.next() {
        let acc = parse_number(acc);
        if acc.is_nan() || acc < 0.0 {
            return None;
        }
    }
    if parts.next().is_some() {
        return None;
    }
    Some(GeoPoint { lat, lng })
}

/// Parse a sequence of inputs, each either a single point or several joined
/// with `;`. Empty segments are skipped; any malformed point fails the whole
/// set.
pub fn parse_points<'a, I>(inputs: I) -> Option<Vec<GeoPoint>>
where
    I: IntoIterator<Item = &'a str>,
{
    inputs
        .into_iter()
        .flat_map(|s| s.split(';'))
        .filter(|seg| !seg.trim().is_empty())
        .map(parse_point)
        .collect()
}

fn round_meters(x: f64) -> f64 {
    js_round(x * 100.0).abs() / 100.0
}

/// Length of the path through `points` in meters, by the spherical law of
/// cosines.
pub fn distance(points: &[GeoPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let total: f64 = points
        .windows(2)
        .map(|w| {
            let (p1, p2) = (w[0].lat.to_radians(), w[1].lat.to_radians());
            let dl = (w[1].lng - w[0].lng).to_radians();
            let cos_angle = p1.sin() * p2.sin() + p1.cos() * p2.cos() * dl.cos();
            // rounding can push identical points just past 1
            cos_angle.clamp(-1.0, 1.0).acos() * EARTH_EQUATORIAL_RADIUS_METERS
        })
        .sum();
    round_meters(total)
}

/// Area of the closed polygon through `points` in square meters, by
/// spherical excess.
pub fn area(points: &[GeoPoint]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let total: f64 = (0..n)
        .map(|i| {
            let (a, b) = (points[i], points[(i + 1) % n]);
            (b.lng - a.lng).to_radians()
                * (2.0 + a.lat.to_radians().sin() + b.lat.to_radians().sin())
        })
        .sum();
    let r = EARTH_EQUATORIAL_RADIUS_METERS;
    round_meters(total * r * r / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_validation() {
        assert!(parse_point("1 2").is_some());
        assert!(parse_point("1 2 3 4").is_some());
        assert!(parse_point("91 2").is_none());
        assert!(parse_point("1 -181").is_none());
        assert!(parse_point("1 2 x").is_none());
        assert!(parse_point("1 2 3 -1").is_none());
        assert!(parse_point("1").is_none());
        assert!(parse_point("1 2 3 4 5").is_none());
    }

    #[test]
    fn segments_across_inputs() {
        let pts = parse_points(["0 0;0 1;", "1 1"]).unwrap();
        assert_eq!(pts.len(), 3);
        assert!(parse_points(["0 0;bogus"]).is_none());
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let pts = parse_points(["0 0;0 1"]).unwrap();
        assert!((distance(&pts) - 111_318.85).abs() < 0.011);
    }
}
