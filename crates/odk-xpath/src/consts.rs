pub const XML_URI: &str = "http://www.w3.org/XML/1998/namespace";

pub const MILLIS_PER_DAY: f64 = 86_400_000.0;
pub const EARTH_EQUATORIAL_RADIUS_METERS: f64 = 6_378_100.0;
