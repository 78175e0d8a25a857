//! Display formatting for the header and weather panels.

use crate::compass::CompassDirection;
use crate::models::WeatherSnapshot;

/// Address shown when reverse geocoding fails.
pub const ADDRESS_PLACEHOLDER: &str = "Address unavailable";

/// Longitude badge, e.g. "E129.20°". Western longitudes use "W".
pub fn format_longitude(lon: f64) -> String {
    let hemi = if lon < 0.0 { 'W' } else { 'E' };
    format!("{}{:.2}°", hemi, lon.abs())
}

/// Latitude badge, e.g. "N35.80°". Southern latitudes use "S".
pub fn format_latitude(lat: f64) -> String {
    let hemi = if lat < 0.0 { 'S' } else { 'N' };
    format!("{}{:.2}°", hemi, lat.abs())
}

/// Wind line for the weather panel, e.g. "Southwest wind 2.3 m/s".
/// Direction is where the wind blows from.
pub fn describe_wind(weather: &WeatherSnapshot) -> String {
    let dir = CompassDirection::from_angle(weather.wind_direction);
    format!("{} wind {:.1} m/s", dir, weather.wind_speed)
}

/// Humidity readout, "--%" when the source did not report it.
pub fn format_humidity(humidity: Option<f64>) -> String {
    match humidity {
        Some(h) => format!("{:.0}%", h),
        None => "--%".to_string(),
    }
}

/// Rotation for a compass needle so it keeps pointing north while the map turns.
pub fn compass_needle_rotation(bearing: f64) -> f64 {
    let r = -bearing % 360.0;
    if r < 0.0 { r + 360.0 } else { r }
}
