use fireline_overlay::store::OverlaySnapshot;
use fireline_shared::format::{
    compass_needle_rotation, describe_wind, format_humidity, format_latitude, format_longitude,
    ADDRESS_PLACEHOLDER,
};

/// Plain-text briefing for a snapshot of the overlay.
pub fn render_briefing(snap: &OverlaySnapshot) -> String {
    let mut out = String::new();

    out.push_str("=== Incident ===\n");
    out.push_str(&format!(
        "  {}  {}  {}\n",
        snap.address.as_deref().unwrap_or(ADDRESS_PLACEHOLDER),
        format_longitude(snap.incident.longitude),
        format_latitude(snap.incident.latitude)
    ));
    out.push_str(&format!("  Phase: {:?}\n", snap.phase));
    out.push_str(&format!(
        "  Compass: {:.0}°\n\n",
        compass_needle_rotation(snap.bearing)
    ));

    out.push_str("=== Helicopter Deployment ===\n");
    out.push_str(&format!("  {}\n\n", snap.helicopter_status()));

    out.push_str("=== Firefighting Strategy ===\n");
    match snap.plan() {
        Some(plan) => {
            out.push_str(&format!(
                "  Slope {:.1}°, elevation {:.0} m\n",
                plan.slope, plan.elevation
            ));
            for entry in &plan.entry_points {
                out.push_str(&format!("  - {}\n", entry));
            }
            out.push('\n');
            for line in plan.strategy_text.lines() {
                out.push_str(&format!("  {}\n", line));
            }
        }
        None => out.push_str("  Plan unavailable\n"),
    }
    out.push('\n');

    out.push_str("=== Weather Information ===\n");
    match snap.weather() {
        Some(w) => {
            out.push_str(&format!("  {}\n", describe_wind(w)));
            out.push_str(&format!("  Humidity {}\n", format_humidity(w.humidity)));
        }
        None => out.push_str("  Weather unavailable\n"),
    }
    out.push('\n');

    out.push_str(&format!("=== Markers ({}) ===\n", snap.markers.len()));
    for m in &snap.markers {
        out.push_str(&format!(
            "  {} at {:.5}, {:.5}\n",
            m.label, m.coordinates.latitude, m.coordinates.longitude
        ));
    }
    out.push('\n');

    out.push_str("=== Contour ===\n");
    match &snap.contour_filter {
        Some(filter) => out.push_str(&format!(
            "  {} ({})\n",
            filter,
            if snap.contour_visible { "visible" } else { "hidden at this zoom" }
        )),
        None => out.push_str("  Not selected\n"),
    }

    out
}
