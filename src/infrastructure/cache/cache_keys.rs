pub fn trip_view_prefix(trip_id: &str) -> String {
    format!("trip_view:{}:", trip_id)
}

/// Views carry the viewer's own share, so each viewer gets a separate slot.
pub fn trip_view_key(trip_id: &str, viewer_id: &str) -> String {
    format!("{}{}", trip_view_prefix(trip_id), viewer_id)
}
