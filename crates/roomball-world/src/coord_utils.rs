use roomball_core::{DetectionSample, RoomVolume, Vector3};

/// Convert a landmark pixel and its normalized depth to room coordinates.
///
/// - Column `0` maps to `min_x` and column `frame_width` to `max_x`.
/// - Row `0` (top of the image) maps to `max_y` and row `frame_height` to `min_y`.
/// - Depth `1` (nearest) maps to `min_z` and depth `0` (farthest) to `max_z`.
///
/// Pixel ratios and depth are clamped to `[0, 1]`, so the result always lies inside
/// the room. Without a usable sample the previous position is returned unchanged: the
/// marker freezes instead of jumping. A sample is unusable if the frame is empty or
/// the depth is not a number.
pub fn to_room_coords(
    sample: Option<&DetectionSample>,
    previous: Vector3,
    frame_width: u32,
    frame_height: u32,
    room: &RoomVolume,
) -> Vector3 {
    let Some(sample) = sample else {
        return previous;
    };
    if !is_usable(sample, frame_width, frame_height) {
        log::debug!("Discarding unusable detection sample {:?}", sample);
        return previous;
    }

    let rx = (sample.pixel_x as f64 / frame_width as f64).clamp(0.0, 1.0);
    let ry = (sample.pixel_y as f64 / frame_height as f64).clamp(0.0, 1.0);
    let depth = sample.depth.clamp(0.0, 1.0);

    Vector3::new(
        room.min_x + rx * (room.max_x - room.min_x),
        room.max_y - ry * (room.max_y - room.min_y),
        room.min_z + (1.0 - depth) * (room.max_z - room.min_z),
    )
}

/// Whether the sample can be mapped at all: the frame is not empty and the depth is a
/// number.
pub fn is_usable(sample: &DetectionSample, frame_width: u32, frame_height: u32) -> bool {
    frame_width > 0 && frame_height > 0 && sample.depth.is_finite()
}

/// Like [`to_room_coords`], using the frame size the sample was taken from.
pub fn sample_to_room_coords(
    sample: Option<&DetectionSample>,
    previous: Vector3,
    room: &RoomVolume,
) -> Vector3 {
    match sample {
        Some(s) => to_room_coords(Some(s), previous, s.frame_width, s.frame_height, room),
        None => previous,
    }
}

/// Convert room coordinates (y up) to a z-up scene graph.
///
/// The room's depth axis becomes the scene's forward axis and its height the
/// scene's up axis.
pub fn to_z_up(position: Vector3) -> Vector3 {
    Vector3::new(position.x, position.z, position.y)
}
