//! Per-image timing when a request leaves it to the service

use std::time::Duration;

use crate::video::ImageFrame;

/// Length of the gaps between `count` images
fn total_gap(count: usize, gap: Duration) -> Duration {
    gap * count.saturating_sub(1) as u32
}

/// `count * per_image + (count - 1) * gap`
pub fn estimate_total_duration(count: usize, per_image: Duration, gap: Duration) -> Duration {
    per_image * count as u32 + total_gap(count, gap)
}

/// Give every image an equal share of `total` minus the gaps, back to back
///
/// Start times accumulate the assigned durations, so image `i` starts at
/// `i * duration`.
pub fn distribute_timing(images: &mut [ImageFrame], total: Duration, gap: Duration) {
    if images.is_empty() {
        return;
    }

    let available = total.saturating_sub(total_gap(images.len(), gap));
    let duration = available / images.len() as u32;

    let mut start = Duration::ZERO;
    for image in images.iter_mut() {
        image.duration = duration;
        image.start_time = start;
        start += duration;
    }
}
