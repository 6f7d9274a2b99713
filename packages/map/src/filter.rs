//! Severity filtering for heatmap points.

use road_risk_models::{HeatmapPoint, SeverityBucket};

/// Points selected by `bucket`, borrowed, in input order.
pub fn visible<'a>(
    points: &'a [HeatmapPoint],
    bucket: SeverityBucket,
) -> impl Iterator<Item = &'a HeatmapPoint> + 'a {
    points.iter().filter(move |p| bucket.includes(p.intensity))
}

/// Returns the points selected by `bucket`, preserving their relative
/// order. `SeverityBucket::All` returns every point.
#[must_use]
pub fn filter(points: &[HeatmapPoint], bucket: SeverityBucket) -> Vec<HeatmapPoint> {
    visible(points, bucket).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(intensity: f64) -> HeatmapPoint {
        HeatmapPoint {
            latitude: 20.0,
            longitude: 78.0,
            intensity,
            accident_count: 1,
            total_casualties: 0,
            severity_label: String::new(),
        }
    }

    fn intensities(points: &[HeatmapPoint]) -> Vec<f64> {
        points.iter().map(|p| p.intensity).collect()
    }

    fn sample() -> Vec<HeatmapPoint> {
        [0.9, 0.1, 0.4, 0.7, 0.55, 1.0, 0.41, 0.0]
            .into_iter()
            .map(point)
            .collect()
    }

    #[test]
    fn all_keeps_everything_in_order() {
        let points = sample();
        assert_eq!(filter(&points, SeverityBucket::All), points);
    }

    #[test]
    fn buckets_partition_in_order() {
        let points = sample();
        assert_eq!(
            intensities(&filter(&points, SeverityBucket::High)),
            [0.9, 1.0]
        );
        assert_eq!(
            intensities(&filter(&points, SeverityBucket::Medium)),
            [0.7, 0.55, 0.41]
        );
        assert_eq!(
            intensities(&filter(&points, SeverityBucket::Low)),
            [0.1, 0.4, 0.0]
        );
    }

    #[test]
    fn boundaries() {
        let points = vec![point(0.4), point(0.7)];
        assert_eq!(intensities(&filter(&points, SeverityBucket::Low)), [0.4]);
        assert_eq!(intensities(&filter(&points, SeverityBucket::Medium)), [0.7]);
        assert!(filter(&points, SeverityBucket::High).is_empty());
    }

    #[test]
    fn idempotent() {
        let points = sample();
        for &bucket in SeverityBucket::all() {
            let once = filter(&points, bucket);
            assert_eq!(filter(&once, bucket), once, "{bucket} not idempotent");
        }
    }

    #[test]
    fn buckets_cover_every_point_once() {
        let points = sample();
        let total: usize = [
            SeverityBucket::Low,
            SeverityBucket::Medium,
            SeverityBucket::High,
        ]
        .into_iter()
        .map(|b| filter(&points, b).len())
        .sum();
        assert_eq!(total, points.len());
    }

    #[test]
    fn empty_input() {
        assert!(filter(&[], SeverityBucket::High).is_empty());
        assert_eq!(visible(&[], SeverityBucket::All).count(), 0);
    }
}
