use image::RgbaImage;

use crate::models::{Color, ColorCluster};

/// Only every Nth pixel is sampled when looking for fill colors
pub const SAMPLING_RATE: usize = 10;
/// Upper bound on the clusters returned by [`find_apartment_colors`]
pub const MAX_CLUSTERS: usize = 30;

/// Running state of one cluster; the centroid is the mean of every merged sample
struct ClusterAccumulator {
    sum: [u64; 3],
    count: u32,
}

impl ClusterAccumulator {
    fn seed(sample: Color) -> Self {
        Self {
            sum: [sample.r as u64, sample.g as u64, sample.b as u64],
            count: 1,
        }
    }

    fn mean(&self) -> [f64; 3] {
        let n = self.count as f64;
        [
            self.sum[0] as f64 / n,
            self.sum[1] as f64 / n,
            self.sum[2] as f64 / n,
        ]
    }

    fn distance(&self, sample: Color) -> f64 {
        let [r, g, b] = self.mean();
        let dr = sample.r as f64 - r;
        let dg = sample.g as f64 - g;
        let db = sample.b as f64 - b;
        (dr * dr + dg * dg + db * db).sqrt()
    }

    fn merge(&mut self, sample: Color) {
        self.sum[0] += sample.r as u64;
        self.sum[1] += sample.g as u64;
        self.sum[2] += sample.b as u64;
        self.count += 1;
    }

    fn to_cluster(&self) -> ColorCluster {
        let [r, g, b] = self.mean();
        ColorCluster {
            color: Color::new(r.round() as u8, g.round() as u8, b.round() as u8),
            count: self.count,
        }
    }
}

/// Collect fill-color samples, skipping transparent pixels and walls/background
pub fn sample_colors(image: &RgbaImage) -> Vec<Color> {
    image
        .as_raw()
        .chunks_exact(4)
        .step_by(SAMPLING_RATE)
        .filter(|px| px[3] >= 128)
        .map(|px| Color::new(px[0], px[1], px[2]))
        .filter(|c| !c.is_structural())
        .collect()
}

/// Group samples into clusters of similar color
pub fn cluster_samples(samples: &[Color]) -> Vec<ColorCluster> {
    let mut clusters: Vec<ClusterAccumulator> = Vec::new();

    for &sample in samples {
        // Stricter once the palette gets busy, so distinct apartments don't merge
        let cluster_distance = if clusters.len() > 20 { 25.0 } else { 30.0 };

        match clusters.iter_mut().find(|c| c.distance(sample) < cluster_distance) {
            Some(cluster) => cluster.merge(sample),
            None => clusters.push(ClusterAccumulator::seed(sample)),
        }
    }

    let min_cluster_size = (samples.len() as f64 * 0.003).max(10.0);
    let mut significant: Vec<ColorCluster> = clusters
        .iter()
        .filter(|c| c.count as f64 > min_cluster_size)
        .map(ClusterAccumulator::to_cluster)
        .collect();

    significant.sort_by(|a, b| b.count.cmp(&a.count));
    significant.truncate(MAX_CLUSTERS);
    significant
}

/// Find the distinct fill colors of a floor plan, most frequent first
pub fn find_apartment_colors(image: &RgbaImage) -> Vec<ColorCluster> {
    let samples = sample_colors(image);
    log::debug!("Collected {} color samples", samples.len());

    let clusters = cluster_samples(&samples);
    log::debug!("Found {} significant color clusters", clusters.len());
    clusters
}

/// Pick up to `count` clusters, in order, none closer than `tolerance` to an
/// already picked one. May return fewer than `count`.
pub fn select_dominant_colors(
    clusters: &[ColorCluster],
    count: usize,
    tolerance: f64,
) -> Vec<ColorCluster> {
    let mut selected: Vec<ColorCluster> = Vec::with_capacity(count);
    if count == 0 {
        return selected;
    }

    for cluster in clusters {
        let too_similar = selected
            .iter()
            .any(|chosen| chosen.color.distance(&cluster.color) < tolerance);

        if !too_similar {
            selected.push(*cluster);
            if selected.len() >= count {
                break;
            }
        }
    }

    selected
}
