//! Column zone model: ordered, non-overlapping x-intervals.
//!
//! Zones come from one of two interchangeable strategies. Calibrated zones
//! are a per-bank table of named intervals at a reference page width, scaled
//! to the observed width. Adaptive zones are clustered from the observed x
//! start positions with deterministic k-means: centroids are initialized
//! evenly spaced between min and max, never randomly, so identical input
//! always yields identical zones.

/// Placeholder cell text inserted when a row has no amount-zone run.
pub const NA_PLACEHOLDER: &str = "N/A";

/// Horizontal alignment declared for a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// Text anchored at the zone's left edge.
    Left,
    /// Numbers anchored at the zone's right edge.
    Right,
}

/// Content type a zone expects, used by the scoring engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// `DD/MM/YYYY` dates.
    Date,
    /// Plain integers (check and reference numbers).
    Integer,
    /// Digits-and-spaces monetary amounts.
    Amount,
    /// Free text.
    Text,
}

/// A named zone interval at the template's reference width.
#[derive(Debug, Clone)]
pub struct ZoneSpec {
    /// Column name, e.g. "date_operation".
    pub name: &'static str,
    /// Left edge at reference width.
    pub x_min: f32,
    /// Right edge at reference width.
    pub x_max: f32,
    /// Declared alignment.
    pub alignment: Alignment,
    /// Expected content.
    pub content: ContentKind,
}

/// An ordered x-interval assigned to one logical column.
#[derive(Debug, Clone)]
pub struct ColumnZone {
    /// Left edge.
    pub x_start: f32,
    /// Right edge.
    pub x_end: f32,
    /// Column index, 0 = leftmost.
    pub index: usize,
    /// Declared alignment.
    pub alignment: Alignment,
    /// Expected content.
    pub content: ContentKind,
}

impl ColumnZone {
    /// Check if an x coordinate falls within this zone.
    pub fn contains(&self, x: f32) -> bool {
        x >= self.x_start && x <= self.x_end
    }

    /// Zone width.
    pub fn width(&self) -> f32 {
        self.x_end - self.x_start
    }

    /// Zone center.
    pub fn center(&self) -> f32 {
        (self.x_start + self.x_end) / 2.0
    }
}

/// Where a zone model came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneSource {
    /// Scaled from a matched template's zone table.
    Calibrated {
        /// Template identifier.
        template: String,
    },
    /// Clustered from observed x positions.
    Adaptive,
}

/// The ordered, non-overlapping zones for one document.
#[derive(Debug, Clone)]
pub struct ZoneModel {
    /// Zones ordered left to right.
    pub zones: Vec<ColumnZone>,
    /// Strategy that produced them.
    pub source: ZoneSource,
}

impl ZoneModel {
    /// Build zones from a calibrated template table, scaled by
    /// `page_width / reference_width`.
    pub fn calibrated(
        template_id: &str,
        specs: &[ZoneSpec],
        reference_width: f32,
        page_width: f32,
    ) -> Self {
        let scale = if reference_width > 0.0 {
            page_width / reference_width
        } else {
            1.0
        };

        let zones = specs
            .iter()
            .enumerate()
            .map(|(index, spec)| ColumnZone {
                x_start: spec.x_min * scale,
                x_end: spec.x_max * scale,
                index,
                alignment: spec.alignment,
                content: spec.content,
            })
            .collect();

        log::debug!(
            "ZoneModel: calibrated '{}' at scale {:.3}",
            template_id,
            scale
        );

        Self {
            zones,
            source: ZoneSource::Calibrated {
                template: template_id.to_string(),
            },
        }
    }

    /// Build zones adaptively from observed x start positions.
    ///
    /// When `k` is `None` the zone count is estimated with the optimal-k
    /// search. Cluster boundaries fall midway between adjacent centroids;
    /// the rightmost zone is declared a right-aligned amount column, which
    /// is where statement layouts put their money figures.
    pub fn adaptive(x_positions: &[f32], k: Option<usize>, max_k: usize, max_iter: usize) -> Self {
        let values = distinct_sorted(x_positions);
        if values.is_empty() {
            return Self {
                zones: vec![],
                source: ZoneSource::Adaptive,
            };
        }

        let k = k
            .unwrap_or_else(|| optimal_k(&values, max_k, max_iter))
            .clamp(1, values.len());
        let centroids = kmeans_1d(&values, k, max_iter);

        let min_x = values[0];
        let max_x = *values.last().unwrap_or(&min_x);
        let last = centroids.len().saturating_sub(1);

        let zones = centroids
            .iter()
            .enumerate()
            .map(|(index, &c)| {
                let x_start = if index == 0 {
                    min_x - 1.0
                } else {
                    (centroids[index - 1] + c) / 2.0
                };
                let x_end = if index == last {
                    // Leave room for the run text to the right of its start.
                    max_x + 120.0
                } else {
                    (c + centroids[index + 1]) / 2.0
                };
                let (alignment, content) = if index == last {
                    (Alignment::Right, ContentKind::Amount)
                } else {
                    (Alignment::Left, ContentKind::Text)
                };
                ColumnZone {
                    x_start,
                    x_end,
                    index,
                    alignment,
                    content,
                }
            })
            .collect();

        log::debug!("ZoneModel: adaptive k={} from {} positions", k, values.len());

        Self {
            zones,
            source: ZoneSource::Adaptive,
        }
    }

    /// The declared amount zone, when one exists.
    pub fn amount_zone(&self) -> Option<&ColumnZone> {
        self.zones.iter().find(|z| z.content == ContentKind::Amount)
    }

    /// Zone boundaries for diagnostics.
    pub fn bounds(&self) -> Vec<(f32, f32)> {
        self.zones.iter().map(|z| (z.x_start, z.x_end)).collect()
    }
}

/// Deterministic 1-D k-means.
///
/// Centroids start evenly spaced between min and max. Random initialization
/// would break reproducibility, which is a hard requirement here; do not
/// "fix" this to match textbook k-means.
pub fn kmeans_1d(values: &[f32], k: usize, max_iter: usize) -> Vec<f32> {
    if values.is_empty() || k == 0 {
        return vec![];
    }
    let k = k.min(values.len());

    let min = values
        .iter()
        .copied()
        .fold(f32::INFINITY, f32::min);
    let max = values
        .iter()
        .copied()
        .fold(f32::NEG_INFINITY, f32::max);

    let mut centroids: Vec<f32> = if k == 1 {
        vec![(min + max) / 2.0]
    } else {
        (0..k)
            .map(|i| min + (max - min) * i as f32 / (k - 1) as f32)
            .collect()
    };

    let mut assignment = vec![0usize; values.len()];

    for _ in 0..max_iter {
        let mut changed = false;
        for (i, &v) in values.iter().enumerate() {
            let nearest = nearest_centroid(v, &centroids);
            if assignment[i] != nearest {
                assignment[i] = nearest;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        for (c, centroid) in centroids.iter_mut().enumerate() {
            let members: Vec<f32> = values
                .iter()
                .zip(&assignment)
                .filter(|(_, &a)| a == c)
                .map(|(&v, _)| v)
                .collect();
            if !members.is_empty() {
                *centroid = members.iter().sum::<f32>() / members.len() as f32;
            }
        }
    }

    centroids.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    centroids
}

/// Detect zone boundaries from natural gaps in sorted unique x positions.
///
/// A gap of at least `gap_threshold` between consecutive positions closes
/// one zone and opens the next.
pub fn natural_gaps(x_positions: &[f32], gap_threshold: f32) -> Vec<(f32, f32)> {
    let values = distinct_sorted(x_positions);
    if values.is_empty() {
        return vec![];
    }

    let mut zones = Vec::new();
    let mut start = values[0];
    let mut prev = values[0];

    for &v in &values[1..] {
        if v - prev >= gap_threshold {
            zones.push((start, prev));
            start = v;
        }
        prev = v;
    }
    zones.push((start, prev));
    zones
}

/// Estimate the zone count by searching k = 1..=max_k for the smallest k
/// whose intra-cluster inertia is within 5% of the single-cluster spread,
/// falling back to the k with minimum inertia.
pub fn optimal_k(values: &[f32], max_k: usize, max_iter: usize) -> usize {
    let values = distinct_sorted(values);
    if values.len() <= 1 {
        return 1;
    }
    let max_k = max_k.clamp(1, values.len());

    let base = inertia(&values, &kmeans_1d(&values, 1, max_iter)).max(f32::EPSILON);
    let mut best_k = 1;
    let mut best_inertia = base;

    for k in 1..=max_k {
        let centroids = kmeans_1d(&values, k, max_iter);
        let cost = inertia(&values, &centroids);
        if cost <= base * 0.05 {
            return k;
        }
        if cost < best_inertia {
            best_inertia = cost;
            best_k = k;
        }
    }

    best_k
}

fn inertia(values: &[f32], centroids: &[f32]) -> f32 {
    values
        .iter()
        .map(|&v| {
            let c = centroids[nearest_centroid(v, centroids)];
            (v - c) * (v - c)
        })
        .sum()
}

fn nearest_centroid(value: f32, centroids: &[f32]) -> usize {
    let mut nearest = 0;
    let mut best = f32::INFINITY;
    for (i, &c) in centroids.iter().enumerate() {
        let d = (value - c).abs();
        if d < best {
            best = d;
            nearest = i;
        }
    }
    nearest
}

fn distinct_sorted(values: &[f32]) -> Vec<f32> {
    let mut out: Vec<f32> = values.to_vec();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    out.dedup_by(|a, b| (*a - *b).abs() < 0.5);
    out
}
