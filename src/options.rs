//! Extraction options and configuration.
//!
//! Every empirically tuned threshold in the pipeline is exposed here rather
//! than hard-coded, so per-bank formats can override them.

/// Options for statement extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Vertical tolerance in points when grouping runs into rows.
    ///
    /// Useful values sit between 2.0 and 8.0 depending on how tightly the
    /// statement packs its lines.
    pub row_tolerance: f32,

    /// Minimum horizontal gap in points that separates two column zones
    /// in the natural-gap detector.
    pub column_gap: f32,

    /// Absolute difference (whole FCFA) below which the calculated and
    /// declared closing balances are considered to agree.
    pub validation_tolerance: i64,

    /// Smallest numeric value treated as a monetary amount by the strict
    /// amount filter. Anything at or below this is a reference number.
    pub materiality_floor: i64,

    /// Iteration bound for the adaptive k-means clustering.
    pub max_cluster_iterations: usize,

    /// Maximum cluster count explored by the optimal-k search.
    pub max_zone_count: usize,

    /// How many of a template's detector phrases must appear in the page
    /// text before its calibrated zone table is used.
    pub detector_threshold: usize,

    /// Whether the two strategies run on separate threads.
    pub parallel: bool,
}

impl ExtractOptions {
    /// Create new extraction options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the row-grouping tolerance.
    pub fn with_row_tolerance(mut self, tolerance: f32) -> Self {
        self.row_tolerance = tolerance;
        self
    }

    /// Set the column-gap threshold.
    pub fn with_column_gap(mut self, gap: f32) -> Self {
        self.column_gap = gap;
        self
    }

    /// Set the validation tolerance.
    pub fn with_validation_tolerance(mut self, tolerance: i64) -> Self {
        self.validation_tolerance = tolerance;
        self
    }

    /// Set the materiality floor for the strict amount filter.
    pub fn with_materiality_floor(mut self, floor: i64) -> Self {
        self.materiality_floor = floor;
        self
    }

    /// Set the maximum number of adaptive zones.
    pub fn with_max_zone_count(mut self, count: usize) -> Self {
        self.max_zone_count = count;
        self
    }

    /// Set the template detector threshold.
    pub fn with_detector_threshold(mut self, threshold: usize) -> Self {
        self.detector_threshold = threshold;
        self
    }

    /// Run both strategies on the calling thread.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            row_tolerance: 4.0,
            column_gap: 20.0,
            validation_tolerance: 1000,
            materiality_floor: 500,
            max_cluster_iterations: 100,
            max_zone_count: 8,
            detector_threshold: 3,
            parallel: true,
        }
    }
}
