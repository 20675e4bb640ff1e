/// Constants describing the on-disk tub store layout.
pub mod store {
    /// Manifest filename at the store root.
    pub const MANIFEST_FILENAME: &str = "manifest.json";
    /// Prefix shared by all catalog segment filenames.
    pub const CATALOG_PREFIX: &str = "catalog_";
    /// Extension shared by all catalog segment filenames.
    pub const CATALOG_EXTENSION: &str = "catalog";
    /// Conventional subdirectory holding image artifacts.
    pub const IMAGES_SUBDIR: &str = "images";
    /// Manifest field tracking record indices excluded from training.
    pub const DELETED_INDEXES_FIELD: &str = "deleted_indexes";
}

/// Constants used by the zero-steering sequence detector.
pub mod detector {
    /// Steering magnitudes strictly below this count as "zero angle".
    pub const ZERO_ANGLE_EPSILON: f64 = 0.05;
    /// Records inspected on each side of a run for turn context.
    pub const TURN_CONTEXT_WINDOW: usize = 5;
    /// A side mean strictly above this marks the run as turn-adjacent.
    pub const TURN_SUPPRESSION_THRESHOLD: f64 = 0.1;
}

/// Default thresholds for the command surface.
pub mod defaults {
    /// Maximum acceptable mean grayscale intensity.
    pub const MAX_BRIGHTNESS: f64 = 250.0;
    /// Minimum acceptable mean grayscale intensity.
    pub const MIN_BRIGHTNESS: f64 = 20.0;
    /// Longest zero-angle run tolerated before flagging.
    pub const MAX_ZERO_ANGLE_COUNT: usize = 10;
}
