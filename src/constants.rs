/// Decimal precision for calculated metrics
pub const DECIMAL_PRECISION: u32 = 6;

/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Rounding scale for lot quantities and cost basis
pub const ROUNDING_SCALE: u32 = 8;

/// Quantity threshold below which a position is considered closed
pub const QUANTITY_THRESHOLD: &str = "0.00000001";

/// Days per year used when annualizing returns
pub const DAYS_PER_YEAR: u32 = 365;

/// Holding period (in days) beyond which a position counts as long-term
pub const LONG_TERM_THRESHOLD_DAYS: i64 = 365;

/// Drift threshold bounds for rebalancing strategies (percent)
pub const MIN_DRIFT_THRESHOLD: &str = "1";
pub const MAX_DRIFT_THRESHOLD: &str = "50";

/// Default drift threshold for new strategies (percent)
pub const DEFAULT_DRIFT_THRESHOLD: &str = "5";
