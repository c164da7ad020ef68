use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Owner ID of the pre-aggregated portfolio-wide daily series
pub const PORTFOLIO_TOTAL_OWNER_ID: &str = "TOTAL";

/// Decimal precision for return calculations
pub const DECIMAL_PRECISION: u32 = 6;

/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Unit-count differences below this are noise, not a buy or sell
pub const UNIT_CHANGE_THRESHOLD: Decimal = dec!(0.0001);

/// Fully-closed positions below this contribution (in percentage points)
/// are suppressed from the attribution list
pub const CLOSED_POSITION_MIN_PP: Decimal = dec!(0.01);

/// Default floor (in percentage points) below which contributions are
/// dropped from the waterfall
pub const DEFAULT_WATERFALL_MIN_PP: Decimal = dec!(0.1);

/// Default number of individually rendered positive waterfall bars
pub const DEFAULT_MAX_WATERFALL_BARS: usize = 8;

/// Negative-side waterfall budget as a fraction of the positive budget
pub const WATERFALL_NEGATIVE_BUDGET_RATIO: Decimal = dec!(0.3);

/// Divergence (in percentage points) between summed contributions and the
/// reference return that triggers reconciliation
pub const RECONCILIATION_TOLERANCE_PP: Decimal = dec!(0.000001);

/// Upper bound for live quote retrieval before the engine degrades to
/// historical-only output
pub const QUOTE_TIMEOUT_SECS: u64 = 5;

/// Cache TTL while an exchange session is open
pub const CACHE_TTL_TRADING_MINUTES: i64 = 5;
