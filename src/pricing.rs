//! Kimi K2 pricing table and cost arithmetic.

/// Price per one million input tokens, in USD.
pub const INPUT_PRICE_PER_MTOK: f64 = 0.15;

/// Price per one million output tokens, in USD.
pub const OUTPUT_PRICE_PER_MTOK: f64 = 2.50;

const TOKENS_PER_MTOK: f64 = 1_000_000.0;

/// Rounds a USD amount to 6 decimal places.
///
/// Costs are rounded per record before being accumulated, so stored totals
/// may drift from an exact sum by the cumulative rounding error.
pub fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

/// Calculates the cost in USD for the given token counts.
///
/// Pure function: `round6(input/1M * $0.15 + output/1M * $2.50)`.
/// Token counts are unsigned, so negative inputs are unrepresentable.
pub fn calculate_cost(input_tokens: u64, output_tokens: u64) -> f64 {
    let input_cost = (input_tokens as f64 / TOKENS_PER_MTOK) * INPUT_PRICE_PER_MTOK;
    let output_cost = (output_tokens as f64 / TOKENS_PER_MTOK) * OUTPUT_PRICE_PER_MTOK;
    round6(input_cost + output_cost)
}
