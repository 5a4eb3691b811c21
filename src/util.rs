/// Checked numeric conversions.
///
/// Conversions between `i64`, `usize` and `f64` that refuse to lose data
/// silently. Used by the sandbox for mixed integer/real arithmetic, indexing
/// and the `int`/`round` safe functions.
pub mod num;
