/// Runtime values.
///
/// Defines the `Value` enum shared by the sandbox and the runtime: numbers,
/// booleans, strings, lists, tuples, maps, `None` and opaque host handles.
/// Provides truthiness, conversions and the display forms used by `print`.
pub mod core;
/// Map keys.
///
/// Defines `MapKey`, the hashable and ordered subset of values allowed as
/// keys of a `Value::Map`. Reals are wrapped in `OrderedFloat` so maps keep a
/// total order.
pub mod map_key;
