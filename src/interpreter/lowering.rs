/// Instructions and the lowering pass.
///
/// Defines the intermediate program (operands, instructions, nested blocks,
/// user functions) and `lower`, which turns parsed statements into it in
/// document order.
pub mod program;

/// The textual form of an intermediate program, as printed by
/// `solar compile`.
pub mod render;
