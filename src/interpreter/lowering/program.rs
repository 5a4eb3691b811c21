use std::rc::Rc;

use tracing::debug;

use crate::{
    ast::{Expression, ExternalCommand, FunctionDef, Statement},
    interpreter::{parser::external::is_read_form, value::core::Value},
};

/// Name of the registry function a multi-value `print` lowers to.
pub const PRINT_MANY: &str = "print_many";

/// A nested instruction sequence.
pub type Block = Vec<Instruction>;

/// Where an instruction gets a value from when it runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A value fixed at compile time.
    Const(Value),
    /// A variable, looked up when the instruction runs.
    Load(String),
    /// Source text for the sandbox, evaluated when the instruction runs.
    Eval(String),
}

impl From<&Expression> for Operand {
    fn from(expr: &Expression) -> Self {
        match expr {
            Expression::NumberLiteral(literal) => Self::Const(Value::from(*literal)),
            Expression::StringLiteral(text) => Self::Const(Value::from(text.as_str())),
            Expression::VariableRef(name) => Self::Load(name.clone()),
            Expression::RawExpression(source) => Self::Eval(source.clone()),
        }
    }
}

/// A user function: its parameters and its lowered body.
#[derive(Debug, Clone, PartialEq)]
pub struct UserFunction {
    /// The name the function is installed under.
    pub name:   String,
    /// Parameter names in declaration order.
    pub params: Vec<String>,
    /// The lowered body.
    pub body:   Block,
    /// Line of the `solar_def` header.
    pub line:   usize,
}

/// One step of the intermediate program.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Bind `name` to the operand's value.
    Store {
        /// The variable.
        name:  String,
        /// The value.
        value: Operand,
        /// Line number in the source code.
        line:  usize,
    },
    /// Print one value.
    Print {
        /// The value.
        value: Operand,
        /// Line number in the source code.
        line:  usize,
    },
    /// Call a registry function.
    Invoke {
        /// The registry name.
        target: String,
        /// Arguments, resolved left to right.
        args:   Vec<Operand>,
        /// Line number in the source code.
        line:   usize,
    },
    /// Run `block` if the condition is truthy.
    Guard {
        /// The condition.
        condition: Operand,
        /// The guarded instructions.
        block:     Block,
        /// Line number in the source code.
        line:      usize,
    },
    /// Register a user function. Until this runs, the name is not callable.
    Install {
        /// The function.
        function: Rc<UserFunction>,
        /// Line number in the source code.
        line:     usize,
    },
    /// Install a native library.
    Import {
        /// The library name.
        module: String,
        /// Line number in the source code.
        line:   usize,
    },
    /// Hand a command to the host.
    Dispatch {
        /// The command, tokens exactly as parsed.
        command: ExternalCommand,
    },
    /// Emit passthrough text.
    Verbatim {
        /// The text as written.
        text: String,
        /// Line number of the first line.
        line: usize,
    },
    /// Run `body` once per frame while the host keeps `handle` alive.
    Loop {
        /// The host handle.
        handle: String,
        /// Instructions run each frame.
        body:   Block,
        /// Line number in the source code.
        line:   usize,
    },
}

impl Instruction {
    /// Returns the source line the instruction came from.
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::Store { line, .. }
            | Self::Print { line, .. }
            | Self::Invoke { line, .. }
            | Self::Guard { line, .. }
            | Self::Install { line, .. }
            | Self::Import { line, .. }
            | Self::Verbatim { line, .. }
            | Self::Loop { line, .. } => *line,
            Self::Dispatch { command } => command.line,
        }
    }

    /// Returns the instruction's name in the rendered program.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Store { .. } => "store",
            Self::Print { .. } => "print",
            Self::Invoke { .. } => "invoke",
            Self::Guard { .. } => "guard",
            Self::Install { .. } => "install",
            Self::Import { .. } => "import",
            Self::Dispatch { .. } => "dispatch",
            Self::Verbatim { .. } => "verbatim",
            Self::Loop { .. } => "loop",
        }
    }
}

/// The lowered form of a program, ready to run.
///
/// Its `Display` form is the text printed by `solar compile`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IntermediateProgram {
    /// Top-level instructions in document order.
    pub instructions: Block,
}

/// Lowers parsed statements into an intermediate program.
///
/// Statements are walked in document order and each one becomes exactly one
/// instruction. Conditionals, function bodies and loop bodies become nested
/// blocks. A function definition becomes an `Install` at the point where it
/// appears, so the function is callable only after that point.
///
/// # Example
/// ```
/// use solar::interpreter::{
///     lowering::program::{Instruction, Operand, lower},
///     parser::core::parse_program,
/// };
///
/// let parsed = parse_program("let x = 2\nif (x > 1) then print x", false).unwrap();
/// let program = lower(&parsed.statements);
/// assert_eq!(program.instructions.len(), 2);
/// assert!(matches!(&program.instructions[1],
///                  Instruction::Guard { condition: Operand::Eval(_), block, .. } if block.len() == 1));
/// ```
#[must_use]
pub fn lower(statements: &[Statement]) -> IntermediateProgram {
    IntermediateProgram { instructions: lower_block(statements) }
}

fn lower_block(statements: &[Statement]) -> Block {
    statements.iter().map(lower_statement).collect()
}

fn lower_statement(statement: &Statement) -> Instruction {
    let instruction = match statement {
        Statement::Binding { name, expr, line } => Instruction::Store { name:  name.clone(),
                                                                        value: Operand::from(expr),
                                                                        line:  *line, },
        Statement::Output { exprs, line } => match exprs.as_slice() {
            [single] => Instruction::Print { value: Operand::from(single),
                                             line:  *line, },
            _ => Instruction::Invoke { target: PRINT_MANY.to_string(),
                                       args:   exprs.iter().map(Operand::from).collect(),
                                       line:   *line, },
        },
        Statement::Call { target, args, line } => Instruction::Invoke { target: target.clone(),
                                                                        args:   args.iter()
                                                                                    .map(Operand::from)
                                                                                    .collect(),
                                                                        line:   *line, },
        Statement::Conditional { cond, then, line } => Instruction::Guard { condition: Operand::from(cond),
                                                                            block:     vec![lower_statement(then)],
                                                                            line:      *line, },
        Statement::FunctionDef(def) => lower_function(def),
        Statement::Loop { handle, body, line } => Instruction::Loop { handle: handle.clone(),
                                                                      body:   lower_block(body),
                                                                      line:   *line, },
        Statement::Directive { module_name, line } => Instruction::Import { module: module_name.clone(),
                                                                           line:   *line, },
        Statement::Passthrough { raw_text, line } => Instruction::Verbatim { text: raw_text.clone(),
                                                                             line: *line, },
        Statement::ExternalCommand(command) => {
            debug!(category = %command.category,
                   sub_command = %command.sub_command,
                   read_form = is_read_form(&command.category, &command.sub_command),
                   line = command.line,
                   "lowered external command");
            Instruction::Dispatch { command: command.clone() }
        },
    };
    debug!(line = instruction.line(), "lowered {}", instruction.keyword());
    instruction
}

fn lower_function(def: &FunctionDef) -> Instruction {
    let function = UserFunction { name:   def.name.clone(),
                                  params: def.params.clone(),
                                  body:   lower_block(&def.body),
                                  line:   def.line, };
    Instruction::Install { function: Rc::new(function),
                           line:     def.line, }
}
