use std::fmt::{self, Display, Formatter};

use crate::interpreter::{
    lowering::program::{Instruction, IntermediateProgram, Operand},
    tokenizer::{Token, quote},
    value::core::Value,
};

const INDENT: &str = "    ";

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(Value::Str(text)) => write!(f, "{}", quote(text)),
            Self::Const(value) => write!(f, "{value}"),
            Self::Load(name) => write!(f, "${name}"),
            Self::Eval(source) => write!(f, "`{source}`"),
        }
    }
}

impl Display for IntermediateProgram {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_block(f, &self.instructions, 0)
    }
}

fn write_block(f: &mut Formatter<'_>, block: &[Instruction], depth: usize) -> fmt::Result {
    for instruction in block {
        write_instruction(f, instruction, depth)?;
    }
    Ok(())
}

/// Writes `items` separated by `, `.
fn write_list<T: Display>(f: &mut Formatter<'_>, items: &[T]) -> fmt::Result {
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_instruction(f: &mut Formatter<'_>, instruction: &Instruction, depth: usize) -> fmt::Result {
    let pad = INDENT.repeat(depth);
    write!(f, "{pad}{}", instruction.keyword())?;
    match instruction {
        Instruction::Store { name, value, .. } => writeln!(f, " {name} = {value}"),
        Instruction::Print { value, .. } => writeln!(f, " {value}"),
        Instruction::Invoke { target, args, .. } => {
            write!(f, " {target}(")?;
            write_list(f, args)?;
            writeln!(f, ")")
        },
        Instruction::Guard { condition, block, .. } => {
            writeln!(f, " {condition}:")?;
            write_block(f, block, depth + 1)
        },
        Instruction::Install { function, .. } => {
            write!(f, " {}(", function.name)?;
            write_list(f, &function.params)?;
            writeln!(f, "):")?;
            write_block(f, &function.body, depth + 1)
        },
        Instruction::Import { module, .. } => writeln!(f, " {module}"),
        Instruction::Dispatch { command } => {
            write!(f, " {} {}", command.category, command.sub_command)?;
            for (text, &was_quoted) in command.raw_tokens.iter().zip(&command.quoted_flags) {
                let token = Token { text: text.clone(),
                                    was_quoted };
                write!(f, " {}", token.to_source())?;
            }
            writeln!(f)
        },
        Instruction::Verbatim { text, .. } => {
            writeln!(f, ":")?;
            for line in text.lines() {
                writeln!(f, "{pad}{INDENT}| {line}")?;
            }
            Ok(())
        },
        Instruction::Loop { handle, body, .. } => {
            writeln!(f, " {handle}:")?;
            write_block(f, body, depth + 1)
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::interpreter::{lowering::program::lower, parser::core::parse_program};

    fn render(source: &str) -> String {
        lower(&parse_program(source, false).unwrap().statements).to_string()
    }

    #[test]
    fn operands_show_their_kind() {
        assert_eq!(render("let a = 3\nlet b = 2.0\nlet c = \"x\"\nlet d = a\nlet e = a + 1"),
                   "store a = 3\nstore b = 2.0\nstore c = \"x\"\nstore d = $a\nstore e = `a + 1`\n");
    }

    #[test]
    fn nested_blocks_are_indented() {
        let text = render("solar_def greet(name):\n    print \"hi\" name\nend\ngreet \"bob\"");
        assert_eq!(text, "install greet(name):\n    invoke print_many(\"hi\", $name)\ninvoke greet(\"bob\")\n");
    }

    #[test]
    fn verbatim_lines_are_prefixed() {
        let text = render("def helper():\n    return 1");
        assert_eq!(text, "verbatim:\n    | def helper():\n    |     return 1\n");
    }
}
