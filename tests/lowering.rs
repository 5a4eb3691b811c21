use solar::{
    ast::{ExternalCommand, Statement},
    compile_source,
    config::Config,
    interpreter::{
        lowering::program::{Instruction, lower},
        parser::core::parse_program,
        tokenizer::tokenize,
    },
};

const COMMANDS: &str = r#"ui label main title "say \"hi\"" at 10 20
gfx text s "42" "at" at (x + 1) 3
ui button main go "a b" at 1 2 do f f\(x "x"
gfx key s 'left' into pressed"#;

fn external_commands(source: &str) -> Vec<ExternalCommand> {
    parse_program(source, false).unwrap()
                                .statements
                                .into_iter()
                                .filter_map(|stmt| match stmt {
                                    Statement::ExternalCommand(cmd) => Some(cmd),
                                    _ => None,
                                })
                                .collect()
}

#[test]
fn dispatch_rendering_reproduces_tokens() {
    let commands = external_commands(COMMANDS);
    assert_eq!(commands.len(), 4);

    let rendered = compile_source(COMMANDS, &Config::default()).unwrap().to_string();
    for (line, cmd) in rendered.lines().zip(&commands) {
        let tokens = tokenize(line, 1).unwrap();
        assert_eq!(tokens[0].text, "dispatch");
        assert_eq!(tokens[1].text, cmd.category);
        assert_eq!(tokens[2].text, cmd.sub_command);

        let texts: Vec<_> = tokens[3..].iter().map(|t| t.text.clone()).collect();
        let flags: Vec<_> = tokens[3..].iter().map(|t| t.was_quoted).collect();
        assert_eq!(texts, cmd.raw_tokens, "{line}");
        assert_eq!(flags, cmd.quoted_flags, "{line}");
    }
}

#[test]
fn quoted_tokens_stay_strings() {
    let commands = external_commands(COMMANDS);
    assert_eq!(commands[1].raw_tokens[1], "42");
    assert!(commands[1].quoted_flags[1]);
    assert_eq!(commands[1].marker_position("at"), Some(3));
    assert_eq!(commands[2].raw_tokens[7], "f(x");
}

#[test]
fn programs_render_in_document_order() {
    let source = "\
use math
let x = 3
if x then print x
solar_def f(a):
    add a 1
end
f x
ui window main";
    let expected = "\
import math
store x = 3
guard $x:
    print $x
install f(a):
    invoke add($a, 1)
invoke f($x)
dispatch ui window main
";
    assert_eq!(compile_source(source, &Config::default()).unwrap().to_string(), expected);
}

#[test]
fn definitions_install_where_they_appear() {
    let parsed = parse_program("f 1\nsolar_def f(n):\n    print n\nend\nf 2", false).unwrap();
    let program = lower(&parsed.statements);
    let keywords: Vec<_> = program.instructions.iter().map(Instruction::keyword).collect();
    assert_eq!(keywords, ["invoke", "install", "invoke"]);
    assert_eq!(program.instructions[1].line(), 2);
}

#[test]
fn loops_lower_to_nested_blocks() {
    let source = "loop screen:\n    gfx present screen\n    print 1\nend";
    let program = compile_source(source, &Config::default()).unwrap();
    let [Instruction::Loop { handle, body, line }] = program.instructions.as_slice() else {
        panic!("expected a single loop");
    };
    assert_eq!((handle.as_str(), *line), ("screen", 1));
    assert_eq!(body.len(), 2);
}
