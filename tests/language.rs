use std::fs;

use solar::{
    config::Config,
    error::{Error, ParseError, RuntimeError},
    interpreter::{
        runtime::{core::Runtime, headless::HeadlessHost},
        value::core::Value,
    },
    parse_source, run_source,
};
use walkdir::WalkDir;

#[test]
fn script_files_run() {
    let mut count = 0;

    for entry in
        WalkDir::new("tests/scripts").into_iter()
                                     .filter_map(Result::ok)
                                     .filter(|e| e.path().extension().is_some_and(|ext| ext == "solar"))
    {
        let path = entry.path();
        let content = fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"));

        count += 1;
        let host = HeadlessHost::new(false).with_frames(3);
        if let Err(e) = run_source(&content, host, &Config::default()) {
            panic!("Script {path:?} failed:\n{content}\nError: {e}");
        }
    }

    assert!(count > 0, "No scripts found in tests/scripts");
}

fn run_with(src: &str, host: HeadlessHost) -> Result<Runtime<HeadlessHost>, Error> {
    run_source(src, host, &Config::default())
}

fn assert_success(src: &str) -> Runtime<HeadlessHost> {
    run_with(src, HeadlessHost::new(false)).unwrap_or_else(|e| panic!("Script failed: {e}"))
}

fn assert_failure(src: &str) -> Error {
    match run_with(src, HeadlessHost::new(false)) {
        Ok(_) => panic!("Script succeeded but was expected to fail"),
        Err(e) => e,
    }
}

fn output(src: &str) -> Vec<String> {
    assert_success(src).host().output().to_vec()
}

#[test]
fn bindings_and_arithmetic() {
    assert_eq!(output("let x = 20\nlet y = (x + 1)\nprint y"), ["21"]);
    assert_eq!(output("let a = 2 + 3 * 4\nprint a"), ["14"]);
    assert_eq!(output("let r = 7 / 2\nprint r"), ["3.5"]);
    assert_eq!(output("let q = (7 // 2)\nprint q"), ["3"]);
}

#[test]
fn literal_bindings_keep_their_type() {
    let runtime = assert_success("let i = 3\nlet r = 3.0\nlet s = \"3\"\nlet n = \"x\"\nlet x = 1");
    let store = runtime.store();
    assert_eq!(store.get("i"), Some(&Value::Integer(3)));
    assert_eq!(store.get("r"), Some(&Value::Real(3.0)));
    assert_eq!(store.get("s"), Some(&Value::from("3")));
    assert_eq!(store.get("n"), Some(&Value::from("x")));
}

#[test]
fn print_many_joins_with_spaces() {
    assert_eq!(output("let x = 2\nprint \"a\" 1 x"), ["a 1 2"]);
    assert_eq!(output("print \"one line\""), ["one line"]);
}

#[test]
fn conditionals_run_their_body_only_when_truthy() {
    assert_eq!(output("let n = 4\nif n > 3 then print \"big\"\nif n > 10 then print \"huge\""), ["big"]);
    assert_eq!(output("if 0 then print \"no\"\nif \"\" then print \"no\"\nprint \"done\""), ["done"]);
    assert_eq!(output("if 1 then if 2 then print \"both\""), ["both"]);

    let runtime = assert_success("if 0 then let x = 1");
    assert_eq!(runtime.store().get("x"), None);
}

#[test]
fn user_functions_and_calls() {
    let src = "\
solar_def greet(who):
    print \"hello\" who
end
greet \"Ada\"
call greet \"Bob\"";
    assert_eq!(output(src), ["hello Ada", "hello Bob"]);
}

#[test]
fn functions_see_state_at_call_time() {
    let src = "\
solar_def show():
    print total
end
let total = 1
show
let total = 2
if total then show";
    assert_eq!(output(src), ["1", "2"]);
}

#[test]
fn calling_before_definition_fails() {
    let err = assert_failure("greet 1\nsolar_def greet(x):\n    print x\nend");
    assert!(matches!(err, Error::Runtime(RuntimeError::UnknownFunction { line: 1, .. })));
}

#[test]
fn parameters_are_local() {
    let src = "\
let who = \"global\"
solar_def show(who):
    print who
end
show \"param\"
print who";
    assert_eq!(output(src), ["param", "global"]);

    let src = "\
solar_def bump(n):
    let n = (n + 1)
    print n
end
bump 1";
    assert_eq!(output(src), ["2"]);

    let runtime = assert_success("solar_def remember(v):\n    let saved = v\nend\nremember 5");
    assert_eq!(runtime.store().get("saved"), Some(&Value::Integer(5)));
    assert_eq!(runtime.store().get("v"), None);
}

#[test]
fn wrong_function_arity_is_error() {
    let err = assert_failure("solar_def f(a, b):\n    print a\nend\nf 1");
    assert!(matches!(err,
                     Error::Runtime(RuntimeError::ArgumentCountMismatch { expected: 2, found: 1, .. })));
}

#[test]
fn runaway_recursion_is_stopped() {
    let err = assert_failure("solar_def f(n):\n    f n\nend\nf 1");
    assert!(matches!(err, Error::Runtime(RuntimeError::CallDepthExceeded { limit: 64, .. })));
}

#[test]
fn libraries_are_installed_by_use() {
    assert_eq!(output("use math\nadd 2 3\npow 2 10\ndiv 1 4"), ["5", "1024", "0.25"]);
    assert_eq!(output("use text\ntitle \"hello world\"\nupper \"abc\""), ["Hello World", "ABC"]);
    assert_eq!(output("use random\nroll 1\npick \"only\""), ["1", "only"]);

    let err = assert_failure("sub 5 2");
    assert!(matches!(err, Error::Runtime(RuntimeError::UnknownFunction { .. })));
    let err = assert_failure("use os");
    assert!(matches!(err, Error::Runtime(RuntimeError::UnknownModule { .. })));
}

#[test]
fn passthrough_is_kept_in_order() {
    let src = "\
import os
x = 5
def helper():
    return 1

print 2";
    let runtime = assert_success(src);
    let blocks = runtime.host().verbatim_blocks();
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0], "import os");
    assert_eq!(blocks[1], "x = 5");
    assert!(blocks[2].starts_with("def helper():\n    return 1"));
    assert_eq!(runtime.host().output(), ["2"]);
    assert_eq!(runtime.store().get("x"), None);
}

#[test]
fn malformed_binding_becomes_passthrough() {
    let runtime = assert_success("let x\nprint 1");
    assert_eq!(runtime.store().get("x"), None);
    assert_eq!(runtime.host().verbatim_blocks(), ["let x"]);

    let mut config = Config::default();
    config.parser.strict = true;
    assert!(matches!(run_source("let x", HeadlessHost::new(false), &config), Err(Error::Parse(_))));
}

#[test]
fn lex_errors_on_keyword_lines_are_fatal() {
    assert!(matches!(assert_failure("print \"oops"), Error::Parse(_)));
    let runtime = assert_success("shout \"oops");
    assert_eq!(runtime.host().verbatim_blocks(), ["shout \"oops"]);
}

#[test]
fn unterminated_blocks_are_fatal() {
    assert!(matches!(assert_failure("solar_def f():\n    print 1"), Error::Parse(_)));
}

#[test]
fn raw_expressions() {
    assert_eq!(output("let xs = [1, 2, 3]\nprint (xs[-1])"), ["3"]);
    assert_eq!(output("let m = ({\"a\": 1, \"b\": 2})\nprint (m[\"b\"])"), ["2"]);
    assert_eq!(output("let s = (\"hello\".upper())\nprint s"), ["HELLO"]);
    assert_eq!(output("let t = (\"yes\" if 3 > 2 else \"no\")\nprint t"), ["yes"]);
    assert_eq!(output("let total = (sum([1, 2, 3]) + max(4, 9))\nprint total"), ["15"]);
    assert_eq!(output("let n = len(\"abc\")\nprint n"), ["3"]);
}

#[test]
fn security_violations_are_fatal() {
    for src in ["let a = (__import__(\"os\"))",
                "let a = open(\"x\")",
                "let open = 1\nlet a = open(1)",
                "let a = (\"\".__class__)",
                "let a = (x := 1)",
                "if (exec(\"1\")) then print 1"]
    {
        let err = assert_failure(src);
        assert!(matches!(err, Error::Runtime(RuntimeError::SecurityViolation { .. })),
                "{src}: {err}");
    }
}

#[test]
fn evaluation_errors_are_reported_with_their_line() {
    assert!(matches!(assert_failure("print 1\nlet x = (1 / 0)"),
                     Error::Runtime(RuntimeError::Eval { line: 2, .. })));
    assert!(matches!(assert_failure("print missing"),
                     Error::Runtime(RuntimeError::UnknownVariable { .. })));
    assert!(matches!(assert_failure("let y = (missing + 1)"),
                     Error::Runtime(RuntimeError::Eval { .. })));
    assert!(matches!(assert_failure("let f = 1\nlet y = (f(2))"),
                     Error::Runtime(RuntimeError::Eval { .. })));
}

#[test]
fn button_callbacks_read_entries() {
    let src = "\
solar_def show(field):
    print field
end
ui window main
ui title main \"Demo\"
ui entry main name at 10 10
ui button main go \"Show\" at 10 40 do show name
ui run main
ui get name into who";
    let mut host = HeadlessHost::new(false);
    host.type_text("name", "Ada").press("go");
    let runtime = run_with(src, host).unwrap();

    assert_eq!(runtime.host().output(), ["Ada"]);
    assert_eq!(runtime.store().get("who"), Some(&Value::from("Ada")));
    assert_eq!(runtime.host().window("main").map(|w| w.title.as_str()), Some("Demo"));
}

#[test]
fn key_bindings_call_functions() {
    let src = "\
solar_def jump():
    print \"jump\"
end
ui window main
ui bind main space do jump
ui run main";
    let mut host = HeadlessHost::new(false);
    host.queue_key("main", "space").queue_key("main", "enter").queue_key("main", "space");
    assert_eq!(run_with(src, host).unwrap().host().output(), ["jump", "jump"]);
}

#[test]
fn frame_loops_draw_until_the_host_stops() {
    let src = "\
gfx screen s 100 100
let x = 0
loop s:
    let x = (x + 10)
    gfx rect s red at x 0 size 5 5
    gfx present s
end
print x";
    let runtime = run_with(src, HeadlessHost::new(false).with_frames(3)).unwrap();
    assert_eq!(runtime.host().output(), ["30"]);
    let canvas = runtime.host().canvas("s").unwrap();
    assert_eq!(canvas.draws.len(), 3);
    assert_eq!(canvas.presented, 3);
}

#[test]
fn frame_loops_are_capped() {
    let mut config = Config::default();
    config.runtime.max_frames = 2;
    let src = "gfx screen s 1 1\nloop s:\n    gfx present s\nend";
    let err = run_source(src, HeadlessHost::new(false).with_frames(5), &config).err().unwrap();
    assert!(matches!(err, Error::Runtime(RuntimeError::LoopLimit { limit: 2, line: 2, .. })));
}

#[test]
fn key_state_is_readable() {
    let mut host = HeadlessHost::new(false);
    host.hold_key("left");
    let src = "gfx screen s 1 1\ngfx key s left into pressed\nif pressed then print \"left\"";
    assert_eq!(run_with(src, host).unwrap().host().output(), ["left"]);
}

#[test]
fn host_failures_carry_the_line() {
    let err = assert_failure("print 1\nui text nowhere \"x\"");
    assert!(matches!(err, Error::Runtime(RuntimeError::Host { line: 2, .. })));
}

#[test]
fn functions_cannot_take_passthrough_names() {
    let src = "solar_def match():\n    print \"hit\"\nend\nprint \"after\"";

    let parsed = parse_source(src, &Config::default()).unwrap();
    assert_eq!(parsed.diagnostics.len(), 1);
    assert!(matches!(parsed.diagnostics[0].cause, ParseError::MalformedFunction { line: 1, .. }));

    let runtime = assert_success(src);
    assert_eq!(runtime.host().output(), ["after"]);
    assert_eq!(runtime.host().verbatim_blocks(), ["solar_def match():\n    print \"hit\"\nend"]);
    assert!(!runtime.registry().contains("match"));

    let mut config = Config::default();
    config.parser.strict = true;
    assert!(matches!(run_source(src, HeadlessHost::new(false), &config), Err(Error::Parse(_))));
}
