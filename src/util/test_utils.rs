use crate::{
    analyzer,
    config::CommentStyle,
    diagnostic::format_errors,
    lexer, parser,
    util::fmt::tree,
};

/// How far a test program is taken through the pipeline.
#[derive(Copy, Clone)]
pub enum Upto {
    /// Print the AST.
    Parser,
    /// Print the global declarations of the IR.
    Analyzer,
}

/// Lexes with [`CommentStyle::MarkerRun`] and runs the stages up to `upto`.
/// Returns the printed tree and every error as `line:column: message`, in
/// stage order.
pub fn run_pipeline(upto: Upto, input: &str) -> (String, Vec<String>) {
    let lexed = lexer::lex(input, CommentStyle::MarkerRun).unwrap();
    let mut errors = format_errors(&lexed.errors);

    let parsed = parser::parse_program(lexed.value).unwrap();
    errors.extend(format_errors(&parsed.errors));
    if let Upto::Parser = upto {
        return (tree::print_program_string(&parsed.value), errors);
    }

    let analyzed = analyzer::analyze(parsed.value).unwrap();
    errors.extend(format_errors(&analyzed.errors));
    (tree::print_ir_string(&analyzed.value), errors)
}

/// What a `tree_tests!` case asserts. Unset parts are not checked.
#[derive(Default)]
pub struct Expect {
    tree: Option<&'static str>,
    errors: Option<&'static [&'static str]>,
}

impl Expect {
    /// The tree, and no errors at all.
    pub fn tree_ok(self, tree: &'static str) -> Expect {
        Expect {
            tree: Some(tree),
            errors: self.errors.or(Some(&[])),
        }
    }

    /// The tree, whatever errors were reported along the way.
    pub fn tree_error(self, tree: &'static str) -> Expect {
        Expect {
            tree: Some(tree),
            ..self
        }
    }

    pub fn expected_errors(self, errors: &'static [&'static str]) -> Expect {
        Expect {
            errors: Some(errors),
            ..self
        }
    }

    #[track_caller]
    pub fn verify(self, upto: Upto, input: &str) {
        let (tree, errors) = run_pipeline(upto, input);
        if let Some(expected) = self.errors {
            ::pretty_assertions::assert_eq!(errors, expected);
        }
        if let Some(expected) = self.tree {
            ::pretty_assertions::assert_eq!(tree.trim(), expected.trim());
        }
    }
}

/// Declares one `#[test]` per case. Each case binds `program` to its source,
/// then any of `tree_ok`, `tree_error` (indented text, passed through
/// `indoc!`) and `expected_errors` (a slice of `line:column: message`).
macro_rules! tree_tests {
    (
        use $upto:ident;

        $(
            fn $name:ident() {
                let program = $source:expr;
                $(let $check:ident = $expected:expr;)*
            }
        )*
    ) => {
        $(
            #[test]
            fn $name() {
                crate::util::test_utils::Expect::default()
                    $(.$check(tree_tests!(@@expected $check, $expected)))*
                    .verify(tree_tests!(@@upto $upto), $source);
            }
        )*
    };

    (@@expected expected_errors, $expected:expr) => { $expected };
    (@@expected $tree:ident, $expected:expr) => { ::indoc::indoc! { $expected } };

    (@@upto parser) => { crate::util::test_utils::Upto::Parser };
    (@@upto analyzer) => { crate::util::test_utils::Upto::Analyzer };
}
pub(crate) use tree_tests;
