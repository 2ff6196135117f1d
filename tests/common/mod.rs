use fern::{diagnostic::Stage, Checked, CommentStyle, Config};

pub fn run_pipeline(src: &str, style: CommentStyle) -> Checked {
    fern::check(src, &Config::with_comment_style(style)).unwrap()
}

/// Runs every stage and asserts the program is accepted.
#[track_caller]
pub fn assert_clean(src: &str) -> Checked {
    let checked = run_pipeline(src, CommentStyle::Line);
    let problems: Vec<_> = checked.diagnostics.iter().map(ToString::to_string).collect();
    assert!(problems.is_empty(), "unexpected problems: {problems:#?}");
    checked
}

/// The error codes reported by `src`, in report order.
pub fn codes(src: &str) -> Vec<&'static str> {
    run_pipeline(src, CommentStyle::Line)
        .diagnostics
        .iter()
        .map(|d| d.code)
        .collect()
}

pub fn stages(checked: &Checked) -> Vec<Stage> {
    checked.diagnostics.iter().map(|d| d.stage).collect()
}
