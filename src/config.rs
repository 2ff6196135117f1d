/// How far a `#` comment reaches.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CommentStyle {
    /// Only the run of `#` characters is a comment; whatever follows on the
    /// line is lexed as code.
    #[default]
    MarkerRun,
    /// The comment extends up to (not including) the next line break.
    Line,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    pub comment_style: CommentStyle,
}

impl Config {
    pub fn with_comment_style(comment_style: CommentStyle) -> Config {
        Config { comment_style }
    }
}
