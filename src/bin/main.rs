use std::{fs, io, path::PathBuf};

use clap::{Parser, ValueEnum};
use miette::{bail, Diagnostic, IntoDiagnostic, NamedSource, Result, SourceSpan};
use thiserror::Error;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fern::{
    lexer, parser,
    util::fmt::{print_tokens, tree},
    CommentStyle, Config,
};

#[derive(Debug, Parser)]
#[command(version, about = None, long_about = None)]
#[command(propagate_version = true)]
struct CliArgs {
    /// Path to the source code file
    input_file: PathBuf,

    /// Execution mode
    #[arg(value_enum)]
    #[arg(short, long)]
    #[arg(default_value_t = Mode::Check)]
    mode: Mode,

    /// How far a `#` comment reaches
    #[arg(value_enum)]
    #[arg(short, long)]
    #[arg(default_value_t = Comments::MarkerRun)]
    comments: Comments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Print the tokens of the source code
    Lex,

    /// Inspect the AST of the parsed source code
    Parse,

    /// Analyze the source code and print its global declarations
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Comments {
    /// Only the run of `#` characters is skipped
    MarkerRun,

    /// Skip up to the end of the line
    Line,
}

impl From<Comments> for CommentStyle {
    fn from(comments: Comments) -> Self {
        match comments {
            Comments::MarkerRun => CommentStyle::MarkerRun,
            Comments::Line => CommentStyle::Line,
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
#[error("{stage} error {code}: {message}")]
struct Problem {
    stage: fern::diagnostic::Stage,
    code: &'static str,
    message: String,

    #[label("here")]
    span: SourceSpan,
}

impl From<fern::Diagnostic> for Problem {
    fn from(diagnostic: fern::Diagnostic) -> Self {
        Problem {
            stage: diagnostic.stage,
            code: diagnostic.code,
            message: diagnostic.message,
            span: (diagnostic.span.lo, diagnostic.span.len as usize).into(),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
#[error("found {} problem(s)", .errs.len())]
struct AppError {
    #[related]
    errs: Vec<Problem>,

    #[source_code]
    code: NamedSource<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().without_time())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .init();

    let args = CliArgs::parse();

    if !args.input_file.is_file() {
        bail!("No proper input file: {:?}", args.input_file);
    }

    let source = fs::read_to_string(&args.input_file).into_diagnostic()?;
    let config = Config::with_comment_style(args.comments.into());
    let mut stdout = io::stdout().lock();

    let diagnostics: Vec<fern::Diagnostic> = match args.mode {
        Mode::Lex => {
            let lexed = lexer::lex(&source, config.comment_style).into_diagnostic()?;
            let (tokens, diagnostics) = lexed.into_parts();
            print_tokens(&mut stdout, &tokens).into_diagnostic()?;
            diagnostics
        }
        Mode::Parse => {
            let lexed = lexer::lex(&source, config.comment_style).into_diagnostic()?;
            let (tokens, mut diagnostics) = lexed.into_parts();
            let parsed = parser::parse_program(tokens).into_diagnostic()?;
            let (program, errors) = parsed.into_parts();
            diagnostics.extend(errors);
            tree::print_program(&mut stdout, &program).into_diagnostic()?;
            diagnostics
        }
        Mode::Check => {
            let checked = fern::check(&source, &config).into_diagnostic()?;
            tree::print_ir(&mut stdout, &checked.ir).into_diagnostic()?;
            checked.diagnostics
        }
    };

    if diagnostics.is_empty() {
        info!("no problems found");
        return Ok(());
    }

    let name = args.input_file.display().to_string();
    Err(AppError {
        errs: diagnostics.into_iter().map(Problem::from).collect(),
        code: NamedSource::new(name, source),
    }
    .into())
}
