mod discover;
mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::EnvFilter;

use rfml::payload::TestPayload;
use rfml::sink::TracingSink;
use rfml::{ParseError, Step, TestDocument};

use crate::discover::RFML_SUFFIX;

#[derive(Parser)]
#[command(name = "rfml", version, about = "Parse and inspect RFML test files")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log every line as it is classified (trace level)
    #[arg(long, global = true)]
    trace_lines: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse files and report errors
    Check(CheckArgs),

    /// Print a parsed test
    Show(ShowArgs),

    /// List steps that require a file upload
    Uploads(UploadsArgs),

    /// Run .test.rfml fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct CheckArgs {
    /// .rfml files or directories to search
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

#[derive(clap::Args)]
struct ShowArgs {
    /// RFML file to print
    file: PathBuf,

    /// Dump the parsed document structure
    #[arg(long, conflicts_with = "json")]
    ast: bool,

    /// Print the JSON payload sent to the test service
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
struct UploadsArgs {
    /// .rfml files or directories to search
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.rfml file or directory containing them
    path: PathBuf,

    /// Run only fixtures in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let ctx = Context {
        color: if cli.no_color {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        },
        trace_lines: cli.trace_lines,
    };

    let exit_code = match cli.command {
        Command::Check(args) => do_check(&ctx, &args),
        Command::Show(args) => do_show(&ctx, &args),
        Command::Uploads(args) => do_uploads(&ctx, &args),
        Command::Test(args) => {
            if args.list_categories {
                test_runner::list_categories(&args.path);
                0
            } else {
                test_runner::run_tests(&args.path, cli.no_color, &args.category)
            }
        }
    };
    process::exit(exit_code);
}

fn init_logging(cli: &Cli) {
    let level = if cli.trace_lines {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .init();
}

struct Context {
    color: ColorChoice,
    trace_lines: bool,
}

enum LoadError {
    Io(std::io::Error),
    Parse(ParseError),
}

impl Context {
    /// Read and parse one file, registering its source for diagnostics.
    fn load(
        &self,
        files: &mut SimpleFiles<String, String>,
        path: &Path,
    ) -> Result<TestDocument, LoadError> {
        let source = std::fs::read_to_string(path).map_err(LoadError::Io)?;
        let file_id = files.add(path.display().to_string(), source.clone());
        let parser = rfml::Parser::new(source, file_id);
        let result = if self.trace_lines {
            parser.parse_with_sink(&mut TracingSink)
        } else {
            parser.parse()
        };
        result.map_err(LoadError::Parse)
    }

    fn report(&self, files: &SimpleFiles<String, String>, path: &Path, error: &LoadError) {
        match error {
            LoadError::Io(e) => eprintln!("error: cannot read '{}': {}", path.display(), e),
            LoadError::Parse(e) => {
                let writer = StandardStream::stderr(self.color);
                let config = term::Config::default();
                let _ = term::emit_to_write_style(
                    &mut writer.lock(),
                    &config,
                    files,
                    &e.to_diagnostic(),
                );
            }
        }
    }
}

/// Expand the given paths into `.rfml` files. Reports and returns `None`
/// when there are none.
fn rfml_files(paths: &[PathBuf]) -> Option<Vec<PathBuf>> {
    let files = discover::collect_files(paths, RFML_SUFFIX);
    if files.is_empty() {
        eprintln!("no {} files found", RFML_SUFFIX);
        return None;
    }
    Some(files)
}

fn do_check(ctx: &Context, args: &CheckArgs) -> i32 {
    let Some(paths) = rfml_files(&args.paths) else {
        return 1;
    };

    let mut files = SimpleFiles::new();
    let mut failed = 0usize;
    for path in &paths {
        match ctx.load(&mut files, path) {
            Ok(doc) => tracing::debug!(
                path = %path.display(),
                rfml_id = %doc.rfml_id,
                steps = doc.steps.len(),
                "parsed"
            ),
            Err(error) => {
                failed += 1;
                ctx.report(&files, path, &error);
            }
        }
    }

    if failed == 0 {
        eprintln!("ok: {} file(s) parsed successfully", paths.len());
        0
    } else {
        eprintln!("error: {} of {} file(s) failed to parse", failed, paths.len());
        1
    }
}

fn do_show(ctx: &Context, args: &ShowArgs) -> i32 {
    let mut files = SimpleFiles::new();
    let doc = match ctx.load(&mut files, &args.file) {
        Ok(doc) => doc,
        Err(error) => {
            ctx.report(&files, &args.file, &error);
            return 1;
        }
    };

    if args.ast {
        println!("{:#?}", doc);
    } else if args.json {
        match serde_json::to_string_pretty(&TestPayload::from(&doc)) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: cannot serialize payload: {}", e);
                return 1;
            }
        }
    } else {
        print_summary(&doc);
    }
    0
}

fn print_summary(doc: &TestDocument) {
    let id = if doc.is_unassigned() {
        "(unassigned)"
    } else {
        doc.rfml_id.as_str()
    };
    println!("{}: {}", id, doc.title.as_deref().unwrap_or("(untitled)"));
    if let Some(start_uri) = &doc.start_uri {
        println!("  start_uri: {}", start_uri);
    }
    if let Some(site_id) = doc.site_id {
        println!("  site_id:   {}", site_id);
    }
    if !doc.tags.is_empty() {
        println!("  tags:      {}", doc.tags.join(", "));
    }
    if !doc.browsers.is_empty() {
        println!("  browsers:  {}", doc.browsers.join(", "));
    }
    let embeds: Vec<&str> = doc.embedded_ids().collect();
    if !embeds.is_empty() {
        println!("  embeds:    {}", embeds.join(", "));
    }
    for line in doc.description.lines() {
        println!("  | {}", line.trim());
    }

    println!();
    for (i, step) in doc.steps.iter().enumerate() {
        let redirect = if step.redirect() { " [redirect]" } else { "" };
        match step {
            Step::Action(action) => {
                let upload = if action.has_uploadable_files() { " [upload]" } else { "" };
                println!("{:>3}. {}{}{}", i + 1, action.action, redirect, upload);
                for line in action.response.lines() {
                    println!("     => {}", line);
                }
            }
            Step::Embedded(test) => {
                println!("{:>3}. - {}{}", i + 1, test.rfml_id, redirect);
            }
        }
    }
}

fn do_uploads(ctx: &Context, args: &UploadsArgs) -> i32 {
    let Some(paths) = rfml_files(&args.paths) else {
        return 1;
    };
    let mut files = SimpleFiles::new();
    let mut exit_code = 0;

    for path in &paths {
        let doc = match ctx.load(&mut files, path) {
            Ok(doc) => doc,
            Err(error) => {
                ctx.report(&files, path, &error);
                exit_code = 1;
                continue;
            }
        };
        for file in doc.uploadable_files() {
            println!(
                "{}:{}: {}({})",
                path.display(),
                file.step_index + 1,
                file.call.kind.name(),
                file.call.argument
            );
        }
    }

    exit_code
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> Context {
        Context {
            color: ColorChoice::Never,
            trace_lines: false,
        }
    }

    #[test]
    fn empty_directory_fails_check_and_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![dir.path().to_path_buf()];
        assert_eq!(do_check(&ctx(), &CheckArgs { paths: paths.clone() }), 1);
        assert_eq!(do_uploads(&ctx(), &UploadsArgs { paths }), 1);
    }

    #[test]
    fn uploads_succeeds_on_valid_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("shot.rfml"),
            "#!shot\nSnap {{ file.screenshot(./a.png) }}\nOk?\n",
        )
        .unwrap();
        let paths = vec![dir.path().to_path_buf()];
        assert_eq!(do_check(&ctx(), &CheckArgs { paths: paths.clone() }), 0);
        assert_eq!(do_uploads(&ctx(), &UploadsArgs { paths }), 0);
    }

    #[test]
    fn uploads_fails_on_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.rfml"), "# site_id: x\n").unwrap();
        let paths = vec![dir.path().to_path_buf()];
        assert_eq!(do_uploads(&ctx(), &UploadsArgs { paths }), 1);
    }
}
