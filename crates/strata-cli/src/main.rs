use serde::Deserialize;
use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use strata::{DiagramConfig, DiagramGenerator, LayerRecord};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "STRATA_LOG";

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Generate(strata::GenerateError),
    Json(serde_json::Error),
    Yaml(serde_yaml::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Generate(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::Yaml(err) => write!(f, "YAML error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<strata::GenerateError> for CliError {
    fn from(value: strata::GenerateError) -> Self {
        Self::Generate(value)
    }
}

impl From<strata_render::Error> for CliError {
    fn from(value: strata_render::Error) -> Self {
        Self::Generate(value.into())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Yaml(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Command {
    #[default]
    Render,
    Layout,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum RenderFormat {
    #[default]
    Pdf,
    Svg,
}

impl FromStr for RenderFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "svg" => Ok(Self::Svg),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    render_format: RenderFormat,
    config: Option<String>,
    title: Option<String>,
    subject: Option<String>,
    author: Option<String>,
    out: Option<String>,
}

/// A record file: either a bare list of layers or a document with metadata.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StackInput {
    Layers(Vec<LayerRecord>),
    Document {
        layers: Vec<LayerRecord>,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        subject: Option<String>,
    },
}

impl StackInput {
    fn into_parts(self) -> (Vec<LayerRecord>, Option<String>, Option<String>) {
        match self {
            StackInput::Layers(layers) => (layers, None, None),
            StackInput::Document {
                layers,
                title,
                subject,
            } => (layers, title, subject),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataFormat {
    Json,
    Yaml,
}

fn usage() -> &'static str {
    "strata-cli\n\
\n\
USAGE:\n\
  strata-cli [render] [--format pdf|svg] [--config <path>] [--title <text>] [--subject <text>] [--author <text>] [--out <path>] [<path>|-]\n\
  strata-cli layout [--pretty] [--config <path>] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', layer records are read from stdin.\n\
  - Records are JSON or YAML: a list of layers, or an object with `layers`, `title`, `subject`.\n\
  - PDF output defaults to writing next to the input file (or ./out.pdf for stdin); `--out -` writes to stdout.\n\
  - SVG output is printed to stdout unless --out is given.\n\
  - layout prints the computed diagram (heights, labels, legend, canvas size) as JSON.\n\
  - Set STRATA_LOG (e.g. STRATA_LOG=debug) to see layout decisions on stderr.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "render" => args.command = Command::Render,
            "layout" => args.command = Command::Layout,
            "--pretty" => args.pretty = true,
            "--format" => {
                let Some(fmt) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.render_format = fmt
                    .parse::<RenderFormat>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
            "--title" => {
                let Some(title) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.title = Some(title.clone());
            }
            "--subject" => {
                let Some(subject) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.subject = Some(subject.clone());
            }
            "--author" => {
                let Some(author) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.author = Some(author.clone());
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "-" => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some("-".to_string());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

/// By extension for files; stdin is JSON when it looks like JSON.
fn detect_format(path: Option<&str>, text: &str) -> DataFormat {
    let ext = path
        .filter(|p| *p != "-")
        .and_then(|p| Path::new(p).extension())
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("json") => DataFormat::Json,
        Some("yaml" | "yml") => DataFormat::Yaml,
        _ => {
            let first = text.trim_start().chars().next();
            if matches!(first, Some('[' | '{')) {
                DataFormat::Json
            } else {
                DataFormat::Yaml
            }
        }
    }
}

fn parse_data<T: serde::de::DeserializeOwned>(
    path: Option<&str>,
    text: &str,
) -> Result<T, CliError> {
    Ok(match detect_format(path, text) {
        DataFormat::Json => serde_json::from_str(text)?,
        DataFormat::Yaml => serde_yaml::from_str(text)?,
    })
}

fn load_config(path: Option<&str>) -> Result<DiagramConfig, CliError> {
    let Some(path) = path else {
        return Ok(DiagramConfig::default());
    };
    let text = std::fs::read_to_string(path)?;
    let config: DiagramConfig = parse_data(Some(path), &text)?;
    config.validate()?;
    Ok(config)
}

fn write_json(value: &impl serde::Serialize, pretty: bool) -> Result<(), CliError> {
    let mut out = std::io::stdout().lock();
    if pretty {
        serde_json::to_writer_pretty(&mut out, value)?;
    } else {
        serde_json::to_writer(&mut out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

fn default_pdf_out_path(input: Option<&str>) -> PathBuf {
    match input {
        Some(path) if path != "-" => PathBuf::from(path).with_extension("pdf"),
        _ => PathBuf::from("out.pdf"),
    }
}

fn default_title(input: Option<&str>) -> String {
    input
        .filter(|p| *p != "-")
        .and_then(|p| Path::new(p).file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "layer stack".to_string())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(args: Args) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref())?;
    let text = read_input(args.input.as_deref())?;
    let input: StackInput = parse_data(args.input.as_deref(), &text)?;
    let (layers, doc_title, doc_subject) = input.into_parts();
    tracing::debug!(layers = layers.len(), "read layer records");

    let mut generator = DiagramGenerator::new(config);
    if let Some(author) = &args.author {
        generator = generator.with_author(author.clone());
    }

    match args.command {
        Command::Layout => {
            let diagram = generator.layout(&layers)?;
            write_json(&diagram, args.pretty)
        }
        Command::Render => match args.render_format {
            RenderFormat::Svg => {
                let svg = generator.render_svg(&layers)?;
                match args.out.as_deref() {
                    None | Some("-") => print!("{svg}"),
                    Some(path) => strata::write_file(Path::new(path), svg.as_bytes())?,
                }
                Ok(())
            }
            RenderFormat::Pdf => {
                let title = args
                    .title
                    .or(doc_title)
                    .unwrap_or_else(|| default_title(args.input.as_deref()));
                let subject = args
                    .subject
                    .or(doc_subject)
                    .unwrap_or_else(|| "layer stack diagram".to_string());
                let bytes = generator.render_pdf(&layers, &title, &subject)?;
                match args.out.as_deref() {
                    Some("-") => std::io::stdout().lock().write_all(&bytes)?,
                    Some(path) => strata::write_file(Path::new(path), &bytes)?,
                    None => {
                        let path = default_pdf_out_path(args.input.as_deref());
                        strata::write_file(&path, &bytes)?;
                    }
                }
                Ok(())
            }
        },
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    init_tracing();
    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        std::iter::once("strata-cli")
            .chain(args.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn render_is_the_default_command() {
        let args = parse_args(&argv(&["stack.json"])).unwrap();
        assert_eq!(args.command, Command::Render);
        assert_eq!(args.render_format, RenderFormat::Pdf);
        assert_eq!(args.input.as_deref(), Some("stack.json"));
    }

    #[test]
    fn unknown_flags_and_extra_inputs_are_usage_errors() {
        assert!(matches!(parse_args(&argv(&["--bogus"])), Err(CliError::Usage(_))));
        assert!(matches!(parse_args(&argv(&["a.json", "b.json"])), Err(CliError::Usage(_))));
        assert!(matches!(parse_args(&argv(&["--format", "png"])), Err(CliError::Usage(_))));
        assert!(matches!(parse_args(&argv(&["--out"])), Err(CliError::Usage(_))));
    }

    #[test]
    fn formats_are_sniffed() {
        assert_eq!(detect_format(Some("a.yml"), "[]"), DataFormat::Yaml);
        assert_eq!(detect_format(Some("a.JSON"), "- x"), DataFormat::Json);
        assert_eq!(detect_format(None, "  [{\"thickness\": 1}]"), DataFormat::Json);
        assert_eq!(detect_format(Some("-"), "- thickness: 1"), DataFormat::Yaml);
    }

    #[test]
    fn documents_carry_title_and_subject() {
        let input: StackInput = parse_data(
            None,
            r#"{"title": "14-AB-001", "layers": [{"thickness": 100, "color": "red", "comments": "x"}]}"#,
        )
        .unwrap();
        let (layers, title, subject) = input.into_parts();
        assert_eq!(layers.len(), 1);
        assert_eq!(title.as_deref(), Some("14-AB-001"));
        assert_eq!(subject, None);
    }

    #[test]
    fn default_paths_follow_the_input() {
        assert_eq!(default_pdf_out_path(Some("dir/cell.yaml")), PathBuf::from("dir/cell.pdf"));
        assert_eq!(default_pdf_out_path(Some("-")), PathBuf::from("out.pdf"));
        assert_eq!(default_title(Some("dir/cell.yaml")), "cell");
        assert_eq!(default_title(None), "layer stack");
    }
}
