//! Sheetbind - open spreadsheet documents, evaluate expressions against them, dump cells.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use sheetbind_core::{Object, Settings, Workspace};
use sheetbind_engine::engine::{BUILTINS, format_value};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Document created when `-c` runs without any file.
const SCRATCH_DOCUMENT: &str = "untitled";
const SCRATCH_SHEET: &str = "Spreadsheet";

fn print_usage() {
    eprintln!("Usage: sheetbind [OPTIONS] [FILE]...");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]...                 Documents to open, in order");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --command <EXPR>      Evaluate EXPR in the first sheet and print the result");
    eprintln!("  --dump                    Print every cell: address, contents, value, status");
    eprintln!("  --config <FILE>           Load settings from FILE instead of the config dir");
    eprintln!("  -h, --help                Print help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  SHEETBIND_LOG             Log filter (default: warn)");
    eprintln!();
    eprintln!("Functions:");
    for builtin in BUILTINS {
        eprintln!("  {:<26}{}", builtin.name, builtin.description);
    }
}

#[derive(Debug, Default)]
struct Options {
    files: Vec<PathBuf>,
    command: Option<String>,
    dump: bool,
    config: Option<PathBuf>,
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("SHEETBIND_LOG").unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Settings from `--config`, or from `config.toml` in the config dir when it exists.
fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    if let Some(path) = explicit {
        return Settings::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }
    let Some(proj) = ProjectDirs::from("", "", "sheetbind") else {
        return Ok(Settings::default());
    };
    let path = proj.config_dir().join("config.toml");
    if !path.exists() {
        return Ok(Settings::default());
    }
    Settings::load(&path).with_context(|| format!("Failed to load config {}", path.display()))
}

/// Document and object that `-c` expressions are evaluated in.
fn command_scope(workspace: &mut Workspace) -> Result<(String, String)> {
    if workspace.documents().is_empty() {
        workspace.new_document(SCRATCH_DOCUMENT)?;
        workspace.add_sheet(SCRATCH_DOCUMENT, SCRATCH_SHEET)?;
        return Ok((SCRATCH_DOCUMENT.to_string(), SCRATCH_SHEET.to_string()));
    }
    let document = &workspace.documents()[0];
    let object = document
        .objects()
        .iter()
        .find(|o| o.as_sheet().is_some())
        .or_else(|| document.objects().first())
        .with_context(|| format!("Document '{}' has no objects", document.name()))?;
    Ok((document.name().to_string(), object.name().to_string()))
}

fn dump(workspace: &mut Workspace, precision: Option<usize>) -> Result<()> {
    workspace.recompute();
    for document in workspace.documents() {
        for object in document.objects() {
            match object {
                Object::Sheet(sheet) => {
                    for (address, cell) in sheet.cells() {
                        if cell.is_empty() {
                            continue;
                        }
                        let value = match sheet.read(address) {
                            Ok(value) => format_value(&value, precision),
                            Err(e) => format!("#ERR: {}", e),
                        };
                        println!(
                            "{}#{}.{}\t{}\t{}\t{}",
                            document.name(),
                            sheet.name(),
                            address,
                            cell.to_input_string(),
                            value,
                            cell.status()
                        );
                    }
                }
                Object::Feature(feature) => {
                    for (name, property) in feature.properties() {
                        let contents = match property.binding() {
                            Some(formula) => format!("={}", formula.source()),
                            None => property.value().to_string(),
                        };
                        let value = match property.read() {
                            Ok(value) => format_value(&value, precision),
                            Err(e) => format!("#ERR: {}", e),
                        };
                        let status = property
                            .binding()
                            .map(|f| f.status().to_string())
                            .unwrap_or_else(|| "Up-to-date".to_string());
                        println!(
                            "{}#{}.{}\t{}\t{}\t{}",
                            document.name(),
                            feature.name(),
                            name,
                            contents,
                            value,
                            status
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

/// Run the CLI; returns the process exit code.
fn run(options: Options) -> Result<i32> {
    let settings = load_settings(options.config.as_deref())?;
    let precision = settings.precision;
    let mut workspace = Workspace::with_settings(settings);
    for path in &options.files {
        workspace
            .open_document(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
    }

    if let Some(command) = &options.command {
        let (document, object) = command_scope(&mut workspace)?;
        match workspace.evaluate_expression(&document, &object, command) {
            Ok(value) => println!("{}", format_value(&value, precision)),
            Err(e) => {
                println!("#ERR: {}", e);
                return Ok(1);
            }
        }
    }

    if options.dump {
        dump(&mut workspace, precision)?;
    }

    if options.command.is_none() && !options.dump {
        if options.files.is_empty() {
            print_usage();
            bail!("Nothing to do");
        }
        for name in workspace.document_names() {
            println!("{}", name);
        }
    }
    Ok(0)
}

fn parse_args(args: &[String]) -> Result<Option<Options>> {
    let mut options = Options::default();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return Ok(None);
            }
            "-c" | "--command" => {
                i += 1;
                let Some(command) = args.get(i) else {
                    bail!("--command requires an expression");
                };
                options.command = Some(command.clone());
            }
            "--dump" => options.dump = true,
            "--config" => {
                i += 1;
                let Some(path) = args.get(i) else {
                    bail!("--config requires a file path");
                };
                options.config = Some(PathBuf::from(path));
            }
            arg if arg.starts_with('-') => {
                print_usage();
                bail!("Unknown option: {}", arg);
            }
            file => options.files.push(PathBuf::from(file)),
        }
        i += 1;
    }
    Ok(Some(options))
}

fn main() {
    init_logging();
    let args: Vec<String> = env::args().collect();

    let code = match parse_args(&args).and_then(|options| match options {
        Some(options) => run(options),
        None => Ok(0),
    }) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    std::process::exit(code);
}
