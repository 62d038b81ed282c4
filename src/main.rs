//! geotree - KML and GeoJSON converter

use std::collections::BTreeMap;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geotree::{Document, Feature, FeatureKind, Format};

#[derive(Parser)]
#[command(name = "geotree")]
#[command(version, about = "KML and GeoJSON converter", long_about = None)]
#[command(after_help = "EXAMPLES:
    geotree tracks.kml tracks.geojson    Convert KML to GeoJSON
    geotree areas.geojson areas.kml      Convert GeoJSON to KML
    geotree -i tracks.kml                Show a summary of the feature tree
    geotree -i --json tracks.kml         Same, as JSON")]
struct Cli {
    /// Input file (KML or GeoJSON)
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (.kml, .geojson or .json)
    #[arg(value_name = "OUTPUT", required_unless_present = "info")]
    output: Option<String>,

    /// Show a summary of the feature tree without converting
    #[arg(short, long)]
    info: bool,

    /// Print the summary as JSON
    #[arg(long, requires = "info")]
    json: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

/// Install a stderr subscriber. `RUST_LOG` takes precedence over the flags.
fn init_tracing(quiet: bool, verbose: bool) {
    let default = if quiet {
        "geotree=error"
    } else if verbose {
        "geotree=debug"
    } else {
        "geotree=info"
    };
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    let result = match (&cli.output, cli.info) {
        (_, true) => show_info(&cli.input, cli.json),
        (Some(output), false) => convert(&cli.input, output, cli.quiet),
        (None, false) => Err("an output file is required".to_string()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[derive(Serialize)]
struct Summary {
    file: String,
    name: Option<String>,
    features: usize,
    kinds: BTreeMap<&'static str, usize>,
    styles: usize,
    /// `[north, south, east, west]`
    bounding_box: Option<[f64; 4]>,
    diagnostics: Vec<String>,
}

impl Summary {
    fn new(file: &str, doc: &Document) -> Self {
        let mut kinds = BTreeMap::new();
        for (_, feature) in doc.root.walk().skip(1) {
            *kinds.entry(feature.kind().as_str()).or_insert(0) += 1;
        }
        Self {
            file: file.to_string(),
            name: doc.root.name.clone(),
            features: kinds.values().sum(),
            kinds,
            styles: doc.styles.len(),
            bounding_box: doc
                .root
                .bounding_box()
                .map(|b| [b.north, b.south, b.east, b.west]),
            diagnostics: doc.diagnostics.iter().map(ToString::to_string).collect(),
        }
    }
}

fn show_info(path: &str, json: bool) -> Result<(), String> {
    let doc = Document::open(path).map_err(|e| e.to_string())?;
    let summary = Summary::new(path, &doc);

    if json {
        let text = serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?;
        println!("{text}");
        return Ok(());
    }

    println!("File: {}", summary.file);
    if let Some(name) = &summary.name {
        println!("Name: {name}");
    }
    println!("Features: {}", summary.features);
    for (kind, count) in &summary.kinds {
        println!("  {kind}: {count}");
    }
    println!("Styles: {}", summary.styles);
    if let Some([north, south, east, west]) = summary.bounding_box {
        println!("Bounds: N {north} S {south} E {east} W {west}");
    }
    if !summary.diagnostics.is_empty() {
        println!("Diagnostics: {}", summary.diagnostics.len());
        for d in &summary.diagnostics {
            println!("  {d}");
        }
    }
    println!();
    print_tree(&doc.root);

    Ok(())
}

fn print_tree(root: &Feature) {
    for (depth, feature) in root.walk() {
        let label = feature.name.as_deref().unwrap_or("(unnamed)");
        let indent = "  ".repeat(depth);
        match feature.kind() {
            FeatureKind::Folder => {
                println!("{indent}{label}/ ({} items)", feature.children().len())
            }
            kind => println!("{indent}{label} [{}]", kind.as_str()),
        }
    }
}

fn convert(input: &str, output: &str, quiet: bool) -> Result<(), String> {
    let format = Format::from_path(output)
        .ok_or_else(|| format!("cannot tell the output format of {output}"))?;
    let doc = Document::open(input).map_err(|e| e.to_string())?;
    for lost in doc.unexportable(format) {
        tracing::warn!("{lost}");
    }
    doc.save(output).map_err(|e| e.to_string())?;

    if !quiet {
        println!(
            "Converted {input} -> {output} ({}, {} diagnostics)",
            format.extension(),
            doc.diagnostics.len()
        );
    }
    Ok(())
}
