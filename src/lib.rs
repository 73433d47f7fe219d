//! Timemark: KML to timeline-item extraction.
//!
//! Timemark flattens a KML document into a normalized sequence of
//! [`TimelineItem`]s ready for a host timeline/map visualization. Each item
//! carries a title, an optional description, a temporal extent (instant or
//! span, possibly inherited from an enclosing folder), and either map
//! geometries or a ground-overlay image.
//!
//! # Modules
//!
//! - [`ir`]: item model and the KML reader
//! - [`error`]: error types for timemark operations
//!
//! # Example
//!
//! ```
//! use timemark::{from_kml_str, Geometry};
//!
//! let kml = r#"<kml><Document>
//!   <Placemark>
//!     <name>Battle of Hastings</name>
//!     <TimeStamp><when>1066-10-14</when></TimeStamp>
//!     <Point><coordinates>0.4877,50.9114</coordinates></Point>
//!   </Placemark>
//! </Document></kml>"#;
//!
//! let items = from_kml_str(kml).unwrap();
//! assert_eq!(items[0].start.as_deref(), Some("1066-10-14"));
//! assert!(matches!(items[0].geometries[0], Geometry::Point(_)));
//! ```

pub mod error;
pub mod ir;

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use error::TimemarkError;
pub use ir::{
    decode_coordinates, from_kml_slice, from_kml_str, from_kml_str_with, read_kml, read_kml_with,
    Clock, Coordinate, FieldBinder, FixedClock, Geometry, KmlReadOptions, Overlay, SystemClock,
    TimelineItem,
};

/// The timemark CLI application.
#[derive(Parser)]
#[command(name = "timemark")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Extract timeline items from a KML file.
    Extract(ExtractArgs),
}

/// Arguments for the extract subcommand.
#[derive(clap::Args)]
struct ExtractArgs {
    /// Input KML file.
    input: PathBuf,

    /// Write the item JSON to this file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Bind this <ExtendedData> field into each item's extras (repeatable).
    #[arg(long = "field")]
    fields: Vec<String>,
}

/// Run the timemark CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), TimemarkError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Extract(args)) => run_extract(args),
        None => {
            println!("timemark {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("KML to timeline-item extractor.");
            println!();
            println!("Run 'timemark --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the extract subcommand.
fn run_extract(args: ExtractArgs) -> Result<(), TimemarkError> {
    let mut opts = KmlReadOptions::default();
    for field in &args.fields {
        opts = opts.with_binder(FieldBinder::new(field.clone()));
    }

    let items = read_kml_with(&args.input, &opts)?;

    match args.output {
        Some(path) => {
            let json =
                serde_json::to_string_pretty(&items).map_err(|source| TimemarkError::JsonWrite {
                    path: path.clone(),
                    source,
                })?;
            fs::write(&path, json).map_err(TimemarkError::Io)
        }
        None => {
            let json =
                serde_json::to_string_pretty(&items).map_err(|source| TimemarkError::JsonWrite {
                    path: PathBuf::from("<stdout>"),
                    source,
                })?;
            println!("{json}");
            Ok(())
        }
    }
}
