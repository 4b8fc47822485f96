//! # Cardpress CLI
//!
//! Command-line interface for ID card rendering and the template server.
//!
//! ## Usage
//!
//! ```bash
//! # Run the HTTP API
//! cardpress serve --listen 0.0.0.0:8080 --data-dir ./data
//!
//! # Render a template to an image
//! cardpress render badge.json --values ada.json --dpi 300 -o badge.png
//!
//! # Or to a PDF page the size of the card
//! cardpress render badge.json --dpi 300 -o badge.pdf
//!
//! # Tile copies onto A4 sheets
//! cardpress sheet badge.json --copies 10 -o sheet.png
//!
//! # Write a browser print page
//! cardpress print-html badge.json -o print.html
//!
//! # Show how many cards fit on a page
//! cardpress layout --paper A4 --margin 20 --spacing 5
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cardpress::{
    CardpressError,
    document::{FieldValues, Template, validate},
    print::{self, PRINT_SCALE, PrintJob},
    render::{self, AssetLoader, ExportFormat, RenderOptions},
    server::{self, ServerConfig},
    units::{CardSize, PaperSize, SizeMm, calculate_card_layout},
};

/// Cardpress - ID card template renderer
#[derive(Parser, Debug)]
#[command(name = "cardpress")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "CARDPRESS_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Address to listen on
        #[arg(long, env = "CARDPRESS_LISTEN", default_value = "0.0.0.0:8080")]
        listen: String,

        /// Directory holding templates.json and users.json
        #[arg(long, env = "CARDPRESS_DATA_DIR", default_value = "./data")]
        data_dir: PathBuf,

        /// Directory served under /assets and used for relative image paths
        #[arg(long, env = "CARDPRESS_ASSET_DIR")]
        asset_dir: Option<PathBuf>,
    },

    /// Render a template to PNG, JPEG or PDF
    Render {
        /// Template JSON file
        template: PathBuf,

        /// Field values JSON file (object of label -> value)
        #[arg(long, value_name = "FILE")]
        values: Option<PathBuf>,

        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// png, jpeg or pdf (defaults to the output extension)
        #[arg(long)]
        format: Option<String>,

        /// Pixel scale relative to the template's CSS pixels
        #[arg(long, default_value = "1.0")]
        scale: f64,

        /// Physical resolution (overrides --scale)
        #[arg(long)]
        dpi: Option<f64>,

        /// Directory for relative image paths
        #[arg(long)]
        asset_dir: Option<PathBuf>,
    },

    /// Render print sheets with copies tiled on paper
    Sheet {
        template: PathBuf,

        #[arg(long, value_name = "FILE")]
        values: Option<PathBuf>,

        /// Output PNG; sheets after the first get a numeric suffix
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        #[arg(long, default_value = "1")]
        copies: u32,

        #[arg(long, default_value = "A4")]
        paper: String,

        #[arg(long, default_value = "20")]
        margin: f64,

        #[arg(long, default_value = "5")]
        spacing: f64,

        #[arg(long, default_value = "300")]
        dpi: f64,

        #[arg(long)]
        asset_dir: Option<PathBuf>,
    },

    /// Write a standalone HTML page that prints the card at physical size
    PrintHtml {
        template: PathBuf,

        #[arg(long, value_name = "FILE")]
        values: Option<PathBuf>,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        #[arg(long, default_value = "1")]
        copies: u32,

        #[arg(long, default_value = "A4")]
        paper: String,

        #[arg(long)]
        asset_dir: Option<PathBuf>,
    },

    /// Show how many cards fit on a sheet
    Layout {
        #[arg(long, default_value = "A4")]
        paper: String,

        /// Card width in mm (defaults to CR80)
        #[arg(long, requires = "card_height_mm")]
        card_width_mm: Option<f64>,

        #[arg(long, requires = "card_width_mm")]
        card_height_mm: Option<f64>,

        #[arg(long, default_value = "20")]
        margin: f64,

        #[arg(long, default_value = "5")]
        spacing: f64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    if let Err(e) = run(cli.command).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn run(command: Commands) -> Result<(), CardpressError> {
    match command {
        Commands::Serve {
            listen,
            data_dir,
            asset_dir,
        } => {
            server::serve(ServerConfig {
                listen_addr: listen,
                data_dir,
                asset_dir,
            })
            .await
        }

        Commands::Render {
            template,
            values,
            output,
            format,
            scale,
            dpi,
            asset_dir,
        } => {
            let format = match format.as_deref() {
                Some(f) => ExportFormat::parse(f)
                    .ok_or_else(|| CardpressError::Validation(format!("Unknown format '{}'", f)))?,
                None => output
                    .extension()
                    .and_then(|e| e.to_str())
                    .and_then(ExportFormat::parse)
                    .unwrap_or_default(),
            };
            let options = match dpi {
                Some(dpi) => RenderOptions::at_dpi(dpi),
                None => RenderOptions::at_scale(scale),
            };
            let (template, values) = load_inputs(&template, values.as_deref())?;
            let loader = AssetLoader::http(asset_dir)?;
            let card = render::render_card(&loader, &template, &values, options).await?;
            std::fs::write(&output, render::encode(&card, format, template.size_mm())?)?;
            println!(
                "Saved {}x{} card to {}",
                card.width(),
                card.height(),
                output.display()
            );
            Ok(())
        }

        Commands::Sheet {
            template,
            values,
            output,
            copies,
            paper,
            margin,
            spacing,
            dpi,
            asset_dir,
        } => {
            let job = PrintJob {
                copies,
                paper: parse_paper(&paper)?,
                margin_mm: margin,
                spacing_mm: spacing,
                dpi,
            };
            job.validate()?;
            let (template, values) = load_inputs(&template, values.as_deref())?;
            let loader = AssetLoader::http(asset_dir)?;
            let card = render::render_card(&loader, &template, &values, RenderOptions::at_dpi(dpi)).await?;
            let sheets = print::SheetRenderer::new(&card, template.size_mm(), &job)?;
            let count = sheets.sheet_count();

            for i in 0..count {
                let path = sheet_path(&output, i as usize);
                std::fs::write(&path, render::export::encode_png(&sheets.render(i)?)?)?;
                println!("Saved sheet {} of {} to {}", i + 1, count, path.display());
            }
            Ok(())
        }

        Commands::PrintHtml {
            template,
            values,
            output,
            copies,
            paper,
            asset_dir,
        } => {
            let job = PrintJob {
                copies,
                paper: parse_paper(&paper)?,
                ..PrintJob::default()
            };
            job.validate()?;
            let (template, values) = load_inputs(&template, values.as_deref())?;
            let loader = AssetLoader::http(asset_dir)?;
            let card = render::render_card(&loader, &template, &values, RenderOptions::at_scale(PRINT_SCALE)).await?;
            let png = render::export::encode_png(&card)?;
            let html = print::print_html(&png, template.canvas.width, template.canvas.height, &job);
            std::fs::write(&output, html)?;
            println!("Saved print page to {}", output.display());
            Ok(())
        }

        Commands::Layout {
            paper,
            card_width_mm,
            card_height_mm,
            margin,
            spacing,
        } => {
            let paper = parse_paper(&paper)?;
            let (label, card) = match (card_width_mm, card_height_mm) {
                (Some(w), Some(h)) => (format!("{}mm x {}mm", w, h), SizeMm::new(w, h)),
                _ => (CardSize::CR80.name.to_string(), CardSize::CR80.mm),
            };
            let layout = calculate_card_layout(card, paper.size_mm(), margin, spacing);
            println!(
                "{} on {}: {} x {} = {} cards per sheet",
                label,
                paper.name(),
                layout.cards_per_row,
                layout.cards_per_column,
                layout.total_cards
            );
            Ok(())
        }
    }
}

fn parse_paper(name: &str) -> Result<PaperSize, CardpressError> {
    PaperSize::by_name(name).ok_or_else(|| {
        let known: Vec<_> = PaperSize::all().iter().map(|p| p.name()).collect();
        CardpressError::Validation(format!(
            "Unknown paper '{}'. Available: {}",
            name,
            known.join(", ")
        ))
    })
}

/// Read a template and optional field values; missing values start from
/// the template's placeholders.
fn load_inputs(template: &Path, values: Option<&Path>) -> Result<(Template, FieldValues), CardpressError> {
    let template: Template = serde_json::from_str(&std::fs::read_to_string(template)?)?;
    validate(&template)?;

    let mut fields = FieldValues::initial(&template);
    if let Some(path) = values {
        let given: FieldValues = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        fields.0.extend(given.0);
    }
    Ok((template, fields))
}

/// `out.png`, `out-2.png`, `out-3.png`, ...
fn sheet_path(output: &Path, index: usize) -> PathBuf {
    if index == 0 {
        return output.to_path_buf();
    }
    let stem = output.file_stem().and_then(|s| s.to_str()).unwrap_or("sheet");
    let ext = output.extension().and_then(|e| e.to_str()).unwrap_or("png");
    output.with_file_name(format!("{}-{}.{}", stem, index + 1, ext))
}
