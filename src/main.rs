use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use log::LevelFilter;
use testlink_conv_rs::cli::{default_export_output, default_import_output, run_export, run_import};
use testlink_conv_rs::column_listing;
use testlink_conv_rs::parser::csv::CsvOptions;
use testlink_conv_rs::parser::schema::HeaderVocabulary;
use testlink_conv_rs::rich_text::DEFAULT_BULLET;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    csv: CsvArgs,

    /// Raise the log level (-v info, -vv debug). RUST_LOG overrides it.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// List the CSV columns of the selected header vocabulary
    #[arg(long)]
    list_columns: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a CSV sheet into TestLink import XML
    Import {
        /// CSV file to read
        input: PathBuf,
        /// XML file to write (default: <stem>_converted.xml next to the input)
        output: Option<PathBuf>,
    },
    /// Convert TestLink XML into a CSV sheet
    Export {
        /// XML file to read
        input: PathBuf,
        /// CSV file to write (default: <stem>.csv next to the input)
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct CsvArgs {
    /// Character encoding of the CSV file (e.g., shift_jis, utf-8)
    #[arg(long, global = true, default_value = "shift_jis")]
    encoding: String,

    /// Field delimiter of the CSV file
    #[arg(long, global = true, default_value_t = ',')]
    delimiter: char,

    /// Header names of the CSV file
    #[arg(long, global = true, value_enum, default_value = "ja")]
    headers: HeaderVocabulary,

    /// Marker that starts a list item line in plain text fields
    #[arg(long, global = true, default_value = DEFAULT_BULLET)]
    bullet: String,
}

impl CsvArgs {
    fn to_options(&self) -> anyhow::Result<CsvOptions> {
        if !self.delimiter.is_ascii() {
            anyhow::bail!("the delimiter must be an ASCII character: {:?}", self.delimiter);
        }
        Ok(CsvOptions {
            encoding: self.encoding.clone(),
            delimiter: self.delimiter as u8,
            vocabulary: self.headers,
            bullet: self.bullet.clone(),
        })
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    if cli.list_columns {
        for line in column_listing(cli.csv.headers) {
            println!("{}", line);
        }
        return Ok(());
    }

    let options = cli.csv.to_options()?;
    match cli.command {
        Some(Command::Import { input, output }) => {
            let output = output.unwrap_or_else(|| default_import_output(&input));
            let report = run_import(&input, &output, &options)?;
            println!(
                "{}: {} test cases, {} steps",
                output.display(),
                report.test_cases,
                report.steps
            );
            if !report.diagnostics.is_empty() {
                eprintln!(
                    "{} records or groups were skipped (details above)",
                    report.diagnostics.len()
                );
            }
        }
        Some(Command::Export { input, output }) => {
            let output = output.unwrap_or_else(|| default_export_output(&input));
            let report = run_export(&input, &output, &options)?;
            println!(
                "{}: {} test cases, {} rows",
                output.display(),
                report.test_cases,
                report.rows
            );
        }
        None => anyhow::bail!("no command given; use `import` or `export` (see --help)"),
    }

    Ok(())
}
