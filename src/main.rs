use clap::{Parser, Subcommand};

mod cmd;
mod core;

#[derive(Parser, Debug)]
#[command(
    name = "traslados",
    version,
    author,
    about = "Transfer import and settlements for medical transport dispatch"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import transfers from a CSV file into the dataset
    Import(cmd::import::ImportCommand),
    /// Check a CSV import file and list rejected rows
    Validate(cmd::validate::ValidateCommand),
    /// Build the settlement statement for a company over a period
    Settle(cmd::settle::SettleCommand),
    /// Export transfers as CSV in the import layout
    Export(cmd::export::ExportCommand),
    /// Show dashboard figures
    Summary(cmd::summary::SummaryCommand),
    /// Add or edit a driver
    Driver(cmd::driver::DriverCommand),
    /// Add or edit a company
    Company(cmd::company::CompanyCommand),
    /// Add or edit a single transfer
    Transfer(cmd::transfer::TransferCommand),
    /// Print the dataset JSON schema or the CSV import columns
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Import(import) => import.exec(),
        Command::Validate(validate) => validate.exec(),
        Command::Settle(settle) => settle.exec(),
        Command::Export(export) => export.exec(),
        Command::Summary(summary) => summary.exec(),
        Command::Driver(driver) => driver.exec(),
        Command::Company(company) => company.exec(),
        Command::Transfer(transfer) => transfer.exec(),
        Command::Schema(schema) => schema.exec(),
    }
}
