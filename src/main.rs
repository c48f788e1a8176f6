mod cell;
mod cli;
mod counterparties;
mod db;
mod dictionaries;
mod error;
mod fmt;
mod importer;
mod invoices;
mod models;
mod row_parser;
mod settings;
mod totals;

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, CounterpartyCommands, DictCommands, InvoiceCommands};
use models::InvoiceFilter;

fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.log_level);

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Import { dir, only } => cli::import::run(dir, only),
        Commands::Dict { command } => match command {
            DictCommands::Accounts => cli::dict::accounts(),
            DictCommands::Vat => cli::dict::vat(),
            DictCommands::Withholding => cli::dict::withholding(),
        },
        Commands::Counterparties { command } => match command {
            CounterpartyCommands::Add(details) => cli::counterparties::add(details),
            CounterpartyCommands::Edit { id, details } => cli::counterparties::edit(id, details),
            CounterpartyCommands::List { q } => cli::counterparties::list(q.as_deref()),
            CounterpartyCommands::Delete { id } => cli::counterparties::delete(id),
        },
        Commands::Invoices { command } => match command {
            InvoiceCommands::New(header) => cli::invoices::create(header),
            InvoiceCommands::Edit { id, header } => cli::invoices::edit(id, header),
            InvoiceCommands::List {
                direction,
                status,
                counterparty,
                from,
                to,
                q,
            } => cli::invoices::list(InvoiceFilter {
                direction,
                status,
                counterparty_id: counterparty,
                from,
                to,
                q,
            }),
            InvoiceCommands::Show { id } => cli::invoices::show(id),
            InvoiceCommands::Delete { id } => cli::invoices::delete(id),
            InvoiceCommands::AddLine { id, line } => cli::invoices::add_line(id, line),
            InvoiceCommands::UpdateLine { id, line_id, line } => {
                cli::invoices::update_line(id, line_id, line)
            }
            InvoiceCommands::DeleteLine { id, line_id } => cli::invoices::delete_line(id, line_id),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
