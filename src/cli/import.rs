use std::path::PathBuf;

use colored::Colorize;

use crate::cli::open_db;
use crate::dictionaries::record_import_run;
use crate::error::{ContiError, Result};
use crate::importer::{import_file, DictionaryKind, ALL_DICTIONARIES};
use crate::settings::{load_settings, shellexpand_path};

/// Runs each requested dictionary import on its own: one failing workbook does
/// not stop the others, but the command still reports failure at the end.
pub fn run(dir: Option<String>, only: Option<String>) -> Result<()> {
    let settings = load_settings();
    let mut conn = open_db()?;

    let base = match dir {
        Some(d) => PathBuf::from(shellexpand_path(&d)),
        None => settings.import_dir(),
    };
    let kinds: Vec<DictionaryKind> = match only {
        Some(key) => vec![DictionaryKind::from_key(&key)?],
        None => ALL_DICTIONARIES.to_vec(),
    };

    let mut failed = 0usize;
    for kind in &kinds {
        let path = base.join(settings.import.file_name(*kind));
        match import_file(*kind, &mut conn, &path) {
            Ok(result) => {
                record_import_run(
                    &conn,
                    kind.key(),
                    &result.filename,
                    &result.checksum,
                    result.counts.processed,
                    result.counts.skipped,
                )?;
                println!(
                    "{}: {} rows processed, {} skipped",
                    kind.name().bold(),
                    result.counts.processed,
                    result.counts.skipped
                );
            }
            Err(e) => {
                tracing::error!(dictionary = kind.key(), path = %path.display(), "import failed: {e}");
                println!("{}: {} ({})", kind.name().bold(), "failed".red(), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(ContiError::Other(format!(
            "{failed} of {} dictionary imports failed",
            kinds.len()
        )));
    }
    Ok(())
}
