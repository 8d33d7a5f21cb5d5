use std::path::Path;

use basket_core::export::render_list_export;

use crate::cli::ExportFormat;
use crate::commands::common::{open_session, require_active, CliContext};
use crate::error::CliError;

pub async fn run_export(
    format: ExportFormat,
    output_path: Option<&Path>,
    ctx: &CliContext,
) -> Result<(), CliError> {
    let session = open_session(ctx).await?;
    let doc = require_active(&session)?;
    let rendered = render_list_export(doc, format.into())?;

    if let Some(path) = output_path {
        std::fs::write(path, rendered)?;
        println!("{}", path.display());
    } else if rendered.ends_with('\n') {
        print!("{rendered}");
    } else {
        println!("{rendered}");
    }

    Ok(())
}
