use crate::cli::CategoryCommands;
use crate::commands::common::{open_session, require_active, resolve_category_id, CliContext};
use crate::error::CliError;

pub async fn run_category(command: CategoryCommands, ctx: &CliContext) -> Result<(), CliError> {
    let mut session = open_session(ctx).await?;
    let doc = require_active(&session)?;

    match command {
        CategoryCommands::Add { name, parent } => {
            let parent_id = parent
                .as_deref()
                .map(|parent| resolve_category_id(doc, parent))
                .transpose()?;
            let id = session
                .edit(|doc| doc.upsert_category(None, Some(&name), parent_id.as_ref()))
                .await?;
            println!("{id}");
        }
        CategoryCommands::Rename { category, name } => {
            let id = resolve_category_id(doc, &category)?;
            session
                .edit(|doc| doc.upsert_category(Some(&id), Some(&name), None))
                .await?;
            println!("Renamed category to {}", name.trim());
        }
        CategoryCommands::Move { category, parent } => {
            let id = resolve_category_id(doc, &category)?;
            let parent_id = resolve_category_id(doc, &parent)?;
            session
                .edit(|doc| doc.move_category(&id, Some(&parent_id)))
                .await?;
            println!("Moved category {category} under {parent}");
        }
        CategoryCommands::Delete { category } => {
            let id = resolve_category_id(doc, &category)?;
            let removed = session.edit(|doc| doc.delete_category(&id)).await?;
            println!("Deleted {removed} categor{}", if removed == 1 { "y" } else { "ies" });
        }
    }

    Ok(())
}
