use basket_core::{ItemPatch, NewItem};

use crate::cli::ItemCommands;
use crate::commands::common::{
    join_words, open_session, require_active, resolve_category_id, resolve_item_id, CliContext,
};
use crate::error::CliError;

pub async fn run_item(command: ItemCommands, ctx: &CliContext) -> Result<(), CliError> {
    let mut session = open_session(ctx).await?;
    let doc = require_active(&session)?;

    match command {
        ItemCommands::Add {
            label,
            qty,
            unit,
            category,
        } => {
            let label = join_words(&label).ok_or(CliError::EmptyLabel)?;
            let mut new_item = NewItem::new(label);
            new_item.quantity = qty;
            new_item.unit = unit;
            if let Some(category) = category {
                new_item = new_item.in_category(resolve_category_id(doc, &category)?);
            }

            let id = session
                .edit(|doc| doc.add_item(new_item))
                .await?
                .ok_or(CliError::EmptyLabel)?;
            println!("{id}");
        }
        ItemCommands::Edit {
            item,
            label,
            qty,
            unit,
            category,
        } => {
            let id = resolve_item_id(doc, &item)?;
            let patch = ItemPatch {
                label,
                quantity: qty.map(Some),
                unit: unit.map(Some),
                category_id: category
                    .as_deref()
                    .map(|category| resolve_category_id(doc, category))
                    .transpose()?,
                checked: None,
            };
            if patch.is_empty() {
                println!("Nothing to change");
                return Ok(());
            }

            session.edit(|doc| doc.update_item(&id, patch)).await?;
            println!("Updated {item}");
        }
        ItemCommands::Check { item } => {
            let id = resolve_item_id(doc, &item)?;
            let checked = session.edit(|doc| doc.toggle_item_checked(&id)).await?;
            println!("{} {item}", if checked { "Checked" } else { "Unchecked" });
        }
        ItemCommands::Delete { item } => {
            let id = resolve_item_id(doc, &item)?;
            session.edit(|doc| doc.delete_item(&id)).await?;
            println!("Deleted {item}");
        }
    }

    Ok(())
}
