use basket_core::ListMode;

use crate::commands::common::{
    format_list_lines, join_words, list_to_summary_item, open_session, render_list_lines,
    require_active, resolve_list_id, short_id, CliContext, ListSummaryItem,
};
use crate::error::CliError;

pub async fn run_new(title_parts: &[String], ctx: &CliContext) -> Result<(), CliError> {
    let title = join_words(title_parts).ok_or(CliError::EmptyTitle)?;

    let mut session = open_session(ctx).await?;
    let doc = session.create_list(&title).await?;

    println!("{}", doc.id);
    Ok(())
}

pub async fn run_lists(as_json: bool, ctx: &CliContext) -> Result<(), CliError> {
    let session = open_session(ctx).await?;
    let lists = session.lists().await?;

    if as_json {
        let json_items = lists
            .iter()
            .map(list_to_summary_item)
            .collect::<Vec<ListSummaryItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if lists.is_empty() {
        println!("No lists yet. Create one with `basket new <title>`.");
        return Ok(());
    }
    let active = session.active().map(|doc| &doc.id);
    for line in format_list_lines(&lists, active) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_use(id: &str, ctx: &CliContext) -> Result<(), CliError> {
    let mut session = open_session(ctx).await?;
    let list_id = resolve_list_id(&session, id).await?;
    let doc = session.open_list(&list_id).await?;

    println!("Active list: {} ({})", doc.title, short_id(doc.id.as_str()));
    Ok(())
}

pub async fn run_show(hide_checked: bool, ctx: &CliContext) -> Result<(), CliError> {
    let session = open_session(ctx).await?;
    let doc = require_active(&session)?;

    for line in render_list_lines(doc, hide_checked || doc.ui.hide_checked) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_rename(title_parts: &[String], ctx: &CliContext) -> Result<(), CliError> {
    let title = join_words(title_parts).ok_or(CliError::EmptyTitle)?;

    let mut session = open_session(ctx).await?;
    require_active(&session)?;
    session
        .edit(|doc| {
            doc.rename(&title);
            Ok(())
        })
        .await?;

    println!("Renamed to {title}");
    Ok(())
}

pub async fn run_mode(mode: ListMode, ctx: &CliContext) -> Result<(), CliError> {
    let mut session = open_session(ctx).await?;
    require_active(&session)?;
    session
        .edit(|doc| {
            doc.set_mode(mode);
            Ok(())
        })
        .await?;

    println!("Mode: {mode}");
    Ok(())
}

pub async fn run_delete(id: &str, ctx: &CliContext) -> Result<(), CliError> {
    let mut session = open_session(ctx).await?;
    let list_id = resolve_list_id(&session, id).await?;
    session.delete_list(&list_id).await?;

    println!("Deleted list {list_id}");
    Ok(())
}
