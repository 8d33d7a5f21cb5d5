use std::sync::Arc;
use std::time::Duration;

use basket_core::{spawn_poller, ResolutionStrategy, ShareRole, SyncStatus};
use chrono::Utc;
use tokio::sync::Mutex;

use crate::commands::common::{
    format_relative_time, format_sync_timestamp, open_session, require_active, short_id,
    CliContext, CliSession,
};
use crate::error::CliError;

async fn open_remote_session(ctx: &CliContext) -> Result<CliSession, CliError> {
    ctx.require_remote_dir()?;
    open_session(ctx).await
}

/// Sync once; on conflict print the summary and resolve with `strategy` if given.
pub async fn sync_active(
    session: &mut CliSession,
    strategy: Option<ResolutionStrategy>,
) -> Result<SyncStatus, CliError> {
    require_active(session)?;
    let status = session.sync_now().await?;
    if status != SyncStatus::Conflict {
        return Ok(status);
    }

    if let Some(summary) = session.conflict_summary() {
        print!("{summary}");
    }
    let Some(strategy) = strategy else {
        return Err(CliError::ConflictUnresolved);
    };
    session.resolve(strategy).await?;
    Ok(status)
}

pub async fn run_sync(
    strategy: Option<ResolutionStrategy>,
    ctx: &CliContext,
) -> Result<(), CliError> {
    let mut session = open_remote_session(ctx).await?;
    sync_active(&mut session, strategy).await?;

    println!("{}", session.status());
    Ok(())
}

pub async fn run_status(ctx: &CliContext) -> Result<(), CliError> {
    let session = open_session(ctx).await?;
    let doc = require_active(&session)?;
    let now_ms = Utc::now().timestamp_millis();

    println!("List:     {} ({})", doc.title, short_id(doc.id.as_str()));
    println!("State:    {} - {}", session.state(), session.status());
    println!("Changes:  {}", if doc.is_dirty() { "unsynced" } else { "none" });
    println!(
        "Remote:   {}",
        doc.sync.remote_file_id.as_deref().unwrap_or("not created yet")
    );
    if let Some(pulled) = doc.sync.last_pulled_at {
        println!(
            "Pulled:   {} ({})",
            format_sync_timestamp(pulled),
            format_relative_time(pulled, now_ms)
        );
    }
    if let Some(pushed) = doc.sync.last_pushed_at {
        println!(
            "Pushed:   {} ({})",
            format_sync_timestamp(pushed),
            format_relative_time(pushed, now_ms)
        );
    }
    Ok(())
}

pub async fn run_share(role: Option<ShareRole>, ctx: &CliContext) -> Result<(), CliError> {
    let mut session = open_remote_session(ctx).await?;
    require_active(&session)?;
    let link = session.share(role).await?;

    println!("{link}");
    Ok(())
}

pub async fn run_import(link: &str, ctx: &CliContext) -> Result<(), CliError> {
    let mut session = open_remote_session(ctx).await?;
    let doc = session.import_shared(link).await?;

    println!("Imported {} ({})", doc.title, short_id(doc.id.as_str()));
    Ok(())
}

pub async fn run_remote(as_json: bool, ctx: &CliContext) -> Result<(), CliError> {
    let session = open_remote_session(ctx).await?;
    let files = session.remote_lists().await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&files)?);
        return Ok(());
    }
    if files.is_empty() {
        println!("No lists on the remote.");
        return Ok(());
    }
    for file in files {
        let modified = file
            .modified_time
            .map_or_else(String::new, |time| {
                format_relative_time(time.timestamp_millis(), Utc::now().timestamp_millis())
            });
        println!("{:<40}  {:<48}  {modified}", file.id, file.name);
    }
    Ok(())
}

pub async fn run_watch(interval_secs: Option<u64>, ctx: &CliContext) -> Result<(), CliError> {
    let period = interval_secs.map_or_else(|| ctx.config.sync.poll_interval(), Duration::from_secs);
    if period.is_zero() {
        return Err(CliError::Config(
            "watch interval must be greater than zero".to_string(),
        ));
    }

    let mut session = open_remote_session(ctx).await?;
    sync_active(&mut session, None).await?;
    let title = require_active(&session)?.title.clone();
    let mut updates = session.subscribe_status();
    let mut last_status = updates.borrow_and_update().message.clone();
    println!("Watching \"{title}\" every {}s (Ctrl-C to stop)", period.as_secs());
    println!("{last_status}");

    // Only the poller locks the session; status arrives over the channel
    let poller = spawn_poller(Arc::new(Mutex::new(session)), period);

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let message = updates.borrow_and_update().message.clone();
                if message != last_status {
                    println!("{message}");
                    last_status = message;
                }
            }
        }
    }

    poller.stop().await;
    println!("Stopped watching");
    Ok(())
}
