//! Todo command handlers
//!
//! Each handler loads the owner's list first so that it works against the
//! same view of the store the terminal UI starts from.

use anyhow::{anyhow, bail, Result};

use todosync_core::{RemoteStore, ServerId, Session, StatusFilter, SyncError, TaskId};

use crate::output::Output;

/// List todos matching `filter`
pub async fn list<R: RemoteStore>(
    session: &mut Session<R>,
    filter: StatusFilter,
    output: &Output,
) -> Result<()> {
    load(session).await?;

    let state = session.state();
    output.print_tasks(&state.filtered(filter), state.active_count());
    Ok(())
}

/// Add a todo
pub async fn add<R: RemoteStore>(
    session: &mut Session<R>,
    title: String,
    output: &Output,
) -> Result<()> {
    load(session).await?;

    let task = match session.add(&title).await {
        Ok(task) => task,
        Err(e) => return Err(surfaced(session, e)),
    };

    output.success(&format!("Created todo: {}", task.id));
    output.print_task(&task);
    Ok(())
}

/// Delete a todo by its server id
pub async fn delete<R: RemoteStore>(
    session: &mut Session<R>,
    id: ServerId,
    output: &Output,
) -> Result<()> {
    load(session).await?;

    if session.state().task(id).is_none() {
        bail!("Todo not found: {}", id);
    }

    if let Err(e) = session.delete(&TaskId::Confirmed(id)).await {
        return Err(surfaced(session, e));
    }

    output.success(&format!("Deleted todo: {}", id));
    Ok(())
}

/// Delete every completed todo
///
/// Prints what was removed and each failure; fails if any delete failed.
pub async fn clear_completed<R: RemoteStore>(
    session: &mut Session<R>,
    output: &Output,
) -> Result<()> {
    load(session).await?;

    let report = session.clear_completed().await?;
    output.print_clear_report(&report);

    if report.is_success() {
        return Ok(());
    }
    match session.state().error_message() {
        Some(msg) => Err(anyhow!("{}", msg)),
        None => Err(anyhow!("Failed to clear {} todo(s)", report.failures.len())),
    }
}

async fn load<R: RemoteStore>(session: &mut Session<R>) -> Result<()> {
    match session.load().await {
        Ok(_) => Ok(()),
        Err(e) => Err(surfaced(session, e)),
    }
}

/// Attach the user-facing notice to a failed operation
fn surfaced<R: RemoteStore>(session: &Session<R>, err: SyncError) -> anyhow::Error {
    match session.state().error_message() {
        Some(msg) => anyhow::Error::new(err).context(msg.to_string()),
        None => err.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use todosync_core::{MemoryRemoteStore, OwnerId, Task};

    const OWNER: OwnerId = OwnerId(1870);

    fn session(tasks: Vec<Task>) -> Session<MemoryRemoteStore> {
        Session::new(OWNER, MemoryRemoteStore::with_tasks(tasks))
    }

    fn task(id: u64, title: &str, completed: bool) -> Task {
        Task {
            id: ServerId(id),
            title: title.to_string(),
            completed,
            user_id: OWNER,
        }
    }

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    #[tokio::test]
    async fn test_list_loads_once() {
        let mut session = session(vec![task(1, "a", false)]);
        list(&mut session, StatusFilter::Active, &quiet())
            .await
            .unwrap();
        assert_eq!(session.remote().list_calls(), 1);
    }

    #[tokio::test]
    async fn test_list_failure_carries_notice() {
        let mut session = session(vec![]);
        session.remote().fail_list(true);

        let err = list(&mut session, StatusFilter::All, &quiet())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unable to load todos");
    }

    #[tokio::test]
    async fn test_add_blank_title_rejected() {
        let mut session = session(vec![]);

        let err = add(&mut session, "   ".into(), &quiet()).await.unwrap_err();

        assert_eq!(err.to_string(), "Title should not be empty");
        assert_eq!(session.remote().create_calls(), 0);
    }

    #[tokio::test]
    async fn test_add_creates_task() {
        let mut session = session(vec![]);
        add(&mut session, "Buy milk".into(), &quiet()).await.unwrap();
        assert_eq!(session.remote().tasks()[0].title, "Buy milk");
    }

    #[tokio::test]
    async fn test_delete_unknown_id() {
        let mut session = session(vec![task(1, "a", false)]);

        let err = delete(&mut session, ServerId(9), &quiet())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("not found"));
        assert_eq!(session.remote().delete_calls(), 0);
    }

    #[tokio::test]
    async fn test_delete_failure_carries_notice() {
        let mut session = session(vec![task(1, "a", false)]);
        session.remote().fail_delete(ServerId(1));

        let err = delete(&mut session, ServerId(1), &quiet())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Unable to delete a todo");
    }

    #[tokio::test]
    async fn test_clear_completed_reports_failure() {
        let mut session = session(vec![
            task(1, "open", false),
            task(2, "done", true),
            task(3, "stuck", true),
        ]);
        session.remote().fail_delete(ServerId(3));

        let err = clear_completed(&mut session, &quiet()).await.unwrap_err();

        assert_eq!(err.to_string(), "Unable to delete todo: stuck");
        let left: Vec<_> = session.remote().tasks().iter().map(|t| t.id).collect();
        assert_eq!(left, vec![ServerId(1), ServerId(3)]);
    }

    #[tokio::test]
    async fn test_clear_completed_nothing_to_do() {
        let mut session = session(vec![task(1, "open", false)]);
        clear_completed(&mut session, &quiet()).await.unwrap();
        assert_eq!(session.remote().delete_calls(), 0);
    }
}
