//! Remote operation polling
//!
//! Cluster restarts, library installs and job runs complete asynchronously.
//! The wait operations below query the workspace until the reported status
//! lands in a target set (success) or a failure set (error), sleeping a fixed
//! delay between attempts. [`Poller`] holds the state machine; the wait
//! functions only differ in the query they issue and how the status is
//! extracted from its response.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use dbwheel_core::domain::cluster::ClusterEvent;
use dbwheel_core::domain::job::{Run, RunId, RunOutput};
use dbwheel_core::domain::library::LibraryFullStatus;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result};
use crate::workspace::Workspace;

/// Delay between two status queries
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_secs(5);

/// Kind of remote resource being waited on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Cluster,
    Library,
    Run,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Cluster => write!(f, "Cluster"),
            ResourceKind::Library => write!(f, "Library"),
            ResourceKind::Run => write!(f, "Run"),
        }
    }
}

/// Statuses that end a wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSets {
    pub target: Vec<String>,
    pub failure: Vec<String>,
}

impl StatusSets {
    pub fn new<T, F>(target: T, failure: F) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self {
            target: target.into_iter().map(Into::into).collect(),
            failure: failure.into_iter().map(Into::into).collect(),
        }
    }

    /// Cluster event types
    pub fn cluster() -> Self {
        Self::new(["RUNNING"], ["ERROR", "UNKNOWN"])
    }

    /// Library install statuses
    pub fn library() -> Self {
        Self::new(["INSTALLED"], ["UNINSTALL_ON_RESTART", "FAILED", "SKIPPED"])
    }

    /// Run life-cycle states
    pub fn run() -> Self {
        Self::new(["TERMINATED"], ["INTERNAL_ERROR", "SKIPPED"])
    }

    /// Failure takes precedence when a status is listed in both sets
    pub fn classify(&self, status: &str) -> PollState {
        if self.failure.iter().any(|s| s == status) {
            PollState::Failed
        } else if self.target.iter().any(|s| s == status) {
            PollState::Succeeded
        } else {
            PollState::Polling
        }
    }
}

/// State of a wait operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Polling,
    Succeeded,
    Failed,
}

/// Pacing and bounds of a wait operation
///
/// Without `max_attempts` or `timeout` a wait only ends on a target or
/// failure status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub delay: Duration,
    pub max_attempts: Option<u32>,
    pub timeout: Option<Duration>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            delay: DEFAULT_POLL_DELAY,
            max_attempts: None,
            timeout: None,
        }
    }
}

impl PollSettings {
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Receives every observation made while waiting
pub trait PollObserver: Send {
    /// Called once per query; `status` is `None` when nothing was reported yet
    fn status(&mut self, resource: ResourceKind, status: Option<&str>, attempt: u32);

    /// Called once per run wait with the run's page URL
    fn run_url(&mut self, _url: &str) {}
}

/// Observer that reports through `tracing`
#[derive(Debug, Default)]
pub struct TracingObserver;

impl PollObserver for TracingObserver {
    fn status(&mut self, resource: ResourceKind, status: Option<&str>, attempt: u32) {
        match status {
            Some(status) => info!("{} status: {} (attempt {})", resource, status, attempt),
            None => info!("{} has not reported a status yet (attempt {})", resource, attempt),
        }
    }

    fn run_url(&mut self, url: &str) {
        info!("Run page: {}", url);
    }
}

/// Outcome of a successful wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    pub status: String,
    pub attempts: u32,
}

/// Poll state machine for a single wait
pub struct Poller<'a> {
    resource: ResourceKind,
    sets: &'a StatusSets,
    settings: &'a PollSettings,
    observer: &'a mut dyn PollObserver,
    attempts: u32,
    started: Instant,
}

impl<'a> Poller<'a> {
    pub fn new(
        resource: ResourceKind,
        sets: &'a StatusSets,
        settings: &'a PollSettings,
        observer: &'a mut dyn PollObserver,
    ) -> Self {
        Self {
            resource,
            sets,
            settings,
            observer,
            attempts: 0,
            started: Instant::now(),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn observer(&mut self) -> &mut dyn PollObserver {
        &mut *self.observer
    }

    /// Record the status extracted from one query
    ///
    /// # Errors
    /// `RemoteOperationFailed` when the status is in the failure set.
    pub fn observe(&mut self, status: Option<&str>) -> Result<PollState> {
        self.attempts += 1;
        self.observer.status(self.resource, status, self.attempts);

        let state = status.map_or(PollState::Polling, |s| self.sets.classify(s));
        match (state, status) {
            (PollState::Failed, Some(status)) => Err(ClientError::RemoteOperationFailed {
                resource: self.resource,
                status: status.to_string(),
            }),
            (state, _) => Ok(state),
        }
    }

    /// Sleep before the next query
    ///
    /// # Errors
    /// `PollTimeout` when the attempt budget is spent or the next query would
    /// start past the timeout.
    pub async fn pause(&mut self) -> Result<()> {
        let out_of_attempts = self
            .settings
            .max_attempts
            .is_some_and(|max| self.attempts >= max);
        let out_of_time = self
            .settings
            .timeout
            .is_some_and(|timeout| self.started.elapsed() + self.settings.delay > timeout);

        if out_of_attempts || out_of_time {
            warn!(
                "Giving up on {} after {} attempt(s)",
                self.resource, self.attempts
            );
            return Err(ClientError::PollTimeout {
                resource: self.resource,
                attempts: self.attempts,
            });
        }

        debug!("Waiting {:?} before polling {} again", self.settings.delay, self.resource);
        tokio::time::sleep(self.settings.delay).await;
        Ok(())
    }

    fn report(&self, status: String) -> PollReport {
        PollReport {
            status,
            attempts: self.attempts,
        }
    }
}

/// Query until a target status is seen
///
/// `query` performs one remote call and extracts the status from it; `None`
/// means the resource has not reported anything yet and polling continues.
/// Errors returned by `query` abort the wait immediately.
pub async fn poll_status<F, Fut>(
    resource: ResourceKind,
    sets: &StatusSets,
    settings: &PollSettings,
    observer: &mut dyn PollObserver,
    mut query: F,
) -> Result<PollReport>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<String>>>,
{
    let mut poller = Poller::new(resource, sets, settings, observer);

    loop {
        let status = query().await?;
        if poller.observe(status.as_deref())? == PollState::Succeeded {
            let status = status.unwrap_or_default();
            return Ok(poller.report(status));
        }
        poller.pause().await?;
    }
}

/// Wait for a cluster to reach a target state
///
/// The status is the type of the most recent cluster event.
pub async fn wait_for_cluster(
    workspace: &dyn Workspace,
    cluster_id: &str,
    sets: &StatusSets,
    settings: &PollSettings,
    observer: &mut dyn PollObserver,
) -> Result<PollReport> {
    info!("Waiting for cluster {}", cluster_id);
    poll_status(ResourceKind::Cluster, sets, settings, observer, move || async move {
        let events = workspace.cluster_events(cluster_id).await?;
        Ok::<_, ClientError>(latest_event_type(&events))
    })
    .await
}

fn latest_event_type(events: &[ClusterEvent]) -> Option<String> {
    let latest = events.first()?;
    debug!("Latest cluster event {} at {:?}", latest.kind, latest.occurred_at());
    Some(latest.kind.clone())
}

/// Wait for the wheel at `wheel` to reach a target install status
pub async fn wait_for_library(
    workspace: &dyn Workspace,
    cluster_id: &str,
    wheel: &str,
    sets: &StatusSets,
    settings: &PollSettings,
    observer: &mut dyn PollObserver,
) -> Result<PollReport> {
    info!("Waiting for library {} on cluster {}", wheel, cluster_id);
    poll_status(ResourceKind::Library, sets, settings, observer, move || async move {
        let statuses = workspace.library_statuses(cluster_id).await?;
        Ok::<_, ClientError>(Some(library_status(&statuses, cluster_id, wheel)?))
    })
    .await
}

/// Status of the single entry tracking `wheel`
///
/// # Errors
/// `LibraryNotFound` when no entry matches, `AmbiguousLibrary` when several do.
fn library_status(statuses: &[LibraryFullStatus], cluster_id: &str, wheel: &str) -> Result<String> {
    let matches: Vec<_> = statuses
        .iter()
        .filter(|status| status.library.is_wheel(wheel))
        .collect();

    match matches.as_slice() {
        [] => Err(ClientError::LibraryNotFound {
            cluster_id: cluster_id.to_string(),
            wheel: wheel.to_string(),
        }),
        [only] => {
            for message in &only.messages {
                debug!("Library message: {}", message);
            }
            Ok(only.status.clone())
        }
        many => Err(ClientError::AmbiguousLibrary {
            cluster_id: cluster_id.to_string(),
            wheel: wheel.to_string(),
            count: many.len(),
        }),
    }
}

/// Outcome of a finished run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run: Run,
    pub url: Option<String>,
    pub attempts: u32,
    /// Fetched only when requested
    pub output: Option<RunOutput>,
}

/// Wait for a run to reach a target life-cycle state
///
/// The run page URL is handed to the observer once, on the first query that
/// reports it. With `fetch_output` the run output is fetched after success.
pub async fn wait_for_run(
    workspace: &dyn Workspace,
    run_id: RunId,
    sets: &StatusSets,
    settings: &PollSettings,
    observer: &mut dyn PollObserver,
    fetch_output: bool,
) -> Result<RunReport> {
    info!("Waiting for run {}", run_id);
    let mut poller = Poller::new(ResourceKind::Run, sets, settings, observer);
    let mut url: Option<String> = None;

    let run = loop {
        let run = workspace.get_run(run_id).await?;

        if url.is_none() {
            if let Some(page) = &run.run_page_url {
                poller.observer().run_url(page);
                url = Some(page.clone());
            }
        }

        if poller.observe(Some(&run.state.life_cycle_state))? == PollState::Succeeded {
            break run;
        }
        poller.pause().await?;
    };

    info!(
        "Run {} finished: {} {}",
        run_id,
        run.state.result_state.as_deref().unwrap_or("-"),
        run.state.state_message.as_deref().unwrap_or("")
    );

    let output = if fetch_output {
        Some(workspace.get_run_output(run_id).await?)
    } else {
        None
    };

    Ok(RunReport {
        run,
        url,
        attempts: poller.attempts(),
        output,
    })
}
