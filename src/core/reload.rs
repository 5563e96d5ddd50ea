use crate::core::app::Site;
use crate::error::Result;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Default interval of the keep-alive loop while watching.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Lifecycle of a [`SiteWatch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WatchState {
  /// Not subscribed yet.
  #[default]
  Idle,
  /// Subscribed to filesystem events and rebuilding on change.
  Watching,
  /// Terminal. The subscription is gone and the worker has exited.
  Stopped,
}

#[derive(Debug, Clone)]
pub struct WatchOptions {
  /// How often the main loop wakes up while waiting for shutdown.
  pub poll_interval: Duration,
}

impl Default for WatchOptions {
  fn default() -> Self {
    Self {
      poll_interval: DEFAULT_POLL_INTERVAL,
    }
  }
}

/// What happened while watching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
  /// Full rebuild passes started.
  pub passes: usize,
  /// Passes that ended in an error.
  pub failures: usize,
  /// State the watch ended in. `Stopped` once `SiteWatch::run` returns.
  pub state: WatchState,
}

/// Messages on the change queue.
#[derive(Debug)]
pub(crate) enum Change {
  Path(PathBuf),
  /// Sent by the watch itself on shutdown; everything queued before it is
  /// still handled.
  Stop,
}

/// Sending half of the change queue. The OS watcher feeds it, and callers
/// can get their own handle from [`SiteWatch::notifier`].
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
  tx: mpsc::UnboundedSender<Change>,
}

impl ChangeNotifier {
  pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<Change>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx }, rx)
  }

  /// Queues `path` as changed. Returns false once the watch has stopped.
  pub fn notify(&self, path: impl Into<PathBuf>) -> bool {
    self.tx.send(Change::Path(path.into())).is_ok()
  }

  fn stop(&self) {
    let _ = self.tx.send(Change::Stop);
  }
}

/// Drains the change queue and runs full rebuilds.
///
/// There is a single consumer, so passes never overlap. Changes that are
/// already queued when a pass starts are folded into that pass.
pub(crate) struct Rebuilder {
  site: Arc<Site>,
  root: PathBuf,
  changes: mpsc::UnboundedReceiver<Change>,
  summary: WatchSummary,
  stopping: bool,
}

impl Rebuilder {
  pub(crate) fn new(site: Arc<Site>, changes: mpsc::UnboundedReceiver<Change>) -> Self {
    let root = site.template_root().to_path_buf();
    Self {
      site,
      root,
      changes,
      summary: WatchSummary {
        state: WatchState::Watching,
        ..WatchSummary::default()
      },
      stopping: false,
    }
  }

  /// Blocks until a stop message arrives or every notifier is dropped.
  pub(crate) fn run(mut self) -> WatchSummary {
    while !self.stopping {
      let path = match self.changes.blocking_recv() {
        Some(Change::Path(path)) => path,
        Some(Change::Stop) | None => break,
      };

      if !self.qualifies(&path) {
        log::debug!("Ignoring change outside the template root: {}", path.display());
        continue;
      }

      log::info!("📝 Template change detected: {}", path.display());
      let merged = self.drain_queued();
      if merged > 0 {
        log::debug!("Folded {} queued change(s) into this rebuild", merged);
      }
      self.rebuild();
    }
    self.summary
  }

  fn qualifies(&self, path: &Path) -> bool {
    path.starts_with(&self.root)
  }

  fn drain_queued(&mut self) -> usize {
    let mut merged = 0;
    while let Ok(change) = self.changes.try_recv() {
      match change {
        Change::Path(path) if self.qualifies(&path) => merged += 1,
        Change::Path(_) => {}
        Change::Stop => {
          self.stopping = true;
          break;
        }
      }
    }
    merged
  }

  fn rebuild(&mut self) {
    self.summary.passes += 1;
    match self.site.build() {
      Ok(report) => log::info!("Templates rebuilt ({} page(s)).", report.len()),
      Err(e) => {
        self.summary.failures += 1;
        log::error!("Failed to rebuild templates: {}", e);
      }
    }
  }
}

/// Subscribes an OS-level watcher that forwards changed paths to `notifier`.
fn subscribe(notifier: ChangeNotifier) -> Result<RecommendedWatcher> {
  let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
    let event = match res {
      Ok(event) => event,
      Err(e) => {
        log::error!("File watch error: {:?}", e);
        return;
      }
    };

    if !(event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove()) {
      return;
    }

    for path in event.paths {
      notifier.notify(path);
    }
  })?;

  Ok(watcher)
}

/// A watch over a site's template root that has not started yet.
///
/// Take a [`ChangeNotifier`] with `notifier()` before calling `run` to push
/// changes in from outside the OS watcher.
#[derive(Debug)]
pub struct SiteWatch {
  site: Arc<Site>,
  options: WatchOptions,
  notifier: ChangeNotifier,
  changes: mpsc::UnboundedReceiver<Change>,
  state: WatchState,
}

impl SiteWatch {
  pub fn new(site: Arc<Site>, options: WatchOptions) -> Self {
    let (notifier, changes) = ChangeNotifier::channel();
    Self {
      site,
      options,
      notifier,
      changes,
      state: WatchState::Idle,
    }
  }

  pub fn notifier(&self) -> ChangeNotifier {
    self.notifier.clone()
  }

  pub fn state(&self) -> WatchState {
    self.state
  }

  /// Watches the template root and rebuilds every template whenever
  /// something under it changes, until `shutdown` completes.
  ///
  /// Rebuild errors are logged and counted; they do not stop the watch. On
  /// shutdown the OS watcher is dropped and this waits for the rebuild worker
  /// to finish the changes queued so far before returning.
  pub async fn run<F>(self, shutdown: F) -> Result<WatchSummary>
  where
    F: Future<Output = ()>,
  {
    let SiteWatch {
      site,
      options,
      notifier,
      changes,
      mut state,
    } = self;
    let root = site.template_root().to_path_buf();

    let mut watcher = subscribe(notifier.clone())?;
    watcher.watch(&root, RecursiveMode::Recursive)?;

    let worker = tokio::task::spawn_blocking(move || Rebuilder::new(site, changes).run());
    transition(&mut state, WatchState::Watching);
    log::info!("Watching '{}' for changes...", root.display());

    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(options.poll_interval);
    loop {
      tokio::select! {
        _ = ticker.tick() => {}
        _ = &mut shutdown => break,
      }
    }

    drop(watcher);
    notifier.stop();
    let mut summary = worker.await?;
    transition(&mut state, WatchState::Stopped);
    summary.state = state;

    Ok(summary)
  }
}

fn transition(state: &mut WatchState, next: WatchState) {
  log::debug!("Watch state: {:?} -> {:?}", state, next);
  *state = next;
}

/// Runs a [`SiteWatch`] with default wiring until `shutdown` completes.
pub async fn watch<F>(site: Arc<Site>, options: WatchOptions, shutdown: F) -> Result<WatchSummary>
where
  F: Future<Output = ()>,
{
  SiteWatch::new(site, options).run(shutdown).await
}
