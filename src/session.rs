//! Start/stop handle around one ingest loop.

use std::net::SocketAddr;
use std::thread::{self, JoinHandle};

use crate::config::Config;
use crate::err::SessionError;
use crate::ingest::{CancelToken, Closer, IngestLoop, UdpSource};
use crate::sink::FixSink;

type WorkerHandle = JoinHandle<Result<(), SessionError>>;

struct Worker {
    cancel: CancelToken,
    closer: Closer,
    addr: SocketAddr,
    handle: WorkerHandle,
}

impl Worker {
    fn join(self) -> Result<(), SessionError> {
        self.cancel.cancel();
        self.closer.close();
        match self.handle.join() {
            Ok(res) => res,
            Err(_) => Err(SessionError::WorkerPanicked),
        }
    }
}

/// At most one running ingest loop, listening on one UDP port.
///
/// Each start gets a fresh smoother; nothing carries over between sessions.
pub struct Session {
    config: Config,
    worker: Option<Worker>,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Session {
            config,
            worker: None,
        }
    }

    /// Start on the configured port, see [start_on](#method.start_on).
    pub fn start<K>(&mut self, sink: K) -> Result<bool, SessionError>
    where
        K: FixSink + Send + 'static,
    {
        let port = self.config.port;
        self.start_on(port, sink)
    }

    /// Bind `port` and start feeding fixes to `sink` on a worker thread.
    ///
    /// Returns `Ok(false)` without touching anything if a session is already
    /// running. Bind failures are returned here and nothing is started.
    pub fn start_on<K>(&mut self, port: u16, sink: K) -> Result<bool, SessionError>
    where
        K: FixSink + Send + 'static,
    {
        if self.is_running() {
            debug!("Session already running, ignoring start on port {}", port);
            return Ok(false);
        }
        if let Some(finished) = self.worker.take() {
            if let Err(e) = finished.join() {
                warn!("Previous session ended with an error: {}", e);
            }
        }

        let source = UdpSource::bind(port, self.config.poll_interval)?;
        let addr = source
            .local_addr()
            .map_err(|e| SessionError::Bind(port, e))?;
        let closer = source.closer().map_err(|e| SessionError::Bind(port, e))?;
        let cancel = CancelToken::new();
        let ingest = IngestLoop::new(source, sink, &self.config);
        let token = cancel.clone();
        let builder = thread::Builder::new().name("xgps-ingest".into());
        let handle = spawn_worker(builder, move || ingest.run(&token))?;

        info!("Listening for XGPS sentences on {}", addr);
        self.worker = Some(Worker {
            cancel,
            closer,
            addr,
            handle,
        });
        Ok(true)
    }

    /// Stop the running session and release its port.
    ///
    /// Safe to call when nothing runs. Returns the error the session died of,
    /// if it died of one.
    pub fn stop(&mut self) -> Result<(), SessionError> {
        match self.worker.take() {
            Some(worker) => {
                let addr = worker.addr;
                let res = worker.join();
                info!("Stopped listening on {}", addr);
                res
            }
            None => Ok(()),
        }
    }

    pub fn is_running(&self) -> bool {
        match self.worker {
            Some(ref w) => !w.handle.is_finished(),
            None => false,
        }
    }

    /// Address the running session is bound to.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.worker.as_ref().map(|w| w.addr)
    }
}

fn spawn_worker<F>(builder: thread::Builder, run: F) -> Result<WorkerHandle, SessionError>
where
    F: FnOnce() -> Result<(), SessionError> + Send + 'static,
{
    builder.spawn(run).map_err(SessionError::Spawn)
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!("Session ended with an error: {}", e);
        }
    }
}
