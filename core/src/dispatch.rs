//! Blocking front of the bridge for synchronous callers.
//!
//! CT-API functions return their result directly, so each call is spawned onto
//! the dispatcher's own runtime and the calling thread waits for its single
//! result. This works from any thread, including one that already drives
//! another async runtime.

use std::future::Future;
use std::sync::mpsc::sync_channel;
use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};

use crate::bridge::Bridge;
use crate::error::{Error, Result};
use crate::settings::Settings;
use crate::status::Status;
use crate::wire::{DataRequest, DataResponse};

const WORKER_THREADS: usize = 2;

pub struct Dispatcher {
    runtime: Runtime,
    bridge: Arc<Bridge>,
}

impl Dispatcher {
    pub fn new(bridge: Bridge) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(WORKER_THREADS)
            .thread_name("ctapi-io")
            .enable_all()
            .build()
            .map_err(Error::Runtime)?;

        Ok(Self {
            runtime,
            bridge: Arc::new(bridge),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(Bridge::new(settings)?)
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    /// Runs the future on the dispatcher's runtime and waits for its output.
    pub fn run<F, Fut>(&self, f: F) -> Result<Fut::Output>
    where
        F: FnOnce(Arc<Bridge>) -> Fut,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        let (tx, rx) = sync_channel(1);
        let call = f(Arc::clone(&self.bridge));

        self.runtime.spawn(async move {
            let _ = tx.send(call.await);
        });

        // A panicking call drops the sender without sending.
        rx.recv().map_err(|_| Error::Dispatch)
    }

    pub fn init(&self, ctn: u16, pn: u16) -> Status {
        self.run(|bridge| async move { bridge.init(ctn, pn).await })
            .unwrap_or_else(Self::lost)
    }

    pub fn data(
        &self,
        ctn: u16,
        request: DataRequest,
    ) -> std::result::Result<DataResponse, Status> {
        self.run(|bridge| async move { bridge.data(ctn, request).await })
            .unwrap_or_else(|e| Err(Self::lost(e)))
    }

    pub fn close(&self, ctn: u16) -> Status {
        self.run(|bridge| async move { bridge.close(ctn).await })
            .unwrap_or_else(Self::lost)
    }

    fn lost(e: Error) -> Status {
        error!("{}", e);
        Status::ErrHtsi
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use url::Url;
    use wiremock::matchers::path_regex;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::http::Transport;
    use crate::registry::Terminal;

    fn start_server(rt: &Runtime) -> MockServer {
        rt.block_on(async {
            let server = MockServer::start().await;
            Mock::given(path_regex("^/ct_(init|close)/"))
                .respond_with(ResponseTemplate::new(200).set_body_string("0"))
                .mount(&server)
                .await;
            Mock::given(path_regex("^/ct_data/"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "dad": 2,
                    "sad": 3,
                    "lenr": 1,
                    "response": "kAA=",
                    "responseCode": 0,
                })))
                .mount(&server)
                .await;
            server
        })
    }

    fn settings(server: &MockServer) -> Settings {
        Settings {
            base_url: Url::parse(&server.uri()).unwrap(),
            timeout: Some(Duration::from_secs(5)),
            ..Settings::default()
        }
    }

    #[test]
    fn runs_calls_to_completion() {
        let rt = Runtime::new().unwrap();
        let server = start_server(&rt);
        let dispatcher = Dispatcher::from_settings(&settings(&server)).unwrap();

        assert_eq!(dispatcher.init(1, 1), Status::Ok);
        assert_eq!(dispatcher.init(1, 1), Status::ErrInvalid);

        let response = dispatcher
            .data(1, DataRequest::new(3, 2, &[1, 2, 3, 4, 5], 1000))
            .unwrap();
        assert_eq!(response.response, vec![144, 0]);

        assert_eq!(dispatcher.close(1), Status::Ok);
        assert_eq!(dispatcher.close(1), Status::ErrInvalid);
        assert_eq!(
            dispatcher.run(|b| async move { b.registry().get(1).await }).unwrap(),
            Terminal::Closed { pn: 1 }
        );
    }

    #[test]
    fn callable_from_inside_another_runtime() {
        let rt = Runtime::new().unwrap();
        let server = start_server(&rt);
        let dispatcher = Dispatcher::from_settings(&settings(&server)).unwrap();

        let status = rt.block_on(async { dispatcher.init(2, 2) });
        assert_eq!(status, Status::Ok);
    }

    #[test]
    fn panicking_call_is_reported() {
        let base = Url::parse("http://127.0.0.1:1/").unwrap();
        let transport = Transport::new(base, None).unwrap();
        let dispatcher = Dispatcher::new(Bridge::with_transport(transport)).unwrap();

        let result: Result<()> = dispatcher.run(|_| async { panic!("boom") });
        assert!(matches!(result, Err(Error::Dispatch)));
    }

    #[test]
    fn unreachable_backend_collapses() {
        let settings = Settings {
            base_url: Url::parse("http://127.0.0.1:1/k2/ctapi/").unwrap(),
            ..Settings::default()
        };
        let dispatcher = Dispatcher::from_settings(&settings).unwrap();

        assert_eq!(dispatcher.init(1, 1), Status::ErrHtsi);
        assert_eq!(dispatcher.close(1), Status::ErrInvalid);
    }
}
