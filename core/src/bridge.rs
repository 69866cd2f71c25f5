//! The CT-API state machine.
//!
//! Every call locks its terminal in the [`Registry`] for its whole duration,
//! checks the lifecycle precondition, talks to the backend at most once and
//! records the resulting transition. Only precondition violations answer
//! [`Status::ErrInvalid`] without touching the network; every failure to get a
//! well-formed answer from the backend collapses into [`Status::ErrHtsi`].

use crate::error::Result;
use crate::http::Transport;
use crate::registry::{Registry, Terminal};
use crate::settings::Settings;
use crate::status::Status;
use crate::wire::{self, DataRequest, DataResponse, Endpoint};

pub struct Bridge {
    registry: Registry,
    transport: Transport,
    terminal_override: Option<(u16, u16)>,
}

impl Bridge {
    /// Creates a bridge with an empty registry.
    pub fn new(settings: &Settings) -> Result<Self> {
        let transport = Transport::new(settings.base_url.clone(), settings.timeout)?;

        Ok(Self::with_transport(transport).terminal_override(settings.terminal_override))
    }

    /// Creates a bridge over the transport with an empty registry.
    pub fn with_transport(transport: Transport) -> Self {
        Self {
            registry: Registry::new(),
            transport,
            terminal_override: None,
        }
    }

    /// Sends these terminal ids to the backend instead of the caller's.
    pub fn terminal_override(mut self, ids: Option<(u16, u16)>) -> Self {
        self.terminal_override = ids;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Opens the card terminal `ctn` on port `pn`.
    pub async fn init(&self, ctn: u16, pn: u16) -> Status {
        let mut terminal = self.registry.lock(ctn).await;

        if terminal.is_initialized() {
            debug!("CT_init: Card terminal {} has already been opened", ctn);
            return Status::ErrInvalid;
        }

        let path = self.path(Endpoint::Init, ctn, pn);
        let status = match self.transport.post_empty(&path).await {
            Ok(body) => wire::decode_status(&body),
            Err(e) => {
                error!("CT_init: Request failed");
                debug!("{}", e);
                return Status::ErrHtsi;
            }
        };

        if status.is_ok() {
            *terminal = Terminal::Initialized { pn };
            debug!("CT_init: Card terminal {} opened", ctn);
        }

        status
    }

    /// Exchanges a command with the card terminal `ctn`.
    ///
    /// Gives the decoded response, cut to the capacity requested in `request.lenr`,
    /// only when the backend reported success. Any other outcome is the status to
    /// return, with the caller's output parameters left as they are.
    pub async fn data(
        &self,
        ctn: u16,
        request: DataRequest,
    ) -> std::result::Result<DataResponse, Status> {
        let terminal = self.registry.lock(ctn).await;

        let pn = match terminal.open_port() {
            Some(pn) => pn,
            None => {
                debug!("CT_data: Card terminal {} has not been opened", ctn);
                return Err(Status::ErrInvalid);
            }
        };

        let capacity = request.lenr;
        let path = self.path(Endpoint::Data, ctn, pn);
        let mut response = match self
            .transport
            .post_json(&path, &request)
            .await
            .and_then(|body| DataResponse::decode(&body))
        {
            Ok(response) => response,
            Err(e) => {
                error!("CT_data: Request failed");
                debug!("{}", e);
                return Err(Status::ErrHtsi);
            }
        };

        debug!("CT_data: RX {}", hex::encode(&response.response));

        if !response.status.is_ok() {
            return Err(response.status);
        }

        response.response.truncate(usize::from(capacity));
        response.lenr = response
            .lenr
            .min(capacity)
            .min(response.response.len() as u16);

        Ok(response)
    }

    /// Closes the card terminal `ctn`.
    /// The terminal is closed locally whatever the backend answers.
    pub async fn close(&self, ctn: u16) -> Status {
        let mut terminal = self.registry.lock(ctn).await;

        let pn = match terminal.open_port() {
            Some(pn) => pn,
            None => {
                debug!("CT_close: Card terminal {} has not been opened", ctn);
                return Status::ErrInvalid;
            }
        };

        *terminal = Terminal::Closed { pn };

        let path = self.path(Endpoint::Close, ctn, pn);
        match self.transport.post_empty(&path).await {
            Ok(body) => wire::decode_status(&body),
            Err(e) => {
                error!("CT_close: Request failed");
                debug!("{}", e);
                Status::ErrHtsi
            }
        }
    }

    fn path(&self, endpoint: Endpoint, ctn: u16, pn: u16) -> String {
        let (ctn, pn) = self.terminal_override.unwrap_or((ctn, pn));

        endpoint.path(ctn, pn)
    }
}
