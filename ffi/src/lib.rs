//! CT-API shared library.
//!
//! Exposes `CT_init`, `CT_data` and `CT_close` exactly like a card terminal driver
//! would, and forwards each call to the configured K2 backend.
//! The bridge is built on the first call from the `libctehxk2` config file and `K2_*` variables.
#![allow(clippy::missing_safety_doc)]
#![allow(non_snake_case)]

mod logging;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::slice;

use k2_ctapi::wire::DataRequest;
use k2_ctapi::{Dispatcher, Settings, Status};
use once_cell::sync::Lazy;
use tracing::{debug, error};

static DISPATCHER: Lazy<Option<Dispatcher>> = Lazy::new(|| {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            logging::init(k2_ctapi::settings::DEFAULT_LOG_LEVEL, None);
            error!("Failed to load configuration: {}", e);
            return None;
        }
    };

    logging::init(&settings.log_level, settings.log_path.as_deref());
    debug!("Using backend at {}", settings.base_url);

    match Dispatcher::from_settings(&settings) {
        Ok(dispatcher) => Some(dispatcher),
        Err(e) => {
            error!("Failed to start the bridge: {}", e);
            None
        }
    }
});

/// Runs the call against the process-wide dispatcher.
/// Neither a missing configuration nor a panic may cross the ABI, both become `ERR_HTSI`.
fn call<F>(name: &str, f: F) -> i8
where
    F: FnOnce(&Dispatcher) -> Status,
{
    let status = match catch_unwind(AssertUnwindSafe(|| DISPATCHER.as_ref().map(f))) {
        Ok(Some(status)) => status,
        Ok(None) => {
            error!("{}: Library is not configured", name);
            Status::ErrHtsi
        }
        Err(e) => {
            error!("{}: Caught panic", name);
            debug!("{:?}", e);
            Status::ErrHtsi
        }
    };

    debug!("{}: Returning {}", name, status);
    status.into()
}

/// Opens the card terminal `ctn` on the port `pn`.
#[no_mangle]
pub extern "system" fn CT_init(ctn: u16, pn: u16) -> i8 {
    call("CT_init", |dispatcher| {
        debug!("CT_init(ctn: {}, pn: {})", ctn, pn);
        dispatcher.init(ctn, pn)
    })
}

/// Sends `lenc` bytes of `command` to the card terminal `ctn`.
/// On input `lenr` is the capacity of `response`; on success it is overwritten with the
/// length received, and `dad`/`sad` with the addresses reported back.
/// Nothing is written unless the call returns `OK`.
#[no_mangle]
pub unsafe extern "system" fn CT_data(
    ctn: u16,
    dad: *mut u8,
    sad: *mut u8,
    lenc: u16,
    command: *const u8,
    lenr: *mut u16,
    response: *mut u8,
) -> i8 {
    call("CT_data", |dispatcher| {
        if dad.is_null() || sad.is_null() || lenr.is_null() || response.is_null() {
            error!("CT_data: Null pointer passed as dad, sad, lenr or response");
            return Status::ErrHtsi;
        }

        if command.is_null() && lenc > 0 {
            error!("CT_data: Null pointer passed as command");
            return Status::ErrHtsi;
        }

        let command = match lenc {
            0 => &[][..],
            _ => slice::from_raw_parts(command, usize::from(lenc)),
        };
        let capacity = *lenr;

        debug!(
            "CT_data(ctn: {}, dad: {}, sad: {}, lenc: {}, lenr: {})",
            ctn, *dad, *sad, lenc, capacity
        );

        match dispatcher.data(ctn, DataRequest::new(*dad, *sad, command, capacity)) {
            Ok(reply) => {
                let out = slice::from_raw_parts_mut(response, usize::from(capacity));
                out[..reply.response.len()].copy_from_slice(&reply.response);

                *dad = reply.dad;
                *sad = reply.sad;
                *lenr = reply.lenr;

                Status::Ok
            }
            Err(status) => status,
        }
    })
}

/// Closes the card terminal `ctn`.
#[no_mangle]
pub extern "system" fn CT_close(ctn: u16) -> i8 {
    call("CT_close", |dispatcher| {
        debug!("CT_close(ctn: {})", ctn);
        dispatcher.close(ctn)
    })
}
