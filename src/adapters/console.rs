//! Console adapter: a [`CloudLink`] over newline-delimited JSON.
//!
//! Stands in for the cellular thing-model transport on a host.  Inbound
//! lines are platform messages, outbound lines are reports and read
//! acknowledgements:
//!
//! ```text
//! → {"type":"command","data":{"11":1,"12":3}}
//! → {"type":"read","ids":[11,12,13],"pkg_id":7}
//! → {"type":"link","connected":false}
//! ← {"type":"report","mode":1,"data":{"11":true,"12":3}}
//! ← {"type":"ack","mode":1,"pkg_id":7,"data":{"11":true,"12":3}}
//! ```

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::app::dispatcher::CommandDispatcher;
use crate::app::ports::{CloudLink, LinkError};
use crate::thing_model::{Report, TslId};

/// One inbound platform message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Inbound {
    /// Write request.  Keys are decimal thing-model ids.
    Command { data: Map<String, Value> },
    /// Read request, answered with an ack carrying the same `pkg_id`.
    /// Ids are kept raw so that one bad id cannot cost the whole ack.
    Read { ids: Vec<Value>, pkg_id: u32 },
    /// Simulated session up/down.
    Link { connected: bool },
}

pub fn parse_line(line: &str) -> Result<Inbound, serde_json::Error> {
    serde_json::from_str(line)
}

/// Thing-model ids of a read request.  Entries that are not integers in
/// the id range cannot name a point and are dropped.
pub fn read_ids(ids: &[Value]) -> Vec<TslId> {
    ids.iter()
        .filter_map(|v| match v.as_i64().map(TslId::try_from) {
            Some(Ok(id)) => Some(id),
            _ => {
                debug!("console: read id {} dropped", v);
                None
            }
        })
        .collect()
}

/// Turn a command's `data` object into a dispatch batch, in arrival
/// order.  Keys that are not ids are logged and dropped.
pub fn command_batch(data: Map<String, Value>) -> Vec<(TslId, Value)> {
    data.into_iter()
        .filter_map(|(key, value)| match key.trim().parse::<TslId>() {
            Ok(id) => Some((id, value)),
            Err(_) => {
                warn!("console: key {:?} is not an id", key);
                None
            }
        })
        .collect()
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Outbound<'a> {
    Report { mode: u8, data: &'a Report },
    Ack { mode: u8, pkg_id: u32, data: &'a Report },
}

pub struct ConsoleLink<W> {
    out: Mutex<W>,
    connected: AtomicBool,
}

impl<W: Write + Send> ConsoleLink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            connected: AtomicBool::new(true),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
        info!("console: link {}", if connected { "up" } else { "down" });
    }

    fn emit(&self, msg: &Outbound<'_>) -> Result<(), LinkError> {
        if !self.is_connected() {
            return Err(LinkError::Disconnected);
        }
        let mut line = serde_json::to_vec(msg).map_err(|e| {
            warn!("console: encode: {}", e);
            LinkError::Rejected(-1)
        })?;
        line.push(b'\n');

        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        out.write_all(&line)
            .and_then(|()| out.flush())
            .map_err(|e| LinkError::Rejected(e.raw_os_error().unwrap_or(-1)))
    }

    /// Consume the writer, e.g. to inspect a buffer.
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> CloudLink for ConsoleLink<W> {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    fn send_report(&self, mode: u8, payload: &Report) -> Result<(), LinkError> {
        self.emit(&Outbound::Report {
            mode,
            data: payload,
        })
    }

    fn ack_read(&self, mode: u8, payload: &Report, correlation_id: u32) -> Result<(), LinkError> {
        self.emit(&Outbound::Ack {
            mode,
            pkg_id: correlation_id,
            data: payload,
        })
    }
}

/// Feed inbound lines to `dispatcher` until `input` ends.  Malformed lines
/// are logged and skipped.
pub fn serve<W: Write + Send>(
    input: impl BufRead,
    dispatcher: &CommandDispatcher,
    link: &ConsoleLink<W>,
) -> io::Result<()> {
    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok(Inbound::Command { data }) => {
                dispatcher.dispatch_command(&command_batch(data));
            }
            Ok(Inbound::Read { ids, pkg_id }) => {
                dispatcher.handle_read(&read_ids(&ids), pkg_id);
            }
            Ok(Inbound::Link { connected }) => link.set_connected(connected),
            Err(e) => warn!("console: bad line: {}", e),
        }
    }
    debug!("console: input closed");
    Ok(())
}
