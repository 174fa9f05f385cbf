//! Ticketing for writes sent to the persistence worker.
//!
//! [`WriteThrough`] remembers which part of the UI each in-flight write came
//! from, so the settle event can clear the right pending marker and pick the
//! right failure message.

use std::collections::BTreeMap;

use launchpad_core::{ProfileField, ProfileId};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use crate::worker::{PersistCommand, PersistRequest, WriteTicket};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOrigin {
    Profile(ProfileId),
    Field(ProfileId, ProfileField),
    Language,
    Client,
}

impl WriteOrigin {
    pub fn profile(&self) -> Option<ProfileId> {
        match self {
            WriteOrigin::Profile(id) | WriteOrigin::Field(id, _) => Some(*id),
            WriteOrigin::Language | WriteOrigin::Client => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlight {
    pub origin: WriteOrigin,
    pub command: &'static str,
    pub failure_key: &'static str,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("persistence worker is not running")]
    WorkerGone,
}

#[derive(Debug)]
pub struct WriteThrough {
    tx: mpsc::UnboundedSender<PersistRequest>,
    next_ticket: u64,
    in_flight: BTreeMap<WriteTicket, InFlight>,
}

impl WriteThrough {
    pub fn new(tx: mpsc::UnboundedSender<PersistRequest>) -> Self {
        Self {
            tx,
            next_ticket: 0,
            in_flight: BTreeMap::new(),
        }
    }

    pub fn submit(
        &mut self,
        origin: WriteOrigin,
        command: PersistCommand,
    ) -> Result<WriteTicket, DispatchError> {
        let ticket = WriteTicket(self.next_ticket);
        let entry = InFlight {
            origin,
            command: command.name(),
            failure_key: command.failure_key(),
        };
        self.tx
            .send(PersistRequest { ticket, command })
            .map_err(|_| DispatchError::WorkerGone)?;
        debug!(ticket = ticket.0, command = entry.command, "write submitted");
        self.next_ticket += 1;
        self.in_flight.insert(ticket, entry);
        Ok(ticket)
    }

    pub fn settle(&mut self, ticket: WriteTicket) -> Option<InFlight> {
        self.in_flight.remove(&ticket)
    }

    pub fn field_in_flight(&self, id: ProfileId, field: ProfileField) -> bool {
        self.in_flight
            .values()
            .any(|entry| entry.origin == WriteOrigin::Field(id, field))
    }

    pub fn row_in_flight(&self, id: ProfileId) -> bool {
        self.in_flight
            .values()
            .any(|entry| entry.origin.profile() == Some(id))
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}
