//! The broker task: sole owner of the connection table and room registry.
//!
//! Every structural change and every fan-out runs here, one request at a
//! time, so no lock guards the tables. Delivery never blocks: a full queue
//! drops the payload for that connection, a closed queue or a detached
//! connection keeps it in the backlog.

use std::{collections::HashMap, ops::ControlFlow, sync::Arc};

use hiroba_shared::time::{Clock, SystemClock};
use tokio::sync::mpsc;

use crate::{
    config::HubConfig,
    domain::{
        Connection, ConnectionId, ConnectionSnapshot, Delivery, DisplayName, Generation, HubError,
        HubSnapshot, LinkState, OutboundSender, Registry, RoomLimitReached, RoomName,
        RoomSnapshot, Timestamp,
    },
};

use super::{command::HubCommand, handle::HubHandle};

pub struct Hub {
    config: HubConfig,
    clock: Arc<dyn Clock>,
    connections: HashMap<ConnectionId, Connection>,
    registry: Registry,
    rx: mpsc::Receiver<HubCommand>,
    /// Used by expiry timers; does not keep the channel open
    weak_tx: mpsc::WeakSender<HubCommand>,
    last_generation: Generation,
}

impl Hub {
    /// Create the broker and the handle used to reach it.
    ///
    /// Nothing is served until [`Hub::run`] is spawned.
    pub fn new(config: HubConfig) -> (Self, HubHandle) {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: HubConfig, clock: Arc<dyn Clock>) -> (Self, HubHandle) {
        let (tx, rx) = mpsc::channel(config.command_buffer);
        let hub = Self {
            registry: Registry::new(config.max_rooms),
            config,
            clock,
            connections: HashMap::new(),
            rx,
            weak_tx: tx.downgrade(),
            last_generation: Generation::new(0),
        };
        (hub, HubHandle::new(tx))
    }

    /// Serve requests until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        tracing::info!("Hub started");
        while let Some(command) = self.rx.recv().await {
            if self.handle(command).is_break() {
                break;
            }
        }
        self.close_all();
        tracing::info!("Hub stopped");
    }

    fn handle(&mut self, command: HubCommand) -> ControlFlow<()> {
        match command {
            HubCommand::Admit { requested, reply } => {
                let _ = reply.send(self.admit(requested));
            }
            HubCommand::Register {
                id,
                name,
                outbound,
                reply,
            } => {
                let _ = reply.send(self.register(id, name, outbound));
            }
            HubCommand::Unregister { id, generation } => self.unregister(&id, generation),
            HubCommand::Detach {
                id,
                generation,
                undelivered,
            } => self.detach(id, generation, undelivered),
            HubCommand::Expire { id, generation } => self.expire(&id, generation),
            HubCommand::Broadcast { payload } => self.broadcast(payload),
            HubCommand::JoinRoom { id, room, reply } => {
                let _ = reply.send(self.join_room(&id, &room));
            }
            HubCommand::LeaveRoom { id, room, reply } => {
                self.leave_room(&id, &room);
                let _ = reply.send(());
            }
            HubCommand::SendToRoom {
                room,
                payload,
                sender,
            } => self.send_to_room(&room, payload, sender.as_ref()),
            HubCommand::SendToName { name, payload } => self.send_to_name(&name, payload),
            HubCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            HubCommand::Shutdown { reply } => {
                tracing::info!("Hub shutting down");
                self.close_all();
                let _ = reply.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    fn admit(&self, requested: Option<ConnectionId>) -> Result<ConnectionId, HubError> {
        if let Some(id) = requested
            && self.connections.contains_key(&id)
        {
            tracing::debug!("Admitting '{}' as a reconnection", id);
            return Ok(id);
        }
        self.check_capacity()?;
        Ok(ConnectionId::generate())
    }

    fn check_capacity(&self) -> Result<(), HubError> {
        match self.config.max_connections {
            Some(max) if self.connections.len() >= max => {
                tracing::warn!("Connection limit of {} reached, refusing connection", max);
                Err(HubError::ConnectionLimitReached(max))
            }
            _ => Ok(()),
        }
    }

    /// Admission does not reserve a slot, so a new id is checked against the
    /// ceiling again here.
    fn register(
        &mut self,
        id: ConnectionId,
        name: DisplayName,
        outbound: OutboundSender,
    ) -> Result<Generation, HubError> {
        if !self.connections.contains_key(&id) {
            self.check_capacity()?;
        }
        self.last_generation = self.last_generation.next();
        let generation = self.last_generation;

        match self.connections.get_mut(&id) {
            Some(connection) => {
                let replayed = connection.attach(name, outbound, generation);
                tracing::info!(
                    "Connection '{}' reattached (generation {}), replayed {} message(s)",
                    id,
                    generation.value(),
                    replayed
                );
            }
            None => {
                let connection = Connection::new(
                    id.clone(),
                    name,
                    generation,
                    outbound,
                    self.config.backlog_capacity,
                    self.now(),
                );
                self.connections.insert(id.clone(), connection);
                tracing::info!(
                    "Connection '{}' registered ({} connected)",
                    id,
                    self.connections.len()
                );
            }
        }
        Ok(generation)
    }

    fn unregister(&mut self, id: &ConnectionId, generation: Generation) {
        match self.connections.get(id) {
            Some(connection) if connection.generation() == generation => self.purge(id),
            Some(_) => tracing::debug!(
                "Ignoring unregister of '{}' from superseded generation {}",
                id,
                generation.value()
            ),
            None => tracing::debug!("Unregister of unknown connection '{}' ignored", id),
        }
    }

    fn detach(&mut self, id: ConnectionId, generation: Generation, undelivered: Vec<String>) {
        let now = self.now();
        let Some(connection) = self.connections.get_mut(&id) else {
            tracing::debug!(
                "Dropping {} undelivered message(s) of unknown connection '{}'",
                undelivered.len(),
                id
            );
            return;
        };

        if connection.generation() != generation {
            // A newer transport already took over; hand it what the old one missed.
            for payload in undelivered {
                log_delivery(&id, connection.deliver(payload));
            }
            return;
        }

        if self.config.reconnect_grace.is_zero() {
            self.purge(&id);
            return;
        }

        let evicted = connection.detach(undelivered, now);
        tracing::info!(
            "Connection '{}' lost its transport; holding {} message(s) for {:?}",
            id,
            connection.backlog_len(),
            self.config.reconnect_grace
        );
        if evicted > 0 {
            tracing::warn!("Backlog of '{}' full, evicted {} message(s)", id, evicted);
        }
        self.schedule_expiry(id, generation);
    }

    fn schedule_expiry(&self, id: ConnectionId, generation: Generation) {
        let weak_tx = self.weak_tx.clone();
        let grace = self.config.reconnect_grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if let Some(tx) = weak_tx.upgrade() {
                let _ = tx.send(HubCommand::Expire { id, generation }).await;
            }
        });
    }

    fn expire(&mut self, id: &ConnectionId, generation: Generation) {
        let expired = self.connections.get(id).is_some_and(|connection| {
            connection.generation() == generation && connection.state() == LinkState::Detached
        });
        if expired {
            tracing::info!("Reconnect grace of '{}' elapsed", id);
            self.purge(id);
        }
    }

    /// Remove a connection from the table and every room, closing its queue.
    fn purge(&mut self, id: &ConnectionId) {
        if self.connections.remove(id).is_none() {
            return;
        }
        let deleted = self.registry.remove_everywhere(id);
        tracing::info!(
            "Connection '{}' removed ({} connected)",
            id,
            self.connections.len()
        );
        for room in deleted {
            tracing::debug!("Room '{}' deleted (no members left)", room);
        }
    }

    fn broadcast(&mut self, payload: String) {
        for (id, connection) in self.connections.iter_mut() {
            log_delivery(id, connection.deliver(payload.clone()));
        }
    }

    fn join_room(&mut self, id: &ConnectionId, room: &RoomName) -> Result<(), HubError> {
        if !self.connections.contains_key(id) {
            return Err(HubError::UnknownConnection(id.to_string()));
        }
        match self.registry.join(id, room) {
            Ok(outcome) => {
                tracing::debug!("Connection '{}' joined room '{}' ({:?})", id, room, outcome);
                Ok(())
            }
            Err(RoomLimitReached(max)) => {
                tracing::warn!(
                    "Room limit of {} reached, '{}' cannot create room '{}'",
                    max,
                    id,
                    room
                );
                Err(HubError::RoomLimitReached(max))
            }
        }
    }

    fn leave_room(&mut self, id: &ConnectionId, room: &RoomName) {
        let outcome = self.registry.leave(id, room);
        tracing::debug!("Connection '{}' left room '{}' ({:?})", id, room, outcome);
    }

    fn send_to_room(&mut self, room: &RoomName, payload: String, sender: Option<&ConnectionId>) {
        if !self.registry.contains_room(room) {
            tracing::debug!("Room '{}' does not exist, message dropped", room);
            return;
        }
        for member in self.registry.members(room) {
            if Some(member) == sender {
                continue;
            }
            if let Some(connection) = self.connections.get_mut(member) {
                log_delivery(member, connection.deliver(payload.clone()));
            }
        }
    }

    fn send_to_name(&mut self, name: &DisplayName, payload: String) {
        let mut matched = 0;
        for (id, connection) in self.connections.iter_mut() {
            if connection.name() == name {
                log_delivery(id, connection.deliver(payload.clone()));
                matched += 1;
            }
        }
        if matched == 0 {
            tracing::debug!("No connection named '{}', message dropped", name);
        }
    }

    fn snapshot(&self) -> HubSnapshot {
        let mut connections: Vec<ConnectionSnapshot> = self
            .connections
            .values()
            .map(|connection| ConnectionSnapshot {
                id: connection.id().clone(),
                name: connection.name().clone(),
                state: connection.state(),
                connected_at: connection.connected_at(),
                detached_since: connection.detached_since(),
                backlog_len: connection.backlog_len(),
                rooms: self.registry.rooms_of(connection.id()).into_iter().collect(),
            })
            .collect();
        connections.sort_by(|a, b| a.id.cmp(&b.id));

        let mut rooms: Vec<RoomSnapshot> = self
            .registry
            .rooms()
            .map(|(name, members)| {
                let mut members: Vec<ConnectionId> = members.iter().cloned().collect();
                members.sort();
                RoomSnapshot {
                    name: name.clone(),
                    members,
                }
            })
            .collect();
        rooms.sort_by(|a, b| a.name.cmp(&b.name));

        HubSnapshot { connections, rooms }
    }

    /// Drop every connection; their queues close and the write loops exit.
    fn close_all(&mut self) {
        if self.connections.is_empty() {
            return;
        }
        tracing::info!("Closing {} connection(s)", self.connections.len());
        self.connections.clear();
        self.registry.clear();
    }
}

fn log_delivery(id: &ConnectionId, delivery: Delivery) {
    match delivery {
        Delivery::Queued => {}
        Delivery::DroppedFull => {
            tracing::warn!("Outbound queue of '{}' is full, message dropped", id)
        }
        Delivery::Backlogged { evicted: false } => {
            tracing::debug!("Connection '{}' unreachable, message kept for replay", id)
        }
        Delivery::Backlogged { evicted: true } => {
            tracing::warn!("Backlog of '{}' full, evicted its oldest message", id)
        }
    }
}
