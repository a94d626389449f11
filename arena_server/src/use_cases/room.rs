// Room actor: membership, lifecycle and the turn loop for one room.

use super::types::{
    ConnectionHandle, ConnectionId, MatchHistory, MemberStatus, MoveRejection, Notice, PlayerEntry,
    RoomConfig, RoomState, RoomStatus, Standing,
};
use crate::domain::systems::{spawn_world, step};
use crate::domain::{
    DeathCause, EventKind, HoldCourse, MoveIntent, MovePolicy, SimError, Snake, SnakeId, TickEvent,
    TurnRecord, World,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, timeout_at};
use tracing::{Instrument, debug, error, info, info_span, warn};

/// Moves a living snake may have queued ahead of the tick being collected.
pub const MAX_BACKLOG: usize = 8;

/// Errors returned by room control operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    /// Start requested with no subscribers.
    EmptyRoom,
    /// Start requested while a match is running or finished.
    NotIdle,
    AlreadySubscribed,
    NotSubscribed,
    /// The layout has no room for every snake.
    Spawn(SimError),
    /// The room's command queue is full.
    Saturated,
    /// The room task has stopped.
    RoomClosed,
}

impl fmt::Display for RoomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomError::EmptyRoom => write!(f, "room has no subscribers"),
            RoomError::NotIdle => write!(f, "room is not idle"),
            RoomError::AlreadySubscribed => write!(f, "connection is already subscribed"),
            RoomError::NotSubscribed => write!(f, "connection is not subscribed"),
            RoomError::Spawn(err) => write!(f, "failed to spawn snakes: {err}"),
            RoomError::Saturated => write!(f, "room is busy"),
            RoomError::RoomClosed => write!(f, "room is closed"),
        }
    }
}

pub(crate) enum RoomCommand {
    Subscribe {
        member: ConnectionHandle,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Unsubscribe {
        connection_id: ConnectionId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Start {
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
    Intent {
        connection_id: ConnectionId,
        intent: MoveIntent,
    },
    Disconnect {
        connection_id: ConnectionId,
    },
    Status {
        reply: oneshot::Sender<RoomStatus>,
    },
    History {
        reply: oneshot::Sender<MatchHistory>,
    },
}

/// Cheap, cloneable handle to a running room task.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    /// Identifier clients use to target this room.
    pub room_id: Arc<str>,
    commands: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| RoomError::RoomClosed)?;
        response.await.map_err(|_| RoomError::RoomClosed)
    }

    pub async fn subscribe(&self, member: ConnectionHandle) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Subscribe { member, reply })
            .await?
    }

    pub async fn unsubscribe(&self, connection_id: ConnectionId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Unsubscribe {
            connection_id,
            reply,
        })
        .await?
    }

    pub async fn start(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Start { reply }).await?
    }

    /// Returns once the room is back to Idle.
    pub async fn reset(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Reset { reply }).await
    }

    pub async fn status(&self) -> Result<RoomStatus, RoomError> {
        self.request(|reply| RoomCommand::Status { reply }).await
    }

    pub async fn history(&self) -> Result<MatchHistory, RoomError> {
        self.request(|reply| RoomCommand::History { reply }).await
    }

    /// Queues a move without waiting. Rejections are delivered to the member's outbox.
    pub fn submit_intent(
        &self,
        connection_id: ConnectionId,
        intent: MoveIntent,
    ) -> Result<(), RoomError> {
        match self.commands.try_send(RoomCommand::Intent {
            connection_id,
            intent,
        }) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => Err(RoomError::Saturated),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(RoomError::RoomClosed),
        }
    }

    pub async fn disconnect(&self, connection_id: ConnectionId) {
        if self
            .commands
            .send(RoomCommand::Disconnect { connection_id })
            .await
            .is_err()
        {
            debug!(connection_id, "room already closed during disconnect");
        }
    }
}

/// Spawns the room task and returns its handle.
pub fn spawn_room(room_id: Arc<str>, config: RoomConfig, command_capacity: usize) -> RoomHandle {
    let (commands, inbox) = mpsc::channel(command_capacity);
    let span = info_span!("room", room_id = %room_id);
    tokio::spawn(room_task(room_id.clone(), config, inbox).instrument(span));
    RoomHandle { room_id, commands }
}

struct Member {
    handle: ConnectionHandle,
    snake_id: Option<SnakeId>,
    backlog: VecDeque<MoveIntent>,
}

struct Match {
    world: World,
    rng: StdRng,
    seed: u64,
    // Snakes at tick 0; decides when the match is over.
    contenders: usize,
    players: Vec<PlayerEntry>,
    history: Vec<Arc<TurnRecord>>,
    latest: Arc<TurnRecord>,
    // Deaths between ticks (leaving, disconnecting), reported with the next record.
    pending: Vec<TickEvent>,
    final_scores: Option<Arc<BTreeMap<SnakeId, u32>>>,
}

impl Match {
    fn new(world: World, rng: StdRng, seed: u64, players: Vec<PlayerEntry>) -> Self {
        let latest = Arc::new(world.record(Vec::new()));
        Self {
            contenders: world.snakes.len(),
            world,
            rng,
            seed,
            players,
            history: vec![latest.clone()],
            latest,
            pending: Vec::new(),
            final_scores: None,
        }
    }

    fn is_over(&self) -> bool {
        let living = self.world.living();
        living == 0 || (self.contenders >= 2 && living <= 1)
    }

    fn standing(&self, snake_id: Option<SnakeId>) -> Standing {
        match snake_id.and_then(|id| self.world.snake(id)) {
            Some(snake) if snake.is_alive() => Standing::Alive {
                score: snake.score(),
            },
            Some(snake) => Standing::Dead {
                score: snake.score(),
            },
            None => Standing::Spectator,
        }
    }

    /// Closes out deaths that ended the match between ticks. The record keeps
    /// the current tick index since no step ran.
    fn flush_pending(&mut self) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        let events = std::mem::take(&mut self.pending);
        self.latest = Arc::new(self.world.record(events));
        self.history.push(self.latest.clone());
        true
    }

    fn remove_snake(&mut self, snake_id: SnakeId, cause: DeathCause) {
        if self.world.kill(snake_id) {
            info!(snake_id, ?cause, "snake removed between ticks");
            self.pending.push(TickEvent {
                snake_id,
                kind: EventKind::Died { cause },
            });
        }
    }
}

enum Phase {
    Idle,
    Running(Match),
    Finished(Match),
}

enum Flow {
    Continue,
    Halt,
}

struct Room {
    room_id: Arc<str>,
    config: RoomConfig,
    members: Vec<Member>,
    phase: Phase,
    fallback: Box<dyn MovePolicy>,
}

pub(crate) async fn room_task(
    room_id: Arc<str>,
    config: RoomConfig,
    mut commands: mpsc::Receiver<RoomCommand>,
) {
    let mut room = Room {
        room_id,
        config,
        members: Vec::new(),
        phase: Phase::Idle,
        fallback: Box::new(HoldCourse),
    };
    info!(name = %room.config.name, "room ready");

    loop {
        let flow = if room.is_running() {
            room.play_tick(&mut commands).await
        } else {
            match commands.recv().await {
                Some(command) => {
                    room.handle(command);
                    Flow::Continue
                }
                None => Flow::Halt,
            }
        };
        if let Flow::Halt = flow {
            break;
        }
    }

    info!("room task exiting");
}

impl Room {
    fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running(_))
    }

    fn state(&self) -> RoomState {
        match self.phase {
            Phase::Idle => RoomState::Idle,
            Phase::Running(_) => RoomState::Running,
            Phase::Finished(_) => RoomState::Finished,
        }
    }

    fn current_match(&self) -> Option<&Match> {
        match &self.phase {
            Phase::Running(game) | Phase::Finished(game) => Some(game),
            Phase::Idle => None,
        }
    }

    fn member_index(&self, connection_id: ConnectionId) -> Option<usize> {
        self.members
            .iter()
            .position(|member| member.handle.connection_id == connection_id)
    }

    fn handle(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Subscribe { member, reply } => {
                let _ = reply.send(self.subscribe(member));
            }
            RoomCommand::Unsubscribe {
                connection_id,
                reply,
            } => {
                let _ = reply.send(self.leave(connection_id, DeathCause::Forfeit));
            }
            RoomCommand::Start { reply } => {
                let _ = reply.send(self.start());
            }
            RoomCommand::Reset { reply } => {
                self.reset();
                let _ = reply.send(());
            }
            RoomCommand::Intent {
                connection_id,
                intent,
            } => self.accept_intent(connection_id, intent),
            RoomCommand::Disconnect { connection_id } => {
                if self.leave(connection_id, DeathCause::Disconnected).is_ok() {
                    info!(connection_id, "member disconnected");
                }
            }
            RoomCommand::Status { reply } => {
                let _ = reply.send(self.status());
            }
            RoomCommand::History { reply } => {
                let _ = reply.send(self.history());
            }
        }
    }

    /// Collects one intent per living snake (or waits out the deadline), then steps.
    async fn play_tick(&mut self, commands: &mut mpsc::Receiver<RoomCommand>) -> Flow {
        let deadline = self
            .config
            .tick_timeout
            .map(|timeout| Instant::now() + timeout);

        while self.is_running() && !self.match_over() && !self.intents_ready() {
            let next = match deadline {
                Some(deadline) => match timeout_at(deadline, commands.recv()).await {
                    Ok(next) => next,
                    Err(_) => break,
                },
                None => commands.recv().await,
            };
            let Some(command) = next else {
                return Flow::Halt;
            };
            self.handle(command);
        }

        // Reset may have ended the match mid-collection.
        if !self.is_running() {
            return Flow::Continue;
        }
        self.resolve_tick()
    }

    fn intents_ready(&self) -> bool {
        let Phase::Running(game) = &self.phase else {
            return true;
        };
        self.members.iter().all(|member| match member.snake_id {
            Some(snake_id) if game.world.is_alive(snake_id) => !member.backlog.is_empty(),
            _ => true,
        })
    }

    fn resolve_tick(&mut self) -> Flow {
        if self.match_over() {
            let flushed = match &mut self.phase {
                Phase::Running(game) => game.flush_pending(),
                _ => false,
            };
            if flushed {
                self.broadcast_tick();
            }
            self.finish();
            return Flow::Continue;
        }

        if let Err(err) = self.advance() {
            error!(error = %err, "simulation step failed; closing room");
            for member in &self.members {
                member.handle.outbox.push(Notice::Error {
                    msg: "room closed after an internal error".to_string(),
                });
            }
            return Flow::Halt;
        }

        self.broadcast_tick();
        if self.match_over() {
            self.finish();
        }
        Flow::Continue
    }

    fn match_over(&self) -> bool {
        matches!(&self.phase, Phase::Running(game) if game.is_over())
    }

    fn advance(&mut self) -> Result<(), SimError> {
        let Phase::Running(game) = &mut self.phase else {
            return Ok(());
        };

        let mut intents = BTreeMap::new();
        for member in &mut self.members {
            let Some(snake_id) = member.snake_id else {
                continue;
            };
            if !game.world.is_alive(snake_id) {
                continue;
            }
            let intent = match member.backlog.pop_front() {
                Some(intent) => intent,
                None => {
                    debug!(snake_id, tick = game.world.tick, "intent missing at deadline");
                    self.fallback.choose(snake_id, &game.latest)
                }
            };
            intents.insert(snake_id, intent);
        }

        let outcome = step(&game.world, &intents, &self.config.tuning, &mut game.rng)?;

        let mut events = std::mem::take(&mut game.pending);
        events.extend(outcome.events);
        for event in &events {
            if let EventKind::Died { cause } = event.kind {
                info!(snake_id = event.snake_id, tick = outcome.world.tick, ?cause, "snake died");
            }
        }

        game.world = outcome.world;
        game.latest = Arc::new(game.world.record(events));
        game.history.push(game.latest.clone());
        Ok(())
    }

    fn broadcast_tick(&self) {
        let Some(game) = self.current_match() else {
            return;
        };
        for member in &self.members {
            member.handle.outbox.push(Notice::Tick {
                record: game.latest.clone(),
                standing: game.standing(member.snake_id),
            });
        }
    }

    fn finish(&mut self) {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Running(mut game) => {
                let scores = Arc::new(game.world.scores());
                info!(tick = game.world.tick, ?scores, "match finished");
                for member in &self.members {
                    member.handle.outbox.push(Notice::Done {
                        scores: scores.clone(),
                    });
                }
                game.final_scores = Some(scores);
                self.phase = Phase::Finished(game);
            }
            other => self.phase = other,
        }
    }

    fn subscribe(&mut self, handle: ConnectionHandle) -> Result<(), RoomError> {
        if self.member_index(handle.connection_id).is_some() {
            return Err(RoomError::AlreadySubscribed);
        }
        if handle.outbox.is_closed() {
            // The connection went away while the subscribe was in flight.
            return Err(RoomError::NotSubscribed);
        }

        handle.outbox.push(Notice::Subscribed {
            room_id: self.room_id.clone(),
        });
        if let Some(game) = self.current_match() {
            handle.outbox.push(Notice::Tick {
                record: game.latest.clone(),
                standing: Standing::Spectator,
            });
            if let Some(scores) = &game.final_scores {
                handle.outbox.push(Notice::Done {
                    scores: scores.clone(),
                });
            }
        }

        info!(connection_id = handle.connection_id, name = %handle.name, "member subscribed");
        self.members.push(Member {
            handle,
            snake_id: None,
            backlog: VecDeque::new(),
        });
        Ok(())
    }

    fn leave(&mut self, connection_id: ConnectionId, cause: DeathCause) -> Result<(), RoomError> {
        let index = self
            .member_index(connection_id)
            .ok_or(RoomError::NotSubscribed)?;
        let member = self.members.remove(index);

        if let (Some(snake_id), Phase::Running(game)) = (member.snake_id, &mut self.phase) {
            game.remove_snake(snake_id, cause);
        }
        member.handle.outbox.push(Notice::Unsubscribed);
        Ok(())
    }

    fn start(&mut self) -> Result<(), RoomError> {
        if !matches!(self.phase, Phase::Idle) {
            return Err(RoomError::NotIdle);
        }
        if self.members.is_empty() {
            return Err(RoomError::EmptyRoom);
        }

        let seed = self.config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let snake_ids: Vec<SnakeId> = (0..self.members.len()).collect();
        let world = spawn_world(
            &self.config.layout,
            &snake_ids,
            &self.config.tuning,
            &mut rng,
        )
        .map_err(RoomError::Spawn)?;

        let mut players = Vec::with_capacity(self.members.len());
        for (member, snake_id) in self.members.iter_mut().zip(snake_ids) {
            member.snake_id = Some(snake_id);
            member.backlog.clear();
            member.handle.outbox.push(Notice::Start { snake_id });
            players.push(PlayerEntry {
                snake_id,
                connection_id: member.handle.connection_id,
                name: member.handle.name.to_string(),
            });
        }

        info!(seed, players = players.len(), "match started");
        self.phase = Phase::Running(Match::new(world, rng, seed, players));
        self.broadcast_tick();
        Ok(())
    }

    fn reset(&mut self) {
        if matches!(self.phase, Phase::Idle) {
            return;
        }
        self.phase = Phase::Idle;
        for member in &mut self.members {
            member.snake_id = None;
            member.backlog.clear();
            member.handle.outbox.push(Notice::Reset);
        }
        info!(members = self.members.len(), "room reset");
    }

    fn accept_intent(&mut self, connection_id: ConnectionId, intent: MoveIntent) {
        let Some(index) = self.member_index(connection_id) else {
            warn!(connection_id, "intent from a connection outside the room");
            return;
        };
        let member = &mut self.members[index];

        let verdict = match (&self.phase, member.snake_id) {
            (Phase::Running(game), Some(snake_id)) => {
                if !game.world.is_alive(snake_id) {
                    Err(MoveRejection::Dead)
                } else if member.backlog.len() >= MAX_BACKLOG {
                    Err(MoveRejection::Backlogged)
                } else {
                    member.backlog.push_back(intent);
                    Ok(())
                }
            }
            (Phase::Running(_), None) => Err(MoveRejection::Spectator),
            (Phase::Idle | Phase::Finished(_), _) => Err(MoveRejection::NotRunning),
        };

        if let Err(rejection) = verdict {
            member.handle.outbox.push(Notice::Rejected(rejection));
        }
    }

    fn status(&self) -> RoomStatus {
        let game = self.current_match();
        let members = self
            .members
            .iter()
            .map(|member| {
                let snake = member
                    .snake_id
                    .and_then(|id| game.and_then(|game| game.world.snake(id)));
                MemberStatus {
                    connection_id: member.handle.connection_id,
                    name: member.handle.name.to_string(),
                    snake_id: member.snake_id,
                    alive: snake.map(Snake::is_alive),
                    score: snake.map(Snake::score),
                }
            })
            .collect();

        RoomStatus {
            room_id: self.room_id.to_string(),
            name: self.config.name.clone(),
            description: self.config.description.clone(),
            state: self.state(),
            width: self.config.layout.width(),
            height: self.config.layout.height(),
            tick: game.map(|game| game.world.tick),
            members,
        }
    }

    fn history(&self) -> MatchHistory {
        let game = self.current_match();
        MatchHistory {
            room_id: self.room_id.to_string(),
            name: self.config.name.clone(),
            state: self.state(),
            seed: game.map(|game| game.seed),
            players: game.map(|game| game.players.clone()).unwrap_or_default(),
            turns: game.map(|game| game.history.clone()).unwrap_or_default(),
            final_scores: game.and_then(|game| game.final_scores.as_deref().cloned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Cell, Layout, SimTuning};
    use crate::use_cases::outbox::Outbox;
    use std::time::Duration;

    // Four east-facing spawn lanes on an open 8x8 grid.
    fn lanes() -> RoomConfig {
        let layout = Layout::from_ascii(&[
            "E.......",
            "........",
            "........",
            "E.......",
            "........",
            "E.......",
            "........",
            "E.......",
        ])
        .unwrap();
        let mut config = RoomConfig::new("lanes", layout);
        config.tuning = SimTuning {
            initial_length: 1,
            doodah_count: 0,
            doodah_reward: 1,
        };
        config.seed = Some(7);
        config
    }

    fn member(connection_id: ConnectionId) -> ConnectionHandle {
        ConnectionHandle {
            connection_id,
            name: Arc::from(format!("player-{connection_id}")),
            outbox: Outbox::new(64),
        }
    }

    async fn room_with(config: RoomConfig, count: u64) -> (RoomHandle, Vec<ConnectionHandle>) {
        let room = spawn_room(Arc::from("room-test"), config, 64);
        let mut members = Vec::new();
        for connection_id in 1..=count {
            let handle = member(connection_id);
            room.subscribe(handle.clone()).await.unwrap();
            members.push(handle);
        }
        (room, members)
    }

    async fn next_notice(member: &ConnectionHandle) -> Notice {
        tokio::time::timeout(Duration::from_secs(5), member.outbox.recv())
            .await
            .expect("notice should arrive")
            .expect("outbox should be open")
    }

    async fn wait_for_tick(member: &ConnectionHandle, tick: u64) -> (Arc<TurnRecord>, Standing) {
        loop {
            if let Notice::Tick { record, standing } = next_notice(member).await {
                if record.tick == tick {
                    return (record, standing);
                }
            }
        }
    }

    async fn wait_for_rejection(member: &ConnectionHandle) -> MoveRejection {
        loop {
            if let Notice::Rejected(rejection) = next_notice(member).await {
                return rejection;
            }
        }
    }

    async fn wait_for_done(member: &ConnectionHandle) -> Arc<BTreeMap<SnakeId, u32>> {
        loop {
            if let Notice::Done { scores } = next_notice(member).await {
                return scores;
            }
        }
    }

    fn move_all(room: &RoomHandle, members: &[ConnectionHandle], intent: MoveIntent) {
        for member in members {
            room.submit_intent(member.connection_id, intent).unwrap();
        }
    }

    #[tokio::test]
    async fn when_room_has_no_members_then_start_fails_with_empty_room() {
        let (room, _) = room_with(lanes(), 0).await;

        assert_eq!(room.start().await, Err(RoomError::EmptyRoom));
        assert_eq!(room.status().await.unwrap().state, RoomState::Idle);
    }

    #[tokio::test]
    async fn when_snakes_cannot_fit_then_start_fails_and_the_room_stays_open() {
        let mut config = lanes();
        config.tuning.initial_length = usize::MAX;
        let (room, _) = room_with(config, 2).await;

        assert_eq!(
            room.start().await,
            Err(RoomError::Spawn(SimError::NoSpawnRoom { snake_id: 0 }))
        );
        assert_eq!(room.status().await.unwrap().state, RoomState::Idle);
    }

    #[tokio::test]
    async fn when_started_then_members_get_their_snake_and_tick_zero() {
        let (room, members) = room_with(lanes(), 2).await;

        room.start().await.unwrap();

        for (expected_id, member) in members.iter().enumerate() {
            assert!(matches!(next_notice(member).await, Notice::Subscribed { .. }));
            match next_notice(member).await {
                Notice::Start { snake_id } => assert_eq!(snake_id, expected_id),
                other => panic!("unexpected notice: {other:?}"),
            }
            let (record, standing) = wait_for_tick(member, 0).await;
            assert_eq!(standing, Standing::Alive { score: 0 });
            assert_eq!(record.snakes.len(), 2);
        }
        assert_eq!(room.start().await, Err(RoomError::NotIdle));
    }

    #[tokio::test]
    async fn when_every_living_snake_has_moved_then_the_tick_resolves() {
        let (room, members) = room_with(lanes(), 2).await;
        room.start().await.unwrap();

        move_all(&room, &members, MoveIntent::Forward);
        let (record, _) = wait_for_tick(&members[0], 1).await;

        assert_eq!(
            record.map.cell_at(Cell::new(1, 0)).unwrap().occupant(),
            Some(0)
        );
        let history = room.history().await.unwrap();
        assert_eq!(history.turns.len(), 2);
        assert_eq!(history.players[1].connection_id, 2);
        assert_eq!(history.seed, Some(7));
    }

    #[tokio::test]
    async fn when_moves_arrive_early_then_they_queue_for_later_ticks() {
        let (room, members) = room_with(lanes(), 2).await;
        room.start().await.unwrap();

        room.submit_intent(1, MoveIntent::Left).unwrap();
        room.submit_intent(1, MoveIntent::Right).unwrap();
        room.submit_intent(2, MoveIntent::Forward).unwrap();
        wait_for_tick(&members[0], 1).await;
        room.submit_intent(2, MoveIntent::Forward).unwrap();
        let (record, _) = wait_for_tick(&members[0], 2).await;

        // Left then Right: one step North, then back to heading East.
        assert_eq!(
            record.map.cell_at(Cell::new(1, 1)).unwrap(),
            crate::domain::Tile::SnakeHead {
                id: 0,
                dir: crate::domain::Heading::East
            }
        );
    }

    #[tokio::test]
    async fn when_the_backlog_is_full_then_extra_moves_are_rejected() {
        let (room, members) = room_with(lanes(), 2).await;
        room.start().await.unwrap();

        for _ in 0..=MAX_BACKLOG + 1 {
            room.submit_intent(1, MoveIntent::Forward).unwrap();
        }

        assert_eq!(
            wait_for_rejection(&members[0]).await,
            MoveRejection::Backlogged
        );
    }

    #[tokio::test]
    async fn when_a_snake_is_dead_then_its_moves_are_rejected() {
        let (room, members) = room_with(lanes(), 3).await;
        room.start().await.unwrap();

        // Snake 0 sits on the bottom row; turning right leaves the grid.
        room.submit_intent(1, MoveIntent::Right).unwrap();
        room.submit_intent(2, MoveIntent::Forward).unwrap();
        room.submit_intent(3, MoveIntent::Forward).unwrap();
        let (_, standing) = wait_for_tick(&members[0], 1).await;
        assert_eq!(standing, Standing::Dead { score: 0 });

        room.submit_intent(1, MoveIntent::Forward).unwrap();
        assert_eq!(wait_for_rejection(&members[0]).await, MoveRejection::Dead);
        assert_eq!(room.status().await.unwrap().state, RoomState::Running);
    }

    #[tokio::test]
    async fn when_one_snake_is_left_then_the_room_finishes_with_scores() {
        let (room, members) = room_with(lanes(), 2).await;
        room.start().await.unwrap();

        room.submit_intent(1, MoveIntent::Right).unwrap();
        room.submit_intent(2, MoveIntent::Forward).unwrap();
        let scores = wait_for_done(&members[1]).await;

        assert_eq!(scores.len(), 2);
        let history = room.history().await.unwrap();
        assert_eq!(history.state, RoomState::Finished);
        assert_eq!(history.turns.len(), 2);
        assert_eq!(history.final_scores.as_ref(), Some(scores.as_ref()));

        room.submit_intent(2, MoveIntent::Forward).unwrap();
        assert_eq!(
            wait_for_rejection(&members[1]).await,
            MoveRejection::NotRunning
        );
    }

    #[tokio::test]
    async fn when_a_lone_snake_dies_then_the_room_finishes() {
        let (room, members) = room_with(lanes(), 1).await;
        room.start().await.unwrap();

        room.submit_intent(1, MoveIntent::Forward).unwrap();
        wait_for_tick(&members[0], 1).await;
        assert_eq!(room.status().await.unwrap().state, RoomState::Running);

        room.submit_intent(1, MoveIntent::Right).unwrap();
        wait_for_done(&members[0]).await;
        assert_eq!(room.status().await.unwrap().state, RoomState::Finished);
    }

    #[tokio::test]
    async fn when_a_member_disconnects_mid_tick_then_the_tick_resolves_without_them() {
        let (room, members) = room_with(lanes(), 4).await;
        room.start().await.unwrap();

        move_all(&room, &members[..3], MoveIntent::Forward);
        room.disconnect(4).await;
        let (record, _) = wait_for_tick(&members[0], 1).await;

        assert_eq!(record.snakes.iter().filter(|snake| snake.alive).count(), 3);
        assert!(record.events.contains(&TickEvent {
            snake_id: 3,
            kind: EventKind::Died {
                cause: DeathCause::Disconnected
            },
        }));
        let status = room.status().await.unwrap();
        assert_eq!(status.members.len(), 3);
        assert_eq!(status.state, RoomState::Running);
    }

    #[tokio::test]
    async fn when_a_disconnect_leaves_one_snake_then_the_death_is_recorded_before_done() {
        let (room, members) = room_with(lanes(), 2).await;
        room.start().await.unwrap();
        wait_for_tick(&members[0], 0).await;

        room.disconnect(2).await;
        let (record, standing) = wait_for_tick(&members[0], 0).await;
        assert_eq!(standing, Standing::Alive { score: 0 });
        assert!(!record.snakes[1].alive);
        wait_for_done(&members[0]).await;

        let history = room.history().await.unwrap();
        assert_eq!(history.state, RoomState::Finished);
        assert_eq!(history.turns.len(), 2);
        let last = history.turns.last().unwrap();
        assert!(last.snakes[0].alive);
        assert!(!last.snakes[1].alive);
        assert_eq!(
            last.events,
            vec![TickEvent {
                snake_id: 1,
                kind: EventKind::Died {
                    cause: DeathCause::Disconnected
                },
            }]
        );
    }

    #[tokio::test]
    async fn when_reset_mid_match_then_the_room_is_idle_with_the_same_members() {
        let (room, members) = room_with(lanes(), 2).await;
        room.start().await.unwrap();
        room.submit_intent(1, MoveIntent::Forward).unwrap();

        room.reset().await.unwrap();
        room.reset().await.unwrap();

        let status = room.status().await.unwrap();
        assert_eq!(status.state, RoomState::Idle);
        assert_eq!(status.members.len(), 2);
        assert!(status.members.iter().all(|member| member.snake_id.is_none()));
        assert!(room.history().await.unwrap().turns.is_empty());

        room.start().await.unwrap();
        move_all(&room, &members, MoveIntent::Forward);
        let (record, _) = wait_for_tick(&members[1], 1).await;
        assert_eq!(record.tick, 1);
    }

    #[tokio::test]
    async fn when_subscribing_mid_match_then_the_member_spectates_the_latest_tick() {
        let (room, members) = room_with(lanes(), 2).await;
        room.start().await.unwrap();
        move_all(&room, &members, MoveIntent::Forward);
        wait_for_tick(&members[0], 1).await;

        let spectator = member(9);
        room.subscribe(spectator.clone()).await.unwrap();

        assert!(matches!(next_notice(&spectator).await, Notice::Subscribed { .. }));
        let (record, standing) = wait_for_tick(&spectator, 1).await;
        assert_eq!(standing, Standing::Spectator);
        assert_eq!(record.snakes.len(), 2);

        room.submit_intent(9, MoveIntent::Left).unwrap();
        assert_eq!(
            wait_for_rejection(&spectator).await,
            MoveRejection::Spectator
        );
    }

    #[tokio::test]
    async fn when_subscribing_twice_then_the_second_attempt_fails() {
        let (room, members) = room_with(lanes(), 1).await;

        let err = room.subscribe(members[0].clone()).await.unwrap_err();

        assert_eq!(err, RoomError::AlreadySubscribed);
    }

    #[tokio::test(start_paused = true)]
    async fn when_the_tick_deadline_passes_then_missing_intents_hold_course() {
        let mut config = lanes();
        config.tick_timeout = Some(Duration::from_millis(500));
        let (room, members) = room_with(config, 2).await;
        room.start().await.unwrap();

        room.submit_intent(1, MoveIntent::Left).unwrap();
        let (record, _) = wait_for_tick(&members[0], 1).await;

        // Snake 1 started at (0, 3) heading East and kept going.
        assert_eq!(record.map.cell_at(Cell::new(1, 3)).unwrap().occupant(), Some(1));
        assert_eq!(record.map.cell_at(Cell::new(0, 1)).unwrap().occupant(), Some(0));
    }
}
