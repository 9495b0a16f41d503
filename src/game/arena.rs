//! Arena task - single owner of the authoritative state
//!
//! Every inbound event is handled to completion on the arena task before
//! the next one is read, so the player and coin maps never see interleaved
//! mutations. Delayed transitions (respawn, round reset) are entries in the
//! [`Scheduler`] and run on the same task; they re-check the store before
//! acting because the player may have left in the meantime.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use glam::{Quat, Vec3};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ArenaConfig;
use crate::ws::protocol::{ClientMsg, ServerMsg, WireQuat, WireVec3};

use super::combat::{CombatSystem, FireKind, Weapon};
use super::policy::{self, ActionPolicy, Verdict};
use super::relay::{Audience, SessionRegistry};
use super::scheduler::{Scheduler, Task};
use super::store::{sanitize_name, ArenaState, LifeState};
use super::{ConnId, PlayerInput};

/// Commands accepted by the arena task
#[derive(Debug)]
pub enum ArenaCommand {
    /// A message from a connected session
    Input(PlayerInput),
    /// The session closed
    Disconnect(ConnId),
}

/// Errors surfaced to sessions talking to the arena
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    #[error("arena task has stopped")]
    Closed,
}

/// Counters readable outside the arena task
#[derive(Debug, Default)]
pub struct ArenaStats {
    players: AtomicUsize,
    coins: AtomicUsize,
}

/// Handle to the running arena
#[derive(Clone)]
pub struct ArenaHandle {
    cmd_tx: mpsc::Sender<ArenaCommand>,
    pub sessions: Arc<SessionRegistry>,
    stats: Arc<ArenaStats>,
}

impl ArenaHandle {
    pub async fn submit(&self, cmd: ArenaCommand) -> Result<(), ArenaError> {
        self.cmd_tx.send(cmd).await.map_err(|_| ArenaError::Closed)
    }

    pub fn player_count(&self) -> usize {
        self.stats.players.load(Ordering::Relaxed)
    }

    pub fn coin_count(&self) -> usize {
        self.stats.coins.load(Ordering::Relaxed)
    }

    pub fn connection_count(&self) -> usize {
        self.sessions.len()
    }
}

/// The authoritative arena
pub struct Arena {
    state: ArenaState,
    config: ArenaConfig,
    policy: Box<dyn ActionPolicy>,
    scheduler: Scheduler,
    cmd_rx: mpsc::Receiver<ArenaCommand>,
    sessions: Arc<SessionRegistry>,
    stats: Arc<ArenaStats>,
}

impl Arena {
    /// Create the arena and the handle sessions use to reach it
    pub fn new(config: ArenaConfig, sessions: Arc<SessionRegistry>) -> (Self, ArenaHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(1024);
        let stats = Arc::new(ArenaStats::default());

        let handle = ArenaHandle {
            cmd_tx,
            sessions: sessions.clone(),
            stats: stats.clone(),
        };

        let arena = Self {
            state: ArenaState::new(&config),
            policy: policy::from_config(config.validate_input),
            config,
            scheduler: Scheduler::new(),
            cmd_rx,
            sessions,
            stats,
        };
        arena.publish_stats();

        (arena, handle)
    }

    /// Replace the acceptance policy
    pub fn set_policy(&mut self, policy: Box<dyn ActionPolicy>) {
        self.policy = policy;
    }

    /// Run until every handle is dropped
    pub async fn run(mut self) {
        info!(
            seed = self.config.seed,
            buildings = self.state.buildings().len(),
            coins = self.state.coin_count(),
            "Arena started"
        );

        loop {
            let next_due = self.scheduler.next_due();

            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle(cmd, Instant::now()),
                    None => break,
                },
                _ = wait_until(next_due) => self.run_due(Instant::now()),
            }
        }

        info!("Arena stopped");
    }

    /// Apply one command
    pub fn handle(&mut self, cmd: ArenaCommand, now: Instant) {
        match cmd {
            ArenaCommand::Input(input) => self.handle_input(input.conn_id, input.msg, now),
            ArenaCommand::Disconnect(conn_id) => self.handle_disconnect(conn_id),
        }
        self.publish_stats();
    }

    /// Run every scheduled transition due at `now`
    pub fn run_due(&mut self, now: Instant) {
        for task in self.scheduler.take_due(now) {
            match task {
                Task::Respawn(conn_id) => self.respawn(conn_id),
                Task::GameReset => self.reset_round(),
            }
        }
        self.publish_stats();
    }

    fn handle_input(&mut self, conn_id: ConnId, msg: ClientMsg, now: Instant) {
        match msg {
            ClientMsg::Join { name } => self.handle_join(conn_id, name),
            ClientMsg::Movement {
                x,
                y,
                z,
                quaternion,
            } => self.handle_movement(conn_id, Vec3::new(x, y, z), quaternion),
            ClientMsg::Shoot {
                position,
                quaternion,
            } => self.relay_fire(
                conn_id,
                FireKind::Shot,
                ServerMsg::PlayerShot {
                    owner_id: conn_id,
                    position,
                    quaternion,
                },
            ),
            ClientMsg::FireMissile {
                position,
                quaternion,
            } => self.relay_fire(
                conn_id,
                FireKind::Missile,
                ServerMsg::MissileFired {
                    owner_id: conn_id,
                    position,
                    quaternion,
                },
            ),
            ClientMsg::DeployFlare { position } => self.relay_flare(conn_id, position),
            ClientMsg::BulletHit { target_id } => {
                self.handle_hit(conn_id, target_id, Weapon::Bullet, now)
            }
            ClientMsg::MissileHit { target_id } => {
                self.handle_hit(conn_id, target_id, Weapon::Missile, now)
            }
            ClientMsg::Crash => self.handle_crash(conn_id, now),
            ClientMsg::CollectCoin { coin_id } => self.handle_collect(conn_id, coin_id, now),
            ClientMsg::Ping { t } => self.send(Audience::One(conn_id), ServerMsg::Pong { t }),
        }
    }

    /// Handle an explicit join
    fn handle_join(&mut self, conn_id: ConnId, name: Option<String>) {
        if self.state.contains_player(&conn_id) {
            warn!(conn_id = %conn_id, "Player already joined");
            return;
        }

        let name = sanitize_name(name.as_deref());
        let record = self.state.add_player(conn_id, name).record();

        self.send(
            Audience::One(conn_id),
            ServerMsg::WorldSnapshot {
                players: self.state.player_records(),
                buildings: self.state.buildings().to_vec(),
                coins: self.state.coins().clone(),
            },
        );

        info!(
            conn_id = %conn_id,
            name = %record.name,
            player_count = self.state.player_count(),
            "Player joined arena"
        );

        self.send(Audience::AllExcept(conn_id), ServerMsg::NewPlayer { player: record });
        self.broadcast_leaderboard();
    }

    /// Take the reported transform verbatim and pass it on
    fn handle_movement(&mut self, conn_id: ConnId, position: Vec3, quaternion: WireQuat) {
        let Some(player) = self.state.player_mut(&conn_id) else {
            return;
        };
        if !player.is_alive() {
            return;
        }

        let orientation = Quat::from(quaternion);
        if let Verdict::Reject(reason) = self.policy.movement(player, position, orientation) {
            debug!(conn_id = %conn_id, reason, "Movement rejected");
            return;
        }

        player.position = position;
        player.orientation = orientation;
        let record = player.record();

        self.send(Audience::AllExcept(conn_id), ServerMsg::PlayerMoved { player: record });
    }

    fn relay_fire(&mut self, conn_id: ConnId, kind: FireKind, msg: ServerMsg) {
        if !self.state.contains_player(&conn_id) {
            return;
        }
        let audience = CombatSystem::fire_audience(kind, conn_id, &self.config.relay);
        self.send(audience, msg);
    }

    fn relay_flare(&mut self, conn_id: ConnId, position: WireVec3) {
        self.relay_fire(
            conn_id,
            FireKind::Flare,
            ServerMsg::FlareDeployed {
                owner_id: conn_id,
                position,
            },
        );
    }

    /// Apply a client-confirmed hit to its target
    fn handle_hit(&mut self, shooter: ConnId, target_id: ConnId, weapon: Weapon, now: Instant) {
        // Shooter must be joined and still alive
        if !self.state.player(&shooter).is_some_and(|p| p.is_alive()) {
            return;
        }
        let Some(target) = self.state.player_mut(&target_id) else {
            return;
        };
        if !target.is_alive() {
            return;
        }
        if let Verdict::Reject(reason) = self.policy.hit(shooter, target, weapon) {
            debug!(shooter = %shooter, target = %target_id, reason, "Hit rejected");
            return;
        }

        let (health, dead) = CombatSystem::apply_damage(target.health, weapon.damage());
        target.health = health;

        self.send(
            Audience::All,
            ServerMsg::UpdateHealth {
                id: target_id,
                health,
            },
        );

        if dead {
            info!(shooter = %shooter, target = %target_id, ?weapon, "Player shot down");
            self.begin_dying(target_id, now);
        }
    }

    /// Self-reported crash; trusted unless the policy objects
    fn handle_crash(&mut self, conn_id: ConnId, now: Instant) {
        let Some(player) = self.state.player(&conn_id) else {
            return;
        };
        if !player.is_alive() {
            return;
        }
        if let Verdict::Reject(reason) = self.policy.crash(player) {
            debug!(conn_id = %conn_id, reason, "Crash rejected");
            return;
        }

        info!(conn_id = %conn_id, "Player crashed");
        self.begin_dying(conn_id, now);
    }

    fn handle_collect(&mut self, conn_id: ConnId, coin_id: String, now: Instant) {
        if self.state.reset_pending() {
            return;
        }
        let Some(player) = self.state.player(&conn_id) else {
            return;
        };
        let Some(coin) = self.state.coins().get(&coin_id) else {
            debug!(conn_id = %conn_id, coin_id = %coin_id, "Coin already collected");
            return;
        };
        if let Verdict::Reject(reason) = self.policy.collect(player, coin.position()) {
            debug!(conn_id = %conn_id, coin_id = %coin_id, reason, "Collection rejected");
            return;
        }

        self.state.take_coin(&coin_id);
        let coin_value = self.config.coin_value;
        let Some(player) = self.state.player_mut(&conn_id) else {
            return;
        };
        player.score = player.score.saturating_add(coin_value);
        let score = player.score;
        let name = player.name.clone();

        self.send(Audience::All, ServerMsg::CoinRemoved { id: coin_id });
        self.broadcast_leaderboard();

        if score >= self.config.win_score {
            self.begin_game_over(name, now);
        } else {
            let coin = self.state.spawn_coin();
            self.send(Audience::All, ServerMsg::CoinAdded { coin });
        }
    }

    fn handle_disconnect(&mut self, conn_id: ConnId) {
        self.scheduler.cancel(Task::Respawn(conn_id));

        if self.state.remove_player(&conn_id).is_some() {
            self.send(Audience::All, ServerMsg::PlayerDisconnected { id: conn_id });
            self.broadcast_leaderboard();
            info!(
                conn_id = %conn_id,
                player_count = self.state.player_count(),
                "Player left arena"
            );
        }
    }

    /// Alive -> Dying, with the respawn scheduled
    fn begin_dying(&mut self, conn_id: ConnId, now: Instant) {
        let Some(player) = self.state.player_mut(&conn_id) else {
            return;
        };
        player.life = LifeState::Dying;
        player.health = player.health.max(0);

        self.send(Audience::One(conn_id), ServerMsg::YouDied);
        self.send(Audience::All, ServerMsg::PlayerDied { id: conn_id });
        self.scheduler
            .schedule(now + self.config.respawn_delay, Task::Respawn(conn_id));
    }

    fn respawn(&mut self, conn_id: ConnId) {
        let dying = self
            .state
            .player(&conn_id)
            .map(|p| p.life == LifeState::Dying)
            .unwrap_or(false);
        if !dying {
            debug!(conn_id = %conn_id, "Respawn skipped");
            return;
        }

        if let Some(record) = self.state.respawn(&conn_id) {
            info!(conn_id = %conn_id, "Player respawned");
            self.send(Audience::All, ServerMsg::Respawn { player: record });
        }
    }

    /// Announce the winner once and schedule the round reset
    fn begin_game_over(&mut self, winner: String, now: Instant) {
        if self.state.reset_pending() {
            return;
        }
        self.state.set_reset_pending(true);

        info!(winner = %winner, "Round won");
        self.send(Audience::All, ServerMsg::GameOver { winner });
        self.scheduler
            .schedule(now + self.config.reset_delay, Task::GameReset);
    }

    fn reset_round(&mut self) {
        let cancelled = self.scheduler.cancel_respawns();

        let players = self.state.reset_players();
        self.send(Audience::All, ServerMsg::GameReset { players });

        let coins = self.state.reset_coins();
        self.send(Audience::All, ServerMsg::CoinsReset { coins });

        self.state.set_reset_pending(false);
        self.broadcast_leaderboard();

        info!(
            players = self.state.player_count(),
            cancelled_respawns = cancelled,
            "Round reset"
        );
    }

    fn broadcast_leaderboard(&self) {
        self.send(
            Audience::All,
            ServerMsg::Leaderboard {
                entries: self.state.leaderboard(),
            },
        );
    }

    fn send(&self, audience: Audience, msg: ServerMsg) {
        self.sessions.deliver(audience, msg);
    }

    fn publish_stats(&self) {
        self.stats
            .players
            .store(self.state.player_count(), Ordering::Relaxed);
        self.stats
            .coins
            .store(self.state.coin_count(), Ordering::Relaxed);
    }
}

/// Sleep until the deadline, or forever when nothing is scheduled
async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
