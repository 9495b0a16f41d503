//! Client-side mirror of the arena
//!
//! `Cockpit` is what a browser tab keeps in memory: the local jet, smoothed
//! remote jets, obstacles, coins and every live projectile. Server messages
//! are folded in with [`Cockpit::apply`]; [`Cockpit::tick`] runs one
//! rendered frame and returns the reports to send back.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use glam::{Quat, Vec3};
use tracing::debug;
use uuid::Uuid;

use super::collision::{coins_in_reach, crash_check, Aabb};
use super::interp::RemoteJet;
use super::model::{ControlInput, FlightModel};
use super::ordnance::{Bullet, Contact, Flare, Impact, Missile};
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, LeaderboardEntry, PlayerRecord, ServerMsg, WireVec3};

/// How long the winner banner stays up
pub const BANNER_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JetStatus {
    /// Not in the arena yet
    Waiting,
    Flying,
    /// Crash sent, waiting for the death notice
    CrashReported,
    /// Between `you_died` and `respawn`
    Down,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub winner: String,
    pub until: Instant,
}

#[derive(Debug)]
pub struct Cockpit {
    my_id: Option<Uuid>,
    jet: Option<FlightModel>,
    status: JetStatus,
    health: i32,
    remotes: HashMap<Uuid, RemoteJet>,
    obstacles: Vec<Aabb>,
    coins: HashMap<String, Vec3>,
    bullets: Vec<Bullet>,
    missiles: Vec<Missile>,
    flares: Vec<Flare>,
    leaderboard: Vec<LeaderboardEntry>,
    banner: Option<Banner>,
    last_rtt_ms: Option<u64>,
}

impl Default for Cockpit {
    fn default() -> Self {
        Self::new()
    }
}

impl Cockpit {
    pub fn new() -> Self {
        Self {
            my_id: None,
            jet: None,
            status: JetStatus::Waiting,
            health: 0,
            remotes: HashMap::new(),
            obstacles: Vec::new(),
            coins: HashMap::new(),
            bullets: Vec::new(),
            missiles: Vec::new(),
            flares: Vec::new(),
            leaderboard: Vec::new(),
            banner: None,
            last_rtt_ms: None,
        }
    }

    pub fn my_id(&self) -> Option<Uuid> {
        self.my_id
    }

    pub fn jet(&self) -> Option<&FlightModel> {
        self.jet.as_ref()
    }

    pub fn status(&self) -> JetStatus {
        self.status
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn remotes(&self) -> &HashMap<Uuid, RemoteJet> {
        &self.remotes
    }

    pub fn coins(&self) -> &HashMap<String, Vec3> {
        &self.coins
    }

    pub fn obstacle_count(&self) -> usize {
        self.obstacles.len()
    }

    /// Live (bullets, missiles, flares)
    pub fn ordnance_counts(&self) -> (usize, usize, usize) {
        (self.bullets.len(), self.missiles.len(), self.flares.len())
    }

    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.leaderboard
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn last_rtt_ms(&self) -> Option<u64> {
        self.last_rtt_ms
    }

    fn is_me(&self, id: Uuid) -> bool {
        self.my_id == Some(id)
    }

    /// Place the local jet at a record's transform with full health
    fn board(&mut self, record: &PlayerRecord) {
        let mut jet = FlightModel::spawn(record.position());
        jet.orientation = Quat::from(record.quaternion).normalize();
        self.jet = Some(jet);
        self.health = record.health;
        self.status = JetStatus::Flying;
    }

    fn upsert_remote(&mut self, record: &PlayerRecord) {
        self.remotes
            .entry(record.id)
            .and_modify(|jet| jet.snap(record))
            .or_insert_with(|| RemoteJet::from_record(record));
    }

    /// Fold one server message into the mirror
    pub fn apply(&mut self, msg: ServerMsg, now: Instant) {
        match msg {
            ServerMsg::Welcome { id, .. } => {
                self.my_id = Some(id);
            }

            ServerMsg::WorldSnapshot {
                players,
                buildings,
                coins,
            } => {
                self.obstacles = buildings.iter().map(Aabb::from_building).collect();
                self.coins = coins
                    .into_iter()
                    .map(|(id, coin)| (id, coin.position()))
                    .collect();
                self.remotes.clear();
                for record in players.values() {
                    if self.is_me(record.id) {
                        self.board(record);
                    } else {
                        self.upsert_remote(record);
                    }
                }
            }

            ServerMsg::NewPlayer { player } => {
                if !self.is_me(player.id) {
                    self.upsert_remote(&player);
                }
            }

            ServerMsg::PlayerMoved { player } => {
                if let Some(jet) = self.remotes.get_mut(&player.id) {
                    jet.observe(&player);
                }
            }

            // Own fire is predicted locally in `tick`; echoes are dropped
            ServerMsg::PlayerShot {
                owner_id,
                position,
                quaternion,
            } => {
                if !self.is_me(owner_id) {
                    self.bullets
                        .push(Bullet::new(owner_id, position.into(), quaternion.into()));
                }
            }

            ServerMsg::MissileFired {
                owner_id,
                position,
                quaternion,
            } => {
                if !self.is_me(owner_id) {
                    self.missiles
                        .push(Missile::new(owner_id, position.into(), quaternion.into()));
                }
            }

            ServerMsg::FlareDeployed { owner_id, position } => {
                if !self.is_me(owner_id) {
                    self.flares.push(Flare::new(owner_id, position.into()));
                }
            }

            ServerMsg::UpdateHealth { id, health } => {
                if self.is_me(id) {
                    self.health = health;
                } else if let Some(jet) = self.remotes.get_mut(&id) {
                    jet.health = health;
                }
            }

            ServerMsg::YouDied => {
                self.status = JetStatus::Down;
                self.health = 0;
            }

            ServerMsg::PlayerDied { id } => {
                if let Some(jet) = self.remotes.get_mut(&id) {
                    jet.visible = false;
                }
            }

            ServerMsg::Respawn { player } => {
                if self.is_me(player.id) {
                    self.board(&player);
                } else {
                    self.upsert_remote(&player);
                }
            }

            ServerMsg::CoinRemoved { id } => {
                self.coins.remove(&id);
            }

            ServerMsg::CoinAdded { coin } => {
                let position = coin.position();
                self.coins.insert(coin.id, position);
            }

            ServerMsg::GameOver { winner } => {
                self.banner = Some(Banner {
                    winner,
                    until: now + BANNER_DURATION,
                });
            }

            ServerMsg::GameReset { players } => {
                for record in &players {
                    if self.is_me(record.id) {
                        self.board(record);
                    } else {
                        self.upsert_remote(record);
                    }
                }
            }

            ServerMsg::CoinsReset { coins } => {
                self.coins = coins
                    .into_iter()
                    .map(|coin| {
                        let position = coin.position();
                        (coin.id, position)
                    })
                    .collect();
            }

            ServerMsg::Leaderboard { entries } => {
                self.leaderboard = entries;
            }

            ServerMsg::PlayerDisconnected { id } => {
                self.remotes.remove(&id);
            }

            ServerMsg::Pong { t } => {
                self.last_rtt_ms = Some(unix_millis().saturating_sub(t));
            }
        }
    }

    /// Jets ordnance can hit this frame: visible remotes plus the local jet
    /// while it is flying
    fn contacts(&self) -> Vec<Contact> {
        let mut contacts: Vec<Contact> = self
            .remotes
            .values()
            .filter(|jet| jet.visible)
            .map(|jet| Contact {
                id: jet.id,
                position: jet.position,
            })
            .collect();

        if let (Some(id), Some(jet), JetStatus::Flying) = (self.my_id, self.jet.as_ref(), self.status) {
            contacts.push(Contact {
                id,
                position: jet.position,
            });
        }
        contacts
    }

    /// Run one rendered frame and return the reports to send
    pub fn tick(&mut self, input: &ControlInput, now: Instant) -> Vec<ClientMsg> {
        let mut out = Vec::new();
        let Some(me) = self.my_id else {
            return out;
        };

        if self.status == JetStatus::Flying {
            if let Some(jet) = self.jet.as_mut() {
                jet.step(input);
                let (position, orientation) = (jet.position, jet.orientation);

                out.push(ClientMsg::Movement {
                    x: position.x,
                    y: position.y,
                    z: position.z,
                    quaternion: orientation.into(),
                });

                if input.fire_gun {
                    self.bullets.push(Bullet::new(me, position, orientation));
                    out.push(ClientMsg::Shoot {
                        position: position.into(),
                        quaternion: orientation.into(),
                    });
                }
                if input.fire_missile {
                    self.missiles.push(Missile::new(me, position, orientation));
                    out.push(ClientMsg::FireMissile {
                        position: position.into(),
                        quaternion: orientation.into(),
                    });
                }
                if input.deploy_flare {
                    self.flares.push(Flare::new(me, position));
                    out.push(ClientMsg::DeployFlare {
                        position: WireVec3::from(position),
                    });
                }

                if let Some(cause) = crash_check(position, &self.obstacles) {
                    debug!(?cause, ?position, "Local jet crashed");
                    self.status = JetStatus::CrashReported;
                    out.push(ClientMsg::Crash);
                } else {
                    for coin_id in coins_in_reach(position, &self.coins) {
                        self.coins.remove(&coin_id);
                        out.push(ClientMsg::CollectCoin { coin_id });
                    }
                }
            }
        }

        for jet in self.remotes.values_mut() {
            jet.step();
        }

        let contacts = self.contacts();
        // A downed pilot's ordnance still flies but no longer scores
        let scoring = self.status == JetStatus::Flying;

        self.bullets.retain_mut(|bullet| match bullet.step(&contacts) {
            Impact::None => true,
            Impact::Jet(target_id) => {
                if scoring && bullet.owner == me {
                    out.push(ClientMsg::BulletHit { target_id });
                }
                false
            }
            _ => false,
        });

        self.flares.retain_mut(|flare| flare.step());

        let flares = &self.flares;
        self.missiles.retain_mut(|missile| match missile.step(flares, &contacts) {
            Impact::None => true,
            Impact::Jet(target_id) => {
                if scoring && missile.owner == me {
                    out.push(ClientMsg::MissileHit { target_id });
                }
                false
            }
            _ => false,
        });

        if self.banner.as_ref().is_some_and(|b| now >= b.until) {
            self.banner = None;
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::protocol::{Building, Coin, WireQuat};

    fn record(id: Uuid, x: f32, y: f32, z: f32) -> PlayerRecord {
        PlayerRecord {
            id,
            name: "Pilot".into(),
            x,
            y,
            z,
            quaternion: WireQuat::IDENTITY,
            health: 100,
            score: 0,
            color: 0x3366ff,
        }
    }

    /// Local jet at (0, 200, 0) heading -Z, one remote straight ahead
    fn seated() -> (Cockpit, Uuid, Uuid) {
        let me = Uuid::new_v4();
        let bandit = Uuid::new_v4();
        let now = Instant::now();
        let mut cockpit = Cockpit::new();
        cockpit.apply(
            ServerMsg::Welcome {
                id: me,
                server_time: 0,
            },
            now,
        );

        let mut players = HashMap::new();
        players.insert(me, record(me, 0.0, 200.0, 0.0));
        players.insert(bandit, record(bandit, 0.0, 200.0, -30.0));
        cockpit.apply(
            ServerMsg::WorldSnapshot {
                players,
                buildings: vec![Building {
                    x: 300.0,
                    z: 300.0,
                    w: 40.0,
                    h: 100.0,
                    d: 40.0,
                }],
                coins: HashMap::new(),
            },
            now,
        );
        (cockpit, me, bandit)
    }

    fn fly(cockpit: &mut Cockpit, input: ControlInput, frames: usize) -> Vec<ClientMsg> {
        let mut sent = Vec::new();
        for _ in 0..frames {
            sent.extend(cockpit.tick(&input, Instant::now()));
        }
        sent
    }

    #[test]
    fn snapshot_seats_the_local_jet() {
        let (cockpit, _, bandit) = seated();
        assert_eq!(cockpit.status(), JetStatus::Flying);
        assert_eq!(cockpit.health(), 100);
        assert_eq!(cockpit.obstacle_count(), 1);
        assert_eq!(cockpit.remotes().len(), 1);
        assert!(cockpit.remotes().contains_key(&bandit));
    }

    #[test]
    fn nothing_is_sent_before_welcome() {
        let mut cockpit = Cockpit::new();
        assert!(cockpit.tick(&ControlInput::default(), Instant::now()).is_empty());
    }

    #[test]
    fn every_frame_reports_movement() {
        let (mut cockpit, _, _) = seated();
        let sent = fly(&mut cockpit, ControlInput::default(), 3);
        assert_eq!(sent.len(), 3);
        match &sent[2] {
            ClientMsg::Movement { z, .. } => assert!((z + 3.0).abs() < 1e-4),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn own_bullet_hit_is_reported() {
        let (mut cockpit, _, bandit) = seated();
        let trigger = ControlInput {
            fire_gun: true,
            ..ControlInput::default()
        };
        let mut sent = cockpit.tick(&trigger, Instant::now());
        assert!(matches!(sent[1], ClientMsg::Shoot { .. }));

        sent.extend(fly(&mut cockpit, ControlInput::default(), 10));
        let hits: Vec<_> = sent
            .iter()
            .filter(|m| matches!(m, ClientMsg::BulletHit { target_id } if *target_id == bandit))
            .collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(cockpit.ordnance_counts().0, 0);
    }

    #[test]
    fn foreign_bullets_are_simulated_but_not_reported() {
        let (mut cockpit, me, bandit) = seated();
        // Bandit fires back toward the local jet
        cockpit.apply(
            ServerMsg::PlayerShot {
                owner_id: bandit,
                position: WireVec3 {
                    x: 0.0,
                    y: 200.0,
                    z: 30.0,
                },
                quaternion: WireQuat::IDENTITY,
            },
            Instant::now(),
        );
        assert_eq!(cockpit.ordnance_counts().0, 1);

        let sent = fly(&mut cockpit, ControlInput::default(), 20);
        assert!(sent
            .iter()
            .all(|m| !matches!(m, ClientMsg::BulletHit { .. })));
        assert_eq!(cockpit.ordnance_counts().0, 0, "bullet should be removed on hit");

        // Echo of our own shot does not spawn a second bullet
        cockpit.apply(
            ServerMsg::PlayerShot {
                owner_id: me,
                position: WireVec3::default(),
                quaternion: WireQuat::IDENTITY,
            },
            Instant::now(),
        );
        assert_eq!(cockpit.ordnance_counts().0, 0);
    }

    #[test]
    fn crash_is_reported_once() {
        let (mut cockpit, _, _) = seated();
        let dive = ControlInput {
            nose_down: true,
            throttle_up: true,
            ..ControlInput::default()
        };
        let sent = fly(&mut cockpit, dive, 600);
        let crashes = sent.iter().filter(|m| matches!(m, ClientMsg::Crash)).count();
        assert_eq!(crashes, 1);
        assert_eq!(cockpit.status(), JetStatus::CrashReported);
        assert!(matches!(sent.last(), Some(ClientMsg::Crash)));
    }

    #[test]
    fn coin_is_collected_and_hidden() {
        let (mut cockpit, _, _) = seated();
        cockpit.apply(
            ServerMsg::CoinAdded {
                coin: Coin {
                    id: "goldcoin01".into(),
                    x: 0.0,
                    y: 200.0,
                    z: -5.0,
                },
            },
            Instant::now(),
        );

        let sent = fly(&mut cockpit, ControlInput::default(), 3);
        let collected: Vec<_> = sent
            .iter()
            .filter_map(|m| match m {
                ClientMsg::CollectCoin { coin_id } => Some(coin_id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(collected, vec!["goldcoin01"]);
        assert!(cockpit.coins().is_empty());

        // Server removal of an already hidden coin is harmless
        cockpit.apply(
            ServerMsg::CoinRemoved {
                id: "goldcoin01".into(),
            },
            Instant::now(),
        );
        assert!(cockpit.coins().is_empty());
    }

    #[test]
    fn death_grounds_the_jet_until_respawn() {
        let (mut cockpit, me, _) = seated();
        cockpit.apply(ServerMsg::YouDied, Instant::now());
        assert_eq!(cockpit.status(), JetStatus::Down);
        assert!(fly(&mut cockpit, ControlInput::default(), 5).is_empty());

        cockpit.apply(
            ServerMsg::Respawn {
                player: record(me, 40.0, 200.0, -40.0),
            },
            Instant::now(),
        );
        assert_eq!(cockpit.status(), JetStatus::Flying);
        assert_eq!(cockpit.health(), 100);
        let jet = cockpit.jet().expect("jet after respawn");
        assert_eq!(jet.orientation, Quat::IDENTITY);
        assert_eq!(jet.position, Vec3::new(40.0, 200.0, -40.0));
    }

    #[test]
    fn dead_remotes_are_hidden_and_not_targetable() {
        let (mut cockpit, _, bandit) = seated();
        cockpit.apply(ServerMsg::PlayerDied { id: bandit }, Instant::now());
        assert!(!cockpit.remotes()[&bandit].visible);

        let trigger = ControlInput {
            fire_gun: true,
            ..ControlInput::default()
        };
        let mut sent = cockpit.tick(&trigger, Instant::now());
        sent.extend(fly(&mut cockpit, ControlInput::default(), 10));
        assert!(sent
            .iter()
            .all(|m| !matches!(m, ClientMsg::BulletHit { .. })));

        cockpit.apply(
            ServerMsg::Respawn {
                player: record(bandit, 100.0, 200.0, 100.0),
            },
            Instant::now(),
        );
        assert!(cockpit.remotes()[&bandit].visible);
    }

    #[test]
    fn remote_motion_is_smoothed() {
        let (mut cockpit, _, bandit) = seated();
        cockpit.apply(
            ServerMsg::PlayerMoved {
                player: record(bandit, 100.0, 200.0, -30.0),
            },
            Instant::now(),
        );
        fly(&mut cockpit, ControlInput::default(), 1);
        assert!((cockpit.remotes()[&bandit].position.x - 20.0).abs() < 1e-3);
    }

    #[test]
    fn game_over_banner_expires() {
        let (mut cockpit, _, _) = seated();
        let start = Instant::now();
        cockpit.apply(
            ServerMsg::GameOver {
                winner: "Ace".into(),
            },
            start,
        );
        cockpit.tick(&ControlInput::default(), start + Duration::from_secs(1));
        assert_eq!(cockpit.banner().map(|b| b.winner.as_str()), Some("Ace"));

        cockpit.tick(&ControlInput::default(), start + BANNER_DURATION);
        assert!(cockpit.banner().is_none());
    }

    #[test]
    fn round_reset_reseats_a_crashed_jet() {
        let (mut cockpit, me, bandit) = seated();
        cockpit.apply(ServerMsg::YouDied, Instant::now());
        cockpit.apply(
            ServerMsg::GameReset {
                players: vec![record(me, 0.0, 200.0, 50.0), record(bandit, 10.0, 200.0, 50.0)],
            },
            Instant::now(),
        );
        assert_eq!(cockpit.status(), JetStatus::Flying);
        assert_eq!(cockpit.health(), 100);
        assert_eq!(cockpit.remotes()[&bandit].position, Vec3::new(10.0, 200.0, 50.0));
    }

    #[test]
    fn downed_pilot_does_not_report_hits() {
        let (mut cockpit, _, bandit) = seated();
        let trigger = ControlInput {
            fire_gun: true,
            ..ControlInput::default()
        };
        cockpit.tick(&trigger, Instant::now());
        cockpit.apply(ServerMsg::YouDied, Instant::now());

        let sent = fly(&mut cockpit, ControlInput::default(), 20);
        assert!(sent.is_empty(), "sent while down: {:?}", sent);
        // The bullet still struck the bandit and was removed
        assert_eq!(cockpit.ordnance_counts().0, 0);
        assert!(cockpit.remotes().contains_key(&bandit));
    }

    #[test]
    fn enemy_missile_homes_onto_local_jet() {
        let (mut cockpit, _, bandit) = seated();
        // Launched behind the local jet, heading -Z on a line 20 units to its right
        cockpit.apply(
            ServerMsg::MissileFired {
                owner_id: bandit,
                position: WireVec3 {
                    x: 20.0,
                    y: 200.0,
                    z: 60.0,
                },
                quaternion: WireQuat::IDENTITY,
            },
            Instant::now(),
        );
        assert_eq!(cockpit.ordnance_counts().1, 1);

        let mut sent = cockpit.tick(&ControlInput::default(), Instant::now());
        let heading = cockpit.missiles[0].orientation * Vec3::NEG_Z;
        assert!(heading.x < 0.0, "missile did not turn toward the local jet: {heading:?}");

        sent.extend(fly(&mut cockpit, ControlInput::default(), 300));
        assert_eq!(cockpit.ordnance_counts().1, 0);
        assert!(sent
            .iter()
            .all(|m| !matches!(m, ClientMsg::MissileHit { .. })));
    }

    #[test]
    fn own_missile_homes_onto_remote() {
        let (mut cockpit, _, bandit) = seated();
        let launch = ControlInput {
            fire_missile: true,
            ..ControlInput::default()
        };
        let mut sent = cockpit.tick(&launch, Instant::now());
        sent.extend(fly(&mut cockpit, ControlInput::default(), 20));
        assert!(sent
            .iter()
            .any(|m| matches!(m, ClientMsg::MissileHit { target_id } if *target_id == bandit)));
        assert_eq!(cockpit.ordnance_counts().1, 0);
    }
}
