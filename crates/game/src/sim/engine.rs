use std::collections::HashMap;

use glam::Vec2;

use crate::config::MatchConfig;
use crate::error::GameError;
use crate::net::{Command, CommandKind, quantize};
use crate::view::EntityView;

use super::collision::resolve_collisions;
use super::economy::Economy;
use super::entity::{Entity, EntityId, EntityKind, IdAllocator, Team, UnitKind};
use super::events::GameEvent;
use super::targeting::find_target;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    pub loser: Team,
}

impl MatchOutcome {
    pub fn winner(&self) -> Team {
        self.loser.opponent()
    }
}

/// Authoritative entity collection for one peer. Local actions are applied
/// immediately and queued as [`Command`]s for the other peer; commands from
/// the other peer are applied at the start of the next tick.
pub struct Simulation {
    config: MatchConfig,
    local_team: Team,
    entities: Vec<Entity>,
    ids: IdAllocator,
    economy: Economy,
    selected: Option<EntityId>,
    outcome: Option<MatchOutcome>,
    outgoing: Vec<Command>,
    events: Vec<GameEvent>,
    tick: u64,
}

impl Simulation {
    pub fn new(config: MatchConfig, local_team: Team) -> Self {
        let economy = Economy::new(
            config.damage_per_currency,
            config.max_conversions_per_tick,
            config.starting_currency,
        );
        let entities = Self::bases(&config);

        Self {
            config,
            local_team,
            entities,
            ids: IdAllocator::new(local_team),
            economy,
            selected: None,
            outcome: None,
            outgoing: Vec::new(),
            events: Vec::new(),
            tick: 0,
        }
    }

    fn bases(config: &MatchConfig) -> Vec<Entity> {
        Team::ALL
            .iter()
            .map(|&team| Entity::base(team, config.base_position(team)))
            .collect()
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn local_team(&self) -> Team {
        self.local_team
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn views(&self) -> Vec<EntityView> {
        self.entities
            .iter()
            .filter(|e| e.is_alive())
            .map(EntityView::from)
            .collect()
    }

    pub fn currency(&self) -> u32 {
        self.economy.currency(self.local_team)
    }

    pub fn economy(&self) -> &Economy {
        &self.economy
    }

    pub fn selected(&self) -> Option<EntityId> {
        self.selected
    }

    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn result_text(&self) -> Option<String> {
        let outcome = self.outcome?;
        let verdict = if outcome.loser == self.local_team {
            "Defeat"
        } else {
            "Victory"
        };
        Some(format!(
            "{}: the {}'s base has fallen",
            verdict,
            outcome.loser.label()
        ))
    }

    pub fn drain_outgoing(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.outgoing)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Spends currency, places the unit at the local start position and
    /// queues the matching spawn command.
    pub fn spawn_local(&mut self, kind: UnitKind, target: Vec2) -> Result<EntityId, GameError> {
        if self.is_over() {
            return Err(GameError::MatchOver);
        }

        let cost = self.config.cost_of(kind);
        let available = self.economy.currency(self.local_team);
        if !self.economy.try_spend(self.local_team, cost) {
            return Err(GameError::InsufficientCurrency {
                kind,
                cost,
                available,
            });
        }

        let id = self.ids.allocate();
        let wire_target = quantize(target);
        let start = self.config.start_position(self.local_team);
        self.entities.push(Entity::unit(
            id,
            self.local_team,
            kind,
            start,
            Some(wire_target.as_vec2()),
        ));

        self.outgoing.push(Command::spawn(kind, id, wire_target));
        self.events.push(GameEvent::UnitSpawned {
            id,
            team: self.local_team,
            kind,
            remote: false,
        });
        log::debug!("spawned {:?} {} toward {}", kind, id, wire_target);

        Ok(id)
    }

    /// Retargets one of our own units. Returns false for unknown ids, bases
    /// and enemy units.
    pub fn reposition(&mut self, id: EntityId, target: Vec2) -> bool {
        if self.is_over() {
            return false;
        }

        let local_team = self.local_team;
        let wire_target = quantize(target);
        let Some(entity) = self
            .entity_mut(id)
            .filter(|e| e.team == local_team && !e.kind.is_base())
        else {
            return false;
        };

        retarget(entity, wire_target.as_vec2());
        self.outgoing.push(Command::reposition(id, wire_target));
        true
    }

    /// Nearest living unit of ours whose collider contains `point`.
    pub fn select_at(&mut self, point: Vec2) -> Option<EntityId> {
        self.selected = self
            .entities
            .iter()
            .filter(|e| e.team == self.local_team && !e.kind.is_base() && e.is_alive())
            .map(|e| (e.id, e.position().distance(point), e.collider_radius()))
            .filter(|&(_, distance, radius)| distance <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _, _)| id);
        self.selected
    }

    /// Moves the selection to the next of our units in collection order.
    pub fn cycle_selection(&mut self) -> Option<EntityId> {
        let owned: Vec<EntityId> = self
            .entities
            .iter()
            .filter(|e| e.team == self.local_team && !e.kind.is_base() && e.is_alive())
            .map(|e| e.id)
            .collect();

        let next = match self.selected.and_then(|id| owned.iter().position(|&o| o == id)) {
            Some(index) => owned.get(index + 1).or(owned.first()),
            None => owned.first(),
        };
        self.selected = next.copied();
        self.selected
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn order_selected(&mut self, target: Vec2) -> bool {
        match self.selected {
            Some(id) => self.reposition(id, target),
            None => false,
        }
    }

    /// Explicit removal outside the health-based sweep. Bases cannot be
    /// destroyed this way; unknown ids are a no-op.
    pub fn destroy_entity(&mut self, id: EntityId) -> Option<Entity> {
        let index = self
            .entities
            .iter()
            .position(|e| e.id == id && !e.kind.is_base())?;
        let entity = self.entities.remove(index);

        if self.selected == Some(id) {
            self.selected = None;
        }
        self.events.push(GameEvent::UnitDestroyed {
            id,
            team: entity.team,
            kind: entity.kind,
            position: entity.position(),
        });
        Some(entity)
    }

    /// Back to a fresh match: both bases at full health, nothing else.
    pub fn restart(&mut self) {
        self.entities = Self::bases(&self.config);
        self.economy.reset();
        self.ids.reset();
        self.selected = None;
        self.outcome = None;
        self.outgoing.clear();
        self.events.clear();
        self.tick = 0;
        log::info!("match reset");
    }

    pub fn tick<I>(&mut self, dt: f32, incoming: I)
    where
        I: IntoIterator<Item = Command>,
    {
        if self.is_over() {
            return;
        }
        self.tick += 1;

        for command in incoming {
            self.apply_remote(command);
        }

        let count = self.entities.len();

        let mut attacks = Vec::new();
        for (index, entity) in self.entities.iter().enumerate() {
            if entity.kind.is_base() || !entity.is_alive() || !entity.can_attack() {
                continue;
            }
            if let Some(target) = find_target(entity, &self.entities) {
                attacks.push((index, target));
            }
        }

        let mut pooled = vec![0.0f32; count];
        let mut attacked = vec![false; count];
        let mut dealt = [0.0f32; 2];
        for &(attacker_index, target_index) in &attacks {
            let attacker = &self.entities[attacker_index];
            let amount = attacker.stats().damage;

            pooled[target_index] += amount;
            attacked[attacker_index] = true;
            dealt[attacker.team.index()] += amount;

            self.events.push(GameEvent::DamageDealt {
                attacker: attacker.id,
                attacker_kind: attacker.kind,
                target: self.entities[target_index].id,
                amount,
            });
        }

        for team in Team::ALL {
            let minted = self.economy.credit_damage(team, dealt[team.index()]);
            if minted > 0 {
                self.events.push(GameEvent::CurrencyEarned {
                    team,
                    amount: minted,
                });
            }
        }

        let mut fallen_base = None;
        for (entity, &damage) in self.entities.iter_mut().zip(&pooled) {
            if damage <= 0.0 {
                continue;
            }
            entity.set_health(entity.health() - damage);
            if entity.kind.is_base() && !entity.is_alive() && fallen_base.is_none() {
                fallen_base = Some((entity.team, entity.position()));
            }
        }

        if let Some((loser, position)) = fallen_base {
            self.end_match(loser, position);
            return;
        }

        let start_positions: HashMap<EntityId, Vec2> = self
            .entities
            .iter()
            .filter(|e| e.is_alive())
            .map(|e| (e.id, e.position()))
            .collect();

        for (entity, &fired) in self.entities.iter_mut().zip(&attacked) {
            if !entity.is_alive() {
                continue;
            }

            if fired {
                entity.attack_cooldown_timer = 0.0;
                entity.is_shooting = true;
            } else {
                entity.attack_cooldown_timer += dt;
                if entity.attack_cooldown_timer >= entity.stats().attack_cooldown {
                    entity.is_shooting = false;
                }
            }

            if !entity.movement_locked() {
                let step = entity.compute_movement(dt);
                entity.set_position(entity.position() + step);
            }
        }

        self.sweep_dead();

        resolve_collisions(&mut self.entities, &start_positions, &self.config.frontline);
    }

    fn apply_remote(&mut self, command: Command) {
        match command.kind {
            CommandKind::Spawn(kind) => {
                if self.entity(command.entity_id).is_some() {
                    log::debug!("ignoring spawn for existing id {}", command.entity_id);
                    return;
                }

                let team = self.local_team.opponent();
                let start = self.config.start_position(team);
                self.entities.push(Entity::unit(
                    command.entity_id,
                    team,
                    kind,
                    start,
                    Some(command.target_position()),
                ));
                self.events.push(GameEvent::UnitSpawned {
                    id: command.entity_id,
                    team,
                    kind,
                    remote: true,
                });
            }
            CommandKind::Reposition => match self.entity_mut(command.entity_id) {
                Some(entity) => retarget(entity, command.target_position()),
                None => log::debug!("reposition for unknown id {}", command.entity_id),
            },
            CommandKind::None => {}
        }
    }

    fn sweep_dead(&mut self) {
        let mut destroyed = Vec::new();
        self.entities.retain(|entity| {
            if entity.is_alive() {
                return true;
            }
            destroyed.push(GameEvent::UnitDestroyed {
                id: entity.id,
                team: entity.team,
                kind: entity.kind,
                position: entity.position(),
            });
            false
        });

        if let Some(selected) = self.selected {
            if self.entity(selected).is_none() {
                self.selected = None;
            }
        }
        self.events.extend(destroyed);
    }

    fn end_match(&mut self, loser: Team, position: Vec2) {
        self.outcome = Some(MatchOutcome { loser });
        self.selected = None;
        self.events.push(GameEvent::UnitDestroyed {
            id: EntityId::base(loser),
            team: loser,
            kind: EntityKind::Base,
            position,
        });
        self.events.push(GameEvent::MatchEnded { loser });
        log::info!(
            "match over after {} ticks: {} base destroyed",
            self.tick,
            loser.label()
        );
    }
}

fn retarget(entity: &mut Entity, target: Vec2) {
    entity.set_desired_position(Some(target));
    if entity.kind == EntityKind::Cavalry {
        entity.attack_move = true;
    }
}
