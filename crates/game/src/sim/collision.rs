use std::collections::HashMap;

use glam::Vec2;

use crate::config::FrontlineBand;

use super::entity::{Entity, EntityId, EntityKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Skip,
    HaltCavalry { cavalry: usize },
    Revert,
    PushApart,
}

/// Pairwise pass over all living entities. `start_positions` holds where each
/// entity stood before this tick's movement; blocked pairs snap back to it.
pub fn resolve_collisions(
    entities: &mut [Entity],
    start_positions: &HashMap<EntityId, Vec2>,
    band: &FrontlineBand,
) {
    let count = entities.len();
    for i in 0..count {
        for j in (i + 1)..count {
            let (head, tail) = entities.split_at_mut(j);
            let a = &mut head[i];
            let b = &mut tail[0];

            if !a.is_alive() || !b.is_alive() {
                continue;
            }

            let delta = b.position() - a.position();
            let distance = delta.length();
            let min_distance = a.collider_radius() + b.collider_radius();
            if distance == 0.0 || distance >= min_distance {
                continue;
            }

            match classify(a, b, band) {
                Resolution::Skip => {}
                Resolution::HaltCavalry { cavalry } => {
                    let rider = if cavalry == 0 { a } else { b };
                    rider.attack_move = false;
                }
                Resolution::Revert => {
                    revert(a, start_positions);
                    revert(b, start_positions);
                }
                Resolution::PushApart => {
                    let normal = delta / distance;
                    let depth = min_distance - distance;
                    let (pa, pb) = (a.position(), b.position());
                    // Bases are anchored, so the unit takes the whole depth.
                    if a.kind.is_base() {
                        b.set_position(pb + normal * depth);
                    } else if b.kind.is_base() {
                        a.set_position(pa - normal * depth);
                    } else {
                        a.set_position(pa - normal * depth * 0.5);
                        b.set_position(pb + normal * depth * 0.5);
                    }
                }
            }
        }
    }
}

fn classify(a: &Entity, b: &Entity, band: &FrontlineBand) -> Resolution {
    match (a.kind, b.kind) {
        (EntityKind::Base, EntityKind::Base) => return Resolution::Skip,
        (EntityKind::Base, _) | (_, EntityKind::Base) if a.team == b.team => {
            return Resolution::Skip;
        }
        (EntityKind::Base, EntityKind::Cavalry) => return Resolution::HaltCavalry { cavalry: 1 },
        (EntityKind::Cavalry, EntityKind::Base) => return Resolution::HaltCavalry { cavalry: 0 },
        _ => {}
    }

    if a.team == b.team {
        return Resolution::Revert;
    }

    if band.contains(a.team, a.position()) || band.contains(b.team, b.position()) {
        Resolution::PushApart
    } else {
        Resolution::Revert
    }
}

fn revert(entity: &mut Entity, start_positions: &HashMap<EntityId, Vec2>) {
    if let Some(&start) = start_positions.get(&entity.id) {
        entity.set_position(start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{Team, UnitKind};

    fn unit(seq: u32, team: Team, kind: UnitKind, position: Vec2) -> Entity {
        Entity::unit(EntityId::new(team, seq), team, kind, position, None)
    }

    fn snapshot(entities: &[Entity]) -> HashMap<EntityId, Vec2> {
        entities.iter().map(|e| (e.id, e.position())).collect()
    }

    #[test]
    fn same_team_reverts_to_start() {
        let before = vec![
            unit(1, Team::Host, UnitKind::Infantry, Vec2::new(300.0, 400.0)),
            unit(2, Team::Host, UnitKind::Infantry, Vec2::new(400.0, 400.0)),
        ];
        let start = snapshot(&before);

        let mut after = before.clone();
        after[0].set_position(Vec2::new(340.0, 400.0));
        after[1].set_position(Vec2::new(360.0, 400.0));

        resolve_collisions(&mut after, &start, &FrontlineBand::default());

        assert_eq!(after[0].position(), Vec2::new(300.0, 400.0));
        assert_eq!(after[1].position(), Vec2::new(400.0, 400.0));
    }

    #[test]
    fn enemies_outside_band_revert() {
        let mut entities = vec![
            unit(1, Team::Joiner, UnitKind::Artillery, Vec2::new(400.0, 300.0)),
            unit(1, Team::Host, UnitKind::Artillery, Vec2::new(400.0, 400.0)),
        ];
        let mut start = snapshot(&entities);
        start.insert(entities[0].id, Vec2::new(400.0, 290.0));
        start.insert(entities[1].id, Vec2::new(400.0, 410.0));

        resolve_collisions(&mut entities, &start, &FrontlineBand::default());

        assert_eq!(entities[0].position(), Vec2::new(400.0, 290.0));
        assert_eq!(entities[1].position(), Vec2::new(400.0, 410.0));
    }

    #[test]
    fn enemies_inside_band_push_apart() {
        let mut entities = vec![
            unit(1, Team::Joiner, UnitKind::Infantry, Vec2::new(400.0, 200.0)),
            unit(1, Team::Host, UnitKind::Infantry, Vec2::new(400.0, 260.0)),
        ];
        let start = snapshot(&entities);

        resolve_collisions(&mut entities, &start, &FrontlineBand::default());

        // Penetration is 80 - 60 = 20, split evenly.
        let a = entities[0].position();
        let b = entities[1].position();
        assert!((a.y - 190.0).abs() < 1e-4);
        assert!((b.y - 270.0).abs() < 1e-4);
        assert!((a.distance(b) - 80.0).abs() < 1e-4);
    }

    #[test]
    fn cavalry_touching_enemy_base_stops_attack_move() {
        let mut entities = vec![
            Entity::base(Team::Joiner, Vec2::new(400.0, -175.0)),
            unit(1, Team::Host, UnitKind::Cavalry, Vec2::new(400.0, 140.0)),
        ];
        let start = snapshot(&entities);
        assert!(entities[1].attack_move);

        resolve_collisions(&mut entities, &start, &FrontlineBand::default());

        assert!(!entities[1].attack_move);
        assert_eq!(entities[1].position(), Vec2::new(400.0, 140.0));
    }

    #[test]
    fn unit_pushed_clear_of_enemy_base() {
        let mut entities = vec![
            Entity::base(Team::Joiner, Vec2::new(400.0, -175.0)),
            unit(1, Team::Host, UnitKind::Infantry, Vec2::new(400.0, 140.0)),
        ];
        let start = snapshot(&entities);

        resolve_collisions(&mut entities, &start, &FrontlineBand::default());

        // 300 + 40 - 315 = 25, all of it on the infantry.
        assert_eq!(entities[0].position(), Vec2::new(400.0, -175.0));
        assert!((entities[1].position().y - 165.0).abs() < 1e-3);
        assert!(entities[0].surface_distance(&entities[1]) >= -1e-3);
    }

    #[test]
    fn cavalry_flag_cleared_even_when_already_false() {
        let mut cavalry = unit(1, Team::Joiner, UnitKind::Cavalry, Vec2::new(400.0, 660.0));
        cavalry.attack_move = false;
        let mut entities = vec![cavalry, Entity::base(Team::Host, Vec2::new(400.0, 975.0))];
        let start = snapshot(&entities);

        resolve_collisions(&mut entities, &start, &FrontlineBand::default());

        assert!(!entities[0].attack_move);
    }

    #[test]
    fn own_base_does_not_block() {
        let mut entities = vec![
            Entity::base(Team::Host, Vec2::new(400.0, 975.0)),
            unit(1, Team::Host, UnitKind::Infantry, Vec2::new(400.0, 690.0)),
        ];
        let mut start = snapshot(&entities);
        start.insert(entities[1].id, Vec2::new(400.0, 700.0));

        resolve_collisions(&mut entities, &start, &FrontlineBand::default());

        assert_eq!(entities[1].position(), Vec2::new(400.0, 690.0));
    }

    #[test]
    fn bases_never_collide() {
        let mut entities = vec![
            Entity::base(Team::Host, Vec2::new(400.0, 400.0)),
            Entity::base(Team::Joiner, Vec2::new(400.0, 450.0)),
        ];
        let start = snapshot(&entities);

        resolve_collisions(&mut entities, &start, &FrontlineBand::default());

        assert_eq!(entities[0].position(), Vec2::new(400.0, 400.0));
        assert_eq!(entities[1].position(), Vec2::new(400.0, 450.0));
    }

    #[test]
    fn exact_overlap_is_skipped() {
        let mut entities = vec![
            unit(1, Team::Joiner, UnitKind::Infantry, Vec2::new(400.0, 200.0)),
            unit(1, Team::Host, UnitKind::Infantry, Vec2::new(400.0, 200.0)),
        ];
        let start = HashMap::new();

        resolve_collisions(&mut entities, &start, &FrontlineBand::default());

        assert_eq!(entities[0].position(), entities[1].position());
    }
}
