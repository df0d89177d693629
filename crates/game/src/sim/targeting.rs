use super::entity::Entity;

/// Single pass over `entities` in collection order. The running minimum covers
/// every living enemy, but a new minimum only becomes the target when it lies
/// within attack range. Ties keep whichever enemy was seen first.
///
/// Returns the index of the chosen target.
pub fn find_target(attacker: &Entity, entities: &[Entity]) -> Option<usize> {
    let range = attacker.stats().attack_range;
    let mut closest = f32::INFINITY;
    let mut target = None;

    for (index, candidate) in entities.iter().enumerate() {
        if candidate.team == attacker.team || !candidate.is_alive() {
            continue;
        }

        let distance = attacker.surface_distance(candidate);
        if distance < closest {
            closest = distance;
            if distance <= range {
                target = Some(index);
            }
        }
    }

    target
}
