use frontline::{GameEvent, SoundCue, Team};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
}

/// One-line description of a game event for the log, or `None` for events
/// too frequent to be worth printing.
pub fn describe(event: &GameEvent, local_team: Team) -> Option<(Severity, String)> {
    let side = |team: Team| if team == local_team { "our" } else { "enemy" };

    let line = match event {
        GameEvent::UnitSpawned { id, team, kind, .. } => {
            (Severity::Info, format!("{} {:?} {} deployed", side(*team), kind, id))
        }
        GameEvent::UnitDestroyed { id, team, kind, .. } => {
            let severity = if *team == local_team {
                Severity::Warn
            } else {
                Severity::Info
            };
            (severity, format!("{} {:?} {} destroyed", side(*team), kind, id))
        }
        GameEvent::CurrencyEarned { team, amount } if *team == local_team => {
            (Severity::Info, format!("+{} currency", amount))
        }
        GameEvent::MatchEnded { loser } => {
            let severity = if *loser == local_team {
                Severity::Warn
            } else {
                Severity::Info
            };
            (severity, format!("{} base has fallen", side(*loser)))
        }
        GameEvent::CurrencyEarned { .. } | GameEvent::DamageDealt { .. } => return None,
    };

    Some(line)
}

pub fn cue_name(cue: SoundCue) -> &'static str {
    match cue {
        SoundCue::March => "march",
        SoundCue::ArtilleryAttack => "artillery",
        SoundCue::BaseDestroyed => "base destroyed",
        SoundCue::Victory => "victory",
        SoundCue::Defeat => "defeat",
    }
}
