use glam::{IVec2, Vec2};

use crate::sim::{EntityId, UnitKind};

/// kind (1) + entity id (4) + target x (4) + target y (4), little-endian, unpadded.
pub const COMMAND_WIRE_SIZE: usize = 13;
pub const DEFAULT_GAME_PORT: u16 = 1234;
pub const DEFAULT_DISCOVERY_PORT: u16 = 12345;
pub const DISCOVERY_TOKEN: &str = "FRONTLINE_HOST";

const KIND_INFANTRY: u8 = 0;
const KIND_CAVALRY: u8 = 1;
const KIND_ARTILLERY: u8 = 2;
const KIND_REPOSITION: u8 = 3;
const KIND_NONE: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Spawn(UnitKind),
    Reposition,
    None,
}

impl CommandKind {
    pub fn to_byte(self) -> u8 {
        match self {
            CommandKind::Spawn(UnitKind::Infantry) => KIND_INFANTRY,
            CommandKind::Spawn(UnitKind::Cavalry) => KIND_CAVALRY,
            CommandKind::Spawn(UnitKind::Artillery) => KIND_ARTILLERY,
            CommandKind::Reposition => KIND_REPOSITION,
            CommandKind::None => KIND_NONE,
        }
    }

    pub fn from_byte(byte: u8) -> Result<Self, PacketError> {
        match byte {
            KIND_INFANTRY => Ok(CommandKind::Spawn(UnitKind::Infantry)),
            KIND_CAVALRY => Ok(CommandKind::Spawn(UnitKind::Cavalry)),
            KIND_ARTILLERY => Ok(CommandKind::Spawn(UnitKind::Artillery)),
            KIND_REPOSITION => Ok(CommandKind::Reposition),
            KIND_NONE => Ok(CommandKind::None),
            other => Err(PacketError::UnknownKind(other)),
        }
    }
}

/// One replicated player action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    pub entity_id: EntityId,
    pub target: IVec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PacketError {
    #[error("payload too short: {0} bytes, expected 13")]
    Truncated(usize),
    #[error("unknown command kind {0}")]
    UnknownKind(u8),
}

impl Command {
    pub fn spawn(kind: UnitKind, entity_id: EntityId, target: IVec2) -> Self {
        Self {
            kind: CommandKind::Spawn(kind),
            entity_id,
            target,
        }
    }

    pub fn reposition(entity_id: EntityId, target: IVec2) -> Self {
        Self {
            kind: CommandKind::Reposition,
            entity_id,
            target,
        }
    }

    pub fn target_position(&self) -> Vec2 {
        self.target.as_vec2()
    }

    pub fn encode(&self) -> [u8; COMMAND_WIRE_SIZE] {
        let mut out = [0u8; COMMAND_WIRE_SIZE];
        out[0] = self.kind.to_byte();
        out[1..5].copy_from_slice(&(self.entity_id.raw() as i32).to_le_bytes());
        out[5..9].copy_from_slice(&self.target.x.to_le_bytes());
        out[9..13].copy_from_slice(&self.target.y.to_le_bytes());
        out
    }

    /// Bytes past the fixed layout are ignored.
    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() < COMMAND_WIRE_SIZE {
            return Err(PacketError::Truncated(data.len()));
        }

        let kind = CommandKind::from_byte(data[0])?;
        let entity_id = read_i32(&data[1..5]) as u32;
        let x = read_i32(&data[5..9]);
        let y = read_i32(&data[9..13]);

        Ok(Self {
            kind,
            entity_id: EntityId(entity_id),
            target: IVec2::new(x, y),
        })
    }
}

/// Wire coordinates are whole numbers.
pub fn quantize(position: Vec2) -> IVec2 {
    position.round().as_ivec2()
}

fn read_i32(bytes: &[u8]) -> i32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    i32::from_le_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Team;

    #[test]
    fn cavalry_spawn_roundtrip() {
        let id = EntityId::new(Team::Joiner, 7);
        assert_eq!(id.raw(), 0x0100_0007);

        let command = Command::spawn(UnitKind::Cavalry, id, IVec2::new(123, 456));
        let bytes = command.encode();

        assert_eq!(bytes.len(), COMMAND_WIRE_SIZE);
        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[1..5], &[0x07, 0x00, 0x00, 0x01]);

        let decoded = Command::decode(&bytes).unwrap();
        assert_eq!(decoded, command);
    }

    #[test]
    fn negative_coordinates_survive() {
        let command = Command::reposition(EntityId(3), IVec2::new(-40, -175));
        let decoded = Command::decode(&command.encode()).unwrap();
        assert_eq!(decoded.target, IVec2::new(-40, -175));
        assert_eq!(decoded.kind, CommandKind::Reposition);
    }

    #[test]
    fn short_payload_rejected() {
        let bytes = Command::reposition(EntityId(1), IVec2::ZERO).encode();
        assert_eq!(
            Command::decode(&bytes[..12]),
            Err(PacketError::Truncated(12))
        );
        assert_eq!(Command::decode(&[]), Err(PacketError::Truncated(0)));
    }

    #[test]
    fn unknown_kind_rejected() {
        let mut bytes = Command::reposition(EntityId(1), IVec2::ZERO).encode();
        bytes[0] = 9;
        assert_eq!(Command::decode(&bytes), Err(PacketError::UnknownKind(9)));

        bytes[0] = 255;
        assert_eq!(Command::decode(&bytes).unwrap().kind, CommandKind::None);
    }

    #[test]
    fn trailing_bytes_ignored() {
        let command = Command::spawn(UnitKind::Artillery, EntityId(2), IVec2::new(1, 2));
        let mut bytes = command.encode().to_vec();
        bytes.extend_from_slice(&[0xAA, 0xBB]);
        assert_eq!(Command::decode(&bytes).unwrap(), command);
    }

    #[test]
    fn quantize_rounds() {
        assert_eq!(quantize(Vec2::new(10.6, -3.4)), IVec2::new(11, -3));
    }
}
