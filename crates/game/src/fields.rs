//! # Field Schemas
//!
//! Every record kind has a fixed, ordered list of named fields. The order is
//! the wire order, and the position in the list is the field's stable index.
//!
//! Field names are the literal keys the legacy query protocol puts on the wire,
//! trailing underscores included (`player_`, `score_t`, ...).
//!
//! # Schemas
//!
//! - [`ServerField`]: 45 header fields (Battlefield 2 flavour)
//! - [`PlayerField`]: 8 per-player columns
//! - [`TeamField`]: 2 per-team columns

use gsemu_core::EntityKind;
use std::fmt;

/// A fixed field table for one record kind
///
/// Implementors are fieldless enums whose discriminants run `0..ALL.len()`,
/// so `index()` and `from_index()` are O(1) and `from_name()` compiles to a
/// single string match.
pub trait FieldSchema: Copy + Eq + fmt::Debug + 'static {
    /// Record kind this schema describes
    const KIND: EntityKind;

    /// Every field, in wire order
    const ALL: &'static [Self];

    /// Wire name of every field, parallel to `ALL`
    const NAMES: &'static [&'static str];

    /// Look a field up by its wire name
    fn from_name(name: &str) -> Option<Self>;

    /// Stable position of this field in `ALL`
    fn index(self) -> usize;

    /// Wire name of this field
    fn name(self) -> &'static str {
        Self::NAMES[self.index()]
    }

    fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Number of fields in the schema
    fn count() -> usize {
        Self::ALL.len()
    }
}

macro_rules! field_schema {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident for $kind:ident {
            $( $variant:ident => $wire:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        $vis enum $name {
            $( $variant, )+
        }

        impl FieldSchema for $name {
            const KIND: EntityKind = EntityKind::$kind;
            const ALL: &'static [Self] = &[ $( Self::$variant, )+ ];
            const NAMES: &'static [&'static str] = &[ $( $wire, )+ ];

            fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( $wire => Some(Self::$variant), )+
                    _ => None,
                }
            }

            #[inline]
            fn index(self) -> usize {
                self as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

field_schema! {
    /// Server header fields, in the order a Battlefield 2 server reports them
    pub enum ServerField for Server {
        HostName => "hostname",
        GameName => "gamename",
        GameVersion => "gamever",
        MapName => "mapname",
        GameType => "gametype",
        GameVariant => "gamevariant",
        NumPlayers => "numplayers",
        MaxPlayers => "maxplayers",
        GameMode => "gamemode",
        Password => "password",
        TimeLimit => "timelimit",
        RoundTime => "roundtime",
        HostPort => "hostport",
        Dedicated => "bf2_dedicated",
        Ranked => "bf2_ranked",
        AntiCheat => "bf2_anticheat",
        Os => "bf2_os",
        AutoRecord => "bf2_autorec",
        DemoIndex => "bf2_d_idx",
        DemoDownload => "bf2_d_dl",
        Voip => "bf2_voip",
        AutoBalanced => "bf2_autobalanced",
        FriendlyFire => "bf2_friendlyfire",
        TkMode => "bf2_tkmode",
        StartDelay => "bf2_startdelay",
        SpawnTime => "bf2_spawntime",
        SponsorText => "bf2_sponsortext",
        SponsorLogoUrl => "bf2_sponsorlogo_url",
        CommunityLogoUrl => "bf2_communitylogo_url",
        ScoreLimit => "bf2_scorelimit",
        TicketRatio => "bf2_ticketratio",
        TeamRatio => "bf2_teamratio",
        Team1 => "bf2_team1",
        Team2 => "bf2_team2",
        Bots => "bf2_bots",
        Pure => "bf2_pure",
        MapSize => "bf2_mapsize",
        GlobalUnlocks => "bf2_globalunlocks",
        Fps => "bf2_fps",
        Plasma => "bf2_plasma",
        ReservedSlots => "bf2_reservedslots",
        CoopBotRatio => "bf2_coopbotratio",
        CoopBotCount => "bf2_coopbotcount",
        CoopBotDifficulty => "bf2_coopbotdiff",
        NoVehicles => "bf2_novehicles",
    }
}

field_schema! {
    /// Per-player columns
    pub enum PlayerField for Player {
        Name => "player_",
        Score => "score_",
        Ping => "ping_",
        Team => "team_",
        Deaths => "deaths_",
        Pid => "pid_",
        Skill => "skill_",
        AiBot => "AIBot_",
    }
}

field_schema! {
    /// Per-team columns
    pub enum TeamField for Team {
        Name => "team_t",
        Score => "score_t",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_consistent<F: FieldSchema>() {
        assert_eq!(F::ALL.len(), F::NAMES.len());
        for (i, field) in F::ALL.iter().enumerate() {
            assert_eq!(field.index(), i);
            assert_eq!(F::from_index(i), Some(*field));
            assert_eq!(F::from_name(field.name()), Some(*field));
        }
        assert_eq!(F::from_index(F::count()), None);
    }

    #[test]
    fn test_tables_are_consistent() {
        assert_consistent::<ServerField>();
        assert_consistent::<PlayerField>();
        assert_consistent::<TeamField>();
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(ServerField::HostName.name(), "hostname");
        assert_eq!(ServerField::Fps.name(), "bf2_fps");
        assert_eq!(PlayerField::AiBot.name(), "AIBot_");
        assert_eq!(TeamField::Score.to_string(), "score_t");
    }

    #[test]
    fn test_counts() {
        assert_eq!(ServerField::count(), 45);
        assert_eq!(PlayerField::count(), 8);
        assert_eq!(TeamField::count(), 2);
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(PlayerField::from_name("player"), None);
        assert_eq!(PlayerField::from_name(""), None);
        assert_eq!(ServerField::from_name("HOSTNAME"), None);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(ServerField::KIND, EntityKind::Server);
        assert_eq!(PlayerField::KIND, EntityKind::Player);
        assert_eq!(TeamField::KIND, EntityKind::Team);
    }
}
