//! Speaking roles, teams, and participant kinds for the BP format.
//!
//! The eight roles and their team bindings are fixed: they never change
//! within or across sessions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four teams in a British Parliamentary debate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    OpeningGovernment,
    OpeningOpposition,
    ClosingGovernment,
    ClosingOpposition,
}

impl Team {
    pub const ALL: [Team; 4] = [
        Team::OpeningGovernment,
        Team::OpeningOpposition,
        Team::ClosingGovernment,
        Team::ClosingOpposition,
    ];

    pub fn index(self) -> usize {
        match self {
            Team::OpeningGovernment => 0,
            Team::OpeningOpposition => 1,
            Team::ClosingGovernment => 2,
            Team::ClosingOpposition => 3,
        }
    }

    pub fn abbreviation(self) -> &'static str {
        match self {
            Team::OpeningGovernment => "OG",
            Team::OpeningOpposition => "OO",
            Team::ClosingGovernment => "CG",
            Team::ClosingOpposition => "CO",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Team::OpeningGovernment => "Opening Government",
            Team::OpeningOpposition => "Opening Opposition",
            Team::ClosingGovernment => "Closing Government",
            Team::ClosingOpposition => "Closing Opposition",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One of the eight fixed speaking positions, declared in speaking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    PrimeMinister,
    LeaderOfOpposition,
    DeputyPrimeMinister,
    DeputyLeaderOfOpposition,
    MemberOfGovernment,
    MemberOfOpposition,
    GovernmentWhip,
    OppositionWhip,
}

impl Role {
    /// The canonical speaking order for a BP debate.
    pub const SPEAKING_ORDER: [Role; 8] = [
        Role::PrimeMinister,
        Role::LeaderOfOpposition,
        Role::DeputyPrimeMinister,
        Role::DeputyLeaderOfOpposition,
        Role::MemberOfGovernment,
        Role::MemberOfOpposition,
        Role::GovernmentWhip,
        Role::OppositionWhip,
    ];

    /// Position of this role in the speaking order.
    pub fn index(self) -> usize {
        match self {
            Role::PrimeMinister => 0,
            Role::LeaderOfOpposition => 1,
            Role::DeputyPrimeMinister => 2,
            Role::DeputyLeaderOfOpposition => 3,
            Role::MemberOfGovernment => 4,
            Role::MemberOfOpposition => 5,
            Role::GovernmentWhip => 6,
            Role::OppositionWhip => 7,
        }
    }

    /// The team this role is permanently bound to.
    pub fn team(self) -> Team {
        match self {
            Role::PrimeMinister | Role::DeputyPrimeMinister => Team::OpeningGovernment,
            Role::LeaderOfOpposition | Role::DeputyLeaderOfOpposition => Team::OpeningOpposition,
            Role::MemberOfGovernment | Role::GovernmentWhip => Team::ClosingGovernment,
            Role::MemberOfOpposition | Role::OppositionWhip => Team::ClosingOpposition,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Role::PrimeMinister => "Prime Minister",
            Role::LeaderOfOpposition => "Leader of Opposition",
            Role::DeputyPrimeMinister => "Deputy Prime Minister",
            Role::DeputyLeaderOfOpposition => "Deputy Leader of Opposition",
            Role::MemberOfGovernment => "Member of Government",
            Role::MemberOfOpposition => "Member of Opposition",
            Role::GovernmentWhip => "Government Whip",
            Role::OppositionWhip => "Opposition Whip",
        }
    }

    /// Look up a role by its display name.
    pub fn from_name(name: &str) -> Option<Role> {
        Role::SPEAKING_ORDER
            .iter()
            .copied()
            .find(|role| role.display_name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Who fills a role for the lifetime of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantKind {
    Ai,
    Human { nickname: String },
}

impl ParticipantKind {
    /// Label recorded next to each speech in the session history.
    pub fn speaker_label(&self) -> &str {
        match self {
            ParticipantKind::Ai => "AI",
            ParticipantKind::Human { nickname } => nickname,
        }
    }
}
