//! Approval roles.

use serde::{Deserialize, Serialize};

/// Roles a user can hold within a department, ordered by approval level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Administrador = 1,
    Initiator = 2,
    Delegate = 3,
    Supervisor = 4,
    Manager = 5,
    Director = 6,
    VpForDepartment = 7,
    VpCfe = 8,
    Ceo = 9,
    BoardChair = 10,
}

impl Role {
    pub const ALL: [Role; 10] = [
        Role::Administrador,
        Role::Initiator,
        Role::Delegate,
        Role::Supervisor,
        Role::Manager,
        Role::Director,
        Role::VpForDepartment,
        Role::VpCfe,
        Role::Ceo,
        Role::BoardChair,
    ];

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.id() == id)
    }

    pub fn id(self) -> i64 {
        self as i64
    }

    /// Name as stored in the `roles` table.
    pub fn name(self) -> &'static str {
        match self {
            Role::Administrador => "ADMINISTRADOR",
            Role::Initiator => "INITIATOR",
            Role::Delegate => "DELEGATE",
            Role::Supervisor => "SUPERVISOR",
            Role::Manager => "MANAGER",
            Role::Director => "DIRECTOR",
            Role::VpForDepartment => "VP_FOR_DEPARTMENT",
            Role::VpCfe => "VP_CFE",
            Role::Ceo => "CEO",
            Role::BoardChair => "BOARD_CHAIR",
        }
    }

    /// Role name for an id, or `"Unknown Role"`.
    pub fn name_of(id: i64) -> &'static str {
        Self::from_id(id).map_or("Unknown Role", Role::name)
    }
}
