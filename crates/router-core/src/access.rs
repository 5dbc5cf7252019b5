//! Access-level resolution for message senders.

use std::collections::HashSet;

use crate::{GuildContext, Identity, UserId};

/// Permission rank of a requester, strictly increasing privilege.
///
/// The derived `Ord` is the authorization order: a command gated at some
/// level is runnable by that level and everything above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccessLevel {
    /// Bot accounts. Terminal: nothing is ever authorized for them.
    Blocked,
    User,
    ServerMod,
    ServerAdmin,
    ServerOwner,
    BotOwner,
}

impl AccessLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blocked => "blocked",
            Self::User => "user",
            Self::ServerMod => "server mod",
            Self::ServerAdmin => "server admin",
            Self::ServerOwner => "server owner",
            Self::BotOwner => "bot owner",
        }
    }
}

impl core::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Guild-scoped permission bits carried on an [`Identity`] snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuildPerms {
    pub administrator: bool,
    pub manage_messages: bool,
    pub ban_members: bool,
    pub kick_members: bool,
}

impl GuildPerms {
    const fn is_moderator(self) -> bool {
        self.manage_messages || self.ban_members || self.kick_members
    }
}

/// Maps an identity snapshot to exactly one [`AccessLevel`].
///
/// Resolution is a fixed-priority rule chain; the first matching rule wins.
/// Outside a guild the guild rules are skipped, so a DM sender is either a
/// configured bot owner or a plain user.
#[derive(Debug, Clone)]
pub struct AccessResolver {
    owners: HashSet<UserId>,
}

impl AccessResolver {
    pub fn new(owners: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            owners: owners.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn resolve(&self, identity: &Identity, guild: Option<&GuildContext>) -> AccessLevel {
        if identity.is_bot {
            return AccessLevel::Blocked;
        }
        if self.owners.contains(&identity.id) {
            return AccessLevel::BotOwner;
        }
        if let Some(guild) = guild {
            if identity.id == guild.owner_id {
                return AccessLevel::ServerOwner;
            }
            if let Some(perms) = identity.guild_perms {
                if perms.administrator {
                    return AccessLevel::ServerAdmin;
                }
                if perms.is_moderator() {
                    return AccessLevel::ServerMod;
                }
            }
        }
        AccessLevel::User
    }
}
