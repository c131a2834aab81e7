use crate::packet::types::ConnectionId;

/// Which endpoint of the transfer this connection is. The role doubles as
/// the local connection id: 0 for the client, 1 for the server.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Role {
    Client,
    Server,
}

impl Role {
    pub fn is_server(self) -> bool {
        self == Role::Server
    }

    pub fn connection_id(self) -> ConnectionId {
        ConnectionId::new(self as u64)
    }

    /// The id packets are addressed to, i.e. the other endpoint's.
    pub fn peer_id(self) -> ConnectionId {
        ConnectionId::new(1 - self as u64)
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub(crate) enum ConnectionState {
    Idle,
    Active,
    Closed,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_role_ids() {
        assert_eq!(Role::Client.connection_id().to_inner(), 0);
        assert_eq!(Role::Client.peer_id().to_inner(), 1);
        assert_eq!(Role::Server.connection_id().to_inner(), 1);
        assert_eq!(Role::Server.peer_id().to_inner(), 0);
    }
}
