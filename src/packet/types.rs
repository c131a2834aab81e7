use crate::bits_ext;
use crate::coder::Coder;
use crate::result::{ensure_len, FlitResult};

bits_ext!(SingleBit, 1);
bits_ext!(TwoBits, 2);

/// 8-byte opaque connection id. This implementation only ever uses 0 for
/// the client endpoint and 1 for the server endpoint, but the full field
/// round-trips.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct ConnectionId(pub u64);

impl ConnectionId {
    pub const WIRE_LEN: usize = 8;

    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn to_inner(self) -> u64 {
        self.0
    }
}

impl Coder for ConnectionId {
    fn encode(&self) -> Vec<u8> {
        self.0.to_be_bytes().to_vec()
    }

    fn decode(bytes: &[u8]) -> FlitResult<Self> {
        ensure_len(bytes, Self::WIRE_LEN)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&bytes[..Self::WIRE_LEN]);
        Ok(Self(u64::from_be_bytes(raw)))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bits::BitsExt;

    #[test]
    fn test_connection_id_round_trip() {
        for id in [0u64, 1, 38, u64::MAX] {
            let cid = ConnectionId::new(id);
            let encoded = cid.encode();
            assert_eq!(encoded.len(), ConnectionId::WIRE_LEN);
            assert_eq!(ConnectionId::decode(&encoded).unwrap(), cid);
        }
    }

    #[test]
    fn test_bit_newtypes() {
        assert_eq!(SingleBit::one().to_inner(), 1);
        assert_eq!(SingleBit::zero().to_inner(), 0);
        assert_eq!(TwoBits::from_num(3).to_inner(), 3);
    }
}
