use crate::bits::{compose_bits, decompose_bits, BitsExt};
use crate::coder::Coder;
use crate::result::{ensure_len, FlitResult};

use super::types::{SingleBit, TwoBits};

// Every data packet carries a single short header byte, MSB first:
// form(1) | fixed(1) | spin(1) | reserved(2) | key_phase(1) | pn_len(2)
// Only pn_len is consulted on this path. The remaining bits are carried
// so that an encode of a decoded header reproduces the original byte.
//
// pn_len follows RFC 9000: the field stores one less than the byte length
// of the packet number, so the two bits cover lengths 1 through 4.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct PacketHeader {
    pub form: SingleBit,
    pub fixed: SingleBit,
    pub spin: SingleBit,
    pub reserved: TwoBits,
    pub key_phase: SingleBit,
    pub pn_len: TwoBits,
}

impl PacketHeader {
    pub const WIRE_LEN: usize = 1;

    /// Header for a packet number that takes `len` bytes on the wire.
    /// `len` must be in 1..=4, which `PacketNumber::size` guarantees.
    pub fn for_packet_number_len(len: usize) -> Self {
        Self {
            form: SingleBit::zero(),
            fixed: SingleBit::zero(),
            spin: SingleBit::zero(),
            reserved: TwoBits::zero(),
            key_phase: SingleBit::zero(),
            pn_len: TwoBits::from_num(len as u8 - 1),
        }
    }

    /// Byte length of the packet number field this header announces.
    pub fn packet_number_len(&self) -> usize {
        self.pn_len.to_inner() as usize + 1
    }
}

impl Coder for PacketHeader {
    fn encode(&self) -> Vec<u8> {
        // compose_bits is LSB first, so the groups run pn_len upward
        let mut bits = Vec::with_capacity(8);
        bits.extend_from_slice(self.pn_len.bits());
        bits.extend_from_slice(self.key_phase.bits());
        bits.extend_from_slice(self.reserved.bits());
        bits.extend_from_slice(self.spin.bits());
        bits.extend_from_slice(self.fixed.bits());
        bits.extend_from_slice(self.form.bits());
        vec![compose_bits(&bits)]
    }

    fn decode(bytes: &[u8]) -> FlitResult<Self> {
        ensure_len(bytes, Self::WIRE_LEN)?;
        let mut groups = decompose_bits(bytes[0], &[2, 1, 2, 1, 1, 1]).into_iter();
        // the iterator yields exactly six groups, consumed in wire order
        let pn_len = TwoBits::from_bits(groups.next().expect("pn_len bits"));
        let key_phase = SingleBit::from_bits(groups.next().expect("key_phase bit"));
        let reserved = TwoBits::from_bits(groups.next().expect("reserved bits"));
        let spin = SingleBit::from_bits(groups.next().expect("spin bit"));
        let fixed = SingleBit::from_bits(groups.next().expect("fixed bit"));
        let form = SingleBit::from_bits(groups.next().expect("form bit"));
        Ok(Self {
            form,
            fixed,
            spin,
            reserved,
            key_phase,
            pn_len,
        })
    }
}

#[cfg(test)]
mod test_header {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_pn_len_is_length_minus_one() {
        for len in 1..=4 {
            let header = PacketHeader::for_packet_number_len(len);
            assert_eq!(header.pn_len.to_inner(), len as u8 - 1);
            assert_eq!(header.packet_number_len(), len);
        }
    }

    #[test]
    fn test_encode_decode() {
        let header = PacketHeader::for_packet_number_len(1);
        assert_eq!(header.encode(), vec![0b0000_0000]);

        let header = PacketHeader::for_packet_number_len(4);
        assert_eq!(header.encode(), vec![0b0000_0011]);

        let reconstructed = PacketHeader::decode(&header.encode()).unwrap();
        assert_eq!(reconstructed, header);
    }

    #[test]
    fn test_unused_bits_round_trip() {
        // every byte value must survive decode then encode untouched
        let mut rng = rand::rng();
        for _ in 0..100 {
            let byte: u8 = rng.random();
            let header = PacketHeader::decode(&[byte]).unwrap();
            assert_eq!(header.encode(), vec![byte]);
        }
    }

    #[test]
    fn test_truncated() {
        assert!(PacketHeader::decode(&[]).is_err());
    }
}
