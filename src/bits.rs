pub trait BitsExt {
    fn from_num(bits: u8) -> Self;
    fn from_bits(bits: Vec<bool>) -> Self;
    fn to_inner(&self) -> u8;
    fn zero() -> Self;
    fn one() -> Self;
    fn bits(&self) -> &[bool];
}

/// An N-bit field of the packet header byte, stored LSB first.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct Bits<const N: usize> {
    pub bits: [bool; N],
}

impl<const N: usize> Bits<N> {
    // the value must fit in N bits, anything above is dropped by the mask
    pub fn from(num: u8) -> Self {
        let mut bits = [false; N];
        for (i, bit) in bits.iter_mut().enumerate() {
            *bit = (num >> i) & 1 == 1;
        }
        Self { bits }
    }

    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self {
            bits: bits.try_into().expect("properly sized bits"),
        }
    }

    pub fn to_inner(&self) -> u8 {
        let mut inner = 0;
        for i in 0..N {
            if self.bits[i] {
                inner |= 1 << i;
            }
        }
        inner
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }
}

/// Split a byte into groups of `lenvec` bits each, LSB first.
pub fn decompose_bits(mut source: u8, lenvec: &[u8]) -> Vec<Vec<bool>> {
    let mut bitvec: Vec<Vec<bool>> = Vec::with_capacity(lenvec.len());

    for &len in lenvec {
        let mut current_bits: Vec<bool> = Vec::with_capacity(len as usize);
        for _ in 0..len {
            let bit = source & 1 == 1;
            current_bits.push(bit);
            source >>= 1;
        }
        bitvec.push(current_bits);
    }

    bitvec
}

/// Inverse of `decompose_bits` over a flat LSB-first bit slice.
pub fn compose_bits(bitvec: &[bool]) -> u8 {
    let mut target: u8 = 0;
    for (i, &bit) in bitvec.iter().enumerate() {
        target |= (bit as u8) << i;
    }
    target
}

#[cfg(test)]
mod test_bits {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_round_trip() {
        let invariant = 0b1010_1010;
        let bits = Bits::<8>::from(invariant);
        assert_eq!(
            bits.bits,
            [false, true, false, true, false, true, false, true]
        );
        assert_eq!(bits.to_inner(), invariant);

        let mut rng = rand::rng();
        for _ in 0..100 {
            let random: u8 = rng.random();
            let bits = Bits::<8>::from(random);
            assert_eq!(bits.to_inner(), random);
        }
    }

    #[test]
    fn test_decompose_compose() {
        // pn_len(2) | key(1) | res(2) | spin(1) | fixed(1) | form(1)
        let byte = 0b1011_0110;
        let groups = decompose_bits(byte, &[2, 1, 2, 1, 1, 1]);
        assert_eq!(groups.len(), 6);
        assert_eq!(compose_bits(&groups.concat()), byte);

        let mut rng = rand::rng();
        for _ in 0..100 {
            let random: u8 = rng.random();
            let groups = decompose_bits(random, &[2, 1, 2, 1, 1, 1]);
            assert_eq!(compose_bits(&groups.concat()), random);
        }
    }

    #[test]
    fn test_narrow_fields() {
        for num in 0..4 {
            let bits = Bits::<2>::from(num);
            assert_eq!(bits.to_inner(), num);
        }
        let bits = Bits::<1>::from(1);
        assert_eq!(bits.to_inner(), 1);
    }
}
