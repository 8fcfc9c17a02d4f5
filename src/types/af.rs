//------------ IPv4 bit helpers ----------------------------------------------
//
// Addresses and prefixes are plain host-order u32s throughout the crate, the
// most significant bit being the first bit of the address. Prefix lengths
// are u8s in 0..=32.

/// The underlying value of an IPv4 address, in host byte order.
pub type IPv4 = u32;

/// The number of bits in an IPv4 address, i.e. the maximum prefix length.
pub const BITS: u8 = 32;

/// The netmask for a prefix of `len` bits. Lengths over 32 saturate.
#[inline]
pub(crate) fn mask(len: u8) -> u32 {
    u32::MAX.checked_shl(32_u32.saturating_sub(len as u32)).unwrap_or(0)
}

/// Fill the bits after `len` with zeros.
#[inline]
pub(crate) fn truncate_to_len(net: IPv4, len: u8) -> IPv4 {
    net & mask(len)
}

/// The bit of `addr` at `pos`, counted from the most significant bit, as a
/// child index (0 or 1).
#[inline]
pub(crate) fn bit_at(addr: IPv4, pos: u8) -> usize {
    ((addr >> (31 - (pos as u32 & 31))) & 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks() {
        assert_eq!(mask(0), 0);
        assert_eq!(mask(1), 0x8000_0000);
        assert_eq!(mask(8), 0xff00_0000);
        assert_eq!(mask(31), 0xffff_fffe);
        assert_eq!(mask(32), u32::MAX);
        assert_eq!(mask(40), u32::MAX);
    }

    #[test]
    fn truncate() {
        assert_eq!(truncate_to_len(0x0a01_0203, 16), 0x0a01_0000);
        assert_eq!(truncate_to_len(0x0a01_0203, 0), 0);
        assert_eq!(truncate_to_len(0x0a01_0203, 32), 0x0a01_0203);
    }

    #[test]
    fn bits() {
        let addr = 0b1010_0000_0000_0000_0000_0000_0000_0001_u32;
        assert_eq!(bit_at(addr, 0), 1);
        assert_eq!(bit_at(addr, 1), 0);
        assert_eq!(bit_at(addr, 2), 1);
        assert_eq!(bit_at(addr, 31), 1);
        assert_eq!(bit_at(addr, 30), 0);
    }
}
