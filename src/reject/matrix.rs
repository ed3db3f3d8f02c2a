// src/reject/matrix.rs

/// Sector-by-sector "can never see" relation, bit-packed the way the REJECT
/// lump stores it: bit `from * n + to`, least significant bit first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectMatrix {
    sector_count: usize,
    data: Vec<u8>,
}

impl RejectMatrix {
    /// Creates an all-visible matrix for `sector_count` sectors.
    pub fn new(sector_count: usize) -> Self {
        let bit_count = sector_count * sector_count;
        Self {
            sector_count,
            data: vec![0; (bit_count + 7) / 8],
        }
    }

    pub fn sector_count(&self) -> usize {
        self.sector_count
    }

    fn bit(&self, from: usize, to: usize) -> (usize, u8) {
        let index = from * self.sector_count + to;
        (index >> 3, 1u8 << (index & 7))
    }

    /// Marks `from` and `to` as mutually hidden.
    pub fn set_blocked(&mut self, from: usize, to: usize) {
        for (a, b) in [(from, to), (to, from)] {
            let (byte, mask) = self.bit(a, b);
            self.data[byte] |= mask;
        }
    }

    pub fn is_blocked(&self, from: usize, to: usize) -> bool {
        if from >= self.sector_count || to >= self.sector_count {
            return false;
        }
        let (byte, mask) = self.bit(from, to);
        self.data[byte] & mask != 0
    }

    /// Number of unordered sector pairs marked hidden.
    pub fn blocked_pairs(&self) -> usize {
        (0..self.sector_count)
            .flat_map(|a| (a + 1..self.sector_count).map(move |b| (a, b)))
            .filter(|&(a, b)| self.is_blocked(a, b))
            .count()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packing() {
        let mut m = RejectMatrix::new(3);
        assert_eq!(m.as_bytes().len(), 2);
        m.set_blocked(0, 2);
        // Bits 2 (0 -> 2) and 6 (2 -> 0).
        assert_eq!(m.as_bytes(), &[0x44, 0x00]);
        assert!(m.is_blocked(2, 0));
        assert!(!m.is_blocked(0, 1));
        assert_eq!(m.blocked_pairs(), 1);

        m.set_blocked(2, 2);
        assert_eq!(m.into_bytes(), vec![0x44, 0x01]);
    }

    #[test]
    fn test_sizes() {
        assert!(RejectMatrix::new(0).as_bytes().is_empty());
        assert_eq!(RejectMatrix::new(1).as_bytes().len(), 1);
        assert_eq!(RejectMatrix::new(8).as_bytes().len(), 8);
        assert_eq!(RejectMatrix::new(9).as_bytes().len(), 11);
    }

    #[test]
    fn test_out_of_range_is_visible() {
        let m = RejectMatrix::new(2);
        assert!(!m.is_blocked(5, 0));
    }
}
