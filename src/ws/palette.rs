/// Colors handed to sessions in join order
pub const PALETTE: [&str; 10] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7",
    "#DDA0DD", "#98D8C8", "#F7DC6F", "#BB8FCE", "#85C1E9",
];

/// Round-robin color picker.
///
/// The cursor only ever moves forward, so colors follow join order and two live
/// sessions share a color once more than `PALETTE.len()` have joined.
#[derive(Debug, Default)]
pub struct ColorAllocator {
    cursor: u64,
}

impl ColorAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_color(&mut self) -> &'static str {
        let color = PALETTE[(self.cursor % PALETTE.len() as u64) as usize];
        self.cursor += 1;
        color
    }

    /// Number of colors handed out so far
    pub fn issued(&self) -> u64 {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_through_palette() {
        let mut colors = ColorAllocator::new();
        let picked: Vec<_> = (0..PALETTE.len() + 2).map(|_| colors.next_color()).collect();
        assert_eq!(&picked[..PALETTE.len()], &PALETTE[..]);
        assert_eq!(picked[PALETTE.len()], PALETTE[0]);
        assert_eq!(picked[PALETTE.len() + 1], PALETTE[1]);
        assert_eq!(colors.issued(), PALETTE.len() as u64 + 2);
    }
}
