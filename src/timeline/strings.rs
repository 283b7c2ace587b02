//! String bank: the tuning and what each string is currently sounding.

use crate::error::StrumError;

#[derive(Debug, Clone)]
pub struct StringBank {
    roots: Vec<u8>,
    sounding: Vec<Option<u8>>,
}

impl StringBank {
    /// `roots` are ordered from the lowest string to the highest.
    pub fn new(roots: Vec<u8>) -> Self {
        let sounding = vec![None; roots.len()];
        Self { roots, sounding }
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn roots(&self) -> &[u8] {
        &self.roots
    }

    pub fn sounding(&self) -> &[Option<u8>] {
        &self.sounding
    }

    /// Map a string number counted from the highest string (1-based) to an
    /// index into `roots`. Numbers outside the bank give `None`.
    pub fn index_from_high(&self, string: u32) -> Option<usize> {
        let count = self.roots.len();
        let string = usize::try_from(string).ok()?;
        if string == 0 || string > count {
            None
        } else {
            Some(count - string)
        }
    }

    /// Pitch of `fret` on the string at `index`.
    pub fn pitch(&self, index: usize, fret: i32) -> Result<u8, StrumError> {
        let root = self.roots[index] as i32;
        root.checked_add(fret)
            .and_then(|p| u8::try_from(p).ok())
            .filter(|p| *p <= 127)
            .ok_or_else(|| {
                StrumError::ConfigError(format!(
                    "fret {} on string root {} is outside MIDI range",
                    fret, root
                ))
            })
    }

    /// Set what the string sounds; returns the note it was sounding before.
    pub fn replace(&mut self, index: usize, note: Option<u8>) -> Option<u8> {
        std::mem::replace(&mut self.sounding[index], note)
    }

    /// Stop every string, returning `(index, note)` for those that sounded.
    pub fn release_all(&mut self) -> Vec<(usize, u8)> {
        self.sounding
            .iter_mut()
            .enumerate()
            .filter_map(|(i, s)| s.take().map(|note| (i, note)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_from_high() {
        let bank = StringBank::new(vec![40, 45, 50, 55, 59, 64]);
        assert_eq!(bank.index_from_high(1), Some(5));
        assert_eq!(bank.index_from_high(6), Some(0));
        assert_eq!(bank.index_from_high(0), None);
        assert_eq!(bank.index_from_high(7), None);
    }

    #[test]
    fn test_replace_and_release() {
        let mut bank = StringBank::new(vec![40, 45]);
        assert_eq!(bank.replace(0, Some(43)), None);
        assert_eq!(bank.replace(0, Some(44)), Some(43));
        assert_eq!(bank.replace(1, None), None);
        assert_eq!(bank.release_all(), vec![(0, 44)]);
        assert_eq!(bank.sounding().to_vec(), vec![None::<u8>, None]);
        assert_eq!(bank.sounding().len(), bank.len());
    }

    #[test]
    fn test_pitch_range() {
        let bank = StringBank::new(vec![40, 120]);
        assert_eq!(bank.pitch(0, 3).unwrap(), 43);
        assert_eq!(bank.pitch(0, -2).unwrap(), 38);
        assert!(bank.pitch(1, 8).is_err());
        assert!(bank.pitch(0, -41).is_err());
    }
}
