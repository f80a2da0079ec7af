use crate::error::{Error, Result};
use crate::sections::Sections;

impl Sections {
    /// Fail if the bytes of any two data sections share an address.
    pub fn check_overlap(&self) -> Result<()> {
        let leaves: Vec<_> = self.iter().filter(|s| !s.data.is_empty()).collect();
        for (i, a) in leaves.iter().enumerate() {
            for b in &leaves[i + 1..] {
                let (as_, ae) = (a.start as i64, a.end());
                let (bs, be) = (b.start as i64, b.end());
                if as_ >= bs && as_ < be {
                    return Err(Error::Overlap(a.name.clone(), b.name.clone()));
                }
                if bs >= as_ && bs < ae {
                    return Err(Error::Overlap(b.name.clone(), a.name.clone()));
                }
            }
        }
        Ok(())
    }
}
