//! Game Boy record lists: a count byte, a 0xFF-terminated species list,
//! then the data blocks, OT names and nicknames each stored as parallel
//! arrays. Lists stay compact.

use crate::core_api::{CoreError, check_index};

const LIST_END: u8 = 0xFF;

#[derive(Debug, Clone, Copy)]
pub(crate) struct GbList {
    pub offset: usize,
    pub capacity: usize,
    pub data_len: usize,
    pub name_len: usize,
}

/// One record split into its list parts.
pub(crate) struct GbEntry<'a> {
    pub list_species: u8,
    pub data: &'a [u8],
    pub ot_name: &'a [u8],
    pub nickname: &'a [u8],
}

impl GbList {
    pub const fn new(offset: usize, capacity: usize, data_len: usize, name_len: usize) -> Self {
        Self {
            offset,
            capacity,
            data_len,
            name_len,
        }
    }

    fn species_at(&self, index: usize) -> usize {
        self.offset + 1 + index
    }

    fn data_at(&self, index: usize) -> usize {
        self.offset + 2 + self.capacity + index * self.data_len
    }

    fn ot_at(&self, index: usize) -> usize {
        self.data_at(self.capacity) + index * self.name_len
    }

    fn nick_at(&self, index: usize) -> usize {
        self.ot_at(self.capacity) + index * self.name_len
    }

    /// Bytes the list occupies.
    pub fn len(&self) -> usize {
        self.nick_at(self.capacity) - self.offset
    }

    pub fn count(&self, d: &[u8]) -> usize {
        usize::from(d[self.offset]).min(self.capacity)
    }

    /// `None` past the end of the list.
    pub fn entry<'a>(&self, d: &'a [u8], index: usize) -> Result<Option<GbEntry<'a>>, CoreError> {
        check_index("slot", index, self.capacity)?;
        if index >= self.count(d) {
            return Ok(None);
        }
        let data = self.data_at(index);
        let ot = self.ot_at(index);
        let nick = self.nick_at(index);
        Ok(Some(GbEntry {
            list_species: d[self.species_at(index)],
            data: &d[data..data + self.data_len],
            ot_name: &d[ot..ot + self.name_len],
            nickname: &d[nick..nick + self.name_len],
        }))
    }

    /// Overwrites an entry, or appends when `index` is at or past the end.
    /// Returns the index actually written.
    pub fn put(&self, d: &mut [u8], index: usize, entry: &GbEntry<'_>) -> Result<usize, CoreError> {
        check_index("slot", index, self.capacity)?;
        let count = self.count(d);
        let at = index.min(count);
        d[self.species_at(at)] = entry.list_species;
        copy_field(d, self.data_at(at), self.data_len, entry.data);
        copy_field(d, self.ot_at(at), self.name_len, entry.ot_name);
        copy_field(d, self.nick_at(at), self.name_len, entry.nickname);
        if at == count {
            self.set_count(d, count + 1);
        }
        Ok(at)
    }

    /// Removes an entry and closes the gap.
    pub fn remove(&self, d: &mut [u8], index: usize) -> Result<(), CoreError> {
        check_index("slot", index, self.capacity)?;
        let count = self.count(d);
        if index >= count {
            return Ok(());
        }
        for i in index..count - 1 {
            d[self.species_at(i)] = d[self.species_at(i + 1)];
            d.copy_within(self.data_at(i + 1)..self.data_at(i + 2), self.data_at(i));
            d.copy_within(self.ot_at(i + 1)..self.ot_at(i + 2), self.ot_at(i));
            d.copy_within(self.nick_at(i + 1)..self.nick_at(i + 2), self.nick_at(i));
        }
        let last = count - 1;
        d[self.data_at(last)..self.data_at(last + 1)].fill(0);
        d[self.ot_at(last)..self.ot_at(last + 1)].fill(0);
        d[self.nick_at(last)..self.nick_at(last + 1)].fill(0);
        self.set_count(d, last);
        Ok(())
    }

    fn set_count(&self, d: &mut [u8], count: usize) {
        d[self.offset] = count as u8;
        d[self.species_at(count)] = LIST_END;
    }

    /// Writes an empty list.
    pub fn clear(&self, d: &mut [u8]) {
        d[self.offset..self.offset + self.len()].fill(0);
        self.set_count(d, 0);
    }
}

fn copy_field(d: &mut [u8], at: usize, len: usize, src: &[u8]) {
    let n = len.min(src.len());
    d[at..at + n].copy_from_slice(&src[..n]);
    d[at + n..at + len].fill(0);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry<'a>(species: u8, data: &'a [u8], name: &'a [u8]) -> GbEntry<'a> {
        GbEntry {
            list_species: species,
            data,
            ot_name: name,
            nickname: name,
        }
    }

    #[test]
    fn appends_and_compacts() {
        let list = GbList::new(0, 3, 2, 1);
        let mut d = vec![0u8; list.len()];
        list.clear(&mut d);
        assert_eq!(d[1], LIST_END);

        assert_eq!(list.put(&mut d, 2, &entry(7, &[7, 7], b"a")).unwrap(), 0);
        assert_eq!(list.put(&mut d, 1, &entry(8, &[8, 8], b"b")).unwrap(), 1);
        assert_eq!(list.count(&d), 2);
        assert_eq!(d[3], LIST_END);

        list.remove(&mut d, 0).unwrap();
        assert_eq!(list.count(&d), 1);
        let first = list.entry(&d, 0).unwrap().unwrap();
        assert_eq!(first.list_species, 8);
        assert_eq!(first.data, &[8, 8]);
        assert_eq!(first.nickname, b"b");
        assert!(list.entry(&d, 1).unwrap().is_none());
        assert!(list.entry(&d, 3).is_err());
    }
}
