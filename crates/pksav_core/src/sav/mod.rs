//! Save containers. Each format owns its image buffer; records are read out
//! as decrypted copies or, from generation 4 on, as borrowed views into the
//! buffer while an editing session is open.

pub mod checksum;
pub mod dex8;
mod gb;
pub mod items;
pub mod sav1;
pub mod sav2;
pub mod sav3;
pub mod sav4;
pub mod sav5;
pub mod sav6;
pub mod sav7;
pub mod sav8;
pub mod swsh;
mod table3ds;

pub use dex8::DexEntry8;
pub use items::{ItemFormat, ItemStack, Pouch, PouchKind, PouchLayout, pouch_for};
pub use sav1::Sav1;
pub use sav2::Sav2;
pub use sav3::Sav3;
pub use sav4::Sav4;
pub use sav5::Sav5;
pub use sav6::Sav6;
pub use sav7::Sav7;
pub use sav8::Sav8;
pub use table3ds::Sav3ds;

use std::cmp::Ordering;

use rand::RngCore;
use serde::Serialize;

use crate::core_api::{CoreError, CoreErrorCode, TrainerInfo, check_index};
use crate::generation::{Game, GameVersion, Generation};
use crate::gift::Gift;
use crate::pkm::{self, Pk4, Pk5, Pk6, Pk7, Pk8, Pkm};
use crate::registry::TableRegistry;

pub const PARTY_SLOTS: usize = 6;

/// Where an injected gift ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum GiftPlacement {
    Pokemon { box_index: usize, slot: usize },
    Items(Vec<ItemPlacement>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ItemPlacement {
    pub pouch: usize,
    pub slot: usize,
    pub item: u16,
    pub count: u16,
}

/// Operations shared by every save format.
///
/// Containers are constructed in the editing state. `finish_editing`
/// re-signs and seals the image so that `bytes` is what a game would read;
/// every mutation outside the bracket fails with `InvalidState`.
pub trait SaveFile {
    fn game(&self) -> Game;
    fn generation(&self) -> Generation {
        self.game().generation()
    }
    fn version(&self) -> GameVersion {
        self.game().default_version()
    }

    fn is_editing(&self) -> bool;
    fn begin_editing(&mut self) -> Result<(), CoreError>;
    fn finish_editing(&mut self) -> Result<(), CoreError>;
    /// Recomputes every block checksum and mirrored summary checksum.
    fn resign(&mut self) -> Result<(), CoreError>;
    fn bytes(&self) -> &[u8];
    fn into_bytes(self: Box<Self>) -> Vec<u8>;

    fn trainer(&self) -> Result<TrainerInfo, CoreError>;
    fn set_ot_name(&mut self, name: &str) -> Result<(), CoreError>;
    fn set_money(&mut self, money: u32) -> Result<(), CoreError>;

    fn box_count(&self) -> usize;
    fn slots_per_box(&self) -> usize;
    fn party_count(&self) -> Result<usize, CoreError>;
    fn empty_pkm(&self) -> Box<dyn Pkm> {
        pkm::blank(self.generation(), false)
    }
    fn pkm(&self, box_index: usize, slot: usize) -> Result<Box<dyn Pkm>, CoreError>;
    fn set_pkm(&mut self, box_index: usize, slot: usize, pkm: &dyn Pkm) -> Result<(), CoreError>;
    /// Borrowed record over the slot's bytes. Edits land in the image
    /// directly; the caller refreshes the record checksum.
    fn pkm_view(
        &mut self,
        _box_index: usize,
        _slot: usize,
    ) -> Result<Box<dyn Pkm + '_>, CoreError> {
        Err(CoreError::unsupported(format!(
            "{} boxes cannot be viewed in place",
            self.game()
        )))
    }
    fn party_pkm(&self, slot: usize) -> Result<Box<dyn Pkm>, CoreError>;
    /// Party-only fields of a box-form record start zeroed; run
    /// `update_party_data` first to fill them.
    fn set_party_pkm(&mut self, slot: usize, pkm: &dyn Pkm) -> Result<(), CoreError>;

    fn dex_update(&mut self, pkm: &dyn Pkm, registry: &TableRegistry) -> Result<(), CoreError>;
    fn dex_caught(&self, species: u16) -> Result<bool, CoreError>;
    fn dex_seen(&self, species: u16) -> Result<bool, CoreError>;

    fn pouches(&self) -> Vec<Pouch> {
        Vec::new()
    }
    fn item(&self, pouch: usize, _slot: usize) -> Result<ItemStack, CoreError> {
        Err(CoreError::out_of_range("pouch", pouch, 0))
    }
    fn set_item(
        &mut self,
        pouch: usize,
        _slot: usize,
        _stack: &ItemStack,
    ) -> Result<(), CoreError> {
        Err(CoreError::out_of_range("pouch", pouch, 0))
    }

    /// Adds to an existing stack of `item` or the first empty slot of the
    /// pouch of `kind`, falling back to the general items pouch. Returns
    /// `None` when the pouch is full.
    fn add_item(
        &mut self,
        kind: PouchKind,
        item: u16,
        count: u16,
    ) -> Result<Option<ItemPlacement>, CoreError> {
        let pouches = self.pouches();
        let pouch = pouches
            .iter()
            .position(|p| p.kind == kind)
            .or_else(|| pouches.iter().position(|p| p.kind == PouchKind::Items))
            .ok_or_else(|| CoreError::unsupported(format!("{} has no bag", self.game())))?;
        let capacity = pouches[pouch].capacity;

        let mut free = None;
        for slot in 0..capacity {
            let stack = self.item(pouch, slot)?;
            if !stack.is_empty() && stack.item == item {
                let count = stack.count.saturating_add(count);
                self.set_item(pouch, slot, &ItemStack { count, ..stack })?;
                return Ok(Some(ItemPlacement { pouch, slot, item, count }));
            }
            if stack.is_empty() && free.is_none() {
                free = Some(slot);
            }
        }
        let Some(slot) = free else {
            return Ok(None);
        };
        self.set_item(pouch, slot, &ItemStack::new(item, count))?;
        Ok(Some(ItemPlacement { pouch, slot, item, count }))
    }

    fn first_empty_slot(&self) -> Result<Option<(usize, usize)>, CoreError> {
        for box_index in 0..self.box_count() {
            for slot in 0..self.slots_per_box() {
                if self.pkm(box_index, slot)?.is_empty() {
                    return Ok(Some((box_index, slot)));
                }
            }
        }
        Ok(None)
    }

    /// Stores the card itself where the format keeps received cards.
    fn record_gift(&mut self, _gift: &dyn Gift) -> Result<(), CoreError> {
        Ok(())
    }

    /// Materializes a creature card into the first empty box slot, or adds
    /// an item card's stacks to the bag, then records the card.
    fn inject_gift(
        &mut self,
        gift: &dyn Gift,
        registry: &TableRegistry,
        rng: &mut dyn RngCore,
    ) -> Result<GiftPlacement, CoreError> {
        ensure_editing(self.is_editing(), "inject_gift")?;
        if gift.generation() != self.generation() {
            return Err(CoreError::unsupported(format!(
                "a {} card cannot be received by {}",
                gift.generation(),
                self.game()
            )));
        }
        let placement = if gift.is_pokemon() {
            let trainer = self.trainer()?;
            let pk = gift.materialize(&trainer, registry, rng)?;
            let (box_index, slot) = self
                .first_empty_slot()?
                .ok_or_else(|| CoreError::new(CoreErrorCode::InvalidState, "every box is full"))?;
            self.set_pkm(box_index, slot, pk.as_ref())?;
            self.dex_update(pk.as_ref(), registry)?;
            GiftPlacement::Pokemon { box_index, slot }
        } else {
            let mut placed = Vec::new();
            for stack in gift.items() {
                let kind = pouch_for(stack.item);
                let at = self.add_item(kind, stack.item, stack.count)?.ok_or_else(|| {
                    CoreError::new(
                        CoreErrorCode::InvalidState,
                        format!("no room for item {}", stack.item),
                    )
                })?;
                placed.push(at);
            }
            GiftPlacement::Items(placed)
        };
        self.record_gift(gift)?;
        log::debug!("received card {} as {:?}", gift.card_id(), placement);
        Ok(placement)
    }
}

/// Detects the format of `bytes` and opens it. Generation 8 images need the
/// registry's static keys.
pub fn open(bytes: Vec<u8>, registry: &TableRegistry) -> Option<Box<dyn SaveFile>> {
    detect(&bytes, registry).into_iter().next()
}

/// Every container that accepts `bytes`; more than one means the image is
/// ambiguous.
pub fn detect(bytes: &[u8], registry: &TableRegistry) -> Vec<Box<dyn SaveFile>> {
    let mut found: Vec<Box<dyn SaveFile>> = Vec::new();
    if let Some(s) = Sav1::new(bytes.to_vec()) {
        found.push(Box::new(s));
    }
    if let Some(s) = Sav2::new(bytes.to_vec()) {
        found.push(Box::new(s));
    }
    if let Some(s) = Sav3::new(bytes.to_vec()) {
        found.push(Box::new(s));
    }
    if let Some(s) = Sav4::new(bytes.to_vec()) {
        found.push(Box::new(s));
    }
    if let Some(s) = Sav5::new(bytes.to_vec()) {
        found.push(Box::new(s));
    }
    if let Some(s) = Sav6::new(bytes.to_vec()) {
        found.push(Box::new(s));
    }
    if let Some(s) = Sav7::new(bytes.to_vec()) {
        found.push(Box::new(s));
    }
    match registry.swsh_keys() {
        Ok(keys) => {
            if let Some(s) = Sav8::new(bytes.to_vec(), keys, registry) {
                found.push(Box::new(s));
            }
        }
        Err(_) => log::trace!("no Sword/Shield keys loaded, skipping that format"),
    }
    for s in &found {
        log::debug!("image of {} bytes accepted as {}", bytes.len(), s.game());
    }
    found
}

/// Orders two save counters by recency; `Greater` means `a` was written
/// after `b`. The counter wraps, so `u32::MAX` followed by 0 counts as newer.
pub(crate) fn compare_counters(a: u32, b: u32) -> Ordering {
    match (a, b) {
        (u32::MAX, 0) => Ordering::Less,
        (0, u32::MAX) => Ordering::Greater,
        _ => a.cmp(&b),
    }
}

pub(crate) fn ensure_editing(editing: bool, operation: &str) -> Result<(), CoreError> {
    if editing {
        Ok(())
    } else {
        Err(CoreError::not_editing(operation))
    }
}

pub(crate) fn check_slot(
    box_count: usize,
    slots_per_box: usize,
    box_index: usize,
    slot: usize,
) -> Result<(), CoreError> {
    check_index("box", box_index, box_count)?;
    check_index("slot", slot, slots_per_box)
}

/// Decrypted bytes of `pkm` in the container's stored form, box or party.
/// Generations 3 and later only; the Game Boy formats split records apart.
pub(crate) fn stored_form(
    generation: Generation,
    pkm: &dyn Pkm,
    party: bool,
) -> Result<Vec<u8>, CoreError> {
    if pkm.generation() != generation {
        return Err(CoreError::unsupported(format!(
            "a {} record cannot be stored in a {} save; convert it first",
            pkm.generation(),
            generation
        )));
    }
    let owned = pkm.to_owned_pkm();
    let box_len = owned.box_len();
    let mut out = pkm::blank(generation, party).bytes().to_vec();
    let src = owned.bytes();
    let n = if party { src.len() } else { box_len };
    out[..n].copy_from_slice(&src[..n]);
    Ok(out)
}

/// Decrypts the record in `slot` in place. Empty slots are left alone.
pub(crate) fn open_slot(generation: Generation, slot: &mut [u8]) {
    if slot.iter().all(|&b| b == 0) {
        return;
    }
    let ok = match generation {
        Generation::Four => Pk4::new(&mut *slot).is_some(),
        Generation::Five => Pk5::new(&mut *slot).is_some(),
        Generation::Six => Pk6::new(&mut *slot).is_some(),
        Generation::Seven => Pk7::new(&mut *slot).is_some(),
        Generation::Eight => Pk8::new(&mut *slot).is_some(),
        _ => true,
    };
    if !ok {
        log::warn!("slot of {} bytes does not hold a {} record", slot.len(), generation);
    }
}

/// Refreshes the checksum of the record in `slot` and encrypts it in
/// place unless it is empty.
pub(crate) fn seal_slot(generation: Generation, slot: &mut [u8]) {
    fn seal<P: Pkm>(pk: Option<P>) {
        if let Some(mut pk) = pk {
            if !pk.is_empty() {
                pk.refresh_checksum();
                pk.encrypt();
            }
        }
    }
    if slot.iter().all(|&b| b == 0) {
        return;
    }
    match generation {
        Generation::Four => seal(Pk4::new(slot)),
        Generation::Five => seal(Pk5::new(slot)),
        Generation::Six => seal(Pk6::new(slot)),
        Generation::Seven => seal(Pk7::new(slot)),
        Generation::Eight => seal(Pk8::new(slot)),
        _ => {}
    }
}

/// Borrowed record over `slot`.
pub(crate) fn view_slot(
    generation: Generation,
    slot: &mut [u8],
) -> Result<Box<dyn Pkm + '_>, CoreError> {
    let view: Option<Box<dyn Pkm + '_>> = match generation {
        Generation::Four => Pk4::new(slot).map(|p| Box::new(p) as Box<dyn Pkm + '_>),
        Generation::Five => Pk5::new(slot).map(|p| Box::new(p) as Box<dyn Pkm + '_>),
        Generation::Six => Pk6::new(slot).map(|p| Box::new(p) as Box<dyn Pkm + '_>),
        Generation::Seven => Pk7::new(slot).map(|p| Box::new(p) as Box<dyn Pkm + '_>),
        Generation::Eight => Pk8::new(slot).map(|p| Box::new(p) as Box<dyn Pkm + '_>),
        _ => None,
    };
    view.ok_or_else(|| {
        CoreError::unsupported(format!("{generation} slots cannot be viewed in place"))
    })
}

/// Reads a record copy from stored bytes, decrypting as needed.
pub(crate) fn read_slot(generation: Generation, bytes: &[u8]) -> Result<Box<dyn Pkm>, CoreError> {
    pkm::from_bytes(generation, bytes.to_vec()).ok_or_else(|| {
        CoreError::new(
            CoreErrorCode::Parse,
            format!("{} bytes is not a {} record", bytes.len(), generation),
        )
    })
}

/// Writes `record` into a compact party of fixed-size slots and returns
/// the new count. An empty record below the count removes that member and
/// closes the gap; a record at or past the count is appended.
pub(crate) fn put_party_slot(
    slots: &mut [u8],
    slot_len: usize,
    count: usize,
    slot: usize,
    record: Option<&[u8]>,
) -> Result<usize, CoreError> {
    check_index("party slot", slot, PARTY_SLOTS)?;
    let count = count.min(PARTY_SLOTS);
    match record {
        None if slot < count => {
            slots.copy_within((slot + 1) * slot_len..count * slot_len, slot * slot_len);
            slots[(count - 1) * slot_len..count * slot_len].fill(0);
            Ok(count - 1)
        }
        None => Ok(count),
        Some(bytes) => {
            let at = slot.min(count);
            let dest = &mut slots[at * slot_len..(at + 1) * slot_len];
            dest.fill(0);
            let n = bytes.len().min(slot_len);
            dest[..n].copy_from_slice(&bytes[..n]);
            Ok(if at == count { count + 1 } else { count })
        }
    }
}

/// Pouch access shared by the containers with a fixed pouch table.
pub(crate) fn pouch_at<'a>(
    layouts: &'a [PouchLayout],
    pouch: usize,
) -> Result<&'a PouchLayout, CoreError> {
    check_index("pouch", pouch, layouts.len())?;
    Ok(&layouts[pouch])
}

/// Sets or clears the bit for `species` (1-based) in a dex flag array.
pub(crate) fn set_dex_bit(data: &mut [u8], offset: usize, species: u16, value: bool) {
    if species == 0 {
        return;
    }
    let bit = usize::from(species - 1);
    crate::endian::set_flag(data, offset + bit / 8, bit % 8, value);
}

pub(crate) fn dex_bit(data: &[u8], offset: usize, species: u16) -> bool {
    if species == 0 {
        return false;
    }
    let bit = usize::from(species - 1);
    crate::endian::flag(data, offset + bit / 8, bit % 8)
}

/// Fails unless `species` is in the generation's national range.
pub(crate) fn check_species(generation: Generation, species: u16) -> Result<(), CoreError> {
    if species == 0 || species > generation.max_species() {
        Err(CoreError::out_of_range(
            "species",
            usize::from(species),
            usize::from(generation.max_species()) + 1,
        ))
    } else {
        Ok(())
    }
}
