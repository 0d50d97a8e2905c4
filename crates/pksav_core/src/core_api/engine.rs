use std::fs;
use std::path::Path;

use log::debug;
use rand::RngCore;

use crate::generation::{Game, GameVersion};
use crate::gift::Gift;
use crate::registry::TableRegistry;
use crate::sav::{self, GiftPlacement, SaveFile};

use super::error::{CoreError, CoreErrorCode};
use super::types::{BoxOccupancy, Snapshot};

/// Entry point: owns the resource tables every session reads from.
#[derive(Default)]
pub struct Engine {
    registry: TableRegistry,
}

/// One opened save. Mutations go through [`Session::container_mut`];
/// [`Session::finish`] seals the image and hands the bytes back.
pub struct Session<'e> {
    game: Game,
    registry: &'e TableRegistry,
    save: Box<dyn SaveFile>,
}

impl std::fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("game", &self.game)
            .field("editing", &self.save.is_editing())
            .finish()
    }
}

impl Engine {
    pub fn new(registry: TableRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TableRegistry {
        &mut self.registry
    }

    pub fn open_path<P: AsRef<Path>>(
        &self,
        path: P,
        hint: Option<GameVersion>,
    ) -> Result<Session<'_>, CoreError> {
        let bytes = fs::read(path)?;
        self.open_bytes(bytes, hint)
    }

    /// Detects the format of `bytes`. A hint keeps only containers of the
    /// hinted game, which settles images more than one format accepts.
    pub fn open_bytes<B: AsRef<[u8]>>(
        &self,
        bytes: B,
        hint: Option<GameVersion>,
    ) -> Result<Session<'_>, CoreError> {
        let bytes = bytes.as_ref();
        let mut found = sav::detect(bytes, &self.registry);
        if let Some(version) = hint {
            let game = version.game();
            found.retain(|s| Some(s.game()) == game);
            if found.is_empty() {
                return Err(CoreError::new(
                    CoreErrorCode::Parse,
                    format!("failed to parse {} bytes as a {version:?} save", bytes.len()),
                ));
            }
        }
        match found.len() {
            0 => Err(CoreError::new(
                CoreErrorCode::Parse,
                format!("unrecognized save image of {} bytes", bytes.len()),
            )),
            1 => {
                let save = found.remove(0);
                debug!("opened {} save", save.game());
                Ok(Session {
                    game: save.game(),
                    registry: &self.registry,
                    save,
                })
            }
            _ => {
                let games: Vec<String> = found.iter().map(|s| s.game().to_string()).collect();
                Err(CoreError::new(
                    CoreErrorCode::GameDetectionAmbiguous,
                    format!("input parsed as {}; supply a game hint", games.join(", ")),
                ))
            }
        }
    }
}

impl<'e> Session<'e> {
    pub fn game(&self) -> Game {
        self.game
    }

    pub fn version(&self) -> GameVersion {
        self.save.version()
    }

    /// The engine's tables, borrowed for the engine's lifetime so they can
    /// be passed alongside [`Session::container_mut`].
    pub fn registry(&self) -> &'e TableRegistry {
        self.registry
    }

    pub fn container(&self) -> &dyn SaveFile {
        self.save.as_ref()
    }

    pub fn container_mut(&mut self) -> &mut dyn SaveFile {
        self.save.as_mut()
    }

    pub fn inject_gift(
        &mut self,
        gift: &dyn Gift,
        rng: &mut dyn RngCore,
    ) -> Result<GiftPlacement, CoreError> {
        self.save.inject_gift(gift, self.registry, rng)
    }

    /// Current state of the save. Dex totals are zero when the save's dex
    /// needs a table the registry lacks.
    pub fn snapshot(&self) -> Result<Snapshot, CoreError> {
        let save = self.save.as_ref();
        let party = (0..save.party_count()?)
            .map(|slot| save.party_pkm(slot).map(|pk| pk.summary(self.registry)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut boxes = Vec::with_capacity(save.box_count());
        for index in 0..save.box_count() {
            let capacity = save.slots_per_box();
            let occupied = (0..capacity)
                .filter(|&slot| save.pkm(index, slot).map_or(true, |pk| !pk.is_empty()))
                .count();
            boxes.push(BoxOccupancy {
                index,
                occupied,
                capacity,
            });
        }

        let (dex_caught, dex_seen) = dex_totals(save);
        Ok(Snapshot {
            game: self.game,
            generation: self.game.generation(),
            trainer: save.trainer()?,
            party,
            boxes,
            dex_caught,
            dex_seen,
        })
    }

    /// Closes the editing session if one is open and returns the image.
    pub fn finish(mut self) -> Result<Vec<u8>, CoreError> {
        if self.save.is_editing() {
            self.save.finish_editing()?;
        }
        Ok(self.save.into_bytes())
    }
}

fn dex_totals(save: &dyn SaveFile) -> (usize, usize) {
    let (mut caught, mut seen) = (0, 0);
    for species in 1..=save.generation().max_species() {
        match (save.dex_caught(species), save.dex_seen(species)) {
            (Ok(c), Ok(s)) => {
                caught += usize::from(c);
                seen += usize::from(s);
            }
            (Err(e), _) | (_, Err(e)) => {
                debug!("dex totals unavailable: {e}");
                return (0, 0);
            }
        }
    }
    (caught, seen)
}
