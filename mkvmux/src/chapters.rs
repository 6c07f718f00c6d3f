//! Chapters (§3 "Chapter atom", §4.10): UID pools, mandatory validation,
//! timecode adjustment and chapter-driven split points.

use std::collections::HashSet;

use thiserror::Error;

use crate::ebml::{Element, EbmlError, Master};
use crate::matroska_ids::{
    CHAPTERS_CONTEXT, CHAPTER_ATOM_CONTEXT, CHAPTER_ATOM_ID, CHAPTER_DISPLAY_ID, CHAPTER_TIME_END_ID,
    CHAPTER_TIME_START_ID, CHAPTER_UID_ID, CHAPTERS_ID, EDITION_ENTRY_ID, EDITION_UID_ID,
};

#[derive(Debug, Error)]
pub enum ChapterError {
    #[error(transparent)]
    Ebml(#[from] EbmlError),
    #[error("duplicate UID {uid} in the {pool} pool")]
    DuplicateUid { uid: u64, pool: &'static str },
    #[error("chapter atom is missing a ChapterDisplay with string and language")]
    MissingDisplay,
}

#[derive(Debug, Clone)]
pub struct ChapterDisplay {
    pub string: String,
    pub language: String,
    pub country: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChapterAtom {
    pub uid: u64,
    pub start_ns: u64,
    pub end_ns: Option<u64>,
    pub hidden: bool,
    pub enabled: bool,
    pub displays: Vec<ChapterDisplay>,
}

#[derive(Debug, Clone)]
pub struct Edition {
    pub uid: Option<u64>,
    pub hidden: bool,
    pub default: bool,
    pub atoms: Vec<ChapterAtom>,
}

/// UID uniqueness pools (§4.10): chapters, editions, and attachments
/// are tracked separately, since a chapter UID may coincide with an
/// attachment UID without conflict, but not with another chapter UID.
#[derive(Default)]
pub struct UidPools {
    pub chapters: HashSet<u64>,
    pub editions: HashSet<u64>,
    pub attachments: HashSet<u64>,
    pub tracks: HashSet<u64>,
}

impl UidPools {
    pub fn claim_chapter(&mut self, uid: u64) -> Result<(), ChapterError> {
        if !self.chapters.insert(uid) {
            return Err(ChapterError::DuplicateUid {
                uid,
                pool: "chapter",
            });
        }
        Ok(())
    }

    pub fn claim_edition(&mut self, uid: u64) -> Result<(), ChapterError> {
        if !self.editions.insert(uid) {
            return Err(ChapterError::DuplicateUid {
                uid,
                pool: "edition",
            });
        }
        Ok(())
    }

    pub fn claim_attachment(&mut self, uid: u64) -> Result<(), ChapterError> {
        if !self.attachments.insert(uid) {
            return Err(ChapterError::DuplicateUid {
                uid,
                pool: "attachment",
            });
        }
        Ok(())
    }

    pub fn claim_track(&mut self, uid: u64) -> Result<(), ChapterError> {
        if !self.tracks.insert(uid) {
            return Err(ChapterError::DuplicateUid { uid, pool: "track" });
        }
        Ok(())
    }
}

pub struct ChapterTree {
    pub editions: Vec<Edition>,
}

impl ChapterTree {
    pub fn new() -> Self {
        ChapterTree { editions: Vec::new() }
    }

    /// `check_mandatory()`: each edition has ≥1 atom; each atom has a
    /// start time, UID, and ≥1 display with string + valid-looking
    /// ISO-639-2 language.
    pub fn check_mandatory(&self) -> Result<(), ChapterError> {
        for edition in &self.editions {
            if edition.atoms.is_empty() {
                return Err(ChapterError::MissingDisplay);
            }

            for atom in &edition.atoms {
                if atom.displays.is_empty() {
                    return Err(ChapterError::MissingDisplay);
                }

                for display in &atom.displays {
                    if display.string.is_empty() || display.language.len() != 3 {
                        return Err(ChapterError::MissingDisplay);
                    }
                }
            }
        }

        Ok(())
    }

    /// Recursive offset by `delta_ns` (may be negative), clamped at
    /// zero since Matroska forbids negative chapter timecodes.
    pub fn adjust_timecodes(&mut self, delta_ns: i64) {
        for edition in &mut self.editions {
            for atom in &mut edition.atoms {
                atom.start_ns = shift_clamped(atom.start_ns, delta_ns);
                atom.end_ns = atom.end_ns.map(|end| shift_clamped(end, delta_ns));
            }
        }
    }

    /// Sorted, deduplicated atom start times, used as chapter-driven
    /// split points (§4.10, §4.9 "Split conditions").
    pub fn split_points(&self) -> Vec<u64> {
        let mut points: Vec<u64> = self
            .editions
            .iter()
            .flat_map(|e| e.atoms.iter().map(|a| a.start_ns))
            .collect();

        points.sort_unstable();
        points.dedup();
        points
    }

    pub fn render(&self) -> Result<Master, EbmlError> {
        let mut chapters = Master::with_id(CHAPTERS_ID, &CHAPTERS_CONTEXT);

        for edition in &self.editions {
            let mut edition_master = Master::with_id(EDITION_ENTRY_ID, &crate::matroska_ids::EDITION_ENTRY_CONTEXT);

            if let Some(uid) = edition.uid {
                let mut uid_elem = crate::matroska_ids::EDITION_ENTRY_CONTEXT
                    .spec_for(EDITION_UID_ID)
                    .unwrap()
                    .instantiate();
                uid_elem.set_uint(uid);
                edition_master.push(uid_elem);
            }

            for atom in &edition.atoms {
                edition_master.push(Element::Master(render_atom(atom)?));
            }

            chapters.push(Element::Master(edition_master));
        }

        Ok(chapters)
    }
}

impl Default for ChapterTree {
    fn default() -> Self {
        ChapterTree::new()
    }
}

fn shift_clamped(value: u64, delta_ns: i64) -> u64 {
    let shifted = value as i64 + delta_ns;
    shifted.max(0) as u64
}

fn render_atom(atom: &ChapterAtom) -> Result<Master, EbmlError> {
    let mut master = Master::with_id(CHAPTER_ATOM_ID, &CHAPTER_ATOM_CONTEXT);

    master.find_first_mut(CHAPTER_UID_ID).unwrap().set_uint(atom.uid);
    master
        .find_first_mut(CHAPTER_TIME_START_ID)
        .unwrap()
        .set_uint(atom.start_ns);

    if let Some(end) = atom.end_ns {
        let mut end_elem = CHAPTER_ATOM_CONTEXT.spec_for(CHAPTER_TIME_END_ID).unwrap().instantiate();
        end_elem.set_uint(end);
        master.push(end_elem);
    }

    for display in &atom.displays {
        let mut display_master = Master::with_id(CHAPTER_DISPLAY_ID, &crate::matroska_ids::CHAPTER_DISPLAY_CONTEXT);
        display_master
            .find_first_mut(crate::matroska_ids::CHAPTER_STRING_ID)
            .unwrap()
            .set_str(display.string.clone());
        display_master
            .find_first_mut(crate::matroska_ids::CHAPTER_LANGUAGE_ID)
            .unwrap()
            .set_str(display.language.clone());

        if let Some(country) = &display.country {
            let mut country_elem = crate::matroska_ids::CHAPTER_DISPLAY_CONTEXT
                .spec_for(crate::matroska_ids::CHAPTER_COUNTRY_ID)
                .unwrap()
                .instantiate();
            country_elem.set_str(country.clone());
            display_master.push(country_elem);
        }

        master.push(Element::Master(display_master));
    }

    Ok(master)
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample_tree() -> ChapterTree {
        ChapterTree {
            editions: vec![Edition {
                uid: Some(1),
                hidden: false,
                default: true,
                atoms: vec![
                    ChapterAtom {
                        uid: 10,
                        start_ns: 0,
                        end_ns: Some(60_000_000_000),
                        hidden: false,
                        enabled: true,
                        displays: vec![ChapterDisplay {
                            string: "Chapter 1".to_string(),
                            language: "eng".to_string(),
                            country: None,
                        }],
                    },
                    ChapterAtom {
                        uid: 11,
                        start_ns: 60_000_000_000,
                        end_ns: None,
                        hidden: false,
                        enabled: true,
                        displays: vec![ChapterDisplay {
                            string: "Chapter 2".to_string(),
                            language: "eng".to_string(),
                            country: None,
                        }],
                    },
                ],
            }],
        }
    }

    #[test]
    fn check_mandatory_passes_for_well_formed_tree() {
        assert!(sample_tree().check_mandatory().is_ok());
    }

    #[test]
    fn check_mandatory_rejects_missing_display() {
        let mut tree = sample_tree();
        tree.editions[0].atoms[0].displays.clear();
        assert!(tree.check_mandatory().is_err());
    }

    #[test]
    fn adjust_timecodes_clamps_at_zero() {
        let mut tree = sample_tree();
        tree.adjust_timecodes(-1_000_000_000_000);

        assert_eq!(tree.editions[0].atoms[0].start_ns, 0);
        assert_eq!(tree.editions[0].atoms[1].start_ns, 0);
    }

    #[test]
    fn split_points_are_sorted_and_deduplicated() {
        let tree = sample_tree();
        assert_eq!(tree.split_points(), vec![0, 60_000_000_000]);
    }

    #[test]
    fn uid_pools_reject_duplicates() {
        let mut pools = UidPools::default();
        pools.claim_chapter(5).unwrap();
        assert!(matches!(
            pools.claim_chapter(5),
            Err(ChapterError::DuplicateUid { uid: 5, pool: "chapter" })
        ));
    }

    #[test]
    fn render_then_parse_reproduces_an_equivalent_tree() {
        let tree = sample_tree();
        let rendered = tree.render().unwrap();

        let mut out = Vec::new();
        Element::Master(rendered).render(true, true, &mut out).unwrap();

        let (parsed, _) = Element::parse(&out, &CHAPTERS_CONTEXT).unwrap();
        let parsed = parsed.as_master().unwrap();

        let first_edition = parsed.find_first(EDITION_ENTRY_ID).unwrap().as_master().unwrap();
        let first_atom = first_edition.find_first(CHAPTER_ATOM_ID).unwrap().as_master().unwrap();

        assert_eq!(first_atom.find_first(CHAPTER_UID_ID).unwrap().as_uint(), Some(10));
    }
}
