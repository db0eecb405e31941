use uuid::Uuid;

use super::{confirm_delete, Novel};
use crate::error::{NovelError, Result};
use crate::models::*;
use crate::prompt::Confirm;

/// Where a part goes: next to a sibling, or last under a parent.
enum Slot {
    Before(Uuid),
    After(Uuid),
    LastChildOf(Option<Uuid>),
}

impl Novel {
    // ============================================================
    // Derived views
    // ============================================================

    pub fn part(&self, id: Uuid) -> Option<&Part> {
        self.parts.iter().find(|p| p.id == id)
    }

    /// Children of `parent` in sibling order; `None` gives the top-level parts.
    pub fn children(&self, parent: Option<Uuid>) -> Vec<&Part> {
        self.parts.iter().filter(|p| p.parent_id == parent).collect()
    }

    /// 1-based position of `part` among its siblings.
    pub fn part_number(&self, part: &Part) -> u32 {
        let position = self
            .parts
            .iter()
            .filter(|p| p.parent_id == part.parent_id)
            .position(|p| p.id == part.id)
            .unwrap_or_default();
        position as u32 + 1
    }

    /// Current tag of `part`. Nested parts are qualified by their parent's tag, e.g.
    /// `"2__the_city.1__arrival"`.
    pub fn part_tag(&self, part: &Part) -> String {
        let local = derive_tag(self.part_number(part), part.title.as_deref());
        match part.parent_id.and_then(|id| self.part(id)) {
            Some(parent) => format!("{}.{}", self.part_tag(parent), local),
            None => local,
        }
    }

    /// Number of ancestors of `part`.
    pub fn part_depth(&self, part: &Part) -> usize {
        let mut depth = 0;
        let mut current = part.parent_id;
        while let Some(parent) = current.and_then(|id| self.part(id)) {
            depth += 1;
            current = parent.parent_id;
        }
        depth
    }

    /// Every part, depth first: each part is followed by its subtree.
    pub fn parts_preorder(&self) -> Vec<&Part> {
        fn walk<'a>(novel: &'a Novel, parent: Option<Uuid>, out: &mut Vec<&'a Part>) {
            for part in novel.children(parent) {
                out.push(part);
                walk(novel, Some(part.id), out);
            }
        }

        let mut out = Vec::with_capacity(self.parts.len());
        walk(self, None, &mut out);
        out
    }

    /// Chapters placed in the part `id`, in chapter order.
    pub fn part_chapters(&self, id: Uuid) -> Vec<&Chapter> {
        self.chapters
            .iter()
            .filter(|c| c.part_id == Some(id))
            .collect()
    }

    pub fn find_part(&self, tag: &str) -> Option<&Part> {
        self.parts.iter().find(|p| self.part_tag(p) == tag)
    }

    fn part_index(&self, tag: &str) -> Result<usize> {
        self.parts
            .iter()
            .position(|p| self.part_tag(p) == tag)
            .ok_or_else(|| NovelError::not_found(EntityKind::Part, tag))
    }

    /// Whether `id` is `ancestor` or lies below it.
    fn is_within(&self, id: Option<Uuid>, ancestor: Uuid) -> bool {
        let mut current = id;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.part(id).and_then(|p| p.parent_id);
        }
        false
    }

    // ============================================================
    // Mutations
    // ============================================================

    pub fn add_part(&mut self, input: AddPartInput) -> Result<&Part> {
        let slot = match &input.placement {
            Placement::Unchanged => Slot::LastChildOf(None),
            placement => self.resolve_slot(placement)?,
        };

        let part = Part::new(input.title, None);
        let id = part.id;
        self.place_part(part, slot);
        self.mark_dirty(&[EntityKind::Part, EntityKind::Chapter]);

        let part = self
            .part(id)
            .ok_or_else(|| NovelError::not_found(EntityKind::Part, id.to_string()))?;
        tracing::info!("Added part {}", self.part_tag(part));
        Ok(part)
    }

    /// Retitle and/or move a part.
    ///
    /// Chapters and child parts refer to the part by id, so they follow it through the
    /// change of tag.
    pub fn update_part(&mut self, tag: &str, input: UpdatePartInput) -> Result<&Part> {
        let index = self.part_index(tag)?;
        let id = self.parts[index].id;

        let slot = match &input.placement {
            Placement::Unchanged => None,
            placement => Some(self.resolve_slot(placement)?),
        };
        // Placing a part next to itself leaves it where it is.
        let slot = slot.filter(|slot| {
            !matches!(slot, Slot::Before(anchor) | Slot::After(anchor) if *anchor == id)
        });
        if let Some(slot) = &slot {
            let new_parent = match slot {
                Slot::Before(anchor) | Slot::After(anchor) => {
                    self.part(*anchor).and_then(|p| p.parent_id)
                }
                Slot::LastChildOf(parent) => *parent,
            };
            if self.is_within(new_parent, id) {
                return Err(NovelError::CyclicParent {
                    tag: tag.to_string(),
                });
            }
        }

        if let Some(title) = input.title {
            self.parts[index].title = Some(title).filter(|t| !t.is_empty());
        }
        if let Some(slot) = slot {
            let part = self.parts.remove(index);
            self.place_part(part, slot);
        }
        self.mark_dirty(&[EntityKind::Part, EntityKind::Chapter]);

        let part = self
            .part(id)
            .ok_or_else(|| NovelError::not_found(EntityKind::Part, tag))?;
        tracing::info!("Updated part {} -> {}", tag, self.part_tag(part));
        Ok(part)
    }

    /// Delete a part. Its children take its place under its parent and its chapters
    /// are left without a part.
    ///
    /// Returns `false` if the deletion was not confirmed.
    pub fn delete_part(
        &mut self,
        tag: &str,
        force: bool,
        confirm: &mut dyn Confirm,
    ) -> Result<bool> {
        let index = self.part_index(tag)?;
        if !confirm_delete(force, confirm, EntityKind::Part, tag)? {
            return Ok(false);
        }

        let removed = self.parts[index].clone();
        let mut promoted: Vec<Part> = self
            .parts
            .iter()
            .filter(|p| p.parent_id == Some(removed.id))
            .cloned()
            .map(|mut p| {
                p.parent_id = removed.parent_id;
                p
            })
            .collect();

        let mut reordered = Vec::with_capacity(self.parts.len());
        for (i, part) in std::mem::take(&mut self.parts).into_iter().enumerate() {
            if i == index {
                reordered.append(&mut promoted);
            } else if part.parent_id != Some(removed.id) {
                reordered.push(part);
            }
        }
        self.parts = reordered;

        for chapter in self.chapters.iter_mut().filter(|c| c.part_id == Some(removed.id)) {
            chapter.part_id = None;
        }
        self.mark_dirty(&[EntityKind::Part, EntityKind::Chapter]);

        tracing::info!("Deleted part {}", tag);
        Ok(true)
    }

    fn resolve_slot(&self, placement: &Placement) -> Result<Slot> {
        Ok(match placement {
            Placement::Unchanged => Slot::LastChildOf(None),
            Placement::Before(tag) => Slot::Before(self.parts[self.part_index(tag)?].id),
            Placement::After(tag) => Slot::After(self.parts[self.part_index(tag)?].id),
            Placement::Under(tag) => Slot::LastChildOf(Some(self.parts[self.part_index(tag)?].id)),
        })
    }

    /// Insert a part that is not currently in the list.
    fn place_part(&mut self, mut part: Part, slot: Slot) {
        let (anchor, offset) = match slot {
            Slot::Before(anchor) => (anchor, 0),
            Slot::After(anchor) => (anchor, 1),
            Slot::LastChildOf(parent) => {
                part.parent_id = parent;
                self.parts.push(part);
                return;
            }
        };
        match self.parts.iter().position(|p| p.id == anchor) {
            Some(at) => {
                part.parent_id = self.parts[at].parent_id;
                self.parts.insert(at + offset, part);
            }
            None => self.parts.push(part),
        }
    }
}
