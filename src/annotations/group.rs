//! Annotation groups.
//!
//! A group is a primary markup annotation plus one or more subordinates.
//! The primary keeps the member list; each subordinate points back at the
//! primary. An annotation is in at most one group at a time.

use super::{Annot, AnnotHandle, AnnotId, AnnotMut};
use crate::editor::Page;
use crate::error::{Error, Result};

impl Page {
    /// Group `members`, making `members[header_index]` the primary.
    ///
    /// Every member must be a distinct markup annotation of this page.
    /// Members already in another group leave it first; a primary leaving
    /// its group disbands it.
    pub fn set_annot_group(&mut self, members: &[AnnotHandle], header_index: usize) -> Result<()> {
        if members.len() < 2 {
            return Err(Error::InvalidParameter(format!(
                "a group needs at least two members, got {}",
                members.len()
            )));
        }
        if header_index >= members.len() {
            return Err(Error::InvalidParameter(format!(
                "header index {} out of range 0..{}",
                header_index,
                members.len()
            )));
        }
        let mut ids: Vec<AnnotId> = Vec::with_capacity(members.len());
        for handle in members {
            let annot = self.annot(*handle)?;
            if !annot.is_markup() {
                return Err(Error::NotMarkup(annot.kind()));
            }
            if ids.contains(&handle.id()) {
                return Err(Error::InvalidParameter(format!(
                    "annotation {} appears twice in the group",
                    handle.id()
                )));
            }
            ids.push(handle.id());
        }

        for id in &ids {
            self.detach_from_group(*id);
        }

        let header = ids[header_index];
        let subordinates: Vec<AnnotId> = ids.iter().copied().filter(|id| *id != header).collect();
        for id in &subordinates {
            if let Some(markup) = self.annots.get_mut(id).and_then(|rec| rec.markup.as_mut()) {
                markup.group_header = Some(header);
            }
        }
        if let Some(markup) = self.annots.get_mut(&header).and_then(|rec| rec.markup.as_mut()) {
            markup.group_members = subordinates;
        }
        for id in &ids {
            if let Some(rec) = self.annots.get_mut(id) {
                rec.touch();
            }
        }
        log::debug!("Formed group of {} annotations with primary {}", ids.len(), header);
        Ok(())
    }

    /// Take `id` out of whatever group it is in. A primary disbands its
    /// group. Returns whether `id` was grouped.
    pub(crate) fn detach_from_group(&mut self, id: AnnotId) -> bool {
        let Some(rec) = self.annots.get_mut(&id) else {
            return false;
        };
        let Some(markup) = rec.markup.as_mut() else {
            return false;
        };

        if let Some(header) = markup.group_header.take() {
            rec.touch();
            if let Some(primary) = self.annots.get_mut(&header) {
                if let Some(m) = primary.markup.as_mut() {
                    m.group_members.retain(|member| *member != id);
                    if m.group_members.is_empty() {
                        log::debug!("Group of primary {} disbanded", header);
                    }
                }
            }
            log::debug!("Annotation {} left the group of {}", id, header);
            return true;
        }

        let members = std::mem::take(&mut markup.group_members);
        if members.is_empty() {
            return false;
        }
        rec.touch();
        for member in &members {
            if let Some(sub) = self.annots.get_mut(member) {
                if let Some(m) = sub.markup.as_mut() {
                    m.group_header = None;
                }
                sub.touch();
            }
        }
        log::debug!("Group of primary {} disbanded ({} subordinates)", id, members.len());
        true
    }
}

impl<'p> Annot<'p> {
    /// Check if this annotation is in a group.
    pub fn is_grouped(&self) -> bool {
        self.rec.group_header().is_some() || self.rec.is_group_primary()
    }

    /// Check if this annotation is the primary of its group.
    pub fn is_group_header(&self) -> bool {
        self.rec.is_group_primary()
    }

    /// The group primary. A primary reports itself.
    pub fn group_header(&self) -> Option<AnnotHandle> {
        if self.rec.is_group_primary() {
            return Some(self.handle());
        }
        self.rec.group_header().map(|id| self.handle_of(id))
    }

    /// Every member of the group, primary first.
    pub fn group_elements(&self) -> Vec<AnnotHandle> {
        let primary = self.shared();
        let Some(markup) = primary.markup.as_ref() else {
            return Vec::new();
        };
        if markup.group_members.is_empty() {
            return Vec::new();
        }
        std::iter::once(primary.id)
            .chain(markup.group_members.iter().copied())
            .map(|id| self.handle_of(id))
            .collect()
    }
}

impl<'p> AnnotMut<'p> {
    /// Leave the group. On the primary this disbands the whole group.
    /// Returns `Ok(false)` when the annotation is not grouped.
    pub fn ungroup(&mut self) -> Result<bool> {
        self.markup_mut()?;
        Ok(self.page.detach_from_group(self.id))
    }
}
