//! Children reconciliation.
//!
//! # Keyed diff
//!
//! Two child lists are reconciled in five steps:
//!
//! 1. Patch the common prefix of same-type, same-key nodes.
//! 2. Patch the common suffix.
//! 3. If only new nodes remain, mount them before the node that follows the
//!    suffix (or the parent anchor).
//! 4. If only old nodes remain, unmount them.
//! 5. Otherwise, for the unknown middle: match old nodes to new positions by
//!    key, unmount the unmatched, then walk the new middle backwards,
//!    mounting fresh nodes and moving matched nodes that are not part of the
//!    longest increasing run of old positions.
//!
//! Keyless old nodes in the middle are never matched and are always
//! replaced.

use std::collections::HashMap;
use std::ops::Range;

use super::sequence::longest_increasing_subsequence;
use super::{MountScope, Renderer};
use crate::error::Result;
use crate::platform::{NodeHandle, Platform};
use crate::vnode::{Children, VNode, VNodeKey};

impl<P: Platform + 'static> Renderer<P> {
    /// Diff the children of two element vnodes sharing `container`.
    pub(crate) fn patch_children(
        &self,
        old: &VNode,
        new: &VNode,
        container: NodeHandle,
        scope: &MountScope,
    ) -> Result<()> {
        match (old.children(), new.children()) {
            (Children::Nodes(prev), Children::Text(next)) => {
                for child in prev {
                    self.unmount(child, true);
                }
                self.platform.set_text(container, next);
            }
            (prev, Children::Text(next)) => {
                if prev.as_text() != Some(&**next) {
                    self.platform.set_text(container, next);
                }
            }
            (Children::Text(_), Children::Nodes(next)) => {
                self.platform.set_text(container, "");
                self.mount_children(next, container, None, scope)?;
            }
            (Children::Nodes(prev), Children::Nodes(next)) => {
                self.patch_keyed_children(prev, next, container, None, scope)?;
            }
            (_, Children::Nodes(next)) => {
                self.mount_children(next, container, None, scope)?;
            }
            (Children::Nodes(prev), _) => {
                for child in prev {
                    self.unmount(child, true);
                }
            }
            (Children::Text(_), _) => self.platform.set_text(container, ""),
            _ => {}
        }
        Ok(())
    }

    pub(crate) fn patch_keyed_children(
        &self,
        prev: &[VNode],
        next: &[VNode],
        container: NodeHandle,
        parent_anchor: Option<NodeHandle>,
        scope: &MountScope,
    ) -> Result<()> {
        let mut i = 0;
        // Exclusive ends of the unmatched ranges.
        let mut prev_end = prev.len();
        let mut next_end = next.len();

        while i < prev_end && i < next_end && prev[i].is_same_vnode_type(&next[i]) {
            self.patch(Some(&prev[i]), &next[i], container, None, scope)?;
            i += 1;
        }

        while i < prev_end
            && i < next_end
            && prev[prev_end - 1].is_same_vnode_type(&next[next_end - 1])
        {
            self.patch(Some(&prev[prev_end - 1]), &next[next_end - 1], container, None, scope)?;
            prev_end -= 1;
            next_end -= 1;
        }

        if i >= prev_end {
            if i < next_end {
                let anchor = next.get(next_end).and_then(VNode::el).or(parent_anchor);
                self.mount_children(&next[i..next_end], container, anchor, scope)?;
            }
            return Ok(());
        }

        if i >= next_end {
            for child in &prev[i..prev_end] {
                self.unmount(child, true);
            }
            return Ok(());
        }

        self.patch_unknown_middle(
            &prev[i..prev_end],
            next,
            i..next_end,
            container,
            parent_anchor,
            scope,
        )
    }

    /// Reconcile `prev_middle` against `next[range]`.
    ///
    /// The whole of `next` is passed so anchors can be taken from the
    /// already-patched node that follows each position.
    fn patch_unknown_middle(
        &self,
        prev_middle: &[VNode],
        next: &[VNode],
        range: Range<usize>,
        container: NodeHandle,
        parent_anchor: Option<NodeHandle>,
        scope: &MountScope,
    ) -> Result<()> {
        let start = range.start;
        let next_middle = &next[range];
        let to_be_patched = next_middle.len();

        let mut key_to_new_index: HashMap<&VNodeKey, usize> = HashMap::new();
        for (offset, child) in next_middle.iter().enumerate() {
            if let Some(key) = child.key() {
                key_to_new_index.entry(key).or_insert(offset);
            }
        }

        // new offset -> index of the old node patched into it.
        let mut new_to_old: Vec<Option<usize>> = vec![None; to_be_patched];
        let mut patched = 0;
        let mut moved = false;
        let mut max_offset_so_far = 0;

        for (old_index, prev_child) in prev_middle.iter().enumerate() {
            if patched >= to_be_patched {
                self.unmount(prev_child, true);
                continue;
            }

            let matched = prev_child.key().and_then(|key| {
                key_to_new_index
                    .get(key)
                    .copied()
                    .filter(|&offset| prev_child.is_same_vnode_type(&next_middle[offset]))
                    .or_else(|| {
                        next_middle
                            .iter()
                            .position(|candidate| prev_child.is_same_vnode_type(candidate))
                    })
            });

            let Some(offset) = matched else {
                self.unmount(prev_child, true);
                continue;
            };

            if offset >= max_offset_so_far {
                max_offset_so_far = offset;
            } else {
                moved = true;
            }
            new_to_old[offset] = Some(old_index);
            self.patch(Some(prev_child), &next_middle[offset], container, None, scope)?;
            patched += 1;
        }

        let stable = if moved {
            longest_increasing_subsequence(&new_to_old)
        } else {
            Vec::new()
        };
        let mut stable_cursor = stable.len();

        for offset in (0..to_be_patched).rev() {
            let position = start + offset;
            let child = &next[position];
            let anchor = next
                .get(position + 1)
                .and_then(VNode::el)
                .or(parent_anchor);

            match new_to_old[offset] {
                None => self.patch(None, child, container, anchor, scope)?,
                Some(_) if moved => {
                    if stable_cursor > 0 && stable[stable_cursor - 1] == offset {
                        stable_cursor -= 1;
                    } else {
                        self.move_vnode(child, container, anchor);
                    }
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}
